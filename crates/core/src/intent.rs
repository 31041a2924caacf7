use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKey {
    AssistantGreeting,
    Waterfall,
    Culture,
    BestTime,
    Adventure,
    Betla,
    Food,
    Default,
    WidgetGreeting,
    PopularDestinations,
    VisitSeason,
    HowToReach,
    LocalFood,
    WidgetHelp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatChannel {
    /// Full-page tourism assistant.
    Assistant,
    /// Floating quick-answer widget.
    Widget,
}

impl ChatChannel {
    pub fn parse(value: &str) -> EngineResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "assistant" | "chatbot" | "page" => Ok(Self::Assistant),
            "widget" | "floating" | "quick" => Ok(Self::Widget),
            _ => Err(EngineError::UnknownChannel(value.to_string())),
        }
    }

    pub fn matcher(self) -> &'static IntentMatcher {
        match self {
            Self::Assistant => &ASSISTANT_MATCHER,
            Self::Widget => &WIDGET_MATCHER,
        }
    }

    pub fn greeting_key(self) -> ResponseKey {
        match self {
            Self::Assistant => ResponseKey::AssistantGreeting,
            Self::Widget => ResponseKey::WidgetGreeting,
        }
    }

    pub fn quick_prompts(self) -> &'static [&'static str] {
        match self {
            Self::Assistant => &[
                "What are the best waterfalls to visit?",
                "Tell me about tribal culture",
                "Best time to visit Jharkhand?",
                "Adventure activities available?",
                "How to reach Betla National Park?",
                "Local food recommendations",
            ],
            Self::Widget => &[
                "Popular destinations",
                "Best time to visit",
                "How to reach",
                "Local food",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// A rule fires when any trigger is a substring of the folded input.
    Contains,
    /// A rule fires when the whole folded input equals a trigger.
    Exact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRule {
    pub key: ResponseKey,
    pub triggers: Vec<String>,
}

impl IntentRule {
    pub fn new(key: ResponseKey, triggers: &[&str]) -> Self {
        Self {
            key,
            triggers: triggers.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    fn fires(&self, folded: &str, mode: MatchMode) -> bool {
        match mode {
            MatchMode::Contains => self
                .triggers
                .iter()
                .any(|trigger| folded.contains(trigger.as_str())),
            MatchMode::Exact => self.triggers.iter().any(|trigger| folded == trigger),
        }
    }
}

/// Ordered keyword rule table. The first rule that fires wins; declaration
/// order is part of the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentMatcher {
    mode: MatchMode,
    rules: Vec<IntentRule>,
    fallback: ResponseKey,
}

static ASSISTANT_MATCHER: Lazy<IntentMatcher> = Lazy::new(IntentMatcher::assistant);
static WIDGET_MATCHER: Lazy<IntentMatcher> = Lazy::new(IntentMatcher::widget);

impl IntentMatcher {
    pub fn new(mode: MatchMode, rules: Vec<IntentRule>, fallback: ResponseKey) -> Self {
        Self {
            mode,
            rules,
            fallback,
        }
    }

    pub fn assistant() -> Self {
        Self::new(
            MatchMode::Contains,
            vec![
                IntentRule::new(ResponseKey::Waterfall, &["waterfall", "falls"]),
                IntentRule::new(ResponseKey::Culture, &["culture", "tribal", "festival"]),
                IntentRule::new(ResponseKey::BestTime, &["time", "when", "season"]),
                IntentRule::new(ResponseKey::Adventure, &["adventure", "activity", "trekking"]),
                IntentRule::new(ResponseKey::Betla, &["betla", "national park"]),
                IntentRule::new(ResponseKey::Food, &["food", "cuisine", "eat"]),
            ],
            ResponseKey::Default,
        )
    }

    pub fn widget() -> Self {
        Self::new(
            MatchMode::Exact,
            vec![
                IntentRule::new(ResponseKey::PopularDestinations, &["popular destinations"]),
                IntentRule::new(ResponseKey::VisitSeason, &["best time to visit"]),
                IntentRule::new(ResponseKey::HowToReach, &["how to reach"]),
                IntentRule::new(ResponseKey::LocalFood, &["local food"]),
            ],
            ResponseKey::WidgetHelp,
        )
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn fallback(&self) -> ResponseKey {
        self.fallback
    }

    pub fn classify(&self, text: &str) -> ResponseKey {
        let folded = fold(text);
        self.rules
            .iter()
            .find(|rule| rule.fires(&folded, self.mode))
            .map(|rule| rule.key)
            .unwrap_or(self.fallback)
    }
}

/// Canned multi-line reply text keyed by [`ResponseKey`].
#[derive(Debug, Clone, Default)]
pub struct ResponseBook {
    entries: HashMap<ResponseKey, String>,
}

impl ResponseBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ResponseKey, text: impl Into<String>) -> &mut Self {
        self.entries.insert(key, text.into());
        self
    }

    pub fn respond(&self, key: ResponseKey) -> EngineResult<&str> {
        self.entries
            .get(&key)
            .map(String::as_str)
            .ok_or(EngineError::ResponseNotFound(key))
    }

    pub fn contains(&self, key: ResponseKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn jharkhand() -> Self {
        let mut book = Self::new();
        book.insert(
            ResponseKey::AssistantGreeting,
            "Hello! I'm your Jharkhand Tourism Assistant. I can help you with information about destinations, travel planning, local culture, and more. How can I assist you today?",
        )
        .insert(
            ResponseKey::Waterfall,
            "Jharkhand is famous for its stunning waterfalls! The top ones include:\n\n🌊 Hundru Falls (98m) - Most popular, great for photography\n🌊 Jonha Falls - Sacred waterfall with temple\n🌊 Dassam Falls (44m) - Perfect for swimming\n🌊 Hirni Falls - Hidden gem in dense forests\n\nBest time to visit: October to March for full flow!",
        )
        .insert(
            ResponseKey::Culture,
            "Jharkhand has a rich tribal heritage! 🎭\n\n• Major tribes: Santhal, Munda, Ho, Oraon\n• Festivals: Sarhul (spring), Karma (monsoon), Sohrai (harvest)\n• Art forms: Paitkar paintings, tribal dances\n• Handicrafts: Bamboo work, handwoven textiles\n• Music: Traditional drums and folk songs\n\nVisit our Tribal Museum in Ranchi to learn more!",
        )
        .insert(
            ResponseKey::BestTime,
            "Best time to visit Jharkhand:\n\n🌤️ Winter (Oct-Mar): Perfect weather, clear skies\n🌧️ Monsoon (Jul-Sep): Waterfalls at full glory\n☀️ Summer (Apr-Jun): Hot but good for hill stations\n\nWinter is ideal for most activities and sightseeing!",
        )
        .insert(
            ResponseKey::Adventure,
            "Adventure activities in Jharkhand:\n\n🏔️ Trekking: Netarhat, Parasnath Hill\n🚣 River rafting: Subarnarekha River\n🧗 Rock climbing: Ranchi hills\n🦌 Wildlife safari: Betla, Palamau\n📸 Photography tours\n🏕️ Camping: Various hill stations\n\nPerfect for adventure enthusiasts!",
        )
        .insert(
            ResponseKey::Betla,
            "Reaching Betla National Park:\n\n✈️ Nearest Airport: Ranchi (160km)\n🚂 Nearest Railway: Daltonganj (25km)\n🚌 Road: Well connected by NH-75\n\n🎫 Entry: ₹50 Indians, ₹500 foreigners\n⏰ Timings: 6 AM - 6 PM\n🦁 Best for: Tiger safari, elephant spotting\n\nBook safari in advance during peak season!",
        )
        .insert(
            ResponseKey::Food,
            "Must-try Jharkhand cuisine:\n\n🍽️ Dhuska - Fried rice pancake\n🍽️ Pittha - Steamed rice cake\n🍽️ Rugra - Mushroom curry\n🍽️ Bamboo shoot curry\n🍽️ Handia - Traditional rice beer\n🍽️ Tribal honey and forest vegetables\n\nTry local dhabas for authentic flavors!",
        )
        .insert(
            ResponseKey::Default,
            "I'd be happy to help you with that! I can provide information about:\n\n• Tourist destinations and attractions\n• Travel planning and itineraries\n• Local culture and festivals\n• Adventure activities\n• Food and accommodation\n• Transportation options\n\nWhat specific information would you like to know?",
        )
        .insert(
            ResponseKey::WidgetGreeting,
            "Hi! I'm here to help you explore Jharkhand. What would you like to know?",
        )
        .insert(
            ResponseKey::PopularDestinations,
            "Top destinations: Hundru Falls, Betla National Park, Baidyanath Temple, and Netarhat Hill Station!",
        )
        .insert(
            ResponseKey::VisitSeason,
            "October to March is perfect - pleasant weather and clear skies for sightseeing!",
        )
        .insert(
            ResponseKey::HowToReach,
            "Ranchi airport is the main gateway. Well connected by rail and road from major cities.",
        )
        .insert(
            ResponseKey::LocalFood,
            "Try Dhuska, Pittha, Rugra curry, and traditional Handia rice beer!",
        )
        .insert(
            ResponseKey::WidgetHelp,
            "I'd be happy to help! You can ask me about destinations, travel tips, culture, or food.",
        );
        book
    }
}

/// Case folding is the only normalization: whitespace is significant.
fn fold(input: &str) -> String {
    input.to_lowercase()
}

/// Classifies `text` on `channel` and resolves the canned reply.
pub fn reply_for<'a>(
    book: &'a ResponseBook,
    channel: ChatChannel,
    text: &str,
) -> EngineResult<(ResponseKey, &'a str)> {
    let key = channel.matcher().classify(text);
    let reply = book.respond(key)?;
    Ok((key, reply))
}
