use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::intent::{ChatChannel, ResponseBook};
use crate::ranking::SortKey;
use crate::selection::Selections;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Waterfalls,
    NationalParks,
    HeritageSites,
    HillStations,
    Handicrafts,
    Packages,
    Nature,
    Culture,
    Adventure,
    Wildlife,
    Spiritual,
    Photography,
}

impl Category {
    pub const DESTINATION: [Category; 4] = [
        Self::Waterfalls,
        Self::NationalParks,
        Self::HeritageSites,
        Self::HillStations,
    ];

    pub const PRODUCT: [Category; 2] = [Self::Handicrafts, Self::Packages];

    pub fn parse(value: &str) -> EngineResult<Self> {
        let folded = value.trim().to_lowercase().replace(['_', '-'], " ");
        let category = match folded.as_str() {
            "waterfalls" | "waterfall" => Self::Waterfalls,
            "national parks" | "national park" => Self::NationalParks,
            "heritage sites" | "heritage site" | "heritage" => Self::HeritageSites,
            "hill stations" | "hill station" => Self::HillStations,
            "handicrafts" | "handicraft" => Self::Handicrafts,
            "packages" | "package" | "tour packages" => Self::Packages,
            "nature" => Self::Nature,
            "culture" => Self::Culture,
            "adventure" => Self::Adventure,
            "wildlife" => Self::Wildlife,
            "spiritual" => Self::Spiritual,
            "photography" => Self::Photography,
            _ => return Err(EngineError::UnknownCategory(value.to_string())),
        };
        Ok(category)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Waterfalls => "Waterfalls",
            Self::NationalParks => "National Parks",
            Self::HeritageSites => "Heritage Sites",
            Self::HillStations => "Hill Stations",
            Self::Handicrafts => "handicrafts",
            Self::Packages => "packages",
            Self::Nature => "Nature",
            Self::Culture => "Culture",
            Self::Adventure => "Adventure",
            Self::Wildlife => "Wildlife",
            Self::Spiritual => "Spiritual",
            Self::Photography => "Photography",
        }
    }

    pub fn is_product_category(self) -> bool {
        Self::PRODUCT.contains(&self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestTag {
    Nature,
    Culture,
    Adventure,
    Wildlife,
    Spiritual,
    Photography,
}

impl InterestTag {
    pub const ALL: [InterestTag; 6] = [
        Self::Nature,
        Self::Culture,
        Self::Adventure,
        Self::Wildlife,
        Self::Spiritual,
        Self::Photography,
    ];

    pub fn parse(value: &str) -> EngineResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "nature" => Ok(Self::Nature),
            "culture" => Ok(Self::Culture),
            "adventure" => Ok(Self::Adventure),
            "wildlife" => Ok(Self::Wildlife),
            "spiritual" => Ok(Self::Spiritual),
            "photography" => Ok(Self::Photography),
            _ => Err(EngineError::UnknownInterest(value.to_string())),
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Nature => "nature",
            Self::Culture => "culture",
            Self::Adventure => "adventure",
            Self::Wildlife => "wildlife",
            Self::Spiritual => "spiritual",
            Self::Photography => "photography",
        }
    }

    /// Checkbox label shown by the planner form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Nature => "Nature & Waterfalls",
            Self::Culture => "Culture & Heritage",
            Self::Adventure => "Adventure Sports",
            Self::Wildlife => "Wildlife & Safari",
            Self::Spiritual => "Spiritual Sites",
            Self::Photography => "Photography",
        }
    }

    pub fn category(self) -> Category {
        match self {
            Self::Nature => Category::Nature,
            Self::Culture => Category::Culture,
            Self::Adventure => Category::Adventure,
            Self::Wildlife => Category::Wildlife,
            Self::Spiritual => Category::Spiritual,
            Self::Photography => Category::Photography,
        }
    }
}

/// Fields shared by every catalog record. Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: u32,
    pub name: String,
    pub location: String,
    pub cost: u32,
    pub rating: f32,
    pub category: Category,
    pub description: String,
    pub tags: Vec<String>,
    pub media: String,
}

/// Anything the filter and ranking engines can operate on.
pub trait Listing {
    fn item(&self) -> &CatalogItem;

    /// Order used when a search names no sort key.
    fn default_sort() -> SortKey
    where
        Self: Sized,
    {
        SortKey::CatalogOrder
    }

    fn is_featured(&self) -> bool {
        false
    }

    fn review_count(&self) -> u32 {
        0
    }
}

impl Listing for CatalogItem {
    fn item(&self) -> &CatalogItem {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub duration: String,
    pub best_time: String,
    pub highlights: Vec<String>,
    pub coordinates: MapPoint,
}

impl Listing for Destination {
    fn item(&self) -> &CatalogItem {
        &self.item
    }

    fn default_sort() -> SortKey {
        SortKey::RatingDesc
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub original_price: Option<u32>,
    pub review_count: u32,
    pub in_stock: bool,
    pub featured: bool,
    pub seller: String,
}

impl Product {
    pub fn price(&self) -> u32 {
        self.item.cost
    }

    /// Rounded percentage off the original price, when the product is discounted.
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?;
        if original <= self.item.cost || original == 0 {
            return None;
        }
        let saved = f64::from(original - self.item.cost) / f64::from(original);
        Some((saved * 100.0).round() as u32)
    }
}

impl Listing for Product {
    fn item(&self) -> &CatalogItem {
        &self.item
    }

    fn default_sort() -> SortKey {
        SortKey::FeaturedFirst
    }

    fn is_featured(&self) -> bool {
        self.featured
    }

    fn review_count(&self) -> u32 {
        self.review_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryItem {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub interest: InterestTag,
    pub duration: String,
    pub day: u32,
}

impl Listing for ItineraryItem {
    fn item(&self) -> &CatalogItem {
        &self.item
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
    pub items: Vec<ItineraryItem>,
    pub total_cost: u64,
}

impl TripPlan {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatSender {
    User,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: ChatSender,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Append-only transcript for one channel of one visitor session.
///
/// Sender alternation is not enforced: two user messages may be followed by
/// two system replies when requests overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub channel: ChatChannel,
    messages: Vec<ChatMessage>,
}

impl ChatExchange {
    pub fn new(channel: ChatChannel) -> Self {
        Self {
            channel,
            messages: Vec::new(),
        }
    }

    pub fn with_greeting(channel: ChatChannel, greeting: impl Into<String>) -> Self {
        let mut exchange = Self::new(channel);
        exchange.push(ChatSender::System, greeting);
        exchange
    }

    pub fn push(&mut self, sender: ChatSender, text: impl Into<String>) -> &ChatMessage {
        self.messages.push(ChatMessage {
            sender,
            text: text.into(),
            at: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Everything one visitor accumulates between page loads: both chat
/// transcripts, favorites and cart, and the latest generated plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorSession {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub assistant_chat: ChatExchange,
    pub widget_chat: ChatExchange,
    pub selections: Selections,
    pub last_plan: Option<TripPlan>,
}

impl VisitorSession {
    /// Opens a session whose transcripts start with each channel's greeting.
    pub fn open(
        session_id: impl Into<String>,
        expires_at: DateTime<Utc>,
        book: &ResponseBook,
    ) -> EngineResult<Self> {
        let greeting = |channel: ChatChannel| -> EngineResult<ChatExchange> {
            let text = book.respond(channel.greeting_key())?;
            Ok(ChatExchange::with_greeting(channel, text))
        };

        Ok(Self {
            session_id: session_id.into(),
            created_at: Utc::now(),
            expires_at,
            assistant_chat: greeting(ChatChannel::Assistant)?,
            widget_chat: greeting(ChatChannel::Widget)?,
            selections: Selections::default(),
            last_plan: None,
        })
    }

    pub fn chat(&self, channel: ChatChannel) -> &ChatExchange {
        match channel {
            ChatChannel::Assistant => &self.assistant_chat,
            ChatChannel::Widget => &self.widget_chat,
        }
    }

    pub fn chat_mut(&mut self, channel: ChatChannel) -> &mut ChatExchange {
        match channel {
            ChatChannel::Assistant => &mut self.assistant_chat,
            ChatChannel::Widget => &mut self.widget_chat,
        }
    }

    /// Replaces the channel's transcript with a greeting-only one.
    pub fn reset_chat(&mut self, channel: ChatChannel, book: &ResponseBook) -> EngineResult<()> {
        let text = book.respond(channel.greeting_key())?;
        *self.chat_mut(channel) = ChatExchange::with_greeting(channel, text);
        Ok(())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
