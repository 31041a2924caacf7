mod delay;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use trails_core::{
    compose_itinerary, reply_for, search_and_rank, Catalog, ChatChannel, ChatSender, Destination,
    EngineError, FilterCriteria, InterestTag, Product, ResponseKey, SelectionKind, SelectionTarget,
    TripPlan,
    TripRequest, VisitorSession, DURATION_CHOICES,
};
use trails_observability::AppMetrics;
use trails_storage::SessionRepository;
use uuid::Uuid;

pub use delay::{schedule_reply, PendingReply, ReplyDelays};

#[derive(Debug, Clone, Deserialize)]
pub struct ChatInput {
    pub session_id: Option<String>,
    pub text: String,
    #[serde(default = "default_channel")]
    pub channel: ChatChannel,
}

fn default_channel() -> ChatChannel {
    ChatChannel::Assistant
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub session_id: String,
    pub channel: ChatChannel,
    pub response_key: ResponseKey,
    pub reply_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanReply {
    pub session_id: String,
    pub plan: TripPlan,
    pub total_cost: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionReply {
    pub session_id: String,
    pub kind: SelectionKind,
    pub target: SelectionTarget,
    pub id: u32,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterestOption {
    pub id: InterestTag,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickPrompts {
    pub assistant: Vec<&'static str>,
    pub widget: Vec<&'static str>,
}

/// Everything a page needs to render the catalog and planner form.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogOverview {
    pub destinations: Vec<Destination>,
    pub products: Vec<Product>,
    pub interests: Vec<InterestOption>,
    pub durations: Vec<u32>,
    pub quick_prompts: QuickPrompts,
}

#[derive(Clone)]
pub struct TourismAgent<S>
where
    S: SessionRepository,
{
    catalog: Arc<Catalog>,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
    delays: ReplyDelays,
    session_ttl: Duration,
    // Serializes load-modify-store of sessions. Never held across a reply delay.
    session_lock: Arc<Mutex<()>>,
}

impl<S> TourismAgent<S>
where
    S: SessionRepository,
{
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<S>,
        metrics: Arc<AppMetrics>,
        delays: ReplyDelays,
    ) -> Self {
        Self {
            catalog,
            store,
            metrics,
            delays,
            session_ttl: Duration::hours(24),
            session_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn delays(&self) -> ReplyDelays {
        self.delays
    }

    pub fn catalog_overview(&self) -> CatalogOverview {
        self.metrics.inc_request();
        CatalogOverview {
            destinations: self.catalog.destinations().to_vec(),
            products: self.catalog.products().to_vec(),
            interests: InterestTag::ALL
                .iter()
                .map(|tag| InterestOption {
                    id: *tag,
                    label: tag.label(),
                })
                .collect(),
            durations: DURATION_CHOICES.to_vec(),
            quick_prompts: QuickPrompts {
                assistant: ChatChannel::Assistant.quick_prompts().to_vec(),
                widget: ChatChannel::Widget.quick_prompts().to_vec(),
            },
        }
    }

    #[instrument(skip(self, criteria), fields(sort = ?criteria.sort))]
    pub fn search_destinations(&self, criteria: &FilterCriteria) -> Vec<Destination> {
        let started = Instant::now();
        self.metrics.inc_request();

        let hits = search_and_rank(self.catalog.destinations(), criteria)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();

        self.metrics.observe_search(hits.len());
        self.metrics.observe_latency(started.elapsed());
        info!(hits = hits.len(), "destination search handled");
        hits
    }

    #[instrument(skip(self, criteria), fields(sort = ?criteria.sort))]
    pub fn search_products(&self, criteria: &FilterCriteria) -> Vec<Product> {
        let started = Instant::now();
        self.metrics.inc_request();

        let hits = search_and_rank(self.catalog.products(), criteria)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();

        self.metrics.observe_search(hits.len());
        self.metrics.observe_latency(started.elapsed());
        info!(hits = hits.len(), "product search handled");
        hits
    }

    /// Records the visitor's message, waits out the channel's reply delay and
    /// records the canned answer. Concurrent messages on one session each get
    /// their own reply.
    #[instrument(skip(self, input), fields(channel = ?input.channel))]
    pub async fn chat(&self, input: ChatInput) -> Result<ChatReply> {
        let started = Instant::now();
        self.metrics.inc_request();

        if input.text.trim().is_empty() {
            debug!("blank chat message rejected");
            return Err(EngineError::invalid("text", "message is empty").into());
        }
        let text = input.text.as_str();

        let (response_key, reply) = reply_for(self.catalog.responses(), input.channel, text)?;
        let reply_text = reply.to_string();

        let session_id = {
            let _guard = self.session_lock.lock().await;
            let mut session = self.load_or_open(input.session_id).await?;
            session.chat_mut(input.channel).push(ChatSender::User, text);
            self.touch_and_store(&mut session).await?;
            session.session_id
        };

        let delivered = schedule_reply(self.delays.for_channel(input.channel), reply_text)
            .wait()
            .await?;

        {
            let _guard = self.session_lock.lock().await;
            match self.load_live(&session_id).await? {
                Some(mut session) => {
                    session
                        .chat_mut(input.channel)
                        .push(ChatSender::System, delivered.as_str());
                    self.touch_and_store(&mut session).await?;
                }
                None => warn!(
                    session_id = %session_id,
                    "session expired before the reply was delivered; reply not recorded"
                ),
            }
        }

        let fallback = response_key == input.channel.matcher().fallback();
        self.metrics.observe_chat_reply(fallback);
        self.metrics.observe_latency(started.elapsed());
        info!(
            session_id = %session_id,
            response_key = ?response_key,
            fallback,
            "chat handled"
        );

        Ok(ChatReply {
            session_id,
            channel: input.channel,
            response_key,
            reply_text: delivered,
        })
    }

    #[instrument(skip(self))]
    pub async fn reset_chat(
        &self,
        session_id: Option<String>,
        channel: ChatChannel,
    ) -> Result<VisitorSession> {
        self.metrics.inc_request();
        let _guard = self.session_lock.lock().await;
        let mut session = self.load_or_open(session_id).await?;
        session.reset_chat(channel, self.catalog.responses())?;
        self.touch_and_store(&mut session).await?;
        info!(session_id = %session.session_id, "chat reset");
        Ok(session)
    }

    /// Validates the planner form, waits out the plan delay and stores the
    /// result as the session's latest plan.
    #[instrument(skip(self, request), fields(days = ?request.days))]
    pub async fn plan_trip(
        &self,
        session_id: Option<String>,
        request: TripRequest,
    ) -> Result<PlanReply> {
        let started = Instant::now();
        self.metrics.inc_request();

        request.validate()?;
        let days = request.days.unwrap_or_default();
        let plan = compose_itinerary(self.catalog.itinerary_pools(), &request.interests, days);
        let plan = schedule_reply(self.delays.plan, plan).wait().await?;

        let session_id = {
            let _guard = self.session_lock.lock().await;
            let mut session = self.load_or_open(session_id).await?;
            session.last_plan = Some(plan.clone());
            self.touch_and_store(&mut session).await?;
            session.session_id
        };

        self.metrics.observe_plan(plan.items.len());
        self.metrics.observe_latency(started.elapsed());
        info!(
            session_id = %session_id,
            days,
            items = plan.items.len(),
            total_cost = plan.total_cost,
            "trip planned"
        );

        let total_cost = plan.total_cost;
        Ok(PlanReply {
            session_id,
            plan,
            total_cost,
        })
    }

    /// Destination and product ids live in separate collections, so the
    /// same number can be a favorite in both. The cart only takes products.
    #[instrument(skip(self))]
    pub async fn toggle_selection(
        &self,
        session_id: Option<String>,
        kind: SelectionKind,
        target: SelectionTarget,
        id: u32,
    ) -> Result<SelectionReply> {
        self.metrics.inc_request();

        let known = match target {
            SelectionTarget::Destination => self.catalog.destination(id).is_some(),
            SelectionTarget::Product => self.catalog.product(id).is_some(),
        };
        if !known {
            return Err(EngineError::invalid(
                "id",
                format!("no {} with id {id}", target.as_code()),
            )
            .into());
        }

        let _guard = self.session_lock.lock().await;
        let mut session = self.load_or_open(session_id).await?;
        let selected = session.selections.toggle(kind, target, id)?;
        self.touch_and_store(&mut session).await?;

        self.metrics.inc_selection_toggle();
        info!(
            session_id = %session.session_id,
            kind = ?kind,
            target = ?target,
            id,
            selected,
            "selection toggled"
        );

        Ok(SelectionReply {
            session_id: session.session_id,
            kind,
            target,
            id,
            selected,
        })
    }

    /// Expired sessions read as absent.
    pub async fn session_snapshot(&self, session_id: &str) -> Result<Option<VisitorSession>> {
        self.metrics.inc_request();
        self.load_live(session_id).await
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        let removed = self.store.purge_expired(Utc::now()).await?;
        if removed > 0 {
            info!(removed, "expired sessions purged");
        }
        Ok(removed)
    }

    async fn load_live(&self, session_id: &str) -> Result<Option<VisitorSession>> {
        let session = self.store.load_session(session_id).await?;
        Ok(session.filter(|session| !session.is_expired(Utc::now())))
    }

    async fn load_or_open(&self, session_id: Option<String>) -> Result<VisitorSession> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = Utc::now();

        match self.store.load_session(&session_id).await? {
            Some(session) if !session.is_expired(now) => Ok(session),
            _ => Ok(VisitorSession::open(
                session_id,
                now + self.session_ttl,
                self.catalog.responses(),
            )?),
        }
    }

    async fn touch_and_store(&self, session: &mut VisitorSession) -> Result<()> {
        session.expires_at = Utc::now() + self.session_ttl;
        self.store.upsert_session(session).await
    }
}

#[cfg(test)]
mod tests {
    use trails_core::{CostRange, ResponseBook, SortKey};
    use trails_storage::MemoryStore;

    use super::*;

    fn agent_with(delays: ReplyDelays) -> TourismAgent<MemoryStore> {
        TourismAgent::new(
            Arc::new(Catalog::jharkhand()),
            Arc::new(MemoryStore::new()),
            AppMetrics::shared(),
            delays,
        )
    }

    fn agent() -> TourismAgent<MemoryStore> {
        agent_with(ReplyDelays::none())
    }

    fn chat_input(session_id: Option<&str>, text: &str) -> ChatInput {
        ChatInput {
            session_id: session_id.map(str::to_string),
            text: text.to_string(),
            channel: ChatChannel::Assistant,
        }
    }

    fn engine_error(error: &anyhow::Error) -> &EngineError {
        error.downcast_ref::<EngineError>().unwrap()
    }

    #[test]
    fn searches_cheap_falls() {
        let criteria = FilterCriteria::new()
            .with_query("falls")
            .with_cost_range(CostRange::new(0, 2_000).unwrap())
            .sorted_by(SortKey::CatalogOrder);
        let names = agent()
            .search_destinations(&criteria)
            .into_iter()
            .map(|d| d.item.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Hundru Falls", "Jonha Falls", "Dassam Falls"]);
    }

    #[test]
    fn unsorted_searches_use_page_defaults() {
        let agent = agent();
        let destinations = agent.search_destinations(&FilterCriteria::new());
        assert_eq!(destinations[0].item.name, "Baidyanath Temple");
        assert!(destinations
            .windows(2)
            .all(|pair| pair[0].item.rating >= pair[1].item.rating));

        let products = agent.search_products(&FilterCriteria::new());
        let featured = products.iter().filter(|p| p.featured).count();
        assert!(featured > 0);
        assert!(products[..featured].iter().all(|p| p.featured));
    }

    #[test]
    fn searches_products_by_price() {
        let criteria = FilterCriteria::new().sorted_by(SortKey::CostAsc);
        let prices = agent()
            .search_products(&criteria)
            .iter()
            .map(|p| p.price())
            .collect::<Vec<_>>();
        assert!(prices.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn overview_lists_interests_and_prompts() {
        let overview = agent().catalog_overview();
        assert_eq!(overview.destinations.len(), 8);
        assert_eq!(overview.interests.len(), InterestTag::ALL.len());
        assert_eq!(overview.durations, vec![1, 2, 3, 4, 5, 7]);
        assert_eq!(overview.quick_prompts.widget.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn chat_waits_for_channel_delay() {
        let agent = agent_with(ReplyDelays::default());
        let started = tokio::time::Instant::now();

        let reply = agent
            .chat(chat_input(None, "What are the best waterfalls to visit?"))
            .await
            .unwrap();

        assert_eq!(reply.response_key, ResponseKey::Waterfall);
        assert!(started.elapsed() >= std::time::Duration::from_millis(1_500));

        let session = agent
            .session_snapshot(&reply.session_id)
            .await
            .unwrap()
            .unwrap();
        let transcript = session.chat(ChatChannel::Assistant);
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.last().unwrap().sender, ChatSender::System);
        assert_eq!(transcript.last().unwrap().text, reply.reply_text);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_messages_all_get_replies() {
        let agent = agent_with(ReplyDelays::default());
        let first = agent.chat(chat_input(Some("visitor"), "Tell me about tribal culture"));
        let second = agent.chat(chat_input(Some("visitor"), "Where can I eat?"));

        let (first, second) = futures::future::join(first, second).await;
        assert_eq!(first.unwrap().response_key, ResponseKey::Culture);
        assert_eq!(second.unwrap().response_key, ResponseKey::Food);

        let session = agent.session_snapshot("visitor").await.unwrap().unwrap();
        let transcript = session.chat(ChatChannel::Assistant);
        assert_eq!(transcript.len(), 5);
        let system_replies = transcript
            .messages()
            .iter()
            .filter(|m| m.sender == ChatSender::System)
            .count();
        assert_eq!(system_replies, 3);
    }

    #[tokio::test]
    async fn widget_uses_exact_phrases() {
        let agent = agent();
        let mut input = chat_input(None, "Local FOOD");
        input.channel = ChatChannel::Widget;
        let reply = agent.chat(input).await.unwrap();
        assert_eq!(reply.response_key, ResponseKey::LocalFood);

        let mut input = chat_input(Some(&reply.session_id), "  local food ");
        input.channel = ChatChannel::Widget;
        let padded = agent.chat(input).await.unwrap();
        assert_eq!(padded.response_key, ResponseKey::WidgetHelp);
        let session = agent
            .session_snapshot(&reply.session_id)
            .await
            .unwrap()
            .unwrap();
        let transcript = session.chat(ChatChannel::Widget).messages();
        assert_eq!(transcript[3].text, "  local food ");

        let mut input = chat_input(Some(&reply.session_id), "local food please");
        input.channel = ChatChannel::Widget;
        let reply = agent.chat(input).await.unwrap();
        assert_eq!(reply.response_key, ResponseKey::WidgetHelp);
    }

    #[tokio::test]
    async fn blank_message_is_rejected_without_side_effects() {
        let agent = agent();
        let error = agent
            .chat(chat_input(Some("quiet"), "   "))
            .await
            .unwrap_err();
        assert!(matches!(engine_error(&error), EngineError::InvalidInput(_)));
        assert!(agent.session_snapshot("quiet").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_reply_text_is_surfaced() {
        let base = Catalog::jharkhand();
        let mut book = ResponseBook::new();
        book.insert(ResponseKey::AssistantGreeting, "hi")
            .insert(ResponseKey::WidgetGreeting, "hey");
        let catalog = Catalog::new(
            base.destinations().to_vec(),
            base.products().to_vec(),
            base.itinerary_pools().clone(),
            book,
        );
        let agent = TourismAgent::new(
            Arc::new(catalog),
            Arc::new(MemoryStore::new()),
            AppMetrics::shared(),
            ReplyDelays::none(),
        );

        let error = agent
            .chat(chat_input(None, "anything at all"))
            .await
            .unwrap_err();
        assert_eq!(
            engine_error(&error),
            &EngineError::ResponseNotFound(ResponseKey::Default)
        );
    }

    #[tokio::test]
    async fn reset_leaves_only_greeting() {
        let agent = agent();
        let reply = agent
            .chat(chat_input(Some("r"), "adventure"))
            .await
            .unwrap();
        let session = agent
            .reset_chat(Some(reply.session_id), ChatChannel::Assistant)
            .await
            .unwrap();
        assert_eq!(session.chat(ChatChannel::Assistant).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn plan_is_stored_on_session() {
        let agent = agent_with(ReplyDelays::default());
        let request = TripRequest {
            interests: vec![InterestTag::Nature],
            days: Some(2),
            budget: Some(5_000),
            people: Some(2),
        };

        let reply = agent
            .plan_trip(Some("planner".to_string()), request)
            .await
            .unwrap();
        assert_eq!(reply.total_cost, 2_700);
        assert_eq!(reply.plan.items.len(), 2);

        let session = agent.session_snapshot("planner").await.unwrap().unwrap();
        assert_eq!(session.last_plan, Some(reply.plan));
    }

    #[tokio::test]
    async fn invalid_plan_request_lists_fields() {
        let request = TripRequest {
            interests: Vec::new(),
            days: Some(3),
            budget: Some(200),
            people: Some(1),
        };
        let error = agent().plan_trip(None, request).await.unwrap_err();
        let fields = engine_error(&error)
            .issues()
            .iter()
            .map(|issue| issue.field.clone())
            .collect::<Vec<_>>();
        assert_eq!(fields, vec!["budget", "interests"]);
    }

    #[tokio::test]
    async fn toggling_twice_restores_selection() {
        let agent = agent();
        let first = agent
            .toggle_selection(
                Some("s".to_string()),
                SelectionKind::Favorite,
                SelectionTarget::Destination,
                3,
            )
            .await
            .unwrap();
        assert!(first.selected);
        let second = agent
            .toggle_selection(
                Some("s".to_string()),
                SelectionKind::Favorite,
                SelectionTarget::Destination,
                3,
            )
            .await
            .unwrap();
        assert!(!second.selected);

        let session = agent.session_snapshot("s").await.unwrap().unwrap();
        assert!(session.selections.destination_favorites.is_empty());
    }

    #[tokio::test]
    async fn destination_and_product_favorites_do_not_collide() {
        let agent = agent();
        let session = Some("both".to_string());
        let destination = agent
            .toggle_selection(
                session.clone(),
                SelectionKind::Favorite,
                SelectionTarget::Destination,
                3,
            )
            .await
            .unwrap();
        let product = agent
            .toggle_selection(
                session.clone(),
                SelectionKind::Favorite,
                SelectionTarget::Product,
                3,
            )
            .await
            .unwrap();
        assert!(destination.selected);
        assert!(product.selected);

        let unfavorited = agent
            .toggle_selection(
                session,
                SelectionKind::Favorite,
                SelectionTarget::Product,
                3,
            )
            .await
            .unwrap();
        assert!(!unfavorited.selected);

        let snapshot = agent.session_snapshot("both").await.unwrap().unwrap();
        assert!(snapshot.selections.destination_favorites.contains(3));
        assert!(!snapshot.selections.product_favorites.contains(3));
    }

    #[tokio::test]
    async fn cart_rejects_unknown_product() {
        let error = agent()
            .toggle_selection(None, SelectionKind::Cart, SelectionTarget::Product, 99)
            .await
            .unwrap_err();
        assert!(matches!(engine_error(&error), EngineError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn cart_rejects_destinations() {
        let error = agent()
            .toggle_selection(None, SelectionKind::Cart, SelectionTarget::Destination, 1)
            .await
            .unwrap_err();
        assert_eq!(engine_error(&error).issues()[0].field, "target");
    }

    #[tokio::test]
    async fn expired_sessions_are_hidden_and_purged() {
        let agent = agent().with_session_ttl(Duration::zero());
        agent
            .toggle_selection(
                Some("old".to_string()),
                SelectionKind::Cart,
                SelectionTarget::Product,
                1,
            )
            .await
            .unwrap();

        assert!(agent.session_snapshot("old").await.unwrap().is_none());
        assert_eq!(agent.purge_expired_sessions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reply_is_dropped_when_session_expires_during_delay() {
        let store = Arc::new(MemoryStore::new());
        let agent = TourismAgent::new(
            Arc::new(Catalog::jharkhand()),
            store.clone(),
            AppMetrics::shared(),
            ReplyDelays::none(),
        )
        .with_session_ttl(Duration::zero());

        let reply = agent
            .chat(chat_input(Some("lapsed"), "adventure"))
            .await
            .unwrap();
        assert_eq!(reply.response_key, ResponseKey::Adventure);

        let stored = store.load_session("lapsed").await.unwrap().unwrap();
        let transcript = stored.chat(ChatChannel::Assistant).messages();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].sender, ChatSender::User);
        assert_eq!(transcript[1].text, "adventure");
    }
}
