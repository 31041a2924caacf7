use std::sync::Arc;

use trails_agents::{ChatInput, ReplyDelays, TourismAgent};
use trails_core::{
    catalog, ChatChannel, InterestTag, SelectionKind, SelectionTarget, TripRequest,
};
use trails_observability::AppMetrics;
use trails_storage::{MemoryStore, SessionRepository};

#[tokio::test]
async fn one_visitor_session_accumulates_everything() {
    let store = Arc::new(MemoryStore::new());
    let metrics = AppMetrics::shared();
    let agent = TourismAgent::new(
        Arc::new(catalog().clone()),
        store.clone(),
        metrics.clone(),
        ReplyDelays::none(),
    );
    let session_id = Some("visitor-1".to_string());

    agent
        .chat(ChatInput {
            session_id: session_id.clone(),
            text: "Tell me about Betla".to_string(),
            channel: ChatChannel::Assistant,
        })
        .await
        .unwrap();
    agent
        .toggle_selection(
            session_id.clone(),
            SelectionKind::Cart,
            SelectionTarget::Product,
            2,
        )
        .await
        .unwrap();
    agent
        .plan_trip(
            session_id.clone(),
            TripRequest {
                interests: vec![InterestTag::Wildlife, InterestTag::Culture],
                days: Some(3),
                budget: Some(3_000),
                people: Some(1),
            },
        )
        .await
        .unwrap();

    assert_eq!(store.session_count().await.unwrap(), 1);
    let session = store.load_session("visitor-1").await.unwrap().unwrap();
    assert_eq!(session.assistant_chat.len(), 3);
    assert!(session.selections.cart.contains(2));
    let plan = session.last_plan.unwrap();
    assert_eq!(plan.items.len(), 3);
    assert_eq!(plan.items[0].interest, InterestTag::Wildlife);

    let dump = store.export_json().unwrap();
    assert!(dump.contains("visitor-1"));

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.chat_replies_total, 1);
    assert_eq!(snapshot.plans_total, 1);
    assert_eq!(snapshot.selection_toggles_total, 1);
}
