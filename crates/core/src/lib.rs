pub mod catalog;
pub mod error;
pub mod filter;
pub mod intent;
pub mod models;
pub mod planner;
pub mod ranking;
pub mod selection;
pub mod validation;

pub use catalog::{catalog, Catalog};
pub use error::{EngineError, EngineResult, FieldIssue};
pub use filter::{filter_items, CostRange, FilterCriteria};
pub use intent::{
    reply_for, ChatChannel, IntentMatcher, IntentRule, MatchMode, ResponseBook, ResponseKey,
};
pub use models::*;
pub use planner::{compose_itinerary, ItineraryPools};
pub use ranking::{rank_items, search_and_rank, SortKey};
pub use selection::{SelectionKind, SelectionSet, SelectionTarget, Selections};
pub use validation::{TripRequest, DURATION_CHOICES, MIN_BUDGET_PER_PERSON};
