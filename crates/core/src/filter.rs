//! Conjunctive filtering over catalog collections.
//!
//! Every call is a linear scan. Callers that grow the catalog can pre-narrow
//! candidates with their own index and hand the survivors to [`filter_items`],
//! which accepts any iterator of listings.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{Category, Listing};
use crate::ranking::SortKey;

/// Inclusive cost bounds, `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCostRange")]
pub struct CostRange {
    min: u32,
    max: u32,
}

#[derive(Deserialize)]
struct RawCostRange {
    min: u32,
    max: u32,
}

impl TryFrom<RawCostRange> for CostRange {
    type Error = EngineError;

    fn try_from(raw: RawCostRange) -> EngineResult<Self> {
        Self::new(raw.min, raw.max)
    }
}

impl CostRange {
    pub const ANY: CostRange = CostRange {
        min: 0,
        max: u32::MAX,
    };

    pub fn new(min: u32, max: u32) -> EngineResult<Self> {
        if min > max {
            return Err(EngineError::invalid(
                "cost_range",
                format!("min ({min}) must not exceed max ({max})"),
            ));
        }
        Ok(Self { min, max })
    }

    /// Fills missing bounds with the open ends of the range.
    pub fn from_bounds(min: Option<u32>, max: Option<u32>) -> EngineResult<Self> {
        Self::new(min.unwrap_or(0), max.unwrap_or(u32::MAX))
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn contains(&self, cost: u32) -> bool {
        (self.min..=self.max).contains(&cost)
    }
}

impl Default for CostRange {
    fn default() -> Self {
        Self::ANY
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub cost_range: CostRange,
    /// Empty means no category constraint.
    #[serde(default)]
    pub categories: BTreeSet<Category>,
    /// `None` ranks by the collection's own default order.
    #[serde(default)]
    pub sort: Option<SortKey>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_cost_range(mut self, range: CostRange) -> Self {
        self.cost_range = range;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.categories.insert(category);
        self
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn matches<T: Listing + ?Sized>(&self, listing: &T) -> bool {
        self.matches_folded(listing, &self.query.to_lowercase())
    }

    fn matches_folded<T: Listing + ?Sized>(&self, listing: &T, folded_query: &str) -> bool {
        let item = listing.item();
        matches_text(item, folded_query)
            && self.cost_range.contains(item.cost)
            && (self.categories.is_empty() || self.categories.contains(&item.category))
    }
}

fn matches_text(item: &crate::models::CatalogItem, folded_query: &str) -> bool {
    if folded_query.is_empty() {
        return true;
    }

    item.name.to_lowercase().contains(folded_query)
        || item.description.to_lowercase().contains(folded_query)
        || item
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(folded_query))
}

/// Returns the listings satisfying every predicate of `criteria`, in input order.
pub fn filter_items<'a, T, I>(items: I, criteria: &FilterCriteria) -> Vec<&'a T>
where
    T: Listing + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let folded_query = criteria.query.to_lowercase();
    items
        .into_iter()
        .filter(|listing| criteria.matches_folded(*listing, &folded_query))
        .collect()
}
