use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::filter::{filter_items, FilterCriteria};
use crate::models::Listing;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Keep the filtered catalog order.
    #[default]
    CatalogOrder,
    #[serde(alias = "rating")]
    RatingDesc,
    #[serde(alias = "cost-low", alias = "price-low")]
    CostAsc,
    #[serde(alias = "cost-high", alias = "price-high")]
    CostDesc,
    #[serde(alias = "name")]
    NameAsc,
    #[serde(alias = "featured")]
    FeaturedFirst,
    #[serde(alias = "reviews", alias = "popularity")]
    ReviewCountDesc,
}

impl SortKey {
    pub fn parse(value: &str) -> EngineResult<Self> {
        let key = match value.trim().to_lowercase().as_str() {
            "" | "catalog" | "catalog-order" | "default" => Self::CatalogOrder,
            "rating" | "rating-desc" => Self::RatingDesc,
            "cost-low" | "price-low" | "cost-asc" => Self::CostAsc,
            "cost-high" | "price-high" | "cost-desc" => Self::CostDesc,
            "name" | "name-asc" => Self::NameAsc,
            "featured" | "featured-first" => Self::FeaturedFirst,
            "reviews" | "popularity" | "review-count-desc" => Self::ReviewCountDesc,
            _ => return Err(EngineError::UnknownSortKey(value.to_string())),
        };
        Ok(key)
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::CatalogOrder => "catalog-order",
            Self::RatingDesc => "rating-desc",
            Self::CostAsc => "cost-asc",
            Self::CostDesc => "cost-desc",
            Self::NameAsc => "name-asc",
            Self::FeaturedFirst => "featured-first",
            Self::ReviewCountDesc => "review-count-desc",
        }
    }
}

/// Returns a new ordering of `items`; the input slice is left untouched.
///
/// Every key sorts stably (ties keep input order) except
/// [`SortKey::FeaturedFirst`], which only guarantees that featured listings
/// precede the rest. Within each partition the order is whatever the unstable
/// sort produces, which is deterministic for a fixed input.
pub fn rank_items<'a, T: Listing>(items: &[&'a T], key: SortKey) -> Vec<&'a T> {
    let mut ranked = items.to_vec();
    match key {
        SortKey::CatalogOrder => {}
        SortKey::RatingDesc => {
            ranked.sort_by(|a, b| b.item().rating.total_cmp(&a.item().rating));
        }
        SortKey::CostAsc => ranked.sort_by_key(|listing| listing.item().cost),
        SortKey::CostDesc => ranked.sort_by_key(|listing| Reverse(listing.item().cost)),
        SortKey::NameAsc => ranked.sort_by(|a, b| a.item().name.cmp(&b.item().name)),
        SortKey::FeaturedFirst => ranked.sort_unstable_by_key(|listing| !listing.is_featured()),
        SortKey::ReviewCountDesc => {
            ranked.sort_by_key(|listing| Reverse(listing.review_count()));
        }
    }
    ranked
}

/// Filter then rank by `criteria.sort`, falling back to the listing type's
/// default order: rating for destinations, featured-first for products.
pub fn search_and_rank<'a, T, I>(items: I, criteria: &FilterCriteria) -> Vec<&'a T>
where
    T: Listing + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let filtered = filter_items(items, criteria);
    rank_items(&filtered, criteria.sort.unwrap_or_else(T::default_sort))
}
