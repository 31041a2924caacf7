use std::collections::BTreeMap;

use crate::models::{InterestTag, ItineraryItem, TripPlan};

/// Static, ordered candidate lists per interest.
#[derive(Debug, Clone, Default)]
pub struct ItineraryPools {
    pools: BTreeMap<InterestTag, Vec<ItineraryItem>>,
}

impl ItineraryPools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(mut self, interest: InterestTag, items: Vec<ItineraryItem>) -> Self {
        self.pools.insert(interest, items);
        self
    }

    /// Missing interests have an empty pool.
    pub fn pool(&self, interest: InterestTag) -> &[ItineraryItem] {
        self.pools
            .get(&interest)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InterestTag, &[ItineraryItem])> {
        self.pools
            .iter()
            .map(|(interest, items)| (*interest, items.as_slice()))
    }
}

/// Builds a day-numbered plan from the caller's interests.
///
/// Each interest contributes up to `ceil(days / 2)` items from the front of
/// its pool, in the caller's order; repeated interests count once. The result
/// is then cut to `days` items, so early interests win when the total
/// overflows. Input is not validated here: zero days or no interests simply
/// yield an empty plan.
pub fn compose_itinerary(
    pools: &ItineraryPools,
    interests: &[InterestTag],
    days: u32,
) -> TripPlan {
    let per_interest = days.div_ceil(2) as usize;

    let mut seen = Vec::with_capacity(interests.len());
    let mut picked = Vec::new();
    for interest in interests {
        if seen.contains(interest) {
            continue;
        }
        seen.push(*interest);
        picked.extend(pools.pool(*interest).iter().take(per_interest).cloned());
    }

    picked.truncate(days as usize);
    for (idx, item) in picked.iter_mut().enumerate() {
        item.day = idx as u32 + 1;
    }

    let total_cost = picked.iter().map(|item| u64::from(item.item.cost)).sum();
    TripPlan {
        items: picked,
        total_cost,
    }
}
