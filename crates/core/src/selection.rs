use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    #[serde(alias = "fav")]
    Favorite,
    Cart,
}

impl SelectionKind {
    pub fn parse(value: &str) -> EngineResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "fav" | "favorite" | "favorites" | "favourite" => Ok(Self::Favorite),
            "cart" => Ok(Self::Cart),
            _ => Err(EngineError::UnknownSelectionKind(value.to_string())),
        }
    }
}

/// Which catalog collection a selected id belongs to. Ids are only unique
/// within one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionTarget {
    Destination,
    Product,
}

impl SelectionTarget {
    pub fn parse(value: &str) -> EngineResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "destination" | "destinations" => Ok(Self::Destination),
            "product" | "products" => Ok(Self::Product),
            _ => Err(EngineError::invalid(
                "target",
                format!("unknown selection target {value:?}"),
            )),
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Destination => "destination",
            Self::Product => "product",
        }
    }
}

/// Membership toggle set. No quantities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet {
    ids: BTreeSet<u32>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` if absent, removes it if present; returns the new membership.
    pub fn toggle(&mut self, id: u32) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Favorites are kept per collection; the cart only holds products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selections {
    pub destination_favorites: SelectionSet,
    pub product_favorites: SelectionSet,
    pub cart: SelectionSet,
}

impl Selections {
    pub fn toggle(
        &mut self,
        kind: SelectionKind,
        target: SelectionTarget,
        id: u32,
    ) -> EngineResult<bool> {
        Ok(self.set_mut(kind, target)?.toggle(id))
    }

    pub fn set(&self, kind: SelectionKind, target: SelectionTarget) -> EngineResult<&SelectionSet> {
        match (kind, target) {
            (SelectionKind::Favorite, SelectionTarget::Destination) => {
                Ok(&self.destination_favorites)
            }
            (SelectionKind::Favorite, SelectionTarget::Product) => Ok(&self.product_favorites),
            (SelectionKind::Cart, SelectionTarget::Product) => Ok(&self.cart),
            (SelectionKind::Cart, SelectionTarget::Destination) => Err(cart_rejects_destinations()),
        }
    }

    fn set_mut(
        &mut self,
        kind: SelectionKind,
        target: SelectionTarget,
    ) -> EngineResult<&mut SelectionSet> {
        match (kind, target) {
            (SelectionKind::Favorite, SelectionTarget::Destination) => {
                Ok(&mut self.destination_favorites)
            }
            (SelectionKind::Favorite, SelectionTarget::Product) => Ok(&mut self.product_favorites),
            (SelectionKind::Cart, SelectionTarget::Product) => Ok(&mut self.cart),
            (SelectionKind::Cart, SelectionTarget::Destination) => Err(cart_rejects_destinations()),
        }
    }
}

fn cart_rejects_destinations() -> EngineError {
    EngineError::invalid("target", "only products can be added to the cart")
}
