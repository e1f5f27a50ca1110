use serde::{Deserialize, Serialize};

use cloudpos_core::ItemId;

/// Menu category. Serialized labels match the historical catalog payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "飲品")]
    Beverage,
    #[serde(rename = "主食")]
    Food,
    #[serde(rename = "甜點")]
    Dessert,
    #[serde(rename = "點心")]
    Snack,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Beverage => "飲品",
            Category::Food => "主食",
            Category::Dessert => "甜點",
            Category::Snack => "點心",
        }
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// A purchasable item (or an empty placeholder slot) on the product grid.
///
/// Immutable configuration data. Cart lines copy these fields by value at
/// add-time, so later catalog edits never alter an in-progress order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub category: Category,
    pub image: String,
    pub color: String,
}

impl CatalogItem {
    /// Placeholder slots have an empty name and must be excluded from
    /// purchase actions.
    pub fn is_placeholder(&self) -> bool {
        self.name.is_empty()
    }
}
