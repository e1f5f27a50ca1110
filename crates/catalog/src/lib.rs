//! `cloudpos-catalog`
//!
//! **Responsibility:** the static list of purchasable items offered at the
//! register.
//!
//! The catalog is loaded once at startup from static configuration and never
//! mutated. Entries with an empty name are placeholder slots: they render as
//! empty grid cells and are excluded from every purchase action.

pub mod catalog;
pub mod item;

pub use catalog::Catalog;
pub use item::{CatalogItem, Category};
