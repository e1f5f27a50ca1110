use serde::{Deserialize, Serialize};

use cloudpos_catalog::CatalogItem;
use cloudpos_core::ItemId;

/// One cart line: a by-value snapshot of a catalog item plus a quantity.
///
/// Item fields are copied at add-time, so later catalog edits do not
/// retroactively change an in-progress order. Serialized flattened
/// (item fields + `quantity`) to match the persisted transaction shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub quantity: u32,
}

impl OrderLine {
    pub fn line_total(&self) -> u64 {
        self.item.price * u64::from(self.quantity)
    }
}

/// The in-progress order: ordered lines, at most one per item identifier.
///
/// Mutation happens only through `CheckoutFlow` event application; everything
/// else sees a read-only view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<OrderLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, id: &ItemId) -> Option<&OrderLine> {
        self.lines.iter().find(|line| &line.item.id == id)
    }

    /// Sum of price × quantity over current lines.
    pub fn subtotal(&self) -> u64 {
        self.lines.iter().map(OrderLine::line_total).sum()
    }

    /// Increment an existing line by 1, or append a new quantity-1 line.
    pub(crate) fn add_item(&mut self, item: &CatalogItem) {
        match self.lines.iter_mut().find(|line| line.item.id == item.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(OrderLine {
                item: item.clone(),
                quantity: 1,
            }),
        }
    }

    /// Adjust a line's quantity by `delta`, clamping at zero.
    ///
    /// A line reaching zero is removed; an unknown id is a no-op.
    pub(crate) fn adjust_quantity(&mut self, id: &ItemId, delta: i64) {
        for line in &mut self.lines {
            if &line.item.id == id {
                let adjusted = i64::from(line.quantity).saturating_add(delta).max(0);
                line.quantity = adjusted as u32;
            }
        }
        self.lines.retain(|line| line.quantity > 0);
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
    }
}
