//! `cloudpos-ledger`
//!
//! **Responsibility:** the persisted transaction history and the read-only
//! aggregates derived from it.
//!
//! The ledger itself stays dumb: an append-ordered collection, most recent
//! first. Totals and filtered views are projections computed on demand; at
//! the sizes this system targets (hundreds to low thousands of records)
//! recomputation is cheaper than any cache invariant.

pub mod ledger;
pub mod stats;

pub use ledger::Ledger;
pub use stats::{month_label, MonthWindow, SalesStats};
