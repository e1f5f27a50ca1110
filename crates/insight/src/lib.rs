//! `cloudpos-insight`
//!
//! **Responsibility:** Optional AI advisory boundary.
//!
//! This crate is intentionally **not** part of the domain model:
//! - It must not depend on the checkout flow or ledger internals.
//! - It must not mutate domain state.
//! - It returns **advisory text**, never domain data.
//!
//! The contract is total: `summarize` always yields a string. Missing
//! credential, empty history, and any transport/provider failure each map to
//! a fixed hint string instead of an error.

pub mod gemini;
pub mod provider;

pub use gemini::{GeminiInsight, InsightConfig};
pub use provider::{
    InsightProvider, NO_CREDENTIAL_HINT, NO_TRANSACTIONS_HINT, UNAVAILABLE_HINT,
};
