//! `cloudpos-storage`
//!
//! **Responsibility:** ledger persistence behind a `load()/save(ledger)`
//! boundary.
//!
//! The persisted form is one JSON array under a fixed storage key; every save
//! overwrites the whole document. Swapping the medium (embedded SQLite,
//! in-memory, a remote document store) must not change ledger semantics, so
//! all payload decoding lives here and degrades malformed state to an empty
//! ledger instead of surfacing it.

pub mod in_memory;
pub mod sqlite;
pub mod store;

pub use in_memory::InMemoryLedgerStore;
pub use sqlite::SqliteLedgerStore;
pub use store::{decode_ledger, encode_ledger, LedgerStore, LEDGER_STORAGE_KEY};
