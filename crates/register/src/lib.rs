//! `cloudpos-register`
//!
//! **Responsibility:** the order & ledger manager.
//!
//! `Register` composes the catalog, the checkout flow, the transaction
//! ledger, a persistence store, and the insight session into the single
//! service a UI drives. Operations execute to completion in response to
//! discrete user actions; the only asynchronous boundary is the insight
//! fetch, which never touches cart or ledger state.

pub mod register;

#[cfg(test)]
mod integration_tests;

pub use register::{Acknowledgment, Register, RegisterError};
