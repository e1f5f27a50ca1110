//! `cloudpos-checkout`
//!
//! **Responsibility:** the in-progress order (cart) and the checkout state
//! machine, from first item to settled transaction.
//!
//! The flow is modeled as a command/event aggregate: `handle` is pure
//! decision logic, `apply` evolves state, and the pending transaction is
//! committed to the ledger only by the caller reacting to
//! `CheckoutFinalized`.

pub mod cart;
pub mod flow;
pub mod payment;
pub mod transaction;

pub use cart::{Cart, OrderLine};
pub use flow::{
    AddItem, AdjustQuantity, BeginCheckout, CancelCheckout, CheckoutCommand, CheckoutEvent,
    CheckoutFlow, CheckoutStage, ClearCart, ConfirmCheckout, FinalizeCheckout,
    ResetPaymentMethod, SelectPaymentMethod, SubmitCashAmount,
};
pub use payment::{parse_cash_input, PaymentMethod};
pub use transaction::Transaction;
