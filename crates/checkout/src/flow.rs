use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cloudpos_catalog::CatalogItem;
use cloudpos_core::{Aggregate, DomainError, Event, ItemId, TransactionId};

use crate::cart::Cart;
use crate::payment::{parse_cash_input, PaymentMethod};
use crate::transaction::Transaction;

/// Checkout flow stage, as presented to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStage {
    /// Empty cart, nothing in progress.
    Idle,
    /// At least one line, checkout not yet begun.
    Building,
    /// Checkout begun, waiting for a payment method.
    AwaitingPaymentMethod,
    /// Cash selected, waiting for the received amount.
    AwaitingAmount,
    /// Non-cash method selected, waiting for the operator's confirmation.
    AwaitingConfirmation,
    /// Transaction snapshot created, waiting to be finalized into the ledger.
    Completed,
}

/// Internal settlement progress.
///
/// `Shopping` covers both `Idle` and `Building`; the split is derived from
/// the cart, not tracked separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FlowState {
    Shopping,
    SelectingPayment,
    EnteringAmount { received: Option<u64> },
    ConfirmingPayment { method: PaymentMethod },
    Completed { pending: Transaction },
}

/// Aggregate: the cart plus the checkout state machine.
///
/// The whole object is serializable, so UI layers can persist or snapshot the
/// in-progress order as one value instead of scattered flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutFlow {
    cart: Cart,
    state: FlowState,
    version: u64,
}

impl CheckoutFlow {
    pub fn new() -> Self {
        Self {
            cart: Cart::new(),
            state: FlowState::Shopping,
            version: 0,
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Sum of price × quantity over current cart lines.
    pub fn subtotal(&self) -> u64 {
        self.cart.subtotal()
    }

    pub fn stage(&self) -> CheckoutStage {
        match &self.state {
            FlowState::Shopping if self.cart.is_empty() => CheckoutStage::Idle,
            FlowState::Shopping => CheckoutStage::Building,
            FlowState::SelectingPayment => CheckoutStage::AwaitingPaymentMethod,
            FlowState::EnteringAmount { .. } => CheckoutStage::AwaitingAmount,
            FlowState::ConfirmingPayment { .. } => CheckoutStage::AwaitingConfirmation,
            FlowState::Completed { .. } => CheckoutStage::Completed,
        }
    }

    /// The payment method chosen for the in-progress settlement, if any.
    pub fn selected_method(&self) -> Option<PaymentMethod> {
        match &self.state {
            FlowState::EnteringAmount { .. } => Some(PaymentMethod::Cash),
            FlowState::ConfirmingPayment { method } => Some(*method),
            FlowState::Completed { pending } => Some(pending.payment_method),
            _ => None,
        }
    }

    /// The accepted cash amount, if one has been submitted.
    pub fn submitted_amount(&self) -> Option<u64> {
        match &self.state {
            FlowState::EnteringAmount { received } => *received,
            _ => None,
        }
    }

    /// The confirmed-but-not-yet-finalized transaction, if any.
    pub fn pending_transaction(&self) -> Option<&Transaction> {
        match &self.state {
            FlowState::Completed { pending } => Some(pending),
            _ => None,
        }
    }
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Command: AddItem (no-op for placeholder slots).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItem {
    pub item: CatalogItem,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustQuantity (delta may be any integer; clamps at zero).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustQuantity {
    pub item_id: ItemId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ClearCart (also cancels any in-progress checkout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearCart {
    pub occurred_at: DateTime<Utc>,
}

/// Command: BeginCheckout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginCheckout {
    pub occurred_at: DateTime<Utc>,
}

/// Command: SelectPaymentMethod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectPaymentMethod {
    pub method: PaymentMethod,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ResetPaymentMethod (back to method selection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPaymentMethod {
    pub occurred_at: DateTime<Utc>,
}

/// Command: SubmitCashAmount (raw operator input).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitCashAmount {
    pub input: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmCheckout.
///
/// The transaction identifier is generated by the caller so `handle` stays
/// pure; `occurred_at` becomes the transaction timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmCheckout {
    pub transaction_id: TransactionId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelCheckout (keep the cart, discard any pending transaction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelCheckout {
    pub occurred_at: DateTime<Utc>,
}

/// Command: FinalizeCheckout (release the pending transaction to the ledger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeCheckout {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutCommand {
    AddItem(AddItem),
    AdjustQuantity(AdjustQuantity),
    ClearCart(ClearCart),
    BeginCheckout(BeginCheckout),
    SelectPaymentMethod(SelectPaymentMethod),
    ResetPaymentMethod(ResetPaymentMethod),
    SubmitCashAmount(SubmitCashAmount),
    ConfirmCheckout(ConfirmCheckout),
    CancelCheckout(CancelCheckout),
    FinalizeCheckout(FinalizeCheckout),
}

/// Event: ItemAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAdded {
    pub item: CatalogItem,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuantityAdjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityAdjusted {
    pub item_id: ItemId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CartCleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCleared {
    pub occurred_at: DateTime<Utc>,
}

/// Event: CheckoutBegun.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutBegun {
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentMethodSelected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodSelected {
    pub method: PaymentMethod,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentMethodReset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodReset {
    pub occurred_at: DateTime<Utc>,
}

/// Event: CashAmountSubmitted (already validated as sufficient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashAmountSubmitted {
    pub received: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CheckoutConfirmed (pending transaction snapshot created).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfirmed {
    pub transaction: Transaction,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CheckoutCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutCancelled {
    pub occurred_at: DateTime<Utc>,
}

/// Event: CheckoutFinalized (the carried transaction is ready for the ledger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutFinalized {
    pub transaction: Transaction,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutEvent {
    ItemAdded(ItemAdded),
    QuantityAdjusted(QuantityAdjusted),
    CartCleared(CartCleared),
    CheckoutBegun(CheckoutBegun),
    PaymentMethodSelected(PaymentMethodSelected),
    PaymentMethodReset(PaymentMethodReset),
    CashAmountSubmitted(CashAmountSubmitted),
    CheckoutConfirmed(CheckoutConfirmed),
    CheckoutCancelled(CheckoutCancelled),
    CheckoutFinalized(CheckoutFinalized),
}

impl Event for CheckoutEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CheckoutEvent::ItemAdded(_) => "checkout.item_added",
            CheckoutEvent::QuantityAdjusted(_) => "checkout.quantity_adjusted",
            CheckoutEvent::CartCleared(_) => "checkout.cart_cleared",
            CheckoutEvent::CheckoutBegun(_) => "checkout.begun",
            CheckoutEvent::PaymentMethodSelected(_) => "checkout.payment_method_selected",
            CheckoutEvent::PaymentMethodReset(_) => "checkout.payment_method_reset",
            CheckoutEvent::CashAmountSubmitted(_) => "checkout.cash_amount_submitted",
            CheckoutEvent::CheckoutConfirmed(_) => "checkout.confirmed",
            CheckoutEvent::CheckoutCancelled(_) => "checkout.cancelled",
            CheckoutEvent::CheckoutFinalized(_) => "checkout.finalized",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CheckoutEvent::ItemAdded(e) => e.occurred_at,
            CheckoutEvent::QuantityAdjusted(e) => e.occurred_at,
            CheckoutEvent::CartCleared(e) => e.occurred_at,
            CheckoutEvent::CheckoutBegun(e) => e.occurred_at,
            CheckoutEvent::PaymentMethodSelected(e) => e.occurred_at,
            CheckoutEvent::PaymentMethodReset(e) => e.occurred_at,
            CheckoutEvent::CashAmountSubmitted(e) => e.occurred_at,
            CheckoutEvent::CheckoutConfirmed(e) => e.occurred_at,
            CheckoutEvent::CheckoutCancelled(e) => e.occurred_at,
            CheckoutEvent::CheckoutFinalized(e) => e.occurred_at,
        }
    }
}

impl Aggregate for CheckoutFlow {
    type Command = CheckoutCommand;
    type Event = CheckoutEvent;
    type Error = DomainError;

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CheckoutEvent::ItemAdded(e) => {
                self.cart.add_item(&e.item);
            }
            CheckoutEvent::QuantityAdjusted(e) => {
                self.cart.adjust_quantity(&e.item_id, e.delta);
            }
            CheckoutEvent::CartCleared(_) => {
                self.cart.clear();
                self.state = FlowState::Shopping;
            }
            CheckoutEvent::CheckoutBegun(_) => {
                self.state = FlowState::SelectingPayment;
            }
            CheckoutEvent::PaymentMethodSelected(e) => {
                self.state = if e.method.is_cash() {
                    FlowState::EnteringAmount { received: None }
                } else {
                    FlowState::ConfirmingPayment { method: e.method }
                };
            }
            CheckoutEvent::PaymentMethodReset(_) => {
                self.state = FlowState::SelectingPayment;
            }
            CheckoutEvent::CashAmountSubmitted(e) => {
                self.state = FlowState::EnteringAmount {
                    received: Some(e.received),
                };
            }
            CheckoutEvent::CheckoutConfirmed(e) => {
                self.state = FlowState::Completed {
                    pending: e.transaction.clone(),
                };
            }
            CheckoutEvent::CheckoutCancelled(_) => {
                self.state = FlowState::Shopping;
            }
            CheckoutEvent::CheckoutFinalized(_) => {
                self.cart.clear();
                self.state = FlowState::Shopping;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CheckoutCommand::AddItem(cmd) => self.handle_add_item(cmd),
            CheckoutCommand::AdjustQuantity(cmd) => self.handle_adjust_quantity(cmd),
            CheckoutCommand::ClearCart(cmd) => self.handle_clear_cart(cmd),
            CheckoutCommand::BeginCheckout(cmd) => self.handle_begin_checkout(cmd),
            CheckoutCommand::SelectPaymentMethod(cmd) => self.handle_select_method(cmd),
            CheckoutCommand::ResetPaymentMethod(cmd) => self.handle_reset_method(cmd),
            CheckoutCommand::SubmitCashAmount(cmd) => self.handle_submit_cash(cmd),
            CheckoutCommand::ConfirmCheckout(cmd) => self.handle_confirm(cmd),
            CheckoutCommand::CancelCheckout(cmd) => self.handle_cancel(cmd),
            CheckoutCommand::FinalizeCheckout(cmd) => self.handle_finalize(cmd),
        }
    }
}

impl CheckoutFlow {
    fn ensure_shopping(&self) -> Result<(), DomainError> {
        if matches!(self.state, FlowState::Shopping) {
            Ok(())
        } else {
            Err(DomainError::invariant(
                "cart can only be edited before checkout begins",
            ))
        }
    }

    fn handle_add_item(&self, cmd: &AddItem) -> Result<Vec<CheckoutEvent>, DomainError> {
        self.ensure_shopping()?;

        // Placeholder grid slots are not purchasable; tapping one does nothing.
        if cmd.item.is_placeholder() {
            return Ok(vec![]);
        }

        Ok(vec![CheckoutEvent::ItemAdded(ItemAdded {
            item: cmd.item.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_adjust_quantity(
        &self,
        cmd: &AdjustQuantity,
    ) -> Result<Vec<CheckoutEvent>, DomainError> {
        self.ensure_shopping()?;

        if self.cart.line(&cmd.item_id).is_none() {
            return Ok(vec![]);
        }

        Ok(vec![CheckoutEvent::QuantityAdjusted(QuantityAdjusted {
            item_id: cmd.item_id.clone(),
            delta: cmd.delta,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_clear_cart(&self, cmd: &ClearCart) -> Result<Vec<CheckoutEvent>, DomainError> {
        if self.cart.is_empty() && matches!(self.state, FlowState::Shopping) {
            return Ok(vec![]);
        }

        Ok(vec![CheckoutEvent::CartCleared(CartCleared {
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_begin_checkout(
        &self,
        cmd: &BeginCheckout,
    ) -> Result<Vec<CheckoutEvent>, DomainError> {
        self.ensure_shopping()?;

        if self.cart.is_empty() {
            return Err(DomainError::validation(
                "cannot begin checkout with an empty cart",
            ));
        }

        Ok(vec![CheckoutEvent::CheckoutBegun(CheckoutBegun {
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_select_method(
        &self,
        cmd: &SelectPaymentMethod,
    ) -> Result<Vec<CheckoutEvent>, DomainError> {
        if !matches!(self.state, FlowState::SelectingPayment) {
            return Err(DomainError::invariant(
                "payment method can only be selected after checkout begins",
            ));
        }

        Ok(vec![CheckoutEvent::PaymentMethodSelected(
            PaymentMethodSelected {
                method: cmd.method,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_reset_method(
        &self,
        cmd: &ResetPaymentMethod,
    ) -> Result<Vec<CheckoutEvent>, DomainError> {
        match self.state {
            FlowState::EnteringAmount { .. } | FlowState::ConfirmingPayment { .. } => {
                Ok(vec![CheckoutEvent::PaymentMethodReset(PaymentMethodReset {
                    occurred_at: cmd.occurred_at,
                })])
            }
            _ => Err(DomainError::invariant(
                "no payment method selection to reset",
            )),
        }
    }

    fn handle_submit_cash(
        &self,
        cmd: &SubmitCashAmount,
    ) -> Result<Vec<CheckoutEvent>, DomainError> {
        if !matches!(self.state, FlowState::EnteringAmount { .. }) {
            return Err(DomainError::invariant(
                "cash amount is only accepted for a cash settlement",
            ));
        }

        let received = parse_cash_input(&cmd.input);
        let required = self.cart.subtotal();
        if received < required {
            return Err(DomainError::insufficient_funds(received, required));
        }

        Ok(vec![CheckoutEvent::CashAmountSubmitted(CashAmountSubmitted {
            received,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_confirm(&self, cmd: &ConfirmCheckout) -> Result<Vec<CheckoutEvent>, DomainError> {
        let subtotal = self.cart.subtotal();

        let (method, received) = match &self.state {
            FlowState::EnteringAmount { received: Some(received) } => {
                if *received < subtotal {
                    return Err(DomainError::insufficient_funds(*received, subtotal));
                }
                (PaymentMethod::Cash, *received)
            }
            FlowState::EnteringAmount { received: None } => {
                return Err(DomainError::invariant(
                    "cash amount has not been submitted",
                ));
            }
            FlowState::ConfirmingPayment { method } => (*method, subtotal),
            _ => {
                return Err(DomainError::invariant(
                    "confirm is only valid once a payment method is chosen",
                ));
            }
        };

        let transaction = Transaction {
            id: cmd.transaction_id.clone(),
            timestamp: cmd.occurred_at.timestamp_millis(),
            items: self.cart.lines().to_vec(),
            total: subtotal,
            payment_method: method,
            received_amount: Some(received),
            change_amount: Some(received.saturating_sub(subtotal)),
        };

        Ok(vec![CheckoutEvent::CheckoutConfirmed(CheckoutConfirmed {
            transaction,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelCheckout) -> Result<Vec<CheckoutEvent>, DomainError> {
        if matches!(self.state, FlowState::Shopping) {
            return Ok(vec![]);
        }

        Ok(vec![CheckoutEvent::CheckoutCancelled(CheckoutCancelled {
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_finalize(&self, cmd: &FinalizeCheckout) -> Result<Vec<CheckoutEvent>, DomainError> {
        match &self.state {
            FlowState::Completed { pending } => {
                Ok(vec![CheckoutEvent::CheckoutFinalized(CheckoutFinalized {
                    transaction: pending.clone(),
                    occurred_at: cmd.occurred_at,
                })])
            }
            _ => Err(DomainError::invariant(
                "no completed checkout to finalize",
            )),
        }
    }
}
