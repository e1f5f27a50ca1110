use chrono::{DateTime, Local, TimeZone, Utc};
use thiserror::Error;

use cloudpos_catalog::{Catalog, CatalogItem};
use cloudpos_checkout::{
    AddItem, AdjustQuantity, BeginCheckout, CancelCheckout, Cart, CheckoutCommand, CheckoutEvent,
    CheckoutFlow, CheckoutStage, ClearCart, ConfirmCheckout, FinalizeCheckout, PaymentMethod,
    ResetPaymentMethod, SelectPaymentMethod, SubmitCashAmount, Transaction,
};
use cloudpos_core::{Aggregate, DomainError, Event, ItemId, TransactionId};
use cloudpos_insight::InsightProvider;
use cloudpos_ledger::{month_label, Ledger, SalesStats};
use cloudpos_storage::LedgerStore;

/// Number of recent transactions handed to the insight provider.
const INSIGHT_DIGEST_LIMIT: usize = 10;

/// Number of months offered by the history filter (current plus two back).
const MONTH_FILTER_DEPTH: u32 = 3;

/// Yes/no gate for irreversible actions. There is no undo; an unconfirmed
/// request must remove nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgment {
    Confirmed,
    Cancelled,
}

/// Errors surfaced by register operations.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// Deterministic domain failure (validation, invariant, shortfall).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Ledger persistence failed. The in-memory ledger is already updated;
    /// the next successful save rewrites the whole document.
    #[error("ledger persistence failed: {0}")]
    Store(#[from] anyhow::Error),
}

/// The order & ledger manager: one till, one logical writer.
///
/// Owns the in-progress checkout flow, the transaction history, and the
/// transient view state the UI needs (detail-view selection, latest insight
/// text). Every ledger mutation synchronously writes the whole document back
/// through the store.
pub struct Register {
    catalog: Catalog,
    flow: CheckoutFlow,
    ledger: Ledger,
    store: Box<dyn LedgerStore>,
    selected_transaction: Option<TransactionId>,
    insight: Option<String>,
    insight_requests: u64,
}

impl Register {
    /// Open a register over a persistence store.
    ///
    /// The persisted ledger is loaded eagerly; a store that cannot be read
    /// logs the failure and starts empty rather than blocking startup
    /// (malformed payloads already degrade inside the store).
    pub fn open(catalog: Catalog, store: Box<dyn LedgerStore>) -> Self {
        let ledger = match store.load() {
            Ok(ledger) => ledger,
            Err(err) => {
                tracing::error!("failed to load persisted ledger, starting empty: {err:?}");
                Ledger::new()
            }
        };
        tracing::info!(transactions = ledger.len(), "register opened");

        Self {
            catalog,
            flow: CheckoutFlow::new(),
            ledger,
            store,
            selected_transaction: None,
            insight: None,
            insight_requests: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cart(&self) -> &Cart {
        self.flow.cart()
    }

    pub fn subtotal(&self) -> u64 {
        self.flow.subtotal()
    }

    pub fn stage(&self) -> CheckoutStage {
        self.flow.stage()
    }

    pub fn flow(&self) -> &CheckoutFlow {
        &self.flow
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn selected_transaction(&self) -> Option<&TransactionId> {
        self.selected_transaction.as_ref()
    }

    pub fn insight(&self) -> Option<&str> {
        self.insight.as_deref()
    }

    // --- cart & checkout -------------------------------------------------

    /// Add a catalog item to the cart (no-op for placeholder slots).
    pub fn add_item(&mut self, item: &CatalogItem) -> Result<(), RegisterError> {
        self.dispatch(CheckoutCommand::AddItem(AddItem {
            item: item.clone(),
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    /// Add an item by catalog identifier.
    pub fn add_item_by_id(&mut self, id: &ItemId) -> Result<(), RegisterError> {
        let item = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(DomainError::not_found)?;
        self.add_item(&item)
    }

    pub fn adjust_quantity(&mut self, id: &ItemId, delta: i64) -> Result<(), RegisterError> {
        self.dispatch(CheckoutCommand::AdjustQuantity(AdjustQuantity {
            item_id: id.clone(),
            delta,
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    /// Empty the cart and cancel any in-progress checkout.
    pub fn clear_cart(&mut self) -> Result<(), RegisterError> {
        self.dispatch(CheckoutCommand::ClearCart(ClearCart {
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    pub fn begin_checkout(&mut self) -> Result<(), RegisterError> {
        self.dispatch(CheckoutCommand::BeginCheckout(BeginCheckout {
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) -> Result<(), RegisterError> {
        self.dispatch(CheckoutCommand::SelectPaymentMethod(SelectPaymentMethod {
            method,
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    pub fn reset_payment_method(&mut self) -> Result<(), RegisterError> {
        self.dispatch(CheckoutCommand::ResetPaymentMethod(ResetPaymentMethod {
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    /// Submit the cash received. Rejects a shortfall with
    /// `DomainError::InsufficientFunds`; non-numeric input counts as zero.
    pub fn submit_cash_amount(&mut self, input: &str) -> Result<(), RegisterError> {
        self.dispatch(CheckoutCommand::SubmitCashAmount(SubmitCashAmount {
            input: input.to_string(),
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    /// Create the pending transaction snapshot and return it for the
    /// success/change-due view. Nothing is in the ledger yet.
    pub fn confirm_checkout(&mut self) -> Result<Transaction, RegisterError> {
        let now = Utc::now();
        self.dispatch(CheckoutCommand::ConfirmCheckout(ConfirmCheckout {
            transaction_id: TransactionId::generate(now),
            occurred_at: now,
        }))?;

        self.flow
            .pending_transaction()
            .cloned()
            .ok_or_else(|| DomainError::invariant("confirm produced no pending transaction").into())
    }

    /// Abandon the in-progress checkout, keeping the cart. A pending
    /// transaction is discarded without any ledger mutation.
    pub fn cancel_checkout(&mut self) -> Result<(), RegisterError> {
        self.dispatch(CheckoutCommand::CancelCheckout(CancelCheckout {
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    /// Commit the pending transaction: prepend it to the ledger, persist the
    /// whole document, and reset the flow to idle.
    ///
    /// Exactly one finalize can commit a given checkout; calling again
    /// without a new checkout fails without touching the ledger.
    pub fn finalize_checkout(&mut self) -> Result<Transaction, RegisterError> {
        let events = self.dispatch(CheckoutCommand::FinalizeCheckout(FinalizeCheckout {
            occurred_at: Utc::now(),
        }))?;

        let transaction = events
            .iter()
            .find_map(|event| match event {
                CheckoutEvent::CheckoutFinalized(e) => Some(e.transaction.clone()),
                _ => None,
            })
            .ok_or_else(|| DomainError::invariant("finalize produced no transaction"))?;

        self.ledger.record(transaction.clone());
        self.persist()?;
        tracing::info!(
            transaction = transaction.id.as_str(),
            total = transaction.total,
            method = transaction.payment_method.as_str(),
            "transaction committed"
        );
        Ok(transaction)
    }

    // --- history ---------------------------------------------------------

    /// Delete a transaction. Destructive and unrecoverable, so it requires
    /// an explicit acknowledgment; an unconfirmed request removes nothing
    /// and reports `false`.
    pub fn delete_transaction(
        &mut self,
        id: &TransactionId,
        ack: Acknowledgment,
    ) -> Result<bool, RegisterError> {
        if ack != Acknowledgment::Confirmed {
            return Ok(false);
        }

        let removed = self.ledger.delete(id).ok_or_else(DomainError::not_found)?;
        if self.selected_transaction.as_ref() == Some(id) {
            self.selected_transaction = None;
        }
        self.persist()?;
        tracing::info!(transaction = removed.id.as_str(), "transaction deleted");
        Ok(true)
    }

    /// Toggle the detail view for a transaction: selecting the already
    /// selected record collapses it.
    pub fn toggle_transaction_detail(&mut self, id: &TransactionId) {
        if self.selected_transaction.as_ref() == Some(id) {
            self.selected_transaction = None;
        } else if self.ledger.get(id).is_some() {
            self.selected_transaction = Some(id.clone());
        }
    }

    /// Sales aggregates for the local wall clock.
    pub fn stats(&self, month_offset: u32, method: Option<PaymentMethod>) -> SalesStats {
        self.stats_at(&Local::now(), month_offset, method)
    }

    /// Sales aggregates at an explicit instant (deterministic queries).
    pub fn stats_at<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        month_offset: u32,
        method: Option<PaymentMethod>,
    ) -> SalesStats {
        SalesStats::compute(&self.ledger, now, month_offset, method)
    }

    /// Labels for the month filter, current month first.
    pub fn month_labels(&self) -> Vec<String> {
        let now = Local::now();
        (0..MONTH_FILTER_DEPTH)
            .map(|offset| month_label(&now, offset))
            .collect()
    }

    // --- insight ---------------------------------------------------------

    /// Issue a new insight request token. The latest token wins; responses
    /// carrying an older token are dropped on completion.
    pub fn begin_insight_fetch(&mut self) -> u64 {
        self.insight_requests += 1;
        self.insight_requests
    }

    /// Store a completed fetch. Returns whether the text was accepted (a
    /// stale token means a newer request is outstanding or already done).
    pub fn complete_insight_fetch(&mut self, token: u64, text: String) -> bool {
        if token == self.insight_requests {
            self.insight = Some(text);
            true
        } else {
            tracing::debug!(token, latest = self.insight_requests, "dropped stale insight response");
            false
        }
    }

    /// Fetch advisory text over the most recent transactions and store it.
    ///
    /// Fire-and-forget relative to the checkout flow: no cart or ledger
    /// state is touched, and the call may simply be issued again.
    pub async fn fetch_insight(&mut self, provider: &dyn InsightProvider) -> String {
        let token = self.begin_insight_fetch();
        let text = provider
            .summarize(self.ledger.recent(INSIGHT_DIGEST_LIMIT))
            .await;
        self.complete_insight_fetch(token, text.clone());
        text
    }

    // --- internals -------------------------------------------------------

    /// Run one command through the flow: decide, apply, log.
    fn dispatch(&mut self, command: CheckoutCommand) -> Result<Vec<CheckoutEvent>, DomainError> {
        let events = self.flow.handle(&command)?;
        for event in &events {
            self.flow.apply(event);
            tracing::debug!(
                event = event.event_type(),
                version = self.flow.version(),
                "applied checkout event"
            );
        }
        Ok(events)
    }

    fn persist(&self) -> Result<(), RegisterError> {
        self.store.save(&self.ledger)?;
        Ok(())
    }
}
