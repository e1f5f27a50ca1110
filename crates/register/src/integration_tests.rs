//! Integration tests for the full register pipeline.
//!
//! Tests: operation → checkout flow → ledger → store
//!
//! Verifies:
//! - A finalized checkout commits exactly one persisted record
//! - Validation failures leave cart, ledger, and store untouched
//! - History restores from (and degrades with) the persistence layer
//! - Deletes are gated on explicit acknowledgment
//! - Insight responses follow last-request-wins

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use cloudpos_catalog::Catalog;
    use cloudpos_checkout::{CheckoutStage, PaymentMethod, Transaction};
    use cloudpos_core::{DomainError, ItemId, TransactionId};
    use cloudpos_insight::{GeminiInsight, InsightConfig, NO_CREDENTIAL_HINT};
    use cloudpos_storage::InMemoryLedgerStore;

    use crate::register::{Acknowledgment, Register, RegisterError};

    fn setup() -> (Register, Arc<InMemoryLedgerStore>) {
        cloudpos_observability::init();
        let store = Arc::new(InMemoryLedgerStore::new());
        let register = Register::open(Catalog::standard(), Box::new(store.clone()));
        (register, store)
    }

    fn americano() -> ItemId {
        ItemId::new("b1")
    }

    /// Run one complete cash checkout for `quantity` americanos.
    fn cash_checkout(register: &mut Register, quantity: u32, received: &str) -> Transaction {
        for _ in 0..quantity {
            register.add_item_by_id(&americano()).unwrap();
        }
        register.begin_checkout().unwrap();
        register.select_payment_method(PaymentMethod::Cash).unwrap();
        register.submit_cash_amount(received).unwrap();
        register.confirm_checkout().unwrap();
        register.finalize_checkout().unwrap()
    }

    #[test]
    fn full_cash_checkout_commits_exactly_one_record() {
        let (mut register, store) = setup();

        register.add_item_by_id(&americano()).unwrap();
        register.add_item_by_id(&americano()).unwrap();
        assert_eq!(register.subtotal(), 130);

        register.begin_checkout().unwrap();
        register.select_payment_method(PaymentMethod::Cash).unwrap();
        register.submit_cash_amount("200").unwrap();

        let pending = register.confirm_checkout().unwrap();
        assert_eq!(pending.total, 130);
        assert_eq!(pending.received_amount, Some(200));
        assert_eq!(pending.change_amount, Some(70));
        // Nothing is committed until finalize.
        assert!(register.ledger().is_empty());
        assert!(store.raw_payload().is_none());

        let committed = register.finalize_checkout().unwrap();
        assert_eq!(committed.id, pending.id);
        assert_eq!(register.ledger().len(), 1);
        assert_eq!(register.stage(), CheckoutStage::Idle);
        assert!(register.cart().is_empty());
        assert!(store.raw_payload().unwrap().contains(pending.id.as_str()));

        // A second finalize without a new checkout must not duplicate.
        let err = register.finalize_checkout().unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Domain(DomainError::InvariantViolation(_))
        ));
        assert_eq!(register.ledger().len(), 1);
    }

    #[test]
    fn non_cash_checkout_records_subtotal_and_zero_change() {
        let (mut register, _store) = setup();

        register.add_item_by_id(&americano()).unwrap();
        register.begin_checkout().unwrap();
        register.select_payment_method(PaymentMethod::Leke).unwrap();
        assert_eq!(register.stage(), CheckoutStage::AwaitingConfirmation);

        register.confirm_checkout().unwrap();
        let committed = register.finalize_checkout().unwrap();
        assert_eq!(committed.payment_method, PaymentMethod::Leke);
        assert_eq!(committed.received_amount, Some(65));
        assert_eq!(committed.change_amount, Some(0));
    }

    #[test]
    fn insufficient_cash_rejects_and_preserves_state() {
        let (mut register, store) = setup();

        register.add_item_by_id(&americano()).unwrap();
        register.add_item_by_id(&americano()).unwrap();
        register.begin_checkout().unwrap();
        register.select_payment_method(PaymentMethod::Cash).unwrap();

        let err = register.submit_cash_amount("100").unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Domain(DomainError::InsufficientFunds {
                received: 100,
                required: 130
            })
        ));

        assert_eq!(register.stage(), CheckoutStage::AwaitingAmount);
        assert_eq!(register.cart().lines()[0].quantity, 2);
        assert!(register.ledger().is_empty());
        assert!(store.raw_payload().is_none());
    }

    #[test]
    fn placeholder_slot_tap_is_ignored() {
        let (mut register, _store) = setup();
        register.add_item_by_id(&ItemId::new("blank1")).unwrap();
        assert!(register.cart().is_empty());
        assert_eq!(register.stage(), CheckoutStage::Idle);
    }

    #[test]
    fn unknown_item_id_is_not_found() {
        let (mut register, _store) = setup();
        let err = register.add_item_by_id(&ItemId::new("nope")).unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Domain(DomainError::NotFound)
        ));
    }

    #[test]
    fn clear_cart_cancels_an_in_progress_checkout() {
        let (mut register, _store) = setup();
        register.add_item_by_id(&americano()).unwrap();
        register.begin_checkout().unwrap();

        register.clear_cart().unwrap();
        assert_eq!(register.stage(), CheckoutStage::Idle);
        assert!(register.cart().is_empty());
    }

    #[test]
    fn history_restores_from_the_store() {
        let (mut register, store) = setup();
        let first = cash_checkout(&mut register, 1, "65");
        let second = cash_checkout(&mut register, 2, "130");

        let reopened = Register::open(Catalog::standard(), Box::new(store.clone()));
        assert_eq!(reopened.ledger().len(), 2);
        // Reverse-chronological: newest first.
        assert_eq!(reopened.ledger().transactions()[0].id, second.id);
        assert_eq!(reopened.ledger().transactions()[1].id, first.id);
    }

    #[test]
    fn malformed_store_payload_starts_empty() {
        cloudpos_observability::init();
        let store = Arc::new(InMemoryLedgerStore::with_payload("{\"not\": \"an array\"}"));
        let register = Register::open(Catalog::standard(), Box::new(store));
        assert!(register.ledger().is_empty());
    }

    #[test]
    fn delete_is_gated_on_acknowledgment() {
        let (mut register, store) = setup();
        let first = cash_checkout(&mut register, 1, "65");
        let second = cash_checkout(&mut register, 2, "200");

        // Unconfirmed: nothing happens.
        let removed = register
            .delete_transaction(&first.id, Acknowledgment::Cancelled)
            .unwrap();
        assert!(!removed);
        assert_eq!(register.ledger().len(), 2);

        // Confirmed: exactly that record goes, the rest keep their order,
        // and an expanded detail view pointing at it collapses.
        register.toggle_transaction_detail(&first.id);
        assert_eq!(register.selected_transaction(), Some(&first.id));

        let removed = register
            .delete_transaction(&first.id, Acknowledgment::Confirmed)
            .unwrap();
        assert!(removed);
        assert_eq!(register.ledger().len(), 1);
        assert_eq!(register.ledger().transactions()[0].id, second.id);
        assert_eq!(register.selected_transaction(), None);
        assert!(!store.raw_payload().unwrap().contains(first.id.as_str()));
    }

    #[test]
    fn deleting_an_unknown_transaction_is_not_found() {
        let (mut register, _store) = setup();
        let err = register
            .delete_transaction(&TransactionId::new("TX-missing"), Acknowledgment::Confirmed)
            .unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Domain(DomainError::NotFound)
        ));
    }

    #[test]
    fn toggling_the_same_detail_twice_collapses_it() {
        let (mut register, _store) = setup();
        let tx = cash_checkout(&mut register, 1, "65");

        register.toggle_transaction_detail(&tx.id);
        assert_eq!(register.selected_transaction(), Some(&tx.id));
        register.toggle_transaction_detail(&tx.id);
        assert_eq!(register.selected_transaction(), None);
    }

    #[test]
    fn todays_stats_reflect_a_fresh_checkout() {
        let (mut register, _store) = setup();
        cash_checkout(&mut register, 2, "200");

        let stats = register.stats_at(&Utc::now(), 0, None);
        assert_eq!(stats.today_total, 130);
        assert_eq!(stats.month_total, 130);
        assert_eq!(stats.filtered.len(), 1);

        let cash_only = register.stats_at(&Utc::now(), 0, Some(PaymentMethod::Cash));
        assert_eq!(cash_only.filtered_total, 130);
        let leke_only = register.stats_at(&Utc::now(), 0, Some(PaymentMethod::Leke));
        assert_eq!(leke_only.filtered_total, 0);
        assert!(leke_only.filtered.is_empty());
    }

    #[test]
    fn month_filter_offers_three_months() {
        let (register, _store) = setup();
        assert_eq!(register.month_labels().len(), 3);
    }

    #[test]
    fn stale_insight_response_is_dropped() {
        let (mut register, _store) = setup();

        let first = register.begin_insight_fetch();
        let second = register.begin_insight_fetch();

        assert!(!register.complete_insight_fetch(first, "stale advice".to_string()));
        assert_eq!(register.insight(), None);

        assert!(register.complete_insight_fetch(second, "fresh advice".to_string()));
        assert_eq!(register.insight(), Some("fresh advice"));
    }

    #[tokio::test]
    async fn insight_without_credential_stores_the_hint() {
        let (mut register, _store) = setup();
        let provider = GeminiInsight::new(InsightConfig::without_credential());

        let text = register.fetch_insight(&provider).await;
        assert_eq!(text, NO_CREDENTIAL_HINT);
        assert_eq!(register.insight(), Some(NO_CREDENTIAL_HINT));
    }
}
