use serde::{Deserialize, Serialize};

use cloudpos_core::TransactionId;

use crate::cart::OrderLine;
use crate::payment::PaymentMethod;

/// An immutable settlement record.
///
/// Created exactly once when a checkout is confirmed, never mutated
/// afterwards. Field names on the wire are camelCase to stay compatible with
/// historical persisted payloads; `receivedAmount`/`changeAmount` are
/// optional there, so records written before those fields existed still
/// deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    /// Frozen copy of the cart lines at checkout time.
    pub items: Vec<OrderLine>,
    /// Amount due, smallest currency unit.
    pub total: u64,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_amount: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_records_missing_optional_fields() {
        let raw = r#"{
            "id": "TX-1717000000000",
            "timestamp": 1717000000000,
            "items": [],
            "total": 130,
            "paymentMethod": "mobile",
            "someFutureField": {"ignored": true}
        }"#;
        let tx: Transaction = serde_json::from_str(raw).unwrap();
        assert_eq!(tx.total, 130);
        assert_eq!(tx.payment_method, PaymentMethod::Mobile);
        assert_eq!(tx.received_amount, None);
        assert_eq!(tx.change_amount, None);
    }

    #[test]
    fn serializes_camel_case_field_names() {
        let tx = Transaction {
            id: TransactionId::new("TX-1"),
            timestamp: 1,
            items: vec![],
            total: 65,
            payment_method: PaymentMethod::Cash,
            received_amount: Some(100),
            change_amount: Some(35),
        };
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["paymentMethod"], "cash");
        assert_eq!(value["receivedAmount"], 100);
        assert_eq!(value["changeAmount"], 35);
    }
}
