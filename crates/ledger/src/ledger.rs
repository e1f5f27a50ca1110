use serde::{Deserialize, Serialize};

use cloudpos_checkout::Transaction;
use cloudpos_core::TransactionId;

/// Append-ordered transaction history, most recent first.
///
/// New records are prepended, so stored order is reverse-chronological and
/// doubles as display order. Records are immutable once recorded; the only
/// removal path is an explicit, acknowledged delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// All records, most recent first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, id: &TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| &tx.id == id)
    }

    /// The `n` most recent records.
    pub fn recent(&self, n: usize) -> &[Transaction] {
        &self.transactions[..self.transactions.len().min(n)]
    }

    /// Prepend a newly finalized transaction.
    pub fn record(&mut self, transaction: Transaction) {
        self.transactions.insert(0, transaction);
    }

    /// Remove exactly the matching record, returning it.
    ///
    /// All other records keep their relative order.
    pub fn delete(&mut self, id: &TransactionId) -> Option<Transaction> {
        let index = self.transactions.iter().position(|tx| &tx.id == id)?;
        Some(self.transactions.remove(index))
    }
}
