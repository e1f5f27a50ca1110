use std::sync::RwLock;

use anyhow::anyhow;

use cloudpos_ledger::Ledger;

use crate::store::{decode_ledger, encode_ledger, LedgerStore};

/// In-memory ledger store.
///
/// Intended for tests/dev. Not optimized for performance. Holds the
/// serialized payload rather than the decoded ledger so tests can inject raw
/// (including malformed) documents and exercise the decode path.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    payload: RwLock<Option<String>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a raw persisted payload.
    pub fn with_payload(raw: impl Into<String>) -> Self {
        Self {
            payload: RwLock::new(Some(raw.into())),
        }
    }

    /// The raw payload as last saved, if any.
    pub fn raw_payload(&self) -> Option<String> {
        self.payload.read().ok().and_then(|guard| guard.clone())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn load(&self) -> anyhow::Result<Ledger> {
        let guard = self
            .payload
            .read()
            .map_err(|_| anyhow!("ledger store lock poisoned"))?;

        Ok(match guard.as_deref() {
            Some(raw) => decode_ledger(raw),
            None => Ledger::new(),
        })
    }

    fn save(&self, ledger: &Ledger) -> anyhow::Result<()> {
        let encoded = encode_ledger(ledger)?;
        let mut guard = self
            .payload
            .write()
            .map_err(|_| anyhow!("ledger store lock poisoned"))?;
        *guard = Some(encoded);
        Ok(())
    }
}
