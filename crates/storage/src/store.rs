use anyhow::Context;

use cloudpos_ledger::Ledger;

/// Fixed storage key for the ledger document.
pub const LEDGER_STORAGE_KEY: &str = "pos_transactions";

/// Persistence boundary for the ledger document.
///
/// Whole-document semantics: `save` overwrites the full serialized ledger,
/// `load` returns the full ledger. An absent or malformed payload loads as an
/// empty ledger (logged, never surfaced); only infrastructure failures (an
/// unreachable store, a failed write) are errors.
pub trait LedgerStore {
    fn load(&self) -> anyhow::Result<Ledger>;

    fn save(&self, ledger: &Ledger) -> anyhow::Result<()>;
}

impl<S> LedgerStore for std::sync::Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn load(&self) -> anyhow::Result<Ledger> {
        (**self).load()
    }

    fn save(&self, ledger: &Ledger) -> anyhow::Result<()> {
        (**self).save(ledger)
    }
}

/// Decode a persisted payload, degrading to an empty ledger on any defect.
///
/// A parse failure or a non-array payload is logged and swallowed: corrupt
/// history must never block the register from starting.
pub fn decode_ledger(raw: &str) -> Ledger {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!("failed to parse persisted ledger, resetting to empty: {err}");
            return Ledger::new();
        }
    };

    if !value.is_array() {
        tracing::error!("persisted ledger is not an array, resetting to empty");
        return Ledger::new();
    }

    match serde_json::from_value(value) {
        Ok(ledger) => ledger,
        Err(err) => {
            tracing::error!("failed to deserialize persisted ledger, resetting to empty: {err}");
            Ledger::new()
        }
    }
}

pub fn encode_ledger(ledger: &Ledger) -> anyhow::Result<String> {
    serde_json::to_string(ledger).context("failed to serialize ledger for persistence")
}
