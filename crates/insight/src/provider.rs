use async_trait::async_trait;

use cloudpos_checkout::Transaction;

/// Fixed response when no API credential is configured.
pub const NO_CREDENTIAL_HINT: &str = "💡 提示：請設定 API_KEY 以啟用 AI 分析。";

/// Fixed response when there is no sales history to analyze.
pub const NO_TRANSACTIONS_HINT: &str = "目前尚無銷售紀錄可供分析。";

/// Fixed response when the provider call fails for any reason.
pub const UNAVAILABLE_HINT: &str = "AI 分析暫時無法連接。";

/// External sales-advisory provider.
///
/// Callers pass recent transactions (most recent first) and get back a short
/// advisory string. Implementations must never fail: the three fixed hints
/// above cover missing credential, empty history, and provider failure. A
/// call has no effect on cart or ledger state and may be retried freely.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn summarize(&self, transactions: &[Transaction]) -> String;
}
