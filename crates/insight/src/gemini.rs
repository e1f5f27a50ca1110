use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use cloudpos_checkout::Transaction;

use crate::provider::{
    InsightProvider, NO_CREDENTIAL_HINT, NO_TRANSACTIONS_HINT, UNAVAILABLE_HINT,
};

/// How many recent transactions feed one advisory request.
const DIGEST_LIMIT: usize = 10;

const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Provider configuration. A missing credential is a valid, handled state.
#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
}

impl InsightConfig {
    /// Read configuration from the environment.
    ///
    /// `API_KEY` supplies the credential; `CLOUDPOS_INSIGHT_MODEL` and
    /// `CLOUDPOS_INSIGHT_API_URL` override the defaults.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("API_KEY").ok().filter(|key| !key.is_empty()),
            model: std::env::var("CLOUDPOS_INSIGHT_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            api_url: std::env::var("CLOUDPOS_INSIGHT_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        }
    }

    pub fn without_credential() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// What the model sees per transaction: the amount, a compact item summary,
/// and the time of day.
#[derive(Debug, Serialize)]
struct TransactionDigest {
    total: u64,
    items: String,
    time: String,
}

fn digest(transactions: &[Transaction]) -> Vec<TransactionDigest> {
    transactions
        .iter()
        .take(DIGEST_LIMIT)
        .map(|tx| TransactionDigest {
            total: tx.total,
            items: tx
                .items
                .iter()
                .map(|line| format!("{}x{}", line.item.name, line.quantity))
                .collect::<Vec<_>>()
                .join(", "),
            time: format_time_of_day(tx.timestamp),
        })
        .collect()
}

fn format_time_of_day(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Gemini-backed insight provider.
pub struct GeminiInsight {
    client: reqwest::Client,
    config: InsightConfig,
}

impl GeminiInsight {
    pub fn new(config: InsightConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(InsightConfig::from_env())
    }

    async fn request_insight(
        &self,
        api_key: &str,
        transactions: &[Transaction],
    ) -> Result<String, InsightError> {
        let summary = serde_json::to_string(&digest(transactions))
            .map_err(|e| InsightError::Parse(e.to_string()))?;
        let prompt = format!(
            "你是一位資深餐飲顧問。請根據以下最近的交易紀錄，提供一段簡短且具啟發性的經營建議（約 50 字）：\n{summary}"
        );

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_url, self.config.model
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| InsightError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(InsightError::Api(
                resp.status().as_u16(),
                resp.text().await.unwrap_or_default(),
            ));
        }

        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| InsightError::Parse(e.to_string()))?;

        value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| InsightError::Parse("response has no candidate text".to_string()))
    }
}

#[async_trait]
impl InsightProvider for GeminiInsight {
    async fn summarize(&self, transactions: &[Transaction]) -> String {
        let Some(api_key) = self.config.api_key.clone() else {
            return NO_CREDENTIAL_HINT.to_string();
        };

        if transactions.is_empty() {
            return NO_TRANSACTIONS_HINT.to_string();
        }

        match self.request_insight(&api_key, transactions).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("insight request failed: {err}");
                UNAVAILABLE_HINT.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudpos_catalog::{CatalogItem, Category};
    use cloudpos_checkout::{OrderLine, PaymentMethod};
    use cloudpos_core::{ItemId, TransactionId};

    fn tx(id: &str, names_and_quantities: &[(&str, u32)]) -> Transaction {
        let items = names_and_quantities
            .iter()
            .map(|(name, quantity)| OrderLine {
                item: CatalogItem {
                    id: ItemId::new(*name),
                    name: name.to_string(),
                    price: 65,
                    category: Category::Beverage,
                    image: String::new(),
                    color: String::new(),
                },
                quantity: *quantity,
            })
            .collect();
        Transaction {
            id: TransactionId::new(id),
            timestamp: 1_717_000_000_000,
            items,
            total: 130,
            payment_method: PaymentMethod::Cash,
            received_amount: Some(200),
            change_amount: Some(70),
        }
    }

    #[test]
    fn digest_joins_items_and_caps_at_ten() {
        let transactions: Vec<_> = (0..15)
            .map(|i| tx(&format!("TX-{i}"), &[("美式咖啡", 2), ("拿鐵咖啡", 1)]))
            .collect();

        let digests = digest(&transactions);
        assert_eq!(digests.len(), DIGEST_LIMIT);
        assert_eq!(digests[0].items, "美式咖啡x2, 拿鐵咖啡x1");
        assert_eq!(digests[0].total, 130);
        assert!(!digests[0].time.is_empty());
    }

    #[tokio::test]
    async fn missing_credential_short_circuits() {
        let provider = GeminiInsight::new(InsightConfig::without_credential());
        let text = provider.summarize(&[tx("TX-1", &[("美式咖啡", 1)])]).await;
        assert_eq!(text, NO_CREDENTIAL_HINT);
    }

    #[tokio::test]
    async fn empty_history_short_circuits() {
        let provider = GeminiInsight::new(InsightConfig {
            api_key: Some("test-key".to_string()),
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        });
        let text = provider.summarize(&[]).await;
        assert_eq!(text, NO_TRANSACTIONS_HINT);
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_fixed_hint() {
        // Nothing listens on the discard port, so the request fails fast.
        let provider = GeminiInsight::new(InsightConfig {
            api_key: Some("test-key".to_string()),
            model: DEFAULT_MODEL.to_string(),
            api_url: "http://127.0.0.1:9".to_string(),
        });
        let text = provider.summarize(&[tx("TX-1", &[("美式咖啡", 1)])]).await;
        assert_eq!(text, UNAVAILABLE_HINT);
    }
}
