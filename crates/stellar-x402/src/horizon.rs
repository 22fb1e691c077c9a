use serde::Deserialize;

use crate::error::X402Error;
use crate::gateway::{LedgerGateway, SignedPayload, SubmitResponse};
use crate::strkey;
use crate::transaction::AccountSnapshot;

/// Ledger gateway backed by a Horizon REST endpoint.
///
/// Wraps `reqwest::Client`. Calls are never retried here: a failed `pay`
/// is re-triggered by the user and reloads everything from scratch.
#[derive(Debug, Clone)]
pub struct HorizonClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AccountRecord {
    account_id: String,
    sequence: String,
}

#[derive(Debug, Deserialize)]
struct FeeStats {
    last_ledger_base_fee: String,
}

#[derive(Debug, Deserialize)]
struct SubmitRecord {
    hash: String,
    #[serde(default)]
    ledger: Option<u32>,
    #[serde(default = "default_successful")]
    successful: bool,
}

fn default_successful() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
struct Problem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    extras: Option<serde_json::Value>,
}

impl HorizonClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, X402Error> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| X402Error::Http(format!("GET {path} failed: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(X402Error::Ledger(format!("{path}: not found")));
        }
        if !status.is_success() {
            return Err(X402Error::Http(format!("GET {path} returned {status}")));
        }

        resp.json()
            .await
            .map_err(|e| X402Error::Http(format!("failed to parse {path} response: {e}")))
    }
}

impl LedgerGateway for HorizonClient {
    async fn load_account(&self, account_id: &str) -> Result<AccountSnapshot, X402Error> {
        if !strkey::is_valid_account_id(account_id) {
            return Err(X402Error::InvalidAddress(account_id.to_string()));
        }

        let record: AccountRecord = self
            .get_json(&format!("/accounts/{account_id}"))
            .await
            .map_err(|e| match e {
                X402Error::Ledger(_) => {
                    X402Error::Ledger(format!("account {account_id} not found on ledger"))
                }
                other => other,
            })?;

        let sequence = record.sequence.parse::<i64>().map_err(|e| {
            X402Error::Ledger(format!("invalid sequence '{}': {e}", record.sequence))
        })?;

        Ok(AccountSnapshot {
            account_id: record.account_id,
            sequence,
        })
    }

    async fn fetch_base_fee(&self) -> Result<u32, X402Error> {
        let stats: FeeStats = self.get_json("/fee_stats").await?;
        stats.last_ledger_base_fee.parse::<u32>().map_err(|e| {
            X402Error::Ledger(format!(
                "invalid base fee '{}': {e}",
                stats.last_ledger_base_fee
            ))
        })
    }

    async fn submit_transaction(&self, signed: &SignedPayload) -> Result<SubmitResponse, X402Error> {
        let url = format!("{}/transactions", self.base_url);
        let resp = self
            .http
            .post(&url)
            .form(&[("tx", signed.as_str())])
            .send()
            .await
            .map_err(|e| X402Error::Http(format!("POST /transactions failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let problem: Problem = resp.json().await.unwrap_or_default();
            let codes = problem
                .extras
                .as_ref()
                .and_then(|x| x.get("result_codes"))
                .map(|c| c.to_string())
                .unwrap_or_default();
            return Err(X402Error::Ledger(format!(
                "submission rejected ({status}): {} {codes}",
                problem.title.unwrap_or_else(|| "unknown error".to_string())
            )));
        }

        let record: SubmitRecord = resp
            .json()
            .await
            .map_err(|e| X402Error::Http(format!("failed to parse submission response: {e}")))?;

        Ok(SubmitResponse {
            hash: record.hash,
            ledger: record.ledger,
            successful: record.successful,
        })
    }
}
