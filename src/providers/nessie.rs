use super::util::{read_success_body, with_retry};
use crate::core::bank::{BankingProvider, NewAccount, NewCustomer, NewLoan};
use crate::core::loan::RawRecord;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};

/// Client for a Nessie-style banking API, authenticated with a `key` query parameter.
pub struct NessieProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize, Debug)]
struct CreatedResponse {
    #[serde(rename = "objectCreated")]
    object_created: CreatedObject,
}

#[derive(Deserialize, Debug)]
struct CreatedObject {
    #[serde(rename = "_id")]
    id: String,
}

impl NessieProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        NessieProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn get_json(&self, endpoint: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Requesting {}", url);

        let response = with_retry(
            || {
                self.client
                    .get(&url)
                    .query(&[("key", self.api_key.as_str())])
                    .send()
            },
            3,
            500,
        )
        .await
        .with_context(|| format!("Request to {endpoint} failed"))?;

        let body = read_success_body(response, endpoint).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(error = ?e, response = %body, "Failed to parse banking API response");
            anyhow!(e).context(format!("Failed to parse response from {endpoint}"))
        })
    }

    async fn post_created<T: Serialize + Sync>(&self, endpoint: &str, payload: &T) -> Result<String> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Posting to {}", url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Request to {endpoint} failed"))?;

        let body = read_success_body(response, endpoint).await?;
        let created: CreatedResponse = serde_json::from_str(&body)
            .with_context(|| format!("Unexpected create response from {endpoint}: {body}"))?;
        Ok(created.object_created.id)
    }
}

fn into_record(value: Value, what: &str) -> Result<RawRecord> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("Expected a JSON object for {what}, got {other}")),
    }
}

#[async_trait]
impl BankingProvider for NessieProvider {
    #[instrument(name = "NessieLoansFetch", skip(self), fields(account_id = %account_id))]
    async fn fetch_loans(&self, account_id: &str) -> Result<Vec<RawRecord>> {
        let value = self
            .get_json(&format!("/accounts/{account_id}/loans"))
            .await?;
        let Value::Array(items) = value else {
            return Err(anyhow!("Expected a list of loans for account {account_id}"));
        };
        items
            .into_iter()
            .map(|item| into_record(item, "loan"))
            .collect()
    }

    #[instrument(name = "NessieAccountFetch", skip(self), fields(account_id = %account_id))]
    async fn fetch_account(&self, account_id: &str) -> Result<RawRecord> {
        let value = self.get_json(&format!("/accounts/{account_id}")).await?;
        into_record(value, "account")
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<String> {
        self.post_created("/customers", customer).await
    }

    async fn create_account(&self, customer_id: &str, account: &NewAccount) -> Result<String> {
        self.post_created(&format!("/customers/{customer_id}/accounts"), account)
            .await
    }

    async fn create_loan(&self, account_id: &str, loan: &NewLoan) -> Result<String> {
        self.post_created(&format!("/accounts/{account_id}/loans"), loan)
            .await
    }
}
