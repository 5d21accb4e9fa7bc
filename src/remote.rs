use crate::errors::StoreError;
use crate::models::Entry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Add,
    Update,
    Delete,
}

/// The record store behind the tracker.
///
/// Fetched records are returned untyped; turning them into entries happens
/// in [`crate::store::EntryStore`].
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Value>, StoreError>;

    /// Sends one mutation. Returns the record echoed back by the store, if any.
    async fn submit(&self, action: Action, entry: &Entry) -> Result<Option<Value>, StoreError>;
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    success: bool,
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    action: Action,
    entry: &'a Entry,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    success: bool,
    #[serde(default)]
    entry: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

pub struct HttpRemote {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn fetch_all(&self) -> Result<Vec<Value>, StoreError> {
        let response = self.client.get(&self.endpoint).send().await?;
        if !response.status().is_success() {
            return Err(StoreError::RemoteUnavailable(format!(
                "fetch failed with status {}",
                response.status()
            )));
        }

        let body: FetchResponse = response.json().await?;
        if !body.success {
            return Err(StoreError::RemoteRejected(
                body.error.unwrap_or_else(|| "fetch refused".to_string()),
            ));
        }
        Ok(body.data)
    }

    async fn submit(&self, action: Action, entry: &Entry) -> Result<Option<Value>, StoreError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SubmitRequest { action, entry })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StoreError::RemoteUnavailable(format!(
                "{action:?} failed with status {}",
                response.status()
            )));
        }

        let body: SubmitResponse = response.json().await?;
        if !body.success {
            return Err(StoreError::RemoteRejected(
                body.message.unwrap_or_else(|| format!("{action:?} refused")),
            ));
        }
        Ok(body.entry)
    }
}
