//! Bulk submission to the index over the Vespa document API.
//!
//! One flush submits each schema's entries as a bulk call: entries are
//! split into sub-batches, each sub-batch is fed with a bounded number of
//! simultaneous requests, and the submitter moves to the next schema only
//! once every response of the current one is collected. Error-class
//! responses are gathered across the whole flush and raised together;
//! transport-level failures abort immediately.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Identity};
use serde_json::{Value, json};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::error::{FeedFailure, IndexError};
use crate::models::{IndexConnection, NAMESPACE, Schema};
use crate::services::partitioner::{FeedBatch, FeedEntry};

/// Outcome of a single document put.
#[derive(Debug, Clone)]
pub struct FeedResponse {
    pub schema: Schema,
    pub id: String,
    pub status: u16,
    pub body: Value,
}

impl FeedResponse {
    pub fn is_error(&self) -> bool {
        self.status >= 300
    }
}

/// Transport seam for the document API, mockable in tests. Retry policy,
/// if any, lives behind this trait rather than in the submitter.
#[async_trait]
pub trait FeedTransport: Send + Sync + 'static {
    async fn put_document(
        &self,
        schema: Schema,
        id: &str,
        fields: &Value,
    ) -> Result<FeedResponse, IndexError>;
}

/// HTTP client for a Vespa application, authenticated with an mTLS
/// identity.
pub struct IndexClient {
    client: Client,
    base_url: String,
}

impl IndexClient {
    pub fn new(connection: &IndexConnection) -> Result<Self, IndexError> {
        let mut pem = std::fs::read(&connection.cert_path)
            .map_err(|e| IndexError::Tls(format!("reading cert: {}", e)))?;
        pem.extend(
            std::fs::read(&connection.key_path)
                .map_err(|e| IndexError::Tls(format!("reading key: {}", e)))?,
        );
        let identity =
            Identity::from_pem(&pem).map_err(|e| IndexError::Tls(e.to_string()))?;

        let client = Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .build()
            .map_err(|e| IndexError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base_url: connection.url.trim_end_matches('/').to_string(),
        })
    }

    /// Checks whether the application answers on its status endpoint.
    pub async fn health_check(&self) -> Result<bool, IndexError> {
        let url = format!("{}/ApplicationStatus", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IndexError::Connection(e.to_string()))?;
        Ok(response.status().is_success())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl FeedTransport for IndexClient {
    async fn put_document(
        &self,
        schema: Schema,
        id: &str,
        fields: &Value,
    ) -> Result<FeedResponse, IndexError> {
        let url = format!(
            "{}/document/v1/{}/{}/docid/{}",
            self.base_url,
            NAMESPACE,
            schema.as_str(),
            id
        );
        let response = self
            .client
            .post(&url)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(FeedResponse {
            schema,
            id: id.to_string(),
            status,
            body,
        })
    }
}

/// Submits flushed batches with bounded per-call concurrency.
pub struct BulkSubmitter<T> {
    pub(crate) transport: Arc<T>,
    connections: usize,
    sub_batch_size: usize,
}

impl<T: FeedTransport> BulkSubmitter<T> {
    pub fn new(transport: T, connections: usize, sub_batch_size: usize) -> Self {
        Self {
            transport: Arc::new(transport),
            connections,
            sub_batch_size,
        }
    }

    /// Submits every schema of the batch in dependency order. All entries
    /// are attempted even when some are rejected; if any error-class
    /// response was collected the whole flush fails with the full failure
    /// list. Returns the number of entries accepted.
    pub async fn submit(&self, batch: FeedBatch) -> Result<usize, IndexError> {
        let mut responses = Vec::new();
        for (schema, entries) in batch.into_schema_order() {
            responses.extend(self.feed_schema(schema, entries).await?);
        }

        let accepted = responses.iter().filter(|r| !r.is_error()).count();
        let failures: Vec<FeedFailure> = responses
            .into_iter()
            .filter(FeedResponse::is_error)
            .map(|r| FeedFailure {
                schema: r.schema,
                id: r.id,
                status: r.status,
                body: r.body,
            })
            .collect();

        if !failures.is_empty() {
            for failure in &failures {
                error!(
                    schema = %failure.schema,
                    id = %failure.id,
                    status = failure.status,
                    "feed entry rejected"
                );
            }
            return Err(IndexError::SubmissionFailed { failures });
        }

        Ok(accepted)
    }

    /// One schema's bulk call: sequential sub-batches, each fed with at
    /// most `connections` requests in flight and joined before the next.
    async fn feed_schema(
        &self,
        schema: Schema,
        entries: Vec<FeedEntry>,
    ) -> Result<Vec<FeedResponse>, IndexError> {
        let total = entries.len();
        let mut responses = Vec::with_capacity(total);
        let mut remaining = entries.into_iter();

        loop {
            let chunk: Vec<FeedEntry> = remaining.by_ref().take(self.sub_batch_size).collect();
            if chunk.is_empty() {
                break;
            }

            let semaphore = Arc::new(Semaphore::new(self.connections));
            let mut tasks = JoinSet::new();
            for entry in chunk {
                let transport = Arc::clone(&self.transport);
                let permit = Arc::clone(&semaphore)
                    .acquire_owned()
                    .await
                    .expect("feed semaphore closed");
                tasks.spawn(async move {
                    let response = transport
                        .put_document(schema, &entry.id, &entry.fields)
                        .await;
                    drop(permit);
                    response
                });
            }

            while let Some(joined) = tasks.join_next().await {
                responses.push(joined.map_err(IndexError::Task)??);
            }
        }

        debug!(schema = %schema, entries = total, "schema batch fed");
        Ok(responses)
    }
}
