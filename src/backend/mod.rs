//! Retrieval/generation backend client
//!
//! The backend is an opaque HTTP service with two endpoints:
//! - `GET /health` → `{ status, source? }`
//! - `POST /response` → `{ response }` or `{ error }`
//!
//! When a request carries neither `pdf_files` nor `use_s3`, the service falls
//! back to its external corpus, so request construction must always be explicit.

mod http_backend;
#[cfg(test)]
pub(crate) mod testing;

pub use http_backend::*;

use crate::config::BackendConfig;
use crate::error::Result;
use crate::models::Document;
use crate::source::ContextSource;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Message used when the service fails without saying why
pub const UNKNOWN_SERVICE_ERROR: &str = "Unknown error occurred";

/// One uploaded file as sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfFile {
    pub name: String,
    pub data: String,
}

/// Body of `POST /response`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_files: Option<Vec<PdfFile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_s3: Option<bool>,
}

impl QueryRequest {
    /// Build the request for `source`. Documents attach only when the source
    /// includes uploads and there are some; `use_s3` is set only when the source
    /// includes the external corpus.
    pub fn build(question: &str, source: ContextSource, documents: &[Document]) -> Self {
        let pdf_files = if source.includes_uploads() && !documents.is_empty() {
            Some(
                documents
                    .iter()
                    .map(|doc| PdfFile {
                        name: doc.name.clone(),
                        data: doc.data.clone(),
                    })
                    .collect(),
            )
        } else {
            None
        };

        let use_s3 = source.includes_external().then_some(true);

        Self {
            question: question.to_string(),
            pdf_files,
            use_s3,
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Liveness probe. Any `Err` means the service is offline.
    async fn health(&self) -> Result<HealthReport>;

    /// Send one query. Failures are `Error::Service` when the service answered
    /// with an error, `Error::Transport` for everything else.
    async fn respond(&self, request: &QueryRequest) -> Result<String>;

    fn base_url(&self) -> &str;
}

pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn Backend>> {
    let backend = HttpBackend::new(config)?;
    Ok(Arc::new(backend))
}
