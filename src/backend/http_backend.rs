use super::{Backend, HealthReport, QueryRequest, UNKNOWN_SERVICE_ERROR};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
struct QueryReply {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpBackend {
    client: Client,
    base_url: Url,
    base_url_str: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.url)
            .map_err(|e| Error::Config(format!("Invalid backend URL: {}", e)))?;
        // Endpoints join relative to the base, so its path must end in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url_str: config.url.clone(),
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid backend URL: {}", e)))
    }
}

fn transport(err: impl std::fmt::Display) -> Error {
    Error::Transport(err.to_string())
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health(&self) -> Result<HealthReport> {
        let url = self.endpoint("health")?;
        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<HealthReport>().await?)
    }

    async fn respond(&self, request: &QueryRequest) -> Result<String> {
        let url = self.endpoint("response")?;
        debug!(
            question = %request.question,
            files = request.pdf_files.as_ref().map_or(0, Vec::len),
            use_s3 = ?request.use_s3,
            "POST {}",
            url
        );

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        let reply = serde_json::from_str::<QueryReply>(&body);

        if !status.is_success() {
            let message = reply
                .ok()
                .and_then(|r| r.error)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_SERVICE_ERROR.to_string());
            debug!(%status, %message, "Backend returned failure status");
            return Err(Error::Service(message));
        }

        let reply = reply.map_err(|e| Error::Transport(format!("Malformed response: {}", e)))?;
        if let Some(message) = reply.error {
            let message = if message.trim().is_empty() {
                UNKNOWN_SERVICE_ERROR.to_string()
            } else {
                message
            };
            return Err(Error::Service(message));
        }

        reply
            .response
            .ok_or_else(|| Error::Transport("Malformed response: missing 'response' field".to_string()))
    }

    fn base_url(&self) -> &str {
        &self.base_url_str
    }
}
