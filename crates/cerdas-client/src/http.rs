//! HTTP implementation of the document backend.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use cerdas_core::{
    defaults, format_tags, Activation, Document, DocumentBackend, DocumentUpdate, Error,
    LatestDocument, Result, SearchResult, ServerStatus, Stats, UploadRequest,
};

use crate::config::ClientConfig;
use crate::error;

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct LatestBody {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Serialize)]
struct UpdateBody<'a> {
    uploaded_by: &'a str,
    tags: String,
}

/// Document backend reached over HTTP.
pub struct HttpBackend {
    client: Client,
    base: Url,
    config: ClientConfig,
}

impl HttpBackend {
    /// Create a backend client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let base = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("Invalid base_url {}: {}", config.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "base_url cannot be a base: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Initializing document backend: url={}, timeout={}s",
            config.base_url, config.timeout_seconds
        );

        Ok(Self {
            client,
            base,
            config,
        })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Base URL joined with `segments`, each percent-encoded as one path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("base_url cannot be a base: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let mut req = self.client.request(method, self.endpoint(segments)?);
        if self.config.skip_tunnel_warning {
            req = req.header(defaults::TUNNEL_WARNING_HEADER, "true");
        }
        Ok(req)
    }
}

async fn expect_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error::from_response(response).await)
    }
}

async fn read_message(response: Response) -> Result<String> {
    let body: MessageBody = expect_success(response).await?.json().await?;
    Ok(body.message)
}

#[async_trait]
impl DocumentBackend for HttpBackend {
    async fn list_documents(&self) -> Result<Vec<Document>> {
        let response = self.request(Method::GET, &["documents"])?.send().await?;
        let documents: Vec<Document> = expect_success(response).await?.json().await?;
        debug!(count = documents.len(), "Fetched document list");
        Ok(documents)
    }

    async fn latest_document(&self) -> Result<Option<LatestDocument>> {
        let response = self
            .request(Method::GET, &["document", "latest"])?
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Backend reports no latest document");
            return Ok(None);
        }

        let text = expect_success(response).await?.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let body: Option<LatestBody> = serde_json::from_str(&text)?;
        Ok(body.and_then(|b| {
            let id = b.id.filter(|id| !id.is_empty())?;
            Some(LatestDocument {
                id,
                filename: b.filename.unwrap_or_default(),
            })
        }))
    }

    async fn switch_document(&self, id: &str) -> Result<Activation> {
        let response = self
            .request(Method::POST, &["switch_document", id])?
            .send()
            .await?;
        let activation: Activation = expect_success(response).await?.json().await?;
        debug!(document_id = %id, filename = %activation.filename, "Document activated");
        Ok(activation)
    }

    async fn delete_document(&self, id: &str) -> Result<String> {
        let response = self
            .request(Method::DELETE, &["document", id])?
            .send()
            .await?;
        read_message(response).await
    }

    async fn update_document(&self, id: &str, update: &DocumentUpdate) -> Result<String> {
        let body = UpdateBody {
            uploaded_by: &update.uploaded_by,
            tags: format_tags(&update.tags),
        };
        let response = self
            .request(Method::PUT, &["document", id])?
            .json(&body)
            .send()
            .await?;
        read_message(response).await
    }

    async fn upload(&self, request: UploadRequest) -> Result<String> {
        let size = request.bytes.len();
        let mut form = Form::new()
            .part(
                "file",
                Part::bytes(request.bytes).file_name(request.filename.clone()),
            )
            .text("tags", format_tags(&request.tags));
        if let Some(uploader) = request.uploaded_by.filter(|u| !u.trim().is_empty()) {
            form = form.text("uploaded_by", uploader);
        }

        debug!(filename = %request.filename, bytes = size, "Uploading document");
        let response = self
            .request(Method::POST, &["upload"])?
            .multipart(form)
            .send()
            .await?;
        read_message(response).await
    }

    async fn autocomplete(&self, prefix: &str) -> Result<Vec<String>> {
        let response = self
            .request(Method::GET, &["autocomplete"])?
            .query(&[("prefix", prefix)])
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    async fn search(&self, query: &str) -> Result<SearchResult> {
        let response = self
            .request(Method::GET, &["search"])?
            .query(&[("query", query)])
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    async fn tags(&self) -> Result<Vec<String>> {
        let response = self.request(Method::GET, &["tags"])?.send().await?;
        Ok(expect_success(response).await?.json().await?)
    }

    async fn stats(&self) -> Result<Stats> {
        let response = self.request(Method::GET, &["stats"])?.send().await?;
        Ok(expect_success(response).await?.json().await?)
    }

    async fn status(&self) -> Result<ServerStatus> {
        let response = self.request(Method::GET, &["status"])?.send().await?;
        Ok(expect_success(response).await?.json().await?)
    }
}
