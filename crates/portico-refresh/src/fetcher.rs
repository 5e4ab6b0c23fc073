//! Schema fetcher - retrieves each service's OpenAPI document

use async_trait::async_trait;
use portico_config::HttpClientConfig;
use portico_core::{Error, Result, ServiceEntry};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

/// Source of OpenAPI documents
#[async_trait]
pub trait SchemaFetcher: Send + Sync {
    /// Fetch the document published by `service`. Transport failures
    /// (network error, non-200 status, unparsable body) are reported as
    /// errors for which [`Error::is_transport`] is true.
    async fn fetch(&self, service: &ServiceEntry) -> Result<Value>;
}

/// Fetches documents over HTTP
#[derive(Debug, Clone)]
pub struct HttpSchemaFetcher {
    client: reqwest::Client,
}

impl HttpSchemaFetcher {
    /// Create a fetcher from client settings
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.keep_alive_timeout)
            .pool_max_idle_per_host(config.connections)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(client))
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SchemaFetcher for HttpSchemaFetcher {
    async fn fetch(&self, service: &ServiceEntry) -> Result<Value> {
        let url = service.schema_url();
        debug!(service = %service.host, url = %url, "Fetching OpenAPI document");

        let response = self
            .client
            .get(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| Error::fetch(&service.host, e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::UnexpectedStatus {
                host: service.host.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::fetch(&service.host, format!("Failed to read body: {e}")))?;

        let document: Value = serde_json::from_str(&body)
            .map_err(|e| Error::fetch(&service.host, format!("Invalid JSON body: {e}")))?;

        debug!(
            service = %service.host,
            size_bytes = body.len(),
            "Fetched OpenAPI document"
        );

        Ok(document)
    }
}
