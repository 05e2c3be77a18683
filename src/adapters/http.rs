use crate::domain::ports::{Transport, TransportResponse};
use crate::utils::error::{Result, TransportError};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Accept certificates whose subject does not match the host. The
    /// chain itself is still verified.
    pub insecure_skip_hostname_verification: bool,
}

impl TransportConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            insecure_skip_hostname_verification: false,
        }
    }

    pub fn insecure_hostnames(mut self, enabled: bool) -> Self {
        self.insecure_skip_hostname_verification = enabled;
        self
    }
}

/// reqwest-backed transport. One instance per run; its connection pool is
/// shared by every task and released when it is dropped.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("url-enricher/", env!("CARGO_PKG_VERSION")));

        if config.insecure_skip_hostname_verification {
            tracing::warn!("⚠️ TLS hostname verification is disabled for this run");
            builder = builder.danger_accept_invalid_hostnames(true);
        }

        Ok(Self {
            client: builder.build()?,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}
