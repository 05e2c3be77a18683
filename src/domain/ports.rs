use crate::core::extraction::ExtractionSchema;
use crate::domain::model::{EnrichedTable, Endpoint, Table};
use crate::utils::error::{Result, TransportError};
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn url_column(&self) -> &str;
    fn endpoints(&self) -> &[Endpoint];
    fn schema(&self) -> &ExtractionSchema;
    fn max_workers(&self) -> usize;
    fn request_timeout(&self) -> Duration;
    fn insecure_skip_hostname_verification(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one JSON POST. Implementations are shared by every in-flight task.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Table>;
    async fn transform(&self, table: Table) -> Result<EnrichedTable>;
    async fn load(&self, enriched: EnrichedTable) -> Result<String>;
}
