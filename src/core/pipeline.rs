use crate::adapters::csv_table::{read_table, write_table};
use crate::adapters::http::{HttpTransport, TransportConfig};
use crate::core::dispatcher::Dispatcher;
use crate::core::rows::work_items;
use crate::core::{ConfigProvider, EnrichedTable, OutputTable, Pipeline, Storage, Table, Transport};
use crate::utils::error::Result;

/// Reads the input table, fans its URLs out to the configured endpoints and
/// writes the enriched table back through `Storage`.
pub struct EnrichmentPipeline<S: Storage, C: ConfigProvider, T: Transport> {
    storage: S,
    config: C,
    transport: T,
}

impl<S: Storage, C: ConfigProvider, T: Transport> EnrichmentPipeline<S, C, T> {
    pub fn new(storage: S, config: C, transport: T) -> Self {
        Self {
            storage,
            config,
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<S: Storage, C: ConfigProvider> EnrichmentPipeline<S, C, HttpTransport> {
    /// Builds the reqwest transport from the job's timeout and TLS profile.
    pub fn with_http(storage: S, config: C) -> Result<Self> {
        let transport_config = TransportConfig::new(config.request_timeout())
            .insecure_hostnames(config.insecure_skip_hostname_verification());
        let transport = HttpTransport::new(&transport_config)?;
        Ok(Self::new(storage, config, transport))
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, T: Transport> Pipeline for EnrichmentPipeline<S, C, T> {
    async fn extract(&self) -> Result<Table> {
        tracing::debug!("Reading input table from: {}", self.config.input_path());
        let data = self.storage.read_file(self.config.input_path()).await?;
        let table = read_table(&data)?;
        tracing::debug!(
            "Input has {} rows and columns {:?}",
            table.row_count(),
            table.headers
        );
        Ok(table)
    }

    async fn transform(&self, table: Table) -> Result<EnrichedTable> {
        let endpoints = self.config.endpoints();
        let schema = self.config.schema();

        let items = work_items(&table, self.config.url_column());
        let columns: Vec<String> = endpoints
            .iter()
            .flat_map(|endpoint| schema.output_columns(endpoint))
            .collect();
        let mut output = OutputTable::new(table, &columns);

        let dispatcher = Dispatcher::new(&self.transport, self.config.max_workers());
        let summary = dispatcher.run(&items, endpoints, schema, &mut output).await?;

        Ok(EnrichedTable {
            table: output,
            summary,
        })
    }

    async fn load(&self, enriched: EnrichedTable) -> Result<String> {
        let data = write_table(enriched.table.table())?;

        tracing::debug!(
            "Writing {} rows ({} bytes) to storage",
            enriched.table.row_count(),
            data.len()
        );
        self.storage
            .write_file(self.config.output_path(), &data)
            .await?;

        Ok(self.config.output_path().to_string())
    }
}
