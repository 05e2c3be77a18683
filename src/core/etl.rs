use crate::core::Pipeline;
use crate::domain::model::RunReport;
use crate::utils::error::Result;
use chrono::Utc;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Runs extract, transform and load once. The pipeline, and with it
    /// the shared transport, is dropped when the run returns.
    pub async fn run(self) -> Result<RunReport> {
        let started_at = Utc::now();
        tracing::info!("Starting enrichment run...");

        tracing::info!("📥 Reading input table...");
        let table = self.pipeline.extract().await?;
        let rows = table.row_count();
        tracing::info!("Read {} rows", rows);

        tracing::info!("🔄 Enriching rows...");
        let enriched = self.pipeline.transform(table).await?;
        let summary = enriched.summary;
        tracing::info!(
            "Enriched {} rows ({} tasks, {} failed)",
            enriched.table.row_count(),
            summary.submitted,
            summary.failed
        );

        tracing::info!("💾 Writing output table...");
        let output_path = self.pipeline.load(enriched).await?;
        let finished_at = Utc::now();
        tracing::info!(
            "Output saved to: {} in {} ms",
            output_path,
            (finished_at - started_at).num_milliseconds()
        );

        Ok(RunReport {
            output_path,
            rows,
            summary,
            started_at,
            finished_at,
        })
    }
}
