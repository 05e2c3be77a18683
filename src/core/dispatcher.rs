use crate::core::extraction::ExtractionSchema;
use crate::domain::model::{DispatchSummary, Endpoint, Outcome, OutputTable, TaskResult, WorkItem};
use crate::domain::ports::Transport;
use crate::utils::error::{Result, TaskError};
use futures::stream::{self, StreamExt};

pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Fans work items out to every endpoint with at most `max_workers`
/// requests in flight, and folds results into the output table as they
/// complete.
pub struct Dispatcher<'a, T: Transport> {
    transport: &'a T,
    max_workers: usize,
}

impl<'a, T: Transport> Dispatcher<'a, T> {
    pub fn new(transport: &'a T, max_workers: usize) -> Self {
        Self {
            transport,
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Runs one task per (item, endpoint) pair and returns once every task
    /// has been written to `table`.
    pub async fn run(
        &self,
        items: &[WorkItem],
        endpoints: &[Endpoint],
        schema: &ExtractionSchema,
        table: &mut OutputTable,
    ) -> Result<DispatchSummary> {
        let mut summary = DispatchSummary {
            submitted: items.len() * endpoints.len(),
            ..DispatchSummary::default()
        };

        tracing::info!(
            "🚀 Dispatching {} tasks ({} rows x {} endpoints, {} workers)",
            summary.submitted,
            items.len(),
            endpoints.len(),
            self.max_workers
        );

        // results are routed by endpoint position, so duplicate names stay apart
        let tasks: Vec<(usize, WorkItem)> = items
            .iter()
            .flat_map(|item| (0..endpoints.len()).map(move |index| (index, item.clone())))
            .collect();

        let mut completed = stream::iter(tasks)
            .map(move |(index, item)| async move {
                (index, self.execute(&item, &endpoints[index]).await)
            })
            .buffer_unordered(self.max_workers);

        while let Some((index, result)) = completed.next().await {
            let endpoint = &endpoints[index];

            match &result.outcome {
                Outcome::Success(_) => {
                    tracing::info!(
                        "Row {}: response from {} processed",
                        result.row_index,
                        endpoint.name
                    );
                }
                Outcome::Failure(err) => {
                    tracing::warn!("Row {}: {} failed: {}", result.row_index, endpoint.name, err);
                }
            }

            summary.record(&result.outcome);
            schema.apply(table, endpoint, &result)?;
        }

        tracing::info!(
            "✅ Dispatch finished: {} succeeded, {} failed",
            summary.succeeded,
            summary.failed
        );
        Ok(summary)
    }

    /// Executes a single task. Never fails; faults become `Outcome::Failure`.
    pub async fn execute(&self, item: &WorkItem, endpoint: &Endpoint) -> TaskResult {
        let outcome = match self.request(item, endpoint).await {
            Ok(object) => Outcome::Success(object),
            Err(err) => Outcome::Failure(err),
        };
        TaskResult {
            row_index: item.row_index,
            endpoint_name: endpoint.name.clone(),
            outcome,
        }
    }

    async fn request(
        &self,
        item: &WorkItem,
        endpoint: &Endpoint,
    ) -> std::result::Result<serde_json::Map<String, serde_json::Value>, TaskError> {
        let url = item.input_value.as_deref().ok_or(TaskError::MissingInput)?;

        tracing::debug!("📡 Row {}: POST {} for {}", item.row_index, endpoint.url, url);
        let payload = serde_json::json!({ "url": url });
        let response = self.transport.post_json(&endpoint.url, &payload).await?;

        if !response.is_success() {
            return Err(TaskError::HttpStatus {
                status: response.status,
                body: response.body,
            });
        }

        match serde_json::from_str::<serde_json::Value>(&response.body) {
            Ok(serde_json::Value::Object(object)) => Ok(object),
            Ok(other) => Err(TaskError::ResponseParse(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(TaskError::ResponseParse(e.to_string())),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
