pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::TomlConfig;

pub use adapters::{
    http::{HttpTransport, TransportConfig},
    storage::LocalStorage,
};
pub use core::{
    dispatcher::Dispatcher,
    etl::EtlEngine,
    extraction::{ExtractionSchema, FieldFormat, FieldRule},
    pipeline::EnrichmentPipeline,
};
pub use domain::model::{DispatchSummary, Endpoint, Outcome, RunReport, TaskResult, WorkItem};
pub use utils::error::{EtlError, Result, TaskError, TransportError};
