pub mod dispatcher;
pub mod etl;
pub mod extraction;
pub mod pipeline;
pub mod rows;

pub use crate::domain::model::{EnrichedTable, OutputTable, Table};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, Transport};
pub use crate::utils::error::Result;
