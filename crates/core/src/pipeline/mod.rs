//! Batch orchestration: validation, application, aggregation and reporting.

pub mod error;
pub mod service;
pub mod types;

pub use error::PipelineError;
pub use service::ProcessingPipeline;
pub use types::{ProcessingInput, ProcessingReport, ProcessingSummary};
