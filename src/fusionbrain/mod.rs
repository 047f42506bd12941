pub mod client;
pub mod types;

pub use client::PipelineClient;
pub use types::{Job, JobStatus};
