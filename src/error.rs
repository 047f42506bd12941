//! Common error type and result alias.
//!
//! Every failure of a chart build surfaces as an [`AppError`]; its `Display`
//! string is the cause reported to HTTP and CLI callers.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Required configuration (credentials, numeric settings) is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The generation service reported a status outside the healthy set.
    #[error("Kandinsky is unavailable right now (status={status}). Try again later.")]
    ServiceUnavailable { status: String },

    #[error("Pipeline list is empty")]
    NoPipelineAvailable,

    /// The run endpoint answered without a job id (queue overloaded).
    #[error("FusionBrain did not accept the job: {0}")]
    SubmissionRejected(String),

    #[error("Job status is DONE but result.files is empty")]
    EmptyResult,

    #[error("FusionBrain FAIL: {0}")]
    RemoteJobFailed(String),

    #[error("Generation did not finish within {attempts} status checks")]
    PollTimeout { attempts: u32 },

    /// A response was missing fields every well-formed answer carries.
    #[error("Unexpected response from FusionBrain: {0}")]
    InvalidResponse(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Non-success HTTP status from a remote endpoint.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Prompt refinement could not produce text. Never leaves the composer.
    #[error("Prompt refiner unavailable: {0}")]
    RefinerUnavailable(String),

    #[error("git failed: {0}")]
    Git(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether re-invoking the whole build later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::ServiceUnavailable { .. }
                | AppError::SubmissionRejected(_)
                | AppError::PollTimeout { .. }
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
