//! Commit chart service library
//!
//! Turns a repository's last week of commit activity into a bar chart image
//! rendered by the FusionBrain (Kandinsky) text-to-image API.
//!
//! Modules:
//! - `api`: Axum HTTP handlers and router used by the server binary.
//! - `commits`: Per-day commit counts from `git log`.
//! - `fusionbrain`: Client for the FusionBrain pipeline endpoints.
//! - `prompt`: Deterministic prompt composition with optional LLM refinement.
//! - `orchestrator`: Runs one build from commit counts to image bytes.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
pub mod api;
pub mod commits;
pub mod config;
pub mod error;
pub mod fusionbrain;
pub mod orchestrator;
pub mod prompt;

pub use commits::DailyCount;
pub use config::{Config, Credentials, PollPolicy};
pub use error::{AppError, AppResult};
pub use fusionbrain::PipelineClient;
pub use orchestrator::JobOrchestrator;
pub use prompt::{Prompt, PromptComposer, Provenance};
