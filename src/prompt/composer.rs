//! Prompt composition for the commit chart.
//!
//! A deterministic prompt is always built first from the data. An LLM refiner
//! may rewrite it; any refiner failure falls back to the deterministic text.
use std::sync::Arc;

use crate::commits::DailyCount;
use crate::prompt::refiner::{NullRefiner, PromptRefiner};

/// Where a prompt's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Deterministic,
    LlmComposed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub provenance: Provenance,
}

impl Prompt {
    pub fn deterministic(text: String) -> Self {
        Prompt { text, provenance: Provenance::Deterministic }
    }

    pub fn llm_composed(text: String) -> Self {
        Prompt { text, provenance: Provenance::LlmComposed }
    }
}

/// `date:count` pairs in input order, comma separated.
pub fn data_pairs(data: &[DailyCount]) -> String {
    data.iter()
        .map(|d| format!("{}:{}", d.date.format("%Y-%m-%d"), d.count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The data-faithful prompt used whenever refinement is unavailable.
pub fn fallback_prompt(data: &[DailyCount]) -> String {
    format!(
        "Draw a clean, minimal, data-faithful bar chart titled 'Commits per day (last {n} days)'. \
         X-axis = dates (YYYY-MM-DD, left to right, exactly these {n} days). \
         Y-axis starts at 0. Uniform solid bars, small gridlines, axis labels, numeric ticks. \
         No 3D, no gradients, no decorations. \
         Data (date:count): {pairs}. Bar heights MUST equal counts.",
        n = data.len(),
        pairs = data_pairs(data),
    )
}

#[derive(Clone)]
pub struct PromptComposer {
    refiner: Arc<dyn PromptRefiner>,
}

impl PromptComposer {
    pub fn new(refiner: Arc<dyn PromptRefiner>) -> Self {
        PromptComposer { refiner }
    }

    /// Composer that only ever produces the deterministic prompt.
    pub fn deterministic() -> Self {
        PromptComposer::new(Arc::new(NullRefiner))
    }

    pub fn refiner_name(&self) -> &'static str {
        self.refiner.name()
    }

    pub async fn compose(&self, data: &[DailyCount]) -> Prompt {
        let fallback = fallback_prompt(data);
        match self.refiner.refine(&fallback).await {
            Ok(text) if !text.trim().is_empty() => Prompt::llm_composed(text.trim().to_string()),
            Ok(_) => {
                tracing::warn!(refiner = self.refiner.name(), "Refiner returned empty text, using fallback prompt");
                Prompt::deterministic(fallback)
            }
            Err(e) => {
                tracing::debug!(refiner = self.refiner.name(), error = %e, "Using fallback prompt");
                Prompt::deterministic(fallback)
            }
        }
    }
}
