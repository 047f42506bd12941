//! Optional LLM rewriting of the chart prompt.
//!
//! The implementation is chosen once by [`select_refiner`]; callers hold an
//! `Arc<dyn PromptRefiner>` and never branch on availability themselves.
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::Config;
use crate::error::{AppError, AppResult};

pub const SYSTEM_INSTRUCTION: &str = "You are a prompt engineer for a Kandinsky (FusionBrain) text-to-image model. \
Return ONLY a single plain English prompt for a flat bar chart; no markdown.";

pub const CANVAS_HINT: &str = " Canvas 1024x768 px, white background, black axes.";

#[async_trait]
pub trait PromptRefiner: Send + Sync {
    /// Rewrite `grounding` into a generation prompt. One attempt, no retries.
    async fn refine(&self, grounding: &str) -> AppResult<String>;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// Used when no LLM is compiled in or configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRefiner;

#[async_trait]
impl PromptRefiner for NullRefiner {
    async fn refine(&self, _grounding: &str) -> AppResult<String> {
        Err(AppError::RefinerUnavailable("no LLM refiner configured".into()))
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Gemini `generateContent` over REST.
#[cfg(feature = "gemini")]
#[derive(Clone)]
pub struct GeminiRefiner {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[cfg(feature = "gemini")]
impl GeminiRefiner {
    pub fn new(http: Client, base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        GeminiRefiner {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    fn request_body(grounding: &str) -> serde_json::Value {
        serde_json::json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{
                "role": "user",
                "parts": [{ "text": format!("{}{}", grounding, CANVAS_HINT) }]
            }]
        })
    }
}

/// Concatenate the text parts of the first candidate.
#[cfg(feature = "gemini")]
fn candidate_text(json: &serde_json::Value) -> String {
    json.pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[cfg(feature = "gemini")]
#[async_trait]
impl PromptRefiner for GeminiRefiner {
    async fn refine(&self, grounding: &str) -> AppResult<String> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(std::time::Duration::from_secs(30))
            .json(&Self::request_body(grounding))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Http { status, body });
        }

        let json: serde_json::Value = response.json().await?;
        let text = candidate_text(&json).trim().to_string();
        if text.is_empty() {
            return Err(AppError::RefinerUnavailable("Gemini returned empty text".into()));
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Pick the refiner for this process: Gemini when compiled in and keyed.
pub fn select_refiner(config: &Config, http: Client) -> Arc<dyn PromptRefiner> {
    match gemini_refiner(config, http) {
        Some(refiner) => {
            tracing::info!(model = %config.gemini_model, "Prompt refinement via Gemini enabled");
            refiner
        }
        None => {
            tracing::info!("Prompt refinement disabled, using deterministic prompts");
            Arc::new(NullRefiner)
        }
    }
}

#[cfg(feature = "gemini")]
fn gemini_refiner(config: &Config, http: Client) -> Option<Arc<dyn PromptRefiner>> {
    let key = config.gemini_api_key.as_deref()?;
    Some(Arc::new(GeminiRefiner::new(http, config.gemini_url.clone(), config.gemini_model.clone(), key)))
}

#[cfg(not(feature = "gemini"))]
fn gemini_refiner(_config: &Config, _http: Client) -> Option<Arc<dyn PromptRefiner>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_refiner_always_unavailable() {
        let err = NullRefiner.refine("anything").await.unwrap_err();
        assert!(matches!(err, AppError::RefinerUnavailable(_)));
    }

    #[cfg(feature = "gemini")]
    #[test]
    fn candidate_text_joins_parts() {
        let json = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "A flat " }, { "text": "bar chart" }] } }]
        });
        assert_eq!(candidate_text(&json), "A flat bar chart");
        assert_eq!(candidate_text(&serde_json::json!({ "candidates": [] })), "");
    }

    #[cfg(feature = "gemini")]
    #[test]
    fn request_carries_grounding_and_instruction() {
        let body = GeminiRefiner::request_body("Data (date:count): 2024-01-01:3");
        let user = body.pointer("/contents/0/parts/0/text").and_then(|v| v.as_str()).unwrap();
        assert!(user.starts_with("Data (date:count): 2024-01-01:3"));
        assert!(user.ends_with("black axes."));
        let system = body.pointer("/systemInstruction/parts/0/text").and_then(|v| v.as_str()).unwrap();
        assert!(system.contains("no markdown"));
    }
}
