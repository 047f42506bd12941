//! Thin HTTP client for the FusionBrain pipeline API.
//!
//! - `check_availability` queries `pipeline/availability`.
//! - `resolve_pipeline` lists `pipelines` and takes the first id.
//! - `submit` posts a single-image request to `pipeline/run`.
//! - `poll` queries `pipeline/status/{id}` until the job is terminal.
//!
//! Each call carries its own timeout and is attempted once; the only retry
//! is the status polling loop against an already-submitted job.
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde_json::Value;

use crate::config::Credentials;
use crate::error::{AppError, AppResult};
use crate::fusionbrain::types::{pipeline_ids, Availability, GenerationParams, Job, JobStatus};

const LIST_TIMEOUT: Duration = Duration::from_secs(20);
const RUN_TIMEOUT: Duration = Duration::from_secs(60);
const STATUS_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct PipelineClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl PipelineClient {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        PipelineClient { http: Client::new(), base_url: base, credentials }
    }

    /// Use a shared `reqwest::Client` (connection pooling).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint URL under `key/api/v1`. Each segment is percent-encoded on
    /// its own, so `/`, `?` or `#` inside one cannot change the target.
    fn url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(&format!("{}/key/api/v1", self.base_url))
            .map_err(|e| AppError::Config(format!("invalid FUSIONBRAIN_URL '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("FUSIONBRAIN_URL '{}' cannot be a base URL", self.base_url)))?
            .extend(segments);
        Ok(url)
    }

    fn auth_headers(&self) -> AppResult<HeaderMap> {
        if !self.credentials.has_api_key() || !self.credentials.has_secret_key() {
            return Err(AppError::Config(
                "KANDINSKY_API_KEY/KANDINSKY_SECRET_KEY are not set in the environment".to_string(),
            ));
        }
        let invalid = |name: &str| AppError::Config(format!("{} contains characters not allowed in a header", name));
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Key",
            HeaderValue::from_str(&format!("Key {}", self.credentials.api_key)).map_err(|_| invalid("KANDINSKY_API_KEY"))?,
        );
        headers.insert(
            "X-Secret",
            HeaderValue::from_str(&format!("Secret {}", self.credentials.secret_key))
                .map_err(|_| invalid("KANDINSKY_SECRET_KEY"))?,
        );
        Ok(headers)
    }

    async fn get_json(&self, segments: &[&str], timeout: Duration) -> AppResult<Value> {
        let headers = self.auth_headers()?;
        let response = self.http.get(self.url(segments)?).headers(headers).timeout(timeout).send().await?;
        read_json(response).await
    }

    /// Fail unless the service reports a healthy (or no) status.
    pub async fn check_availability(&self) -> AppResult<()> {
        let body = self.get_json(&["pipeline", "availability"], LIST_TIMEOUT).await?;
        let availability = Availability::from_body(&body);
        if !availability.is_healthy() {
            let status = availability.status_text();
            tracing::warn!(%status, "FusionBrain reports unavailable");
            return Err(AppError::ServiceUnavailable { status });
        }
        if availability.pipeline_status.is_none() {
            tracing::debug!("Availability response carried no status, treating as healthy");
        }
        Ok(())
    }

    /// Id of the first listed pipeline.
    pub async fn resolve_pipeline(&self) -> AppResult<String> {
        let body = self.get_json(&["pipelines"], LIST_TIMEOUT).await?;
        let ids = pipeline_ids(&body)
            .ok_or_else(|| AppError::InvalidResponse(format!("pipeline list is not an array: {}", body)))?;
        let first = ids.into_iter().next().ok_or(AppError::NoPipelineAvailable)?;
        if first.is_empty() {
            return Err(AppError::InvalidResponse(format!("first pipeline has no id: {}", body)));
        }
        tracing::info!(pipeline_id = %first, "Resolved pipeline");
        Ok(first)
    }

    /// Queue one image and return the job id assigned by the service.
    pub async fn submit(&self, pipeline_id: &str, prompt: &str, width: u32, height: u32) -> AppResult<String> {
        let headers = self.auth_headers()?;
        let params = GenerationParams::single_image(prompt, width, height);
        tracing::debug!(width = params.width, height = params.height, "Submitting generation request");

        let params_part = Part::text(serde_json::to_string(&params)?).mime_str("application/json")?;
        let form = Form::new().text("pipeline_id", pipeline_id.to_string()).part("params", params_part);

        let response = self
            .http
            .post(self.url(&["pipeline", "run"])?)
            .headers(headers)
            .timeout(RUN_TIMEOUT)
            .multipart(form)
            .send()
            .await?;
        let body = read_json(response).await?;

        // An overloaded queue answers with a status object instead of a job.
        match body.get("uuid").and_then(|v| v.as_str()).filter(|id| !id.is_empty()) {
            Some(id) => {
                tracing::info!(job_id = %id, "Job accepted");
                Ok(id.to_string())
            }
            None => Err(AppError::SubmissionRejected(body.to_string())),
        }
    }

    /// Single status query.
    pub async fn job(&self, job_id: &str) -> AppResult<Job> {
        let body = self.get_json(&["pipeline", "status", job_id], STATUS_TIMEOUT).await?;
        let job = Job::from_status(&body);
        if job.status == JobStatus::Fail && job.error.is_none() {
            return Ok(Job { error: Some(body.to_string()), ..job });
        }
        Ok(job)
    }

    /// Query status up to `max_attempts` times, sleeping `delay` between
    /// queries, and return the first base64 payload once `DONE`.
    pub async fn poll(&self, job_id: &str, max_attempts: u32, delay: Duration) -> AppResult<String> {
        for attempt in 1..=max_attempts {
            if attempt > 1 {
                tokio::time::sleep(delay).await;
            }
            let job = self.job(job_id).await?;
            match job.status {
                JobStatus::Done => {
                    tracing::info!(%job_id, attempt, "Job done");
                    return job.files.into_iter().next().ok_or(AppError::EmptyResult);
                }
                JobStatus::Fail => {
                    let diagnostic = job.error.unwrap_or_default();
                    tracing::warn!(%job_id, attempt, %diagnostic, "Job failed");
                    return Err(AppError::RemoteJobFailed(diagnostic));
                }
                JobStatus::Pending(status) => {
                    tracing::debug!(%job_id, attempt, %status, "Job not finished");
                }
            }
        }
        Err(AppError::PollTimeout { attempts: max_attempts })
    }
}

async fn read_json(response: Response) -> AppResult<Value> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
        tracing::error!(status, %body, "FusionBrain request failed");
        return Err(AppError::Http { status, body });
    }
    Ok(response.json().await?)
}
