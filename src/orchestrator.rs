//! Sequences prompt composition and the FusionBrain job lifecycle.
//!
//! compose → availability → pipeline → submit → poll → decode. Stages run one
//! after another; the first failure aborts the run and nothing is retried
//! except status polling for the submitted job.
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::Instrument;
use uuid::Uuid;

use crate::commits::DailyCount;
use crate::config::{Config, PollPolicy};
use crate::error::AppResult;
use crate::fusionbrain::PipelineClient;
use crate::prompt::{select_refiner, PromptComposer, Provenance};

pub const CHART_WIDTH: u32 = 1024;
pub const CHART_HEIGHT: u32 = 768;

#[derive(Clone)]
pub struct JobOrchestrator {
    composer: PromptComposer,
    client: PipelineClient,
    poll: PollPolicy,
}

impl JobOrchestrator {
    pub fn new(composer: PromptComposer, client: PipelineClient, poll: PollPolicy) -> Self {
        JobOrchestrator { composer, client, poll }
    }

    /// Wire everything from configuration, sharing one HTTP client.
    pub fn from_config(config: &Config) -> Self {
        let http = reqwest::Client::new();
        let composer = PromptComposer::new(select_refiner(config, http.clone()));
        let client = PipelineClient::new(config.fusionbrain_url.clone(), config.credentials.clone()).with_http_client(http);
        JobOrchestrator::new(composer, client, config.poll)
    }

    pub fn composer(&self) -> &PromptComposer {
        &self.composer
    }

    pub fn client(&self) -> &PipelineClient {
        &self.client
    }

    /// Run one full build and return the decoded image bytes.
    ///
    /// Every call submits a new remote job; concurrent calls are independent.
    pub async fn produce_image(&self, data: &[DailyCount]) -> AppResult<Vec<u8>> {
        let build_id = Uuid::new_v4();
        let span = tracing::info_span!("produce_image", %build_id);
        self.run(data).instrument(span).await
    }

    async fn run(&self, data: &[DailyCount]) -> AppResult<Vec<u8>> {
        let prompt = self.composer.compose(data).await;
        tracing::info!(
            llm = prompt.provenance == Provenance::LlmComposed,
            chars = prompt.text.len(),
            "Prompt composed"
        );

        self.client.check_availability().await?;
        let pipeline_id = self.client.resolve_pipeline().await?;
        let job_id = self.client.submit(&pipeline_id, &prompt.text, CHART_WIDTH, CHART_HEIGHT).await?;
        let payload = self.client.poll(&job_id, self.poll.attempts, self.poll.delay).await?;

        let bytes = decode_payload(&payload)?;
        tracing::info!(%job_id, bytes = bytes.len(), "Chart image received");
        Ok(bytes)
    }
}

/// Standard base64 with any ASCII whitespace (line wrapping included) ignored.
fn decode_payload(payload: &str) -> AppResult<Vec<u8>> {
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(BASE64.decode(compact)?)
}
