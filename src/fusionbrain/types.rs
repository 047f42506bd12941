//! Request and response shapes of the FusionBrain pipeline API.
use serde::Serialize;
use serde_json::Value;

/// Status tokens the availability endpoint uses for a working service.
pub const HEALTHY_STATUSES: &[&str] = &["ENABLED", "AVAILABLE", "OK"];

/// The API rejects either side above this.
pub const MAX_SIDE: u32 = 1024;

/// The `pipeline_status` field of an availability response, kept raw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Availability {
    pub pipeline_status: Option<Value>,
}

impl Availability {
    /// `null` is read the same as a missing field.
    pub fn from_body(body: &Value) -> Self {
        Availability { pipeline_status: body.get("pipeline_status").filter(|v| !v.is_null()).cloned() }
    }

    /// A missing or empty status counts as healthy. Non-string values never do.
    pub fn is_healthy(&self) -> bool {
        match &self.pipeline_status {
            None => true,
            Some(Value::String(status)) => status.is_empty() || HEALTHY_STATUSES.contains(&status.as_str()),
            Some(_) => false,
        }
    }

    /// Status as reported, for diagnostics.
    pub fn status_text(&self) -> String {
        match &self.pipeline_status {
            None => String::new(),
            Some(Value::String(status)) => status.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// The `params` part of a run request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    #[serde(rename = "type")]
    pub kind: String,
    pub num_images: u32,
    pub width: u32,
    pub height: u32,
    pub generate_params: GenerateQuery,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateQuery {
    pub query: String,
}

impl GenerationParams {
    /// One image, each side clamped to [`MAX_SIDE`].
    pub fn single_image(prompt: &str, width: u32, height: u32) -> Self {
        GenerationParams {
            kind: "GENERATE".to_string(),
            num_images: 1,
            width: width.min(MAX_SIDE),
            height: height.min(MAX_SIDE),
            generate_params: GenerateQuery { query: prompt.to_string() },
        }
    }
}

/// Remote job state. Anything other than `DONE`/`FAIL` keeps polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending(String),
    Done,
    Fail,
}

impl JobStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("DONE") => JobStatus::Done,
            Some("FAIL") => JobStatus::Fail,
            other => JobStatus::Pending(other.unwrap_or("").to_string()),
        }
    }
}

/// Client-side view of one remote generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub status: JobStatus,
    /// Base64-encoded images, only meaningful once `DONE`.
    pub files: Vec<String>,
    pub error: Option<String>,
}

impl Job {
    /// Build from a status response, one field at a time.
    ///
    /// A field of the wrong type is dropped on its own and never changes the
    /// status read from `status`. Non-string entries in `result.files` are
    /// skipped.
    pub fn from_status(body: &Value) -> Self {
        let files = body
            .pointer("/result/files")
            .and_then(Value::as_array)
            .map(|files| files.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        Job {
            status: JobStatus::parse(body.get("status").and_then(Value::as_str)),
            files,
            error: body
                .get("errorDescription")
                .and_then(Value::as_str)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
        }
    }
}

/// Pipeline ids in list order; ids may be strings or numbers.
///
/// `None` when the body is not a list. Entries without an id map to "".
pub fn pipeline_ids(body: &Value) -> Option<Vec<String>> {
    let list = body.as_array()?;
    Some(
        list.iter()
            .map(|entry| match entry.get("id") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            })
            .collect(),
    )
}
