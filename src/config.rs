//! Env-driven configuration for the service and library.
//!
//! Values are read from the process environment once at startup; `dotenv` is
//! loaded on demand by the binaries. The resulting [`Config`] is immutable and
//! handed to the client and orchestrator explicitly.
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub const DEFAULT_FUSIONBRAIN_URL: &str = "https://api-key.fusionbrain.ai/";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const PNG_NAME: &str = "commit_chart.png";

/// FusionBrain key pair. Empty values are reported on first use, not at load.
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Credentials { api_key: api_key.into(), secret_key: secret_key.into() }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn has_secret_key(&self) -> bool {
        !self.secret_key.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &if self.has_api_key() { "***" } else { "<unset>" })
            .field("secret_key", &if self.has_secret_key() { "***" } else { "<unset>" })
            .finish()
    }
}

/// Fixed-interval status polling: `attempts` queries, `delay` between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy { attempts: 25, delay: Duration::from_secs(3) }
    }
}

#[derive(Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub fusionbrain_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_url: String,
    pub gemini_model: String,
    pub repo_path: PathBuf,
    pub out_dir: PathBuf,
    pub api_host: String,
    pub api_port: String,
    pub poll: PollPolicy,
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> AppResult<Self> {
        let out_dir = match env::var("CHART_OUT_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => env::current_dir()?,
        };
        let defaults = PollPolicy::default();
        let poll = PollPolicy {
            attempts: parse_var("POLL_ATTEMPTS", defaults.attempts)?,
            delay: Duration::from_secs(parse_var("POLL_DELAY_SECS", defaults.delay.as_secs())?),
        };
        Ok(Config {
            credentials: Credentials::new(
                env::var("KANDINSKY_API_KEY").unwrap_or_default(),
                env::var("KANDINSKY_SECRET_KEY").unwrap_or_default(),
            ),
            fusionbrain_url: env::var("FUSIONBRAIN_URL").unwrap_or_else(|_| DEFAULT_FUSIONBRAIN_URL.to_string()),
            gemini_api_key: env::var("GOOGLE_API_KEY")
                .or_else(|_| env::var("GEMINI_API_KEY"))
                .ok()
                .filter(|k| !k.is_empty()),
            gemini_url: env::var("GEMINI_URL").unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string()),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            repo_path: PathBuf::from(env::var("REPO_PATH").unwrap_or_else(|_| ".".to_string())),
            out_dir,
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            api_port: env::var("API_PORT").unwrap_or_else(|_| "8766".to_string()),
            poll,
        })
    }

    /// Where the built chart is written and served from.
    pub fn png_path(&self) -> PathBuf {
        self.out_dir.join(PNG_NAME)
    }

    /// Report which variables are set. Secret values are never printed.
    pub fn print_env_vars() {
        for name in ["KANDINSKY_API_KEY", "KANDINSKY_SECRET_KEY", "GOOGLE_API_KEY", "GEMINI_API_KEY"] {
            let state = match env::var(name) {
                Ok(v) if !v.is_empty() => "<set>",
                _ => "<unset>",
            };
            println!("{}: {}", name, state);
        }
        for name in ["FUSIONBRAIN_URL", "GEMINI_MODEL", "REPO_PATH", "CHART_OUT_DIR", "API_HOST", "API_PORT"] {
            println!("{}: {}", name, env::var(name).unwrap_or_else(|_| "<unset>".to_string()));
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a non-negative integer, got '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_poll_policy_matches_documented_values() {
        let policy = PollPolicy::default();
        assert_eq!(policy.attempts, 25);
        assert_eq!(policy.delay, Duration::from_secs(3));
    }

    #[test]
    fn credentials_debug_hides_values() {
        let creds = Credentials::new("abc123", "");
        let shown = format!("{:?}", creds);
        assert!(!shown.contains("abc123"));
        assert!(shown.contains("<unset>"));
    }

    #[test]
    fn parse_var_rejects_garbage() {
        std::env::set_var("COMMIT_CHART_TEST_ATTEMPTS", "many");
        let res: AppResult<u32> = parse_var("COMMIT_CHART_TEST_ATTEMPTS", 25);
        assert!(matches!(res, Err(AppError::Config(_))));
        std::env::remove_var("COMMIT_CHART_TEST_ATTEMPTS");
        assert_eq!(parse_var("COMMIT_CHART_TEST_ATTEMPTS", 25u32).unwrap(), 25);
    }
}
