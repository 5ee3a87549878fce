//! Model invoker: hands a prompt to the local language model.
//!
//! The production backend shells out to a llama.cpp-style CLI. Failures never escape as
//! errors; they are folded into a [`ModelReply`] tagged [`ExchangeOutcome::Error`] so the
//! conversation keeps a record of what went wrong.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::profile::ExchangeOutcome;

/// Default cap on generated tokens (`-n`).
pub const DEFAULT_MAX_TOKENS: u32 = 512;
/// Default sampling temperature (`--temp`).
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default wall-clock limit for one model run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Text produced by a model run plus whether it is a genuine answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReply {
    pub text: String,
    pub outcome: ExchangeOutcome,
}

impl ModelReply {
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: ExchangeOutcome::Answer,
        }
    }

    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: ExchangeOutcome::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_error()
    }
}

/// Anything that can turn a prompt into a reply. Implementations must not panic or
/// return early with an error: every failure is a [`ModelReply::failed`].
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> ModelReply;
}

// ---------------------------------------------------------------------------
// llama.cpp CLI backend
// ---------------------------------------------------------------------------

/// Runs `<executable> -m <model> -p <prompt> -n <max_tokens> --temp <temperature>`.
///
/// The child is killed if the returned future is dropped, so an aborted caller (for example
/// a disconnected HTTP client) does not leave the model running until the timeout.
#[derive(Debug, Clone)]
pub struct LlamaCliBackend {
    executable: PathBuf,
    model_path: PathBuf,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl LlamaCliBackend {
    pub fn new(executable: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            model_path: model_path.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments passed after the executable.
    pub fn command_args(&self, prompt: &str) -> Vec<OsString> {
        vec![
            "-m".into(),
            self.model_path.clone().into_os_string(),
            "-p".into(),
            prompt.into(),
            "-n".into(),
            self.max_tokens.to_string().into(),
            "--temp".into(),
            self.temperature.to_string().into(),
        ]
    }
}

#[async_trait]
impl ModelBackend for LlamaCliBackend {
    fn name(&self) -> &str {
        "llama-cli"
    }

    async fn complete(&self, prompt: &str) -> ModelReply {
        let mut cmd = tokio::process::Command::new(&self.executable);
        cmd.args(self.command_args(prompt))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(executable = %self.executable.display(), error = %e, "failed to launch model");
                return ModelReply::failed(format!("Error querying LLM: {}", e));
            }
        };

        // On timeout the wait future is dropped with the child, which kills it.
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs_f64(), "model timed out");
                ModelReply::failed(format!(
                    "Error querying LLM: model did not respond within {} seconds",
                    self.timeout.as_secs_f64()
                ))
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to collect model output");
                ModelReply::failed(format!("Error querying LLM: {}", e))
            }
            Ok(Ok(output)) if output.status.success() => {
                ModelReply::answer(String::from_utf8_lossy(&output.stdout).trim())
            }
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::warn!(status = %output.status, "model exited with failure");
                ModelReply::failed(format!("Error: {}", stderr))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

const MOCK_REPLY: &str = "[mock] The guide listens in silence; no local model is configured.";

/// Canned replies without spawning anything (`llm_mode = "mock"`). Records every prompt.
#[derive(Debug)]
pub struct MockBackend {
    reply: ModelReply,
    prompts: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::replying(ModelReply::answer(MOCK_REPLY))
    }

    pub fn replying(reply: ModelReply) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &str) -> ModelReply {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.reply.clone()
    }
}
