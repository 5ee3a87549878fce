//! Spirit Scry configuration.
//!
//! Precedence: environment (`SCRY__*`) > TOML file (`SCRY_CONFIG`, default `config/scry.toml`) > defaults.
//!
//! | Key | Env | Default |
//! |-----|-----|---------|
//! | profile_path | SCRY__PROFILE_PATH | profile.json |
//! | llm_mode | SCRY__LLM_MODE | llama ("llama" \| "mock") |
//! | llama_path | SCRY__LLAMA_PATH | ~/llama.cpp/main |
//! | model_path | SCRY__MODEL_PATH | ~/llama.cpp/Meta-Llama-3-8B-Instruct-Q4_K_M.gguf |
//! | max_tokens | SCRY__MAX_TOKENS | 512 |
//! | temperature | SCRY__TEMPERATURE | 0.7 |
//! | timeout_secs | SCRY__TIMEOUT_SECS | 300 |
//! | host | SCRY__HOST | 0.0.0.0 |
//! | port | SCRY__PORT | 5000 |

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScryResult;
use crate::invoker::{LlamaCliBackend, MockBackend, ModelBackend};

const DEFAULT_CONFIG_PATH: &str = "config/scry";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScryConfig {
    pub profile_path: String,
    /// "llama" runs the external CLI; "mock" answers with a canned reply.
    pub llm_mode: String,
    pub llama_path: String,
    pub model_path: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub host: String,
    pub port: u16,
}

impl Default for ScryConfig {
    fn default() -> Self {
        Self {
            profile_path: "profile.json".to_string(),
            llm_mode: "llama".to_string(),
            llama_path: "~/llama.cpp/main".to_string(),
            model_path: "~/llama.cpp/Meta-Llama-3-8B-Instruct-Q4_K_M.gguf".to_string(),
            max_tokens: crate::invoker::DEFAULT_MAX_TOKENS,
            temperature: crate::invoker::DEFAULT_TEMPERATURE,
            timeout_secs: crate::invoker::DEFAULT_TIMEOUT.as_secs(),
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ScryConfig {
    /// Load from the optional config file and `SCRY__*` environment variables.
    pub fn load() -> ScryResult<Self> {
        let config_path = std::env::var("SCRY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`ScryConfig::load`] with an explicit file. A missing file is not an error.
    pub fn load_from(path: &Path) -> ScryResult<Self> {
        let defaults = ScryConfig::default();
        let builder = config::Config::builder()
            .set_default("profile_path", defaults.profile_path)?
            .set_default("llm_mode", defaults.llm_mode)?
            .set_default("llama_path", defaults.llama_path)?
            .set_default("model_path", defaults.model_path)?
            .set_default("max_tokens", i64::from(defaults.max_tokens))?
            .set_default("temperature", f64::from(defaults.temperature))?
            .set_default("timeout_secs", defaults.timeout_secs as i64)?
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("SCRY").separator("__"));

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn is_mock(&self) -> bool {
        self.llm_mode.trim().eq_ignore_ascii_case("mock")
    }

    pub fn profile_path(&self) -> PathBuf {
        expand_home(&self.profile_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Backend selected by `llm_mode`.
    pub fn model_backend(&self) -> Arc<dyn ModelBackend> {
        if self.is_mock() {
            return Arc::new(MockBackend::new());
        }
        Arc::new(
            LlamaCliBackend::new(expand_home(&self.llama_path), expand_home(&self.model_path))
                .with_max_tokens(self.max_tokens)
                .with_temperature(self.temperature)
                .with_timeout(self.timeout()),
        )
    }
}

/// Expand a leading `~` to the home directory. Paths without one, or hosts without a home, pass through.
pub fn expand_home(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScryConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.timeout_secs, 300);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert!(!config.is_mock());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scry.toml");
        std::fs::write(&path, "llm_mode = \"mock\"\nprofile_path = \"data/me.json\"\ntimeout_secs = 30\n").unwrap();
        let config = ScryConfig::load_from(&path).unwrap();
        assert!(config.is_mock());
        assert_eq!(config.profile_path(), PathBuf::from("data/me.json"));
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.model_backend().name(), "mock");
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("relative/~x"), PathBuf::from("relative/~x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/llama.cpp/main"), home.join("llama.cpp/main"));
        }
    }
}
