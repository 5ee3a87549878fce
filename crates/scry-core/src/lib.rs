//! scry-core: Spirit Scry core library (profile store, prompt builder, model invoker, orchestrator).
//!
//! The console and gateway add-ons are thin shells around [`Orchestrator`].

mod config;
mod error;
mod invoker;
mod orchestrator;
mod profile;
pub mod prompts;

pub use config::{expand_home, ScryConfig};
pub use error::{ScryError, ScryResult};
pub use invoker::{
    LlamaCliBackend, MockBackend, ModelBackend, ModelReply, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT,
};
pub use orchestrator::{Orchestrator, UpdateReport};
pub use profile::{
    clamp_level, Exchange, ExchangeOutcome, Goal, Profile, ProfileSetting, ProfileStore, SettingOutcome,
    SettingValue, HISTORY_LIMIT, MAX_LEVEL, MIN_LEVEL,
};
pub use prompts::build_prompt;

