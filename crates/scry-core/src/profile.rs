//! Spiritual profile: the single persisted document behind every interaction.
//!
//! The profile carries three independent affinity scores, a depth level, a primary goal
//! and the most recent question/answer exchanges. [`ProfileStore`] owns the JSON file;
//! every mutation rewrites the whole document (write to a sibling `.tmp`, then rename).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ScryError, ScryResult};

/// Lowest accepted affinity / depth level.
pub const MIN_LEVEL: i64 = 1;
/// Highest accepted affinity / depth level.
pub const MAX_LEVEL: i64 = 5;
/// Number of exchanges kept in `conversation_history`.
pub const HISTORY_LIMIT: usize = 10;

const DEFAULT_AFFINITY: i64 = 3;
const DEFAULT_DEPTH: i64 = 2;

fn default_affinity() -> i64 {
    DEFAULT_AFFINITY
}

fn default_depth() -> i64 {
    DEFAULT_DEPTH
}

fn default_goal() -> String {
    Goal::default().as_str().to_string()
}

/// Clamp a user-supplied level into `[MIN_LEVEL, MAX_LEVEL]`.
pub fn clamp_level(value: i64) -> i64 {
    value.clamp(MIN_LEVEL, MAX_LEVEL)
}

// ---------------------------------------------------------------------------
// Goal
// ---------------------------------------------------------------------------

/// What the user wants out of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    /// Clear explanations and intellectual insight.
    #[default]
    Understanding,
    /// Exercises and daily applications.
    Practice,
    /// Poetic, uplifting perspectives.
    Inspiration,
    /// Compassionate guidance and support.
    Counsel,
}

impl Goal {
    pub const ALL: [Goal; 4] = [Goal::Understanding, Goal::Practice, Goal::Inspiration, Goal::Counsel];

    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::Understanding => "understanding",
            Goal::Practice => "practice",
            Goal::Inspiration => "inspiration",
            Goal::Counsel => "counsel",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "understanding" => Some(Goal::Understanding),
            "practice" => Some(Goal::Practice),
            "inspiration" => Some(Goal::Inspiration),
            "counsel" => Some(Goal::Counsel),
            _ => None,
        }
    }

    /// Comma-separated list of accepted goal names, for prompts and error messages.
    pub fn choices() -> String {
        Goal::ALL.iter().map(Goal::as_str).collect::<Vec<_>>().join(", ")
    }
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// Whether an exchange holds a real model answer or an error report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeOutcome {
    #[default]
    Answer,
    Error,
}

impl ExchangeOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ExchangeOutcome::Error)
    }
}

/// One question/answer turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// RFC 3339 creation time. Kept as text so older documents with naive timestamps still load.
    pub timestamp: String,
    pub question: String,
    pub answer: String,
    /// Absent in documents written before the tag existed; those count as answers.
    #[serde(default)]
    pub outcome: ExchangeOutcome,
}

impl Exchange {
    /// New exchange stamped with the current local time.
    pub fn now(question: impl Into<String>, answer: impl Into<String>, outcome: ExchangeOutcome) -> Self {
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            question: question.into(),
            answer: answer.into(),
            outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "default_affinity")]
    pub scientific: i64,
    #[serde(default = "default_affinity")]
    pub mystical: i64,
    #[serde(default = "default_affinity")]
    pub philosophical: i64,
    #[serde(default = "default_depth")]
    pub depth: i64,
    /// Free text on disk; unknown goals load fine and fall back to generic guidance in prompts.
    #[serde(default = "default_goal")]
    pub goal: String,
    #[serde(default)]
    pub conversation_history: Vec<Exchange>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            scientific: DEFAULT_AFFINITY,
            mystical: DEFAULT_AFFINITY,
            philosophical: DEFAULT_AFFINITY,
            depth: DEFAULT_DEPTH,
            goal: default_goal(),
            conversation_history: Vec::new(),
        }
    }
}

impl Profile {
    /// Append an exchange and evict the oldest entries beyond [`HISTORY_LIMIT`].
    pub fn push_exchange(&mut self, exchange: Exchange) {
        self.conversation_history.push(exchange);
        let len = self.conversation_history.len();
        if len > HISTORY_LIMIT {
            self.conversation_history.drain(..len - HISTORY_LIMIT);
        }
    }

    /// The last `n` exchanges (or fewer), oldest first.
    pub fn recent_exchanges(&self, n: usize) -> &[Exchange] {
        let start = self.conversation_history.len().saturating_sub(n);
        &self.conversation_history[start..]
    }

    pub fn get(&self, setting: ProfileSetting) -> String {
        match setting {
            ProfileSetting::Scientific => self.scientific.to_string(),
            ProfileSetting::Mystical => self.mystical.to_string(),
            ProfileSetting::Philosophical => self.philosophical.to_string(),
            ProfileSetting::Depth => self.depth.to_string(),
            ProfileSetting::Goal => self.goal.clone(),
        }
    }

    /// Store an already validated value.
    pub fn set(&mut self, value: SettingValue) {
        match value {
            SettingValue::Level(setting, level) => {
                let level = clamp_level(level);
                match setting {
                    ProfileSetting::Scientific => self.scientific = level,
                    ProfileSetting::Mystical => self.mystical = level,
                    ProfileSetting::Philosophical => self.philosophical = level,
                    ProfileSetting::Depth => self.depth = level,
                    // Level values are only produced for numeric settings.
                    ProfileSetting::Goal => {}
                }
            }
            SettingValue::Goal(goal) => self.goal = goal.as_str().to_string(),
        }
    }

    /// Human-readable block used by the console "show profile" option.
    pub fn summary(&self) -> String {
        format!(
            "=== Your Spiritual Profile ===\n\
             Scientific Inclination: {}/5\n\
             Mystical Inclination: {}/5\n\
             Philosophical Inclination: {}/5\n\
             Depth Level: {}/5\n\
             Primary Goal: {}\n\
             ==============================",
            self.scientific, self.mystical, self.philosophical, self.depth, self.goal
        )
    }
}

// ---------------------------------------------------------------------------
// Settings (allow-listed updater)
// ---------------------------------------------------------------------------

/// The profile fields a user may change. `conversation_history` is not one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSetting {
    Scientific,
    Mystical,
    Philosophical,
    Depth,
    Goal,
}

impl ProfileSetting {
    pub const ALL: [ProfileSetting; 5] = [
        ProfileSetting::Scientific,
        ProfileSetting::Mystical,
        ProfileSetting::Philosophical,
        ProfileSetting::Depth,
        ProfileSetting::Goal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileSetting::Scientific => "scientific",
            ProfileSetting::Mystical => "mystical",
            ProfileSetting::Philosophical => "philosophical",
            ProfileSetting::Depth => "depth",
            ProfileSetting::Goal => "goal",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        ProfileSetting::ALL.into_iter().find(|s| s.as_str() == key)
    }

    /// Check the JSON type (and for goals, the name) of a candidate value. Levels are clamped, not rejected.
    pub fn parse_value(&self, value: &serde_json::Value) -> ScryResult<SettingValue> {
        match self {
            ProfileSetting::Goal => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| ScryError::invalid_setting(self.as_str(), "expected a string"))?;
                let goal = Goal::from_str(raw).ok_or_else(|| {
                    ScryError::invalid_setting(
                        self.as_str(),
                        format!("unknown goal {:?} (expected one of: {})", raw, Goal::choices()),
                    )
                })?;
                Ok(SettingValue::Goal(goal))
            }
            _ => {
                let level = value
                    .as_i64()
                    .ok_or_else(|| ScryError::invalid_setting(self.as_str(), "expected an integer"))?;
                Ok(SettingValue::Level(*self, clamp_level(level)))
            }
        }
    }
}

impl fmt::Display for ProfileSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated value ready to be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingValue {
    Level(ProfileSetting, i64),
    Goal(Goal),
}

/// Result of a single setting update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingOutcome {
    Updated { setting: ProfileSetting, value: String },
    NotFound { key: String },
}

impl SettingOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, SettingOutcome::Updated { .. })
    }
}

impl fmt::Display for SettingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingOutcome::Updated { setting, value } => write!(f, "Updated {} to {}", setting, value),
            SettingOutcome::NotFound { .. } => f.write_str("Setting not found"),
        }
    }
}

// ---------------------------------------------------------------------------
// ProfileStore
// ---------------------------------------------------------------------------

/// JSON file holding the profile. No cross-process locking: the last writer wins.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the profile, creating and persisting the default one when the file is absent.
    /// A file that exists but does not parse is an error; it is never reset.
    pub fn load(&self) -> ScryResult<Profile> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| ScryError::MalformedProfile {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let profile = Profile::default();
                self.save(&profile)?;
                tracing::info!(path = %self.path.display(), "created default profile");
                Ok(profile)
            }
            Err(e) => Err(ScryError::persistence(&self.path, e)),
        }
    }

    /// Replace the document with `profile` (pretty JSON, write-then-rename).
    pub fn save(&self, profile: &Profile) -> ScryResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ScryError::persistence(parent, e))?;
        }
        let json = serde_json::to_string_pretty(profile).map_err(|source| ScryError::MalformedProfile {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| ScryError::persistence(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| ScryError::persistence(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), history = profile.conversation_history.len(), "profile saved");
        Ok(())
    }

    /// [`ProfileStore::save`] on the blocking pool, for callers on the async runtime.
    pub async fn persist(&self, profile: Profile) -> ScryResult<()> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.save(&profile))
            .await
            .map_err(|e| ScryError::persistence(&self.path, std::io::Error::other(e)))?
    }

    /// Change one allow-listed setting and persist. Unknown keys leave the profile untouched.
    pub fn update_setting(
        &self,
        profile: &mut Profile,
        key: &str,
        value: &serde_json::Value,
    ) -> ScryResult<SettingOutcome> {
        let Some(setting) = ProfileSetting::from_key(key) else {
            tracing::debug!(key, "ignoring unknown profile setting");
            return Ok(SettingOutcome::NotFound { key: key.to_string() });
        };
        let parsed = setting.parse_value(value)?;
        let mut updated = profile.clone();
        updated.set(parsed);
        self.save(&updated)?;
        *profile = updated;
        Ok(SettingOutcome::Updated {
            setting,
            value: profile.get(setting),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exchange(n: usize) -> Exchange {
        Exchange {
            timestamp: format!("2026-01-01T00:00:{:02}+00:00", n),
            question: format!("q{}", n),
            answer: format!("a{}", n),
            outcome: ExchangeOutcome::Answer,
        }
    }

    #[test]
    fn test_history_keeps_ten_most_recent() {
        let mut profile = Profile::default();
        for n in 0..11 {
            profile.push_exchange(exchange(n));
        }
        assert_eq!(profile.conversation_history.len(), HISTORY_LIMIT);
        let questions: Vec<_> = profile.conversation_history.iter().map(|e| e.question.clone()).collect();
        let expected: Vec<_> = (1..11).map(|n| format!("q{}", n)).collect();
        assert_eq!(questions, expected);
    }

    #[test]
    fn test_recent_exchanges_handles_short_history() {
        let mut profile = Profile::default();
        assert!(profile.recent_exchanges(3).is_empty());
        profile.push_exchange(exchange(1));
        assert_eq!(profile.recent_exchanges(3).len(), 1);
    }

    #[test]
    fn test_goal_parse() {
        assert_eq!(Goal::from_str(" Practice "), Some(Goal::Practice));
        assert_eq!(Goal::from_str("counsel"), Some(Goal::Counsel));
        assert_eq!(Goal::from_str("enlightenment"), None);
    }

    #[test]
    fn test_setting_values_are_clamped() {
        let parsed = ProfileSetting::Depth.parse_value(&json!(9)).unwrap();
        assert_eq!(parsed, SettingValue::Level(ProfileSetting::Depth, 5));
        let parsed = ProfileSetting::Mystical.parse_value(&json!(-2)).unwrap();
        assert_eq!(parsed, SettingValue::Level(ProfileSetting::Mystical, 1));
    }

    #[test]
    fn test_setting_type_is_checked() {
        let err = ProfileSetting::Scientific.parse_value(&json!("high")).unwrap_err();
        assert!(err.is_invalid_input());
        let err = ProfileSetting::Goal.parse_value(&json!(3)).unwrap_err();
        assert!(err.is_invalid_input());
        let err = ProfileSetting::Goal.parse_value(&json!("enlightenment")).unwrap_err();
        assert!(err.to_string().contains("enlightenment"));
    }

    #[test]
    fn test_conversation_history_is_not_a_setting() {
        assert_eq!(ProfileSetting::from_key("conversation_history"), None);
        assert_eq!(ProfileSetting::from_key("depth"), Some(ProfileSetting::Depth));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let profile: Profile = serde_json::from_str(r#"{"goal": "practice"}"#).unwrap();
        assert_eq!(profile.goal, "practice");
        assert_eq!(profile.depth, 2);
        assert_eq!(profile.scientific, 3);
        assert!(profile.conversation_history.is_empty());
    }

    #[test]
    fn test_untagged_exchange_counts_as_answer() {
        let exchange: Exchange = serde_json::from_str(
            r#"{"timestamp": "2024-05-01T10:00:00.123456", "question": "q", "answer": "a"}"#,
        )
        .unwrap();
        assert_eq!(exchange.outcome, ExchangeOutcome::Answer);
    }

    #[test]
    fn test_setting_outcome_messages() {
        let updated = SettingOutcome::Updated {
            setting: ProfileSetting::Goal,
            value: "practice".into(),
        };
        assert_eq!(updated.to_string(), "Updated goal to practice");
        let missing = SettingOutcome::NotFound { key: "mood".into() };
        assert_eq!(missing.to_string(), "Setting not found");
    }
}
