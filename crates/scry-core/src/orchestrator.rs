//! Interaction orchestrator: the one owner of the in-memory profile.
//!
//! Both front ends (console and gateway) go through [`Orchestrator`]. The profile sits
//! behind an async mutex; every read-modify-save happens under that lock so concurrent
//! requests cannot lose each other's updates. The model call itself runs unlocked.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::ScryResult;
use crate::invoker::{ModelBackend, ModelReply};
use crate::profile::{Exchange, Profile, ProfileSetting, ProfileStore, SettingOutcome, SettingValue};
use crate::prompts::build_prompt;

/// Which keys of a batch update were applied and which were ignored as unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub updated: Vec<String>,
    pub ignored: Vec<String>,
}

pub struct Orchestrator {
    store: ProfileStore,
    backend: Arc<dyn ModelBackend>,
    profile: Mutex<Profile>,
}

impl Orchestrator {
    /// Load (or create) the profile from `store` and wire it to `backend`.
    pub fn open(store: ProfileStore, backend: Arc<dyn ModelBackend>) -> ScryResult<Self> {
        let profile = store.load()?;
        Ok(Self::with_profile(store, backend, profile))
    }

    /// Use an already loaded profile. Nothing is written until the first mutation.
    pub fn with_profile(store: ProfileStore, backend: Arc<dyn ModelBackend>, profile: Profile) -> Self {
        Self {
            store,
            backend,
            profile: Mutex::new(profile),
        }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Snapshot of the current profile.
    pub async fn profile(&self) -> Profile {
        self.profile.lock().await.clone()
    }

    /// Build the prompt, run the model, record the exchange and persist.
    ///
    /// Model failures are recorded like answers (tagged as errors) and returned, not raised.
    /// Only a failed save is an `Err`; the in-memory history keeps the exchange either way.
    pub async fn ask(&self, question: &str) -> ScryResult<ModelReply> {
        let (prompt, depth) = {
            let profile = self.profile.lock().await;
            (build_prompt(&profile, question), profile.depth)
        };

        tracing::info!(depth, backend = self.backend.name(), question_len = question.len(), "asking model");
        let reply = self.backend.complete(&prompt).await;
        if reply.is_error() {
            tracing::warn!(reply = %reply.text, "model reply recorded as error");
        }

        let mut profile = self.profile.lock().await;
        profile.push_exchange(Exchange::now(question, reply.text.clone(), reply.outcome));
        self.store.persist(profile.clone()).await?;
        Ok(reply)
    }

    /// Change one setting. Unknown keys are reported as not found and change nothing.
    pub async fn update_setting(&self, key: &str, value: &serde_json::Value) -> ScryResult<SettingOutcome> {
        let Some(setting) = ProfileSetting::from_key(key) else {
            tracing::info!(key, "ignoring unknown profile setting");
            return Ok(SettingOutcome::NotFound { key: key.to_string() });
        };
        let parsed = setting.parse_value(value)?;

        let mut profile = self.profile.lock().await;
        let mut updated = profile.clone();
        updated.set(parsed);
        self.store.persist(updated.clone()).await?;
        *profile = updated;

        let outcome = SettingOutcome::Updated {
            setting,
            value: profile.get(setting),
        };
        tracing::info!(key, outcome = %outcome, "profile setting update");
        Ok(outcome)
    }

    /// Apply several settings at once. Every recognized key is validated first; if any value
    /// is invalid nothing is applied. Unknown keys are skipped and listed in the report.
    pub async fn update_settings(
        &self,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> ScryResult<UpdateReport> {
        let mut report = UpdateReport::default();
        let mut values: Vec<SettingValue> = Vec::new();
        for (key, value) in fields {
            match ProfileSetting::from_key(key) {
                Some(setting) => {
                    values.push(setting.parse_value(value)?);
                    report.updated.push(key.clone());
                }
                None => report.ignored.push(key.clone()),
            }
        }

        let mut profile = self.profile.lock().await;
        if !values.is_empty() {
            let mut updated = profile.clone();
            for value in values {
                updated.set(value);
            }
            self.store.persist(updated.clone()).await?;
            *profile = updated;
        }
        tracing::info!(updated = ?report.updated, ignored = ?report.ignored, "profile updated");
        Ok(report)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("store", &self.store)
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}

