//! User memory persisted as key-value records
//!
//! Holds the single user profile and a bounded, FIFO log of session
//! summaries. Every mutation is written through to the backing store;
//! persistence failures are logged and never surface to callers.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::conversation::Turn;

use super::storage::KvStore;
use super::summary::{build_context, extract_topics, summarize_transcript};

/// Record key for the user profile
pub const PROFILE_KEY: &str = "helpfulat_user_profile";

/// Record key for the session summary log
pub const SUMMARIES_KEY: &str = "helpfulat_session_summaries";

/// Maximum number of summaries kept in the log
pub const MAX_SUMMARIES: usize = 10;

/// Number of summaries folded into the profile's history cache
const HISTORY_WINDOW: usize = 5;

const DEFAULT_NAME: &str = "User";

/// Current time at the precision records are stored with
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Record timestamps are epoch milliseconds; RFC 3339 strings are also read
mod epoch_millis {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stamp {
        Millis(i64),
        Fractional(f64),
        Text(DateTime<Utc>),
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.timestamp_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let millis = match Stamp::deserialize(deserializer)? {
            Stamp::Millis(ms) => ms,
            Stamp::Fractional(ms) => ms as i64,
            Stamp::Text(date) => return Ok(date),
        };
        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", millis)))
    }
}

/// The installation's single user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub conversation_history: String,
    #[serde(with = "epoch_millis")]
    pub last_updated: DateTime<Utc>,
}

impl UserProfile {
    fn fresh() -> Self {
        Self {
            id: format!("user_{}", Uuid::new_v4().simple()),
            name: DEFAULT_NAME.to_string(),
            interests: Vec::new(),
            conversation_history: String::new(),
            last_updated: now(),
        }
    }
}

/// Synopsis of a finished chat session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub title: String,
    #[serde(with = "epoch_millis")]
    pub date: DateTime<Utc>,
    pub personality: String,
    pub summary: String,
    pub topics: Vec<String>,
}

/// Fixed-capacity log of summaries, oldest first
///
/// Pushing past capacity drops the oldest entry. Reads never reorder.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SummaryLog {
    entries: VecDeque<SessionSummary>,
}

impl SummaryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a summary, returning the evicted one if the log was full
    pub fn push(&mut self, summary: SessionSummary) -> Option<SessionSummary> {
        self.entries.push_back(summary);
        if self.entries.len() > MAX_SUMMARIES {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&SessionSummary> {
        self.entries.back()
    }

    pub fn to_vec(&self) -> Vec<SessionSummary> {
        self.entries.iter().cloned().collect()
    }

    /// `"{title}: {summary}"` lines for the most recent entries, newest last
    fn history_cache(&self) -> String {
        let start = self.entries.len().saturating_sub(HISTORY_WINDOW);
        self.entries
            .iter()
            .skip(start)
            .map(|s| format!("{}: {}", s.title, s.summary))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse a stored log, keeping whatever entries are well-formed
    fn from_json(raw: &str) -> Self {
        let values: Vec<Value> = match serde_json::from_str(raw) {
            Ok(values) => values,
            Err(e) => {
                tracing::error!("Error loading session summaries: {}", e);
                return Self::new();
            }
        };

        let mut log = Self::new();
        for value in values {
            match serde_json::from_value::<SessionSummary>(value) {
                Ok(summary) => {
                    log.push(summary);
                }
                Err(e) => tracing::warn!("Skipping malformed session summary: {}", e),
            }
        }
        log
    }
}

/// Read-only projection for profile display
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub name: String,
    pub session_count: usize,
    pub interests: Vec<String>,
    pub last_session: Option<SessionSummary>,
}

#[derive(Debug, Default)]
struct MemoryState {
    profile: Option<UserProfile>,
    summaries: SummaryLog,
}

/// Memory store for the user profile and session summaries
pub struct MemoryStore {
    backend: Arc<dyn KvStore>,
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store over the given backend; call [`MemoryStore::load`] before use
    pub fn new(backend: Arc<dyn KvStore>) -> Self {
        Self {
            backend,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Create a store and load its persisted records
    pub async fn open(backend: Arc<dyn KvStore>) -> Self {
        let store = Self::new(backend);
        store.load().await;
        store
    }

    /// Reload both records from the backend, substituting defaults for bad data
    pub async fn load(&self) {
        let profile = match self.read_record(PROFILE_KEY).await {
            Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::error!("Error loading user profile: {}", e);
                    None
                }
            },
            None => None,
        };

        let summaries = self
            .read_record(SUMMARIES_KEY)
            .await
            .map(|raw| SummaryLog::from_json(&raw))
            .unwrap_or_default();

        tracing::debug!(
            "Loaded memory: profile={}, summaries={}",
            profile.is_some(),
            summaries.len()
        );

        let mut state = self.state.lock().await;
        state.profile = profile;
        state.summaries = summaries;
    }

    /// Return the profile, creating and persisting one on first access
    pub async fn get_or_create_profile(&self) -> UserProfile {
        let mut state = self.state.lock().await;
        self.ensure_profile(&mut state).await.clone()
    }

    /// Overwrite the display name; blank names are accepted as-is
    pub async fn update_name(&self, name: &str) {
        let mut state = self.state.lock().await;
        let profile = self.ensure_profile(&mut state).await;
        profile.name = name.to_string();
        self.save_profile(profile).await;
    }

    /// Add an interest unless an identical one is already recorded
    pub async fn add_interest(&self, tag: &str) {
        let mut state = self.state.lock().await;
        let profile = self.ensure_profile(&mut state).await;
        if profile.interests.iter().any(|i| i == tag) {
            return;
        }
        profile.interests.push(tag.to_string());
        self.save_profile(profile).await;
    }

    /// Summarize a finished session and append it to the log
    pub async fn record_session_end(
        &self,
        session_id: &str,
        title: &str,
        personality: &str,
        transcript: &[Turn],
    ) {
        let summary = SessionSummary {
            session_id: session_id.to_string(),
            title: title.to_string(),
            date: now(),
            personality: personality.to_string(),
            summary: summarize_transcript(transcript),
            topics: extract_topics(transcript),
        };

        let mut state = self.state.lock().await;
        if let Some(evicted) = state.summaries.push(summary) {
            tracing::debug!("Evicted summary for session {}", evicted.session_id);
        }
        self.write_record(SUMMARIES_KEY, &state.summaries).await;

        let history = state.summaries.history_cache();
        let profile = self.ensure_profile(&mut state).await;
        profile.conversation_history = history;
        self.save_profile(profile).await;

        tracing::info!("Recorded summary for session {}", session_id);
    }

    /// Context block for the current profile and log
    pub async fn context(&self) -> String {
        let mut state = self.state.lock().await;
        let recent = state.summaries.to_vec();
        let profile = self.ensure_profile(&mut state).await;
        build_context(&profile.name, &profile.interests, &recent)
    }

    pub async fn get_stats(&self) -> MemoryStats {
        let mut state = self.state.lock().await;
        let session_count = state.summaries.len();
        let last_session = state.summaries.last().cloned();
        let profile = self.ensure_profile(&mut state).await;

        MemoryStats {
            name: profile.name.clone(),
            session_count,
            interests: profile.interests.clone(),
            last_session,
        }
    }

    /// Snapshot of the summary log, oldest first
    pub async fn summaries(&self) -> Vec<SessionSummary> {
        self.state.lock().await.summaries.to_vec()
    }

    /// Forget the profile and every summary
    pub async fn clear_all(&self) {
        let mut state = self.state.lock().await;
        state.profile = None;
        state.summaries = SummaryLog::new();

        for key in [PROFILE_KEY, SUMMARIES_KEY] {
            if let Err(e) = self.backend.delete(key).await {
                tracing::error!("Failed to delete {}: {}", key, e);
            }
        }
        tracing::info!("Cleared all memory");
    }

    async fn ensure_profile<'a>(&self, state: &'a mut MemoryState) -> &'a mut UserProfile {
        if state.profile.is_none() {
            let mut profile = UserProfile::fresh();
            tracing::info!("Created user profile {}", profile.id);
            self.save_profile(&mut profile).await;
            state.profile = Some(profile);
        }
        state.profile.get_or_insert_with(UserProfile::fresh)
    }

    async fn save_profile(&self, profile: &mut UserProfile) {
        profile.last_updated = now();
        self.write_record(PROFILE_KEY, profile).await;
    }

    async fn read_record(&self, key: &str) -> Option<String> {
        match self.backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    async fn write_record<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.backend.put(key, &json).await {
            tracing::error!("Failed to write {}: {}", key, e);
        }
    }
}
