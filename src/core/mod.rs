//! Core assistant components
//!
//! Memory (profile and session summaries), the key-value storage it sits on,
//! and the session manager that drives conversations.

mod memory;
mod session;
mod storage;
mod summary;

pub use memory::{
    MemoryStats, MemoryStore, SessionSummary, SummaryLog, UserProfile, MAX_SUMMARIES,
    PROFILE_KEY, SUMMARIES_KEY,
};
pub use session::{SessionError, SessionInfo, SessionList, SessionManager};
pub use storage::{InMemoryKvStore, KvStore, SqliteKvStore, StorageError};
pub use summary::{
    build_context, extract_topics, summarize_transcript, CONTEXT_WINDOW, EMPTY_SESSION,
    TOPIC_VOCABULARY,
};
