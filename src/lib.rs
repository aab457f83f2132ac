//! Helpfulat - chat assistant API
//!
//! A Gemini-backed chat service that remembers who it is talking to. Each
//! finished chat session is condensed into a short summary; the user's name,
//! interests and the most recent summaries are rendered into a context block
//! that accompanies every model call. An arcade with three small games rides
//! alongside.

use std::sync::Arc;

pub mod arcade;
pub mod config;
pub mod conversation;
pub mod core;
pub mod providers;
pub mod routes;

use crate::arcade::Arcade;
use crate::config::Config;
use crate::core::{MemoryStore, SessionManager};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionManager>,
    pub memory: Arc<MemoryStore>,
    pub arcade: Arc<Arcade>,
}
