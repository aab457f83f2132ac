//! Chat sessions and the send pipeline
//!
//! The `SessionManager` is the only caller of the model gateway. It:
//! 1. Keeps the list of sessions and which one is active
//! 2. Appends the user's turn and a "thinking" placeholder
//! 3. Resolves the memory context and calls the gateway
//! 4. Replaces the placeholder with the answer (or an apology)
//! 5. Summarizes sessions into memory when the user switches away
//!
//! Only one send may be in flight; a second send is rejected, not queued.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::{Personality, PromptOptions};
use crate::conversation::{ChatMessage, ChatSession, Turn};
use crate::providers::{Gateway, GenerationRequest};

use super::memory::MemoryStore;

/// Characters of the opening message used as the sidebar title
const TITLE_CHARS: usize = 30;

/// Errors from the session manager
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("A message is already being sent")]
    Busy,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Session not found: {0}")]
    NotFound(Uuid),
}

/// Sidebar entry for a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub title: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
}

/// All sessions, newest first, and the active one
#[derive(Debug, Clone, Serialize)]
pub struct SessionList {
    pub active: Uuid,
    pub sessions: Vec<SessionInfo>,
}

struct SessionEntry {
    session: ChatSession,
    personality: Personality,
    /// Message count at the last summary, to avoid re-summarizing an unchanged session
    summarized_len: usize,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            session: ChatSession::new(),
            personality: Personality::default(),
            summarized_len: 0,
        }
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.session.id,
            title: self.session.title.clone(),
            message_count: self.session.messages.len(),
            created_at: self.session.created_at,
        }
    }
}

struct SessionState {
    entries: Vec<SessionEntry>,
    active: Uuid,
}

impl SessionState {
    fn entry_mut(&mut self, id: Uuid) -> Option<&mut SessionEntry> {
        self.entries.iter_mut().find(|e| e.session.id == id)
    }
}

/// Clears the busy flag when a send finishes, however it finishes
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owner of the chat sessions
pub struct SessionManager {
    memory: Arc<MemoryStore>,
    gateway: Arc<dyn Gateway>,
    state: Mutex<SessionState>,
    busy: AtomicBool,
}

impl SessionManager {
    /// Create a manager with one fresh, active session
    pub fn new(memory: Arc<MemoryStore>, gateway: Arc<dyn Gateway>) -> Self {
        let first = SessionEntry::new();
        let active = first.session.id;

        Self {
            memory,
            gateway,
            state: Mutex::new(SessionState {
                entries: vec![first],
                active,
            }),
            busy: AtomicBool::new(false),
        }
    }

    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn list(&self) -> SessionList {
        let state = self.state.lock().await;
        SessionList {
            active: state.active,
            sessions: state.entries.iter().map(SessionEntry::info).collect(),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<ChatSession, SessionError> {
        let mut state = self.state.lock().await;
        state
            .entry_mut(id)
            .map(|e| e.session.clone())
            .ok_or(SessionError::NotFound(id))
    }

    pub async fn active(&self) -> ChatSession {
        let mut state = self.state.lock().await;
        let active = state.active;
        match state.entry_mut(active) {
            Some(entry) => entry.session.clone(),
            None => ChatSession::new(),
        }
    }

    /// Start a new session and make it active
    pub async fn create_session(&self) -> ChatSession {
        let mut state = self.state.lock().await;
        let leaving = state.active;
        self.summarize(&mut state, leaving).await;

        let entry = SessionEntry::new();
        let session = entry.session.clone();
        state.active = session.id;
        state.entries.insert(0, entry);

        tracing::info!("Created session {}", session.id);
        session
    }

    /// Make another session active, summarizing the one being left
    pub async fn switch_to(&self, id: Uuid) -> Result<ChatSession, SessionError> {
        let mut state = self.state.lock().await;
        let session = state
            .entry_mut(id)
            .map(|e| e.session.clone())
            .ok_or(SessionError::NotFound(id))?;

        if state.active != id {
            let leaving = state.active;
            self.summarize(&mut state, leaving).await;
            state.active = id;
            tracing::debug!("Switched to session {}", id);
        }

        Ok(session)
    }

    /// Summarize the active session, e.g. on shutdown
    pub async fn end_active_session(&self) {
        let mut state = self.state.lock().await;
        let active = state.active;
        self.summarize(&mut state, active).await;
    }

    /// Send a user message to the active session and wait for the answer
    ///
    /// Returns the id of the session the message went to, which stays the
    /// same even if another session becomes active meanwhile, and the
    /// assistant message appended to it. Gateway failures are not errors
    /// here: the placeholder is replaced with an apology that carries the
    /// failure reason.
    pub async fn send(
        &self,
        text: &str,
        options: PromptOptions,
    ) -> Result<(Uuid, ChatMessage), SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SessionError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let (session_id, turns) = {
            let mut state = self.state.lock().await;
            let active = state.active;
            let entry = state
                .entry_mut(active)
                .ok_or(SessionError::NotFound(active))?;

            let mut turns = entry.session.transcript();
            turns.push(Turn::user(text));

            if entry.session.messages.is_empty() {
                entry.session.title = text.chars().take(TITLE_CHARS).collect();
            }
            entry.personality = options.personality;
            entry.session.messages.push(ChatMessage::user(text));
            entry.session.messages.push(ChatMessage::thinking());

            (active, turns)
        };

        let memory_context = self.memory.context().await;
        let result = self
            .gateway
            .generate(GenerationRequest {
                turns,
                options,
                memory_context,
            })
            .await;

        let reply = match result {
            Ok(response) => ChatMessage::assistant(response.text, response.sources),
            Err(e) => {
                tracing::error!("Generation failed for session {}: {}", session_id, e);
                ChatMessage::assistant(apology(&e.to_string()), Vec::new())
            }
        };

        let mut state = self.state.lock().await;
        let entry = state
            .entry_mut(session_id)
            .ok_or(SessionError::NotFound(session_id))?;
        entry.session.remove_placeholders();
        entry.session.messages.push(reply.clone());

        Ok((session_id, reply))
    }

    async fn summarize(&self, state: &mut SessionState, id: Uuid) {
        let Some(entry) = state.entry_mut(id) else {
            return;
        };

        let len = entry.session.messages.len();
        if len == 0 || len == entry.summarized_len {
            return;
        }

        self.memory
            .record_session_end(
                &entry.session.id.to_string(),
                &entry.session.summary_title(),
                entry.personality.as_str(),
                &entry.session.transcript(),
            )
            .await;
        entry.summarized_len = len;
    }
}

fn apology(reason: &str) -> String {
    format!(
        "Sorry, I couldn't come up with an answer right now. Please try again in a moment. ({})",
        reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Role, Source};
    use crate::core::storage::InMemoryKvStore;
    use crate::providers::{GenerationResponse, ProviderError};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    /// Gateway that echoes the last turn and records requests
    #[derive(Default)]
    struct EchoGateway {
        requests: Mutex<Vec<GenerationRequest>>,
        gate: Option<Arc<Notify>>,
        fail: bool,
    }

    #[async_trait]
    impl Gateway for EchoGateway {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, ProviderError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let last = request
                .turns
                .last()
                .map(|t| t.content.clone())
                .unwrap_or_default();
            self.requests.lock().await.push(request);

            if self.fail {
                return Err(ProviderError::QuotaExceeded("out of tokens".to_string()));
            }
            Ok(GenerationResponse {
                text: format!("echo: {}", last),
                sources: vec![Source {
                    url: "https://example.com/a".to_string(),
                    title: "a".to_string(),
                }],
            })
        }
    }

    async fn manager(gateway: Arc<EchoGateway>) -> SessionManager {
        let memory = Arc::new(MemoryStore::open(Arc::new(InMemoryKvStore::new())).await);
        SessionManager::new(memory, gateway)
    }

    #[tokio::test]
    async fn test_send_appends_answer() {
        let gateway = Arc::new(EchoGateway::default());
        let manager = manager(gateway.clone()).await;
        manager.memory().update_name("Alice").await;

        let (session_id, reply) = manager
            .send("hello there", PromptOptions::default())
            .await
            .unwrap();
        assert_eq!(session_id, manager.list().await.active);
        assert_eq!(reply.content, "echo: hello there");
        assert_eq!(reply.sources.len(), 1);

        manager.send("and again", PromptOptions::default()).await.unwrap();

        let session = manager.active().await;
        assert_eq!(session.title, "hello there");
        let roles: Vec<Role> = session.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert!(session.messages.iter().all(|m| !m.is_searching));

        let requests = gateway.requests.lock().await;
        assert_eq!(requests[1].turns.len(), 3);
        assert_eq!(requests[1].turns[2], Turn::user("and again"));
        assert!(requests[0].memory_context.contains("- Name: Alice"));
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let manager = manager(Arc::new(EchoGateway::default())).await;
        assert!(matches!(
            manager.send("   ", PromptOptions::default()).await,
            Err(SessionError::EmptyMessage)
        ));
        assert!(manager.active().await.messages.is_empty());
    }

    #[tokio::test]
    async fn test_failure_substitutes_apology() {
        let gateway = Arc::new(EchoGateway {
            fail: true,
            ..EchoGateway::default()
        });
        let manager = manager(gateway).await;

        let (_, reply) = manager.send("hi", PromptOptions::default()).await.unwrap();
        assert!(reply.content.starts_with("Sorry"));
        assert!(reply.content.contains("out of tokens"));

        let session = manager.active().await;
        assert_eq!(session.messages.len(), 2);
        assert!(!manager.is_busy());
    }

    #[tokio::test]
    async fn test_concurrent_send_is_rejected() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(EchoGateway {
            gate: Some(gate.clone()),
            ..EchoGateway::default()
        });
        let manager = Arc::new(manager(gateway).await);

        let first = tokio::spawn({
            let manager = manager.clone();
            async move { manager.send("first", PromptOptions::default()).await }
        });
        while !manager.is_busy() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            manager.send("second", PromptOptions::default()).await,
            Err(SessionError::Busy)
        ));
        let pending = manager.active().await;
        assert!(pending.messages.last().unwrap().is_searching);

        gate.notify_one();
        let (_, reply) = first.await.unwrap().unwrap();
        assert_eq!(reply.content, "echo: first");
        assert!(!manager.is_busy());
        assert_eq!(manager.active().await.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_reply_lands_in_sending_session() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(EchoGateway {
            gate: Some(gate.clone()),
            ..EchoGateway::default()
        });
        let manager = Arc::new(manager(gateway).await);
        let original = manager.active().await.id;

        let pending = tokio::spawn({
            let manager = manager.clone();
            async move { manager.send("still thinking", PromptOptions::default()).await }
        });
        while !manager.is_busy() {
            tokio::task::yield_now().await;
        }

        let newer = manager.create_session().await;
        gate.notify_one();
        let (session_id, reply) = pending.await.unwrap().unwrap();

        assert_eq!(session_id, original);
        assert_ne!(session_id, newer.id);
        assert_eq!(manager.list().await.active, newer.id);
        let messages = manager.get(original).await.unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].id, reply.id);
        assert!(manager.get(newer.id).await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn test_switch_records_summary_once() {
        let manager = manager(Arc::new(EchoGateway::default())).await;
        let options = PromptOptions {
            personality: Personality::Chill,
            ..PromptOptions::default()
        };

        manager.send("explain recursion please", options).await.unwrap();
        let first = manager.active().await.id;

        let second = manager.create_session().await;
        assert_eq!(manager.list().await.active, second.id);

        let summaries = manager.memory().summaries().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].session_id, first.to_string());
        assert_eq!(summaries[0].personality, "chill");
        assert!(summaries[0].summary.starts_with("1 questions asked"));
        assert!(summaries[0].topics.contains(&"explain".to_string()));

        // Leaving an empty session or an unchanged one records nothing
        manager.switch_to(first).await.unwrap();
        manager.switch_to(second.id).await.unwrap();
        assert_eq!(manager.memory().summaries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_switch_to_unknown_session() {
        let manager = manager(Arc::new(EchoGateway::default())).await;
        let id = Uuid::new_v4();
        assert!(matches!(
            manager.switch_to(id).await,
            Err(SessionError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_end_active_session() {
        let manager = manager(Arc::new(EchoGateway::default())).await;
        manager.send("what is math", PromptOptions::default()).await.unwrap();

        manager.end_active_session().await;
        manager.end_active_session().await;

        let stats = manager.memory().get_stats().await;
        assert_eq!(stats.session_count, 1);
        assert_eq!(stats.last_session.unwrap().title, "what is math");
    }
}
