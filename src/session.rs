//! Session persistence.
//!
//! The store owns the durable conversation model: an ordered message log
//! plus serialization. Every mutation re-serializes and writes through the
//! full session synchronously when persistence is enabled; persistence
//! failures are logged and never surface to the caller. A loaded snapshot
//! is structurally validated before it is trusted; anything invalid is
//! discarded in favor of a fresh session.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::WidgetConfig;
use crate::error::{Error, Result};
use crate::types::{Message, MessageStatus, Session, ToolCall};

/// Keyed snapshot storage for serialized sessions.
pub trait SessionStorage: Send {
    /// Loads the snapshot stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Stores `snapshot` under `key`, replacing any previous value.
    fn save(&mut self, key: &str, snapshot: &str) -> Result<()>;
}

/// File-backed storage: one JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates storage rooted at `dir`. The directory is created on first
    /// save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SessionStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|err| Error::io("failed to read session snapshot", err))
    }

    fn save(&mut self, key: &str, snapshot: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| Error::io("failed to create storage directory", err))?;
        fs::write(self.path_for(key), snapshot)
            .map_err(|err| Error::io("failed to write session snapshot", err))
    }
}

/// In-memory storage, shareable across stores; used for tests and
/// embeddings without durable storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Creates empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::streaming("storage lock poisoned", None))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, snapshot: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::streaming("storage lock poisoned", None))?;
        entries.insert(key.to_string(), snapshot.to_string());
        Ok(())
    }
}

/// A shallow, field-wise update applied to a stored message.
///
/// Unset fields are left untouched; the message id is immutable.
#[derive(Debug, Clone, Default)]
pub struct MessageUpdate {
    /// Replacement content.
    pub content: Option<String>,

    /// Replacement status, applied through the monotonic transition rule.
    pub status: Option<MessageStatus>,

    /// Replacement tool-call list.
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl MessageUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the content field.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the status field.
    pub fn status(mut self, status: MessageStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the tool-call list.
    pub fn tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = Some(tool_calls);
        self
    }
}

/// Owns the active session and its write-through persistence.
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    key: String,
    persist: bool,
    session: Option<Session>,
}

impl SessionStore {
    /// Creates a store over the given storage backend.
    pub fn new(config: &WidgetConfig, storage: Box<dyn SessionStorage>) -> Self {
        Self {
            storage,
            key: config.session_storage_key.clone(),
            persist: config.persist_session,
            session: None,
        }
    }

    /// Creates a store backed by in-memory storage.
    pub fn in_memory(config: &WidgetConfig) -> Self {
        Self::new(config, Box::new(MemoryStorage::new()))
    }

    /// Loads the persisted session if one passes validation, otherwise
    /// creates (and persists) a fresh one. Idempotent.
    pub fn initialize(&mut self) -> &Session {
        if self.session.is_none() {
            let restored = if self.persist {
                self.load_snapshot()
            } else {
                None
            };
            let session = match restored {
                Some(session) => session,
                None => {
                    let fresh = Session::new();
                    self.persist_snapshot(&fresh);
                    fresh
                }
            };
            self.session = Some(session);
        }
        self.session.get_or_insert_with(Session::new)
    }

    /// The active session, initializing on first use.
    pub fn session(&mut self) -> &Session {
        self.initialize()
    }

    /// The conversation id sent with every turn.
    pub fn conversation_id(&mut self) -> String {
        self.initialize().conversation_id.clone()
    }

    /// All messages in order.
    pub fn messages(&mut self) -> &[Message] {
        &self.initialize().messages
    }

    /// Looks up a message by id.
    pub fn message(&mut self, id: &str) -> Option<&Message> {
        self.initialize().messages.iter().find(|m| m.id == id)
    }

    /// Appends a message and writes through.
    pub fn add_message(&mut self, message: Message) {
        self.initialize();
        if let Some(session) = self.session.as_mut() {
            session.messages.push(message);
            session.updated_at = crate::types::now_ms();
        }
        self.write_through();
    }

    /// Applies a shallow update to the message with the given id and
    /// writes through. Unknown ids are ignored.
    pub fn update_message(&mut self, id: &str, update: MessageUpdate) {
        self.initialize();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(message) = session.messages.iter_mut().find(|m| m.id == id) else {
            return;
        };
        if let Some(content) = update.content {
            message.content = content;
        }
        if let Some(status) = update.status {
            message.transition(status);
        }
        if let Some(tool_calls) = update.tool_calls {
            message.tool_calls = tool_calls;
        }
        session.updated_at = crate::types::now_ms();
        self.write_through();
    }

    /// Discards the session and starts a fresh one; persists the
    /// replacement.
    pub fn clear(&mut self) {
        let fresh = Session::new();
        self.persist_snapshot(&fresh);
        self.session = Some(fresh);
    }

    fn load_snapshot(&self) -> Option<Session> {
        let data = match self.storage.load(&self.key) {
            Ok(data) => data?,
            Err(err) => {
                tracing::warn!(key = %self.key, %err, "failed to load session snapshot");
                return None;
            }
        };
        match serde_json::from_str::<Session>(&data) {
            Ok(session) => Some(session),
            Err(err) => {
                tracing::warn!(key = %self.key, %err, "discarding structurally invalid snapshot");
                None
            }
        }
    }

    fn write_through(&mut self) {
        if !self.persist {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let snapshot = match serde_json::to_string(session) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(%err, "failed to serialize session");
                return;
            }
        };
        if let Err(err) = self.storage.save(&self.key, &snapshot) {
            tracing::warn!(key = %self.key, %err, "failed to persist session");
        }
    }

    fn persist_snapshot(&mut self, session: &Session) {
        if !self.persist {
            return;
        }
        match serde_json::to_string(session) {
            Ok(snapshot) => {
                if let Err(err) = self.storage.save(&self.key, &snapshot) {
                    tracing::warn!(key = %self.key, %err, "failed to persist session");
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to serialize session");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn config() -> WidgetConfig {
        WidgetConfig::new("https://agent.example.com")
    }

    struct FailingStorage;

    impl SessionStorage for FailingStorage {
        fn load(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::io(
                "load failed",
                io::Error::new(io::ErrorKind::Other, "quota"),
            ))
        }

        fn save(&mut self, _key: &str, _snapshot: &str) -> Result<()> {
            Err(Error::io(
                "save failed",
                io::Error::new(io::ErrorKind::Other, "quota"),
            ))
        }
    }

    #[test]
    fn initialize_creates_fresh_session() {
        let mut store = SessionStore::in_memory(&config());
        let session = store.initialize().clone();
        assert!(session.messages.is_empty());
        // Idempotent: same session on the second call.
        assert_eq!(store.initialize().id, session.id);
    }

    #[test]
    fn round_trip_reproduces_equal_session() {
        let storage = MemoryStorage::new();

        let mut store = SessionStore::new(&config(), Box::new(storage.clone()));
        store.initialize();
        store.add_message(Message::user("hello"));
        store.add_message(Message::assistant_placeholder());
        let original = store.session().clone();

        let mut reloaded = SessionStore::new(&config(), Box::new(storage));
        assert_eq!(reloaded.initialize(), &original);
    }

    #[test]
    fn corrupted_snapshot_is_rejected() {
        let mut storage = MemoryStorage::new();
        storage
            .save(
                "chat-widget-session",
                r#"{"id":"s","conversationId":"c","messages":"nope","createdAt":1,"updatedAt":2}"#,
            )
            .unwrap();

        let mut store = SessionStore::new(&config(), Box::new(storage));
        let session = store.initialize();
        assert_ne!(session.id, "s");
        assert!(session.messages.is_empty());
    }

    #[test]
    fn snapshot_missing_created_at_is_rejected() {
        let mut storage = MemoryStorage::new();
        storage
            .save(
                "chat-widget-session",
                r#"{"id":"s","conversationId":"c","messages":[],"updatedAt":2}"#,
            )
            .unwrap();

        let mut store = SessionStore::new(&config(), Box::new(storage));
        assert_ne!(store.initialize().id, "s");
    }

    #[test]
    fn update_merges_named_fields_only() {
        let mut store = SessionStore::in_memory(&config());
        let message = Message::assistant_placeholder();
        let id = message.id.clone();
        store.add_message(message);

        store.update_message(&id, MessageUpdate::new().content("partial"));
        let updated = store.message(&id).unwrap();
        assert_eq!(updated.content, "partial");
        assert_eq!(updated.status, MessageStatus::Streaming);

        store.update_message(&id, MessageUpdate::new().status(MessageStatus::Complete));
        assert_eq!(
            store.message(&id).unwrap().status,
            MessageStatus::Complete
        );
    }

    #[test]
    fn update_ignores_unknown_id() {
        let mut store = SessionStore::in_memory(&config());
        store.initialize();
        store.update_message("missing", MessageUpdate::new().content("x"));
        assert!(store.messages().is_empty());
    }

    #[test]
    fn clear_replaces_session_wholesale() {
        let mut store = SessionStore::in_memory(&config());
        store.add_message(Message::user("hi"));
        let old_conversation = store.conversation_id();

        store.clear();
        assert!(store.messages().is_empty());
        assert_ne!(store.conversation_id(), old_conversation);
    }

    #[test]
    fn persistence_failure_does_not_block_conversation() {
        let mut store = SessionStore::new(&config(), Box::new(FailingStorage));
        store.add_message(Message::user("still works"));
        assert_eq!(store.messages().len(), 1);
    }

    #[test]
    fn disabled_persistence_never_touches_storage() {
        let config = config().with_persistence(false);
        let mut store = SessionStore::new(&config, Box::new(FailingStorage));
        store.add_message(Message::user("in memory only"));
        assert_eq!(store.messages().len(), 1);
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let mut store = SessionStore::new(&config(), Box::new(storage.clone()));
        store.add_message(Message::user("on disk"));
        let original = store.session().clone();

        let mut reloaded = SessionStore::new(&config(), Box::new(storage));
        assert_eq!(reloaded.initialize(), &original);
    }
}
