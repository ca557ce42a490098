use serde::{Deserialize, Serialize};

use crate::types::{Message, now_ms};

/// A conversation and its message log.
///
/// Exactly one session is active per widget instance; `clear_history`
/// replaces it wholesale. The `conversation_id` correlates every turn
/// sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: String,

    /// Backend correlation id for all turns in this conversation.
    #[serde(rename = "conversationId")]
    pub conversation_id: String,

    /// Ordered message log.
    pub messages: Vec<Message>,

    /// Creation time, milliseconds since the Unix epoch.
    #[serde(rename = "createdAt")]
    pub created_at: i64,

    /// Last mutation time, milliseconds since the Unix epoch.
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl Session {
    /// Create a fresh, empty session with generated ids.
    pub fn new() -> Self {
        let now = now_ms();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: uuid::Uuid::new_v4().to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
