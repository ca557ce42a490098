use serde::{Deserialize, Serialize};

use crate::types::now_ms;

/// Role type for a conversation message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

/// Lifecycle status of a message.
///
/// Transitions are monotonic: the terminal statuses (`Complete` and
/// `Error`) are absorbing, so a finished message never changes status
/// again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Created but not yet streaming.
    Pending,

    /// Content is still arriving.
    Streaming,

    /// All content received.
    Complete,

    /// The turn ended in an error.
    Error,
}

impl MessageStatus {
    /// Returns true for `Complete` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageStatus::Complete | MessageStatus::Error)
    }
}

/// Lifecycle status of a tool call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStatus {
    /// Invoked, result not yet received.
    Pending,

    /// Result received.
    Complete,

    /// The tool reported an error.
    Error,
}

/// A tool invocation recorded on an assistant message.
///
/// Tool calls are append-only within a message: created on a `tool-call`
/// event and mutated in place when the matching `tool-result` arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id assigned by the backend.
    pub id: String,

    /// Name of the invoked tool.
    #[serde(rename = "toolName")]
    pub tool_name: String,

    /// Opaque invocation arguments.
    pub args: serde_json::Value,

    /// Opaque result payload, present once the call completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    /// Lifecycle status.
    pub status: ToolCallStatus,
}

impl ToolCall {
    /// Create a pending `ToolCall` from a `tool-call` event payload.
    pub fn pending(id: String, tool_name: String, args: serde_json::Value) -> Self {
        Self {
            id,
            tool_name,
            args,
            result: None,
            status: ToolCallStatus::Pending,
        }
    }
}

/// A single message in a conversation.
///
/// The session owns every message; presentation layers hold transient
/// render references only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique, generated identifier.
    pub id: String,

    /// Who authored the message.
    pub role: MessageRole,

    /// Message text; grows incrementally while streaming.
    pub content: String,

    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,

    /// Lifecycle status.
    pub status: MessageStatus,

    /// Tool invocations attached to this message, in arrival order.
    #[serde(rename = "toolCalls", default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    /// Create a user message; user messages are terminal at creation.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: now_ms(),
            status: MessageStatus::Complete,
            tool_calls: Vec::new(),
        }
    }

    /// Create an empty assistant placeholder to be filled in by the stream.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            content: String::new(),
            timestamp: now_ms(),
            status: MessageStatus::Streaming,
            tool_calls: Vec::new(),
        }
    }

    /// Transition the message status. Terminal statuses are absorbing:
    /// once the message is `Complete` or `Error` the transition is
    /// ignored.
    pub fn transition(&mut self, status: MessageStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
    }

    /// Find a tool call by id.
    pub fn tool_call_mut(&mut self, id: &str) -> Option<&mut ToolCall> {
        self.tool_calls.iter_mut().find(|tc| tc.id == id)
    }
}
