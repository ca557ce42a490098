use serde::{Deserialize, Serialize};

/// Payload of a `tool-call` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPayload {
    /// Correlation id for the matching `tool-result` event.
    #[serde(rename = "toolCallId", default)]
    pub tool_call_id: String,

    /// Name of the invoked tool.
    #[serde(rename = "toolName", default)]
    pub tool_name: String,

    /// Opaque invocation arguments.
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Payload of a `tool-result` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResultPayload {
    /// Correlation id of the tool call this result belongs to.
    #[serde(rename = "toolCallId", default)]
    pub tool_call_id: String,

    /// Opaque result payload.
    #[serde(default)]
    pub result: serde_json::Value,
}

/// Payload of an `error` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable error message.
    #[serde(default)]
    pub message: String,

    /// Optional machine-readable code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// One decoded unit of the streaming vocabulary.
///
/// The wire format is `{"type": "...", "content": ...}`; unknown extra
/// fields (e.g. `traceId`) are ignored. Exhaustive matching over this enum
/// is the extension point for new event kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    /// Stream-boundary marker: the turn has started.
    Start,

    /// A text delta to append to the assistant message.
    Text {
        /// The text content.
        #[serde(default)]
        content: String,
    },

    /// The backend invoked a tool.
    ToolCall {
        /// Invocation details; absent content yields an empty call.
        #[serde(default)]
        content: Option<ToolCallPayload>,
    },

    /// A tool finished and reported its result.
    ToolResult {
        /// Result details keyed by `toolCallId`.
        #[serde(default)]
        content: Option<ToolResultPayload>,
    },

    /// The backend reported a turn-level error inline.
    Error {
        /// Error details, when provided.
        #[serde(default)]
        content: Option<ErrorPayload>,
    },

    /// Stream-boundary marker: no further events follow.
    Done,

    /// Stream-boundary marker: the turn finished normally.
    Finish,
}
