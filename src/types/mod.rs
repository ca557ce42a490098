//! Data model and wire types: messages, sessions, protocol events, and
//! request/response bodies.

// Public modules
pub mod event;
pub mod message;
pub mod request;
pub mod session;

// Re-exports
pub use event::{ErrorPayload, StreamEvent, ToolCallPayload, ToolResultPayload};
pub use message::{Message, MessageRole, MessageStatus, ToolCall, ToolCallStatus};
pub use request::{ChatRequest, ChatResponse, ChatResponseData, RequestMetadata};
pub use session::Session;

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
