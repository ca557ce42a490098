//! Presentation seams.
//!
//! The controller drives the conversation; everything the user actually
//! sees goes through [`ChatSurface`]. An embedding supplies its own
//! implementation (DOM, TUI, test recorder); the controller never assumes
//! anything about how messages are displayed.

use crate::types::{Message, MessageStatus, ToolCall};

/// The rendering surface the controller draws the conversation onto.
///
/// Content passed to [`update_content`](ChatSurface::update_content) is
/// already-rendered HTML; the surface inserts it verbatim.
pub trait ChatSurface: Send {
    /// Renders a new message bubble.
    fn render_message(&mut self, message: &Message);

    /// Replaces the rendered content of the message with the given id.
    /// `is_complete` is false for every intermediate streaming render.
    fn update_content(&mut self, id: &str, html: &str, is_complete: bool);

    /// Updates the status indicator of the message with the given id.
    fn set_status(&mut self, id: &str, status: MessageStatus);

    /// Shows a new tool-call entry on the message with the given id.
    fn add_tool_call(&mut self, id: &str, tool_call: &ToolCall);

    /// Updates an existing tool-call entry on the message with the given
    /// id.
    fn update_tool_call(&mut self, id: &str, tool_call: &ToolCall);

    /// Shows an error indicator on the message with the given id.
    fn show_error(&mut self, id: &str, message: &str);

    /// Scrolls the transcript to its end.
    fn scroll_to_bottom(&mut self);

    /// Shows or hides the thinking indicator.
    fn set_thinking(&mut self, thinking: bool);

    /// Enables or disables the input field.
    fn set_input_enabled(&mut self, enabled: bool);

    /// Moves focus to the input field.
    fn focus_input(&mut self);

    /// Removes every rendered message.
    fn clear_messages(&mut self);
}

/// Embedding-level lifecycle callbacks.
///
/// Every method has a no-op default; embeddings override only what they
/// observe. `()` implements the trait for embeddings that observe nothing.
pub trait WidgetHooks: Send {
    /// Called after a user message is committed to the session.
    fn on_message_sent(&mut self, message: &Message) {
        let _ = message;
    }

    /// Called after an assistant message completes successfully.
    fn on_message_received(&mut self, message: &Message) {
        let _ = message;
    }

    /// Called when a turn fails.
    fn on_error(&mut self, error: &crate::error::Error) {
        let _ = error;
    }
}

impl WidgetHooks for () {}
