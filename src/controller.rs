//! Conversation controller.
//!
//! One controller owns one conversation: it commits user messages to the
//! session, drives a streaming turn through the transport, folds events
//! into the assistant placeholder, and keeps the surface in sync. At most
//! one turn is in flight at a time; a send during an active turn is a
//! silent no-op, never queued.

use crate::client::{AgentClient, StreamHandler, Transport};
use crate::config::{FALLBACK_APOLOGY, WidgetConfig};
use crate::context::{NoPageContext, PageContextProvider};
use crate::error::{Error, Result};
use crate::markdown::MarkdownRenderer;
use crate::session::{MessageUpdate, SessionStore};
use crate::surface::{ChatSurface, WidgetHooks};
use crate::types::{
    Message, MessageRole, MessageStatus, StreamEvent, ToolCall, ToolCallStatus,
};

/// Shown when a stream error event arrives without a message.
const GENERIC_ERROR: &str = "An error occurred";

/// How a streaming turn ended.
enum TurnOutcome {
    /// Still streaming, or aborted before either terminal callback fired.
    Pending,

    /// The stream ended normally.
    Complete,

    /// The turn failed at the transport level.
    Errored(Error),
}

/// Drives one conversation over a [`Transport`].
pub struct ChatController<T: Transport> {
    config: WidgetConfig,
    transport: T,
    markdown: MarkdownRenderer,
    store: SessionStore,
    context: Box<dyn PageContextProvider>,
    surface: Box<dyn ChatSurface>,
    hooks: Box<dyn WidgetHooks>,
    streaming: bool,
}

impl<T: Transport> ChatController<T> {
    /// Creates a controller, failing fast on an invalid configuration.
    pub fn new(
        config: WidgetConfig,
        transport: T,
        store: SessionStore,
        surface: Box<dyn ChatSurface>,
    ) -> Result<Self> {
        config.validate()?;
        let markdown = MarkdownRenderer::new(&config);
        Ok(Self {
            config,
            transport,
            markdown,
            store,
            context: Box::new(NoPageContext),
            surface,
            hooks: Box::new(()),
            streaming: false,
        })
    }

    /// Replaces the page-context provider.
    pub fn with_context_provider(mut self, provider: Box<dyn PageContextProvider>) -> Self {
        self.context = provider;
        self
    }

    /// Replaces the lifecycle hooks.
    pub fn with_hooks(mut self, hooks: Box<dyn WidgetHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Returns true while a turn is in flight.
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Loads (or creates) the session and replays its messages onto the
    /// surface.
    pub fn initialize(&mut self) {
        let messages = self.store.initialize().messages.clone();
        for message in &messages {
            self.surface.render_message(message);
            let html = match message.role {
                MessageRole::User => self.markdown.render_user(&message.content),
                MessageRole::Assistant => self.markdown.render(&message.content, true),
            };
            self.surface.update_content(&message.id, &html, true);
            for tool_call in &message.tool_calls {
                if !self.config.suppressed_tools.contains(&tool_call.tool_name) {
                    self.surface.add_tool_call(&message.id, tool_call);
                }
            }
        }
        if !messages.is_empty() {
            self.surface.scroll_to_bottom();
        }
    }

    /// Sends one user message and streams the assistant reply to
    /// completion.
    ///
    /// A no-op while a turn is already in flight, and for whitespace-only
    /// input. The committed user message keeps its original text,
    /// untrimmed.
    pub async fn send_message(&mut self, text: &str) {
        self.run_turn(text, false).await;
    }

    /// Sends one user message through the non-streaming fallback
    /// endpoint. The full reply arrives as one event sequence and is
    /// folded through the same handling as a streamed turn.
    pub async fn send_message_fallback(&mut self, text: &str) {
        self.run_turn(text, true).await;
    }

    async fn run_turn(&mut self, text: &str, fallback: bool) {
        if self.streaming || text.trim().is_empty() {
            return;
        }

        let user = Message::user(text);
        self.surface.render_message(&user);
        self.surface
            .update_content(&user.id, &self.markdown.render_user(&user.content), true);
        self.store.add_message(user.clone());
        self.hooks.on_message_sent(&user);

        let placeholder = Message::assistant_placeholder();
        self.surface.render_message(&placeholder);
        self.store.add_message(placeholder.clone());

        self.streaming = true;
        self.surface.set_input_enabled(false);
        self.surface.set_thinking(true);
        self.surface.scroll_to_bottom();

        let page_context = if self.config.include_page_context {
            self.context.extract_context()
        } else {
            None
        };
        let conversation_id = self.store.conversation_id();

        let mut handler = TurnHandler {
            message: placeholder,
            surface: self.surface.as_mut(),
            markdown: &self.markdown,
            suppressed: &self.config.suppressed_tools,
            outcome: TurnOutcome::Pending,
        };
        if fallback {
            match self
                .transport
                .fetch_message(text, &conversation_id, page_context.as_deref())
                .await
            {
                Ok(events) => {
                    for event in events {
                        handler.on_event(event);
                    }
                    handler.on_complete();
                }
                Err(err) => handler.on_error(err),
            }
        } else {
            self.transport
                .stream_message(text, &conversation_id, page_context.as_deref(), &mut handler)
                .await;
        }
        let TurnHandler {
            mut message,
            outcome,
            ..
        } = handler;

        match outcome {
            TurnOutcome::Complete => {
                message.transition(MessageStatus::Complete);
                let html = self.markdown.render(&message.content, true);
                self.surface.update_content(&message.id, &html, true);
                self.surface.set_status(&message.id, message.status);
                self.store.update_message(
                    &message.id,
                    MessageUpdate::new()
                        .content(message.content.clone())
                        .status(message.status)
                        .tool_calls(message.tool_calls.clone()),
                );
                self.hooks.on_message_received(&message);
                self.finish_turn();
            }
            TurnOutcome::Errored(err) => {
                tracing::error!(%err, "turn failed");
                // Partial content is discarded; the bubble shows the
                // apology instead.
                message.content = FALLBACK_APOLOGY.to_string();
                message.transition(MessageStatus::Error);
                let html = self.markdown.render(&message.content, true);
                self.surface.update_content(&message.id, &html, true);
                self.surface.set_status(&message.id, MessageStatus::Error);
                self.store.update_message(
                    &message.id,
                    MessageUpdate::new()
                        .content(message.content.clone())
                        .status(MessageStatus::Error)
                        .tool_calls(message.tool_calls.clone()),
                );
                self.hooks.on_error(&err);
                self.finish_turn();
            }
            TurnOutcome::Pending => {
                // Aborted. No terminal callbacks fired and no cleanup
                // runs: the placeholder stays in streaming state until
                // destroy tears the widget down.
            }
        }
    }

    /// Discards the conversation and starts a fresh session.
    pub fn clear_history(&mut self) {
        self.store.clear();
        self.surface.clear_messages();
    }

    /// Tears the widget down: aborts any in-flight turn and clears the
    /// surface.
    pub fn destroy(&mut self) {
        self.transport.abort();
        self.streaming = false;
        self.surface.clear_messages();
    }

    /// All messages of the active session, in order.
    pub fn messages(&mut self) -> &[Message] {
        self.store.messages()
    }

    fn finish_turn(&mut self) {
        self.streaming = false;
        self.surface.set_thinking(false);
        self.surface.set_input_enabled(true);
        self.surface.focus_input();
    }
}

impl ChatController<AgentClient> {
    /// Creates a controller wired to the HTTP transport for the configured
    /// endpoint.
    pub fn connect(
        config: WidgetConfig,
        store: SessionStore,
        surface: Box<dyn ChatSurface>,
    ) -> Result<Self> {
        config.validate()?;
        let transport = AgentClient::new(&config)?;
        ChatController::new(config, transport, store, surface)
    }
}

/// A controller over the HTTP transport.
pub type ChatWidget = ChatController<AgentClient>;

/// Folds one turn's events into the assistant placeholder and mirrors
/// them onto the surface.
struct TurnHandler<'a> {
    message: Message,
    surface: &'a mut dyn ChatSurface,
    markdown: &'a MarkdownRenderer,
    suppressed: &'a [String],
    outcome: TurnOutcome,
}

impl StreamHandler for TurnHandler<'_> {
    fn on_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Text { content } => {
                self.message.content.push_str(&content);
                let html = self.markdown.render(&self.message.content, false);
                self.surface.update_content(&self.message.id, &html, false);
                self.surface.scroll_to_bottom();
            }
            StreamEvent::ToolCall { content } => {
                let payload = content.unwrap_or_default();
                let id = if payload.tool_call_id.is_empty() {
                    uuid::Uuid::new_v4().to_string()
                } else {
                    payload.tool_call_id
                };
                let name = if payload.tool_name.is_empty() {
                    "unknown".to_string()
                } else {
                    payload.tool_name
                };
                let tool_call = ToolCall::pending(id, name, payload.args);
                self.message.tool_calls.push(tool_call.clone());
                if !self.suppressed.contains(&tool_call.tool_name) {
                    self.surface.add_tool_call(&self.message.id, &tool_call);
                    self.surface.scroll_to_bottom();
                }
            }
            StreamEvent::ToolResult { content } => {
                let payload = content.unwrap_or_default();
                if let Some(tool_call) = self.message.tool_call_mut(&payload.tool_call_id) {
                    tool_call.result = Some(payload.result);
                    tool_call.status = ToolCallStatus::Complete;
                    let tool_call = tool_call.clone();
                    if !self.suppressed.contains(&tool_call.tool_name) {
                        self.surface.update_tool_call(&self.message.id, &tool_call);
                    }
                }
            }
            StreamEvent::Error { content } => {
                let text = content
                    .map(|p| p.message)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| GENERIC_ERROR.to_string());
                self.message.transition(MessageStatus::Error);
                self.surface.set_status(&self.message.id, MessageStatus::Error);
                self.surface.show_error(&self.message.id, &text);
            }
            StreamEvent::Start | StreamEvent::Done | StreamEvent::Finish => {}
        }
    }

    fn on_complete(&mut self) {
        self.outcome = TurnOutcome::Complete;
    }

    fn on_error(&mut self, error: Error) {
        self.outcome = TurnOutcome::Errored(error);
    }
}
