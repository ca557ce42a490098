//! Embeddable chat widget core: streaming transport, progressive markdown
//! rendering, conversation control, and session persistence.
//!
//! The crate is organized around four seams:
//!
//! - [`Transport`](client::Transport) carries one turn to the agent backend
//!   and streams the reply back as [`StreamEvent`](types::StreamEvent)s.
//! - [`ChatSurface`](surface::ChatSurface) is the presentation layer the
//!   controller draws onto; embeddings supply their own.
//! - [`SessionStorage`](session::SessionStorage) persists the conversation
//!   across embeddings of the widget.
//! - [`ChatController`](controller::ChatController) ties them together and
//!   owns the turn state machine.
//!
//! A typical embedding builds a [`WidgetConfig`], wires a surface and a
//! storage backend, and calls
//! [`ChatWidget::connect`](controller::ChatController::connect).

pub mod client;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod framer;
pub mod markdown;
pub mod session;
pub mod sse;
pub mod surface;
pub mod types;

pub use client::{AgentClient, StreamHandler, Transport};
pub use config::{ChatHeight, FALLBACK_APOLOGY, Position, WidgetConfig};
pub use context::{NoPageContext, PageContextProvider, StaticPageContext};
pub use controller::{ChatController, ChatWidget};
pub use error::{Error, Result};
pub use framer::LineFramer;
pub use markdown::MarkdownRenderer;
pub use session::{FileStorage, MemoryStorage, MessageUpdate, SessionStorage, SessionStore};
pub use surface::{ChatSurface, WidgetHooks};
pub use types::{
    ChatRequest, ChatResponse, ErrorPayload, Message, MessageRole, MessageStatus, Session,
    StreamEvent, ToolCall, ToolCallPayload, ToolCallStatus, ToolResultPayload,
};
