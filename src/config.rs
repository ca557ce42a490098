//! Widget configuration: defaults, builder methods, and fail-fast
//! validation.
//!
//! Validation aggregates every violation into one error so an embedding
//! caller sees the full list at once; a widget is never constructed from an
//! invalid configuration.

use url::Url;

use crate::error::{Error, Result};

/// Default storage key for the persisted session snapshot.
const DEFAULT_STORAGE_KEY: &str = "chat-widget-session";

/// Default apology shown when a turn fails at the transport level.
pub const FALLBACK_APOLOGY: &str = "Sorry, something went wrong. Please try again.";

/// Corner of the host page the widget attaches to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Position {
    /// Bottom-right corner.
    BottomRight,

    /// Bottom-left corner.
    BottomLeft,
}

/// Panel height: a fixed pixel value or the full viewport.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChatHeight {
    /// Fixed height in pixels.
    Fixed(u32),

    /// Full viewport height.
    Full,
}

/// Configuration for a widget instance.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Base URL of the agent backend. Required.
    pub agent_endpoint: String,

    /// Corner placement.
    pub position: Position,

    /// Avatar button diameter in pixels.
    pub avatar_size: u32,

    /// Panel width in pixels.
    pub chat_width: u32,

    /// Panel height.
    pub chat_height: ChatHeight,

    /// Panel header title.
    pub header_title: String,

    /// Greeting shown before any conversation.
    pub welcome_message: String,

    /// Input placeholder text.
    pub placeholder: String,

    /// Open the panel as soon as the widget mounts.
    pub open_on_load: bool,

    /// Persist the session snapshot across page loads.
    pub persist_session: bool,

    /// Storage key for the persisted snapshot.
    pub session_storage_key: String,

    /// Extract host-page context once per turn and send it as metadata.
    pub include_page_context: bool,

    /// Render assistant replies as markdown; plain text otherwise.
    pub enable_markdown: bool,

    /// Best-effort keyword highlighting inside code blocks.
    pub syntax_highlighting: bool,

    /// Bearer/raw token attached to every request, if set.
    pub auth_token: Option<String>,

    /// Header the token is sent under. `Authorization` gets a Bearer
    /// prefix; any other name receives the raw token.
    pub auth_header: String,

    /// Internal tool names recorded in the model but hidden from the
    /// rendered tool-call list.
    pub suppressed_tools: Vec<String>,
}

impl WidgetConfig {
    /// Creates a configuration with default values for the given endpoint.
    pub fn new(agent_endpoint: impl Into<String>) -> Self {
        Self {
            agent_endpoint: agent_endpoint.into(),
            position: Position::BottomRight,
            avatar_size: 60,
            chat_width: 400,
            chat_height: ChatHeight::Fixed(600),
            header_title: "Chat with Us".to_string(),
            welcome_message: "Hello! How can I help you today?".to_string(),
            placeholder: "Type your message...".to_string(),
            open_on_load: false,
            persist_session: true,
            session_storage_key: DEFAULT_STORAGE_KEY.to_string(),
            include_page_context: false,
            enable_markdown: true,
            syntax_highlighting: true,
            auth_token: None,
            auth_header: "Authorization".to_string(),
            suppressed_tools: vec!["getPageContent".to_string()],
        }
    }

    /// Sets the corner placement.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Sets the avatar size in pixels.
    pub fn with_avatar_size(mut self, avatar_size: u32) -> Self {
        self.avatar_size = avatar_size;
        self
    }

    /// Sets the panel width in pixels.
    pub fn with_chat_width(mut self, chat_width: u32) -> Self {
        self.chat_width = chat_width;
        self
    }

    /// Sets the panel height.
    pub fn with_chat_height(mut self, chat_height: ChatHeight) -> Self {
        self.chat_height = chat_height;
        self
    }

    /// Sets the header title.
    pub fn with_header_title(mut self, title: impl Into<String>) -> Self {
        self.header_title = title.into();
        self
    }

    /// Sets the welcome message.
    pub fn with_welcome_message(mut self, message: impl Into<String>) -> Self {
        self.welcome_message = message.into();
        self
    }

    /// Enables or disables session persistence.
    pub fn with_persistence(mut self, persist: bool) -> Self {
        self.persist_session = persist;
        self
    }

    /// Sets the storage key for the persisted snapshot.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.session_storage_key = key.into();
        self
    }

    /// Enables or disables page-context extraction.
    pub fn with_page_context(mut self, include: bool) -> Self {
        self.include_page_context = include;
        self
    }

    /// Enables or disables markdown rendering.
    pub fn with_markdown(mut self, enable: bool) -> Self {
        self.enable_markdown = enable;
        self
    }

    /// Enables or disables code-block highlighting.
    pub fn with_syntax_highlighting(mut self, enable: bool) -> Self {
        self.syntax_highlighting = enable;
        self
    }

    /// Sets the authentication token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Sets the header name the token is sent under.
    pub fn with_auth_header(mut self, header: impl Into<String>) -> Self {
        self.auth_header = header.into();
        self
    }

    /// Sets the list of tool names hidden from the rendered tool-call list.
    pub fn with_suppressed_tools(mut self, tools: Vec<String>) -> Self {
        self.suppressed_tools = tools;
        self
    }

    /// Validates the configuration, returning every violation at once.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();

        if self.agent_endpoint.is_empty() {
            violations.push("agent_endpoint is required".to_string());
        } else if Url::parse(&self.agent_endpoint).is_err() {
            violations.push("agent_endpoint must be a valid URL".to_string());
        }

        if !(30..=120).contains(&self.avatar_size) {
            violations.push("avatar_size must be between 30 and 120".to_string());
        }

        if !(280..=800).contains(&self.chat_width) {
            violations.push("chat_width must be between 280 and 800".to_string());
        }

        if let ChatHeight::Fixed(height) = self.chat_height
            && !(300..=1200).contains(&height)
        {
            violations.push("chat_height must be between 300 and 1200, or full".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::config(violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = WidgetConfig::new("https://agent.example.com/api/agent");
        assert!(config.validate().is_ok());
        assert_eq!(config.position, Position::BottomRight);
        assert_eq!(config.avatar_size, 60);
        assert_eq!(config.chat_width, 400);
        assert_eq!(config.chat_height, ChatHeight::Fixed(600));
        assert!(config.persist_session);
        assert!(config.enable_markdown);
        assert!(config.syntax_highlighting);
        assert!(!config.include_page_context);
        assert_eq!(config.session_storage_key, "chat-widget-session");
        assert_eq!(config.auth_header, "Authorization");
        assert!(config.auth_token.is_none());
        assert_eq!(config.suppressed_tools, vec!["getPageContent".to_string()]);
    }

    #[test]
    fn builder_pattern() {
        let config = WidgetConfig::new("https://agent.example.com")
            .with_position(Position::BottomLeft)
            .with_avatar_size(80)
            .with_chat_width(320)
            .with_chat_height(ChatHeight::Full)
            .with_persistence(false)
            .with_storage_key("acme-chat")
            .with_page_context(true)
            .with_markdown(false)
            .with_syntax_highlighting(false)
            .with_auth_token("tok-123")
            .with_auth_header("X-Api-Key")
            .with_suppressed_tools(vec!["internal".to_string()]);

        assert_eq!(config.position, Position::BottomLeft);
        assert_eq!(config.avatar_size, 80);
        assert_eq!(config.chat_width, 320);
        assert_eq!(config.chat_height, ChatHeight::Full);
        assert!(!config.persist_session);
        assert_eq!(config.session_storage_key, "acme-chat");
        assert!(config.include_page_context);
        assert!(!config.enable_markdown);
        assert!(!config.syntax_highlighting);
        assert_eq!(config.auth_token.as_deref(), Some("tok-123"));
        assert_eq!(config.auth_header, "X-Api-Key");
        assert_eq!(config.suppressed_tools, vec!["internal".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_aggregates_all_violations() {
        let config = WidgetConfig::new("not a url")
            .with_avatar_size(10)
            .with_chat_width(10_000)
            .with_chat_height(ChatHeight::Fixed(1));

        let err = config.validate().unwrap_err();
        let Error::Config { violations } = &err else {
            panic!("expected config error, got {err}");
        };
        assert_eq!(violations.len(), 4);
        assert!(violations[0].contains("agent_endpoint"));
        assert!(violations[1].contains("avatar_size"));
        assert!(violations[2].contains("chat_width"));
        assert!(violations[3].contains("chat_height"));
    }

    #[test]
    fn missing_endpoint_is_rejected() {
        let err = WidgetConfig::new("").validate().unwrap_err();
        assert!(err.to_string().contains("agent_endpoint is required"));
    }

    #[test]
    fn full_height_skips_range_check() {
        let config =
            WidgetConfig::new("https://agent.example.com").with_chat_height(ChatHeight::Full);
        assert!(config.validate().is_ok());
    }
}
