//! Host-page context extraction.
//!
//! When enabled in the configuration, the controller asks the provider for
//! a context string once per turn and attaches it to the request metadata.
//! Extraction happens before the request is built; failures surface as
//! `None` and the turn proceeds without context.

/// Extracts a description of the page the widget is embedded in.
pub trait PageContextProvider: Send {
    /// Returns the current page context, or `None` when nothing useful can
    /// be extracted.
    fn extract_context(&self) -> Option<String>;
}

/// A provider that never supplies context; the default.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoPageContext;

impl PageContextProvider for NoPageContext {
    fn extract_context(&self) -> Option<String> {
        None
    }
}

/// A provider returning a fixed string; useful for embeddings whose host
/// context is known up front, and for tests.
#[derive(Debug, Clone)]
pub struct StaticPageContext {
    context: String,
}

impl StaticPageContext {
    /// Creates a provider that always returns `context`.
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
        }
    }
}

impl PageContextProvider for StaticPageContext {
    fn extract_context(&self) -> Option<String> {
        Some(self.context.clone())
    }
}
