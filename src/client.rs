//! HTTP transport for the agent backend.
//!
//! [`AgentClient`] posts one request per turn to the streaming endpoint and
//! feeds the SSE body through the line framer to a [`StreamHandler`].
//! Cancellation is cooperative: `abort` trips a token and the in-flight
//! turn returns silently, with no completion and no error delivered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::config::WidgetConfig;
use crate::error::{Error, Result};
use crate::framer::LineFramer;
use crate::sse;
use crate::types::{ChatRequest, ChatResponse, StreamEvent};

/// Connect timeout for both endpoints.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Receives the decoded events of one streaming turn, in arrival order.
///
/// Exactly one of `on_complete` and `on_error` fires per turn, unless the
/// turn was aborted, in which case neither does.
pub trait StreamHandler: Send {
    /// Called once per decoded event.
    fn on_event(&mut self, event: StreamEvent);

    /// Called once when the stream ends normally.
    fn on_complete(&mut self);

    /// Called once when the turn fails.
    fn on_error(&mut self, error: Error);
}

/// The controller's seam onto the network.
#[async_trait]
pub trait Transport: Send {
    /// Streams one turn, delivering events to `handler`.
    async fn stream_message(
        &self,
        message: &str,
        conversation_id: &str,
        page_context: Option<&str>,
        handler: &mut (dyn StreamHandler + '_),
    );

    /// Sends one turn to the non-streaming endpoint and returns the whole
    /// reply as an event sequence, so callers fold it through the same
    /// handling as a streamed turn.
    async fn fetch_message(
        &self,
        message: &str,
        conversation_id: &str,
        page_context: Option<&str>,
    ) -> Result<Vec<StreamEvent>>;

    /// Cancels the in-flight turn, if any. The aborted turn delivers no
    /// further callbacks.
    fn abort(&self);

    /// Returns true while a turn is in flight.
    fn is_streaming(&self) -> bool;
}

/// Reqwest-backed transport for the agent backend.
pub struct AgentClient {
    client: reqwest::Client,
    stream_url: String,
    chat_url: String,
    auth_header: String,
    auth_token: Option<String>,
    // The token of the turn currently in flight, keyed by a turn id so a
    // superseded turn cannot clear its successor's token.
    cancel: Mutex<Option<(u64, CancellationToken)>>,
    turns: AtomicU64,
}

impl AgentClient {
    /// Creates a client for the configured endpoint.
    pub fn new(config: &WidgetConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|err| {
                Error::http_client("failed to build HTTP client", Some(Box::new(err)))
            })?;
        let stream_url = derive_stream_url(&config.agent_endpoint);
        let chat_url = derive_chat_url(&stream_url);
        Ok(Self {
            client,
            stream_url,
            chat_url,
            auth_header: config.auth_header.clone(),
            auth_token: config.auth_token.clone(),
            cancel: Mutex::new(None),
            turns: AtomicU64::new(0),
        })
    }

    /// The streaming endpoint URL.
    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    /// The non-streaming fallback endpoint URL.
    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// Sends one turn to the non-streaming `/chat` endpoint and rephrases
    /// the reply as the equivalent event sequence.
    pub async fn send_chat(
        &self,
        message: &str,
        conversation_id: &str,
        page_context: Option<&str>,
    ) -> Result<Vec<StreamEvent>> {
        let request = ChatRequest::new(
            message,
            Some(conversation_id.to_string()),
            page_context.map(str::to_string),
        );
        let builder = self.client.post(&self.chat_url).json(&request);
        let response = self.authorize(builder).send().await.map_err(classify)?;
        if !response.status().is_success() {
            return Err(Error::api(
                response.status().as_u16(),
                read_error_body(response).await,
            ));
        }
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| Error::serialization("invalid chat response body", Some(Box::new(err))))?;
        Ok(vec![
            StreamEvent::Start,
            StreamEvent::Text {
                content: body.into_text(),
            },
            StreamEvent::Finish,
        ])
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.header(
                self.auth_header.as_str(),
                auth_header_value(&self.auth_header, token),
            ),
            None => builder,
        }
    }

    /// Runs one streaming turn. `Ok(true)` means the stream ended
    /// normally; `Ok(false)` means it was cancelled.
    async fn run_stream(
        &self,
        token: &CancellationToken,
        message: &str,
        conversation_id: &str,
        page_context: Option<&str>,
        handler: &mut (dyn StreamHandler + '_),
    ) -> Result<bool> {
        let request = ChatRequest::new(
            message,
            Some(conversation_id.to_string()),
            page_context.map(str::to_string),
        );
        let builder = self
            .client
            .post(&self.stream_url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&request);
        let send = self.authorize(builder).send();

        let response = tokio::select! {
            _ = token.cancelled() => return Ok(false),
            response = send => response.map_err(classify)?,
        };
        if !response.status().is_success() {
            return Err(Error::api(
                response.status().as_u16(),
                read_error_body(response).await,
            ));
        }

        let mut stream = response.bytes_stream();
        let mut framer = LineFramer::new();
        loop {
            let chunk = tokio::select! {
                _ = token.cancelled() => return Ok(false),
                chunk = stream.next() => chunk,
            };
            match chunk {
                Some(Ok(bytes)) => {
                    for line in framer.push(&bytes) {
                        if let Some(event) = sse::parse_line(&line) {
                            handler.on_event(event);
                        }
                    }
                }
                Some(Err(err)) => return Err(classify(err)),
                None => break,
            }
        }
        // A body that ends without a trailing newline still carries one
        // last frame.
        if let Some(line) = framer.flush()
            && let Some(event) = sse::parse_line(&line)
        {
            handler.on_event(event);
        }
        Ok(true)
    }

    fn take_token(&self) -> (u64, CancellationToken) {
        let turn = self.turns.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let mut slot = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some((turn, token.clone()));
        (turn, token)
    }

    fn clear_token(&self, turn: u64) {
        let mut slot = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|(held, _)| *held == turn) {
            *slot = None;
        }
    }
}

#[async_trait]
impl Transport for AgentClient {
    async fn stream_message(
        &self,
        message: &str,
        conversation_id: &str,
        page_context: Option<&str>,
        handler: &mut (dyn StreamHandler + '_),
    ) {
        let (turn, token) = self.take_token();
        let outcome = self
            .run_stream(&token, message, conversation_id, page_context, handler)
            .await;
        self.clear_token(turn);
        match outcome {
            Ok(true) => handler.on_complete(),
            Ok(false) => {}
            Err(err) => handler.on_error(err),
        }
    }

    async fn fetch_message(
        &self,
        message: &str,
        conversation_id: &str,
        page_context: Option<&str>,
    ) -> Result<Vec<StreamEvent>> {
        self.send_chat(message, conversation_id, page_context).await
    }

    fn abort(&self) {
        let slot = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, token)) = slot.as_ref() {
            token.cancel();
        }
    }

    fn is_streaming(&self) -> bool {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Normalizes the configured endpoint into the streaming URL: a trailing
/// `/stream` segment is appended unless already present.
fn derive_stream_url(endpoint: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if base.ends_with("/stream") {
        base.to_string()
    } else {
        format!("{base}/stream")
    }
}

/// Derives the non-streaming fallback URL from the streaming URL.
fn derive_chat_url(stream_url: &str) -> String {
    let base = stream_url.strip_suffix("/stream").unwrap_or(stream_url);
    format!("{base}/chat")
}

/// Formats the authentication header value: the `Authorization` header
/// carries a Bearer token; any other header carries the raw token.
fn auth_header_value(header: &str, token: &str) -> String {
    if header.eq_ignore_ascii_case("authorization") {
        format!("Bearer {token}")
    } else {
        token.to_string()
    }
}

fn classify(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::timeout(format!("request timed out: {err}"), None)
    } else if err.is_connect() {
        Error::connection(format!("failed to connect: {err}"), Some(Box::new(err)))
    } else {
        Error::http_client(err.to_string(), Some(Box::new(err)))
    }
}

async fn read_error_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(body) if !body.trim().is_empty() => body,
        _ => "no readable body".to_string(),
    }
}
