use serde::{Deserialize, Serialize};

/// Turn metadata sent alongside the user message.
///
/// Serializes to `{}` when no page context was extracted, matching the
/// wire contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Extracted host-page context, when enabled.
    #[serde(rename = "pageContext", default, skip_serializing_if = "Option::is_none")]
    pub page_context: Option<String>,
}

/// JSON body posted to the streaming (and fallback) endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message text.
    pub message: String,

    /// Correlates all turns of one conversation.
    #[serde(rename = "conversationId", default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// Turn metadata.
    #[serde(default)]
    pub metadata: RequestMetadata,
}

impl ChatRequest {
    /// Build a request for one turn.
    pub fn new(
        message: impl Into<String>,
        conversation_id: Option<String>,
        page_context: Option<String>,
    ) -> Self {
        Self {
            message: message.into(),
            conversation_id,
            metadata: RequestMetadata { page_context },
        }
    }
}

/// Response body of the non-streaming `/chat` fallback endpoint.
///
/// Current backends respond `{"data": {"text": ...}}`; legacy ones respond
/// with a top-level `{"text": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatResponse {
    /// Current response envelope.
    #[serde(default)]
    pub data: Option<ChatResponseData>,

    /// Legacy top-level text field.
    #[serde(default)]
    pub text: Option<String>,
}

/// Inner payload of a `/chat` response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatResponseData {
    /// The assistant's full reply.
    #[serde(default)]
    pub text: String,
}

impl ChatResponse {
    /// The reply text, preferring the enveloped shape over the legacy one.
    pub fn into_text(self) -> String {
        if let Some(data) = self.data {
            data.text
        } else {
            self.text.unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_without_context_serializes_empty_metadata() {
        let request = ChatRequest::new("hello", Some("conv-1".to_string()), None);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "message": "hello",
                "conversationId": "conv-1",
                "metadata": {}
            })
        );
    }

    #[test]
    fn request_with_context_carries_page_context() {
        let request = ChatRequest::new("hello", None, Some("pricing page".to_string()));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["metadata"]["pageContext"], "pricing page");
        assert!(value.get("conversationId").is_none());
    }

    #[test]
    fn response_prefers_enveloped_text() {
        let response: ChatResponse =
            serde_json::from_value(json!({"data": {"text": "new"}, "text": "old"})).unwrap();
        assert_eq!(response.into_text(), "new");
    }

    #[test]
    fn response_falls_back_to_legacy_text() {
        let response: ChatResponse = serde_json::from_value(json!({"text": "old"})).unwrap();
        assert_eq!(response.into_text(), "old");

        let response: ChatResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.into_text(), "");
    }
}
