//! AI strategy coach: conversation state and the chat proxy client.
//!
//! The conversation is plain synchronous state owned by the UI. Sending a
//! message is split in three steps so the network call can run on the async
//! runtime: [`CoachConversation::begin`] records the user's message,
//! [`ChatClient::send`] talks to the proxy, [`CoachConversation::finish`]
//! records the reply or the failure.

use crate::config::CoachSettings;
use crate::error::MapError;
use crate::persistence::COACH_KEY;
use crate::types::WardleyMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One-click questions offered under the chat input.
pub const QUICK_PROMPTS: [&str; 4] = [
    "Analyze my map",
    "What should I build vs buy?",
    "Where are my risks?",
    "Suggest next moves",
];

const SYSTEM_PROMPT: &str = "You are an expert Wardley Mapping strategy coach. \
Help the user understand their value chain, the evolution of its components \
(genesis, custom-built, product, commodity) and the strategic plays available to them. \
Be concise and practical, and refer to the user's components by name.";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person using the editor
    User,
    /// The coach
    Assistant,
}

/// A single chat message, in the proxy's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote it
    pub role: Role,
    /// Message text
    pub content: String,
}

/// Chat history plus the state of the request in flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoachConversation {
    /// All exchanged messages, oldest first
    pub messages: Vec<ChatMessage>,
    /// Text in the input box
    pub draft: String,
    /// Error from the last failed request, shown inline
    pub last_error: Option<String>,
    in_flight: bool,
}

impl CoachConversation {
    /// Restores the conversation saved under the coach storage key.
    pub fn load(storage: &dyn eframe::Storage) -> Self {
        let messages = storage
            .get_string(COACH_KEY)
            .and_then(|json| match serde_json::from_str::<Vec<ChatMessage>>(&json) {
                Ok(messages) => Some(messages),
                Err(err) => {
                    log::warn!("ignoring unreadable coach history: {err}");
                    None
                }
            })
            .unwrap_or_default();
        Self {
            messages,
            ..Self::default()
        }
    }

    /// Writes the message history to storage.
    pub fn save(&self, storage: &mut dyn eframe::Storage) {
        match serde_json::to_string(&self.messages) {
            Ok(json) => storage.set_string(COACH_KEY, json),
            Err(err) => log::error!("Failed to serialize coach history: {err}"),
        }
    }

    /// Whether a request is waiting for its reply.
    pub fn is_waiting(&self) -> bool {
        self.in_flight
    }

    /// Records a user message and marks a request as in flight.
    ///
    /// # Returns
    ///
    /// [`MapError::Validation`] for blank text, [`MapError::Busy`] while another
    /// request is pending. Neither changes the conversation.
    pub fn begin(&mut self, text: &str) -> Result<(), MapError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MapError::Validation("Please enter a message.".to_string()));
        }
        if self.in_flight {
            return Err(MapError::Busy);
        }
        self.messages.push(ChatMessage {
            role: Role::User,
            content: text.to_string(),
        });
        self.in_flight = true;
        self.last_error = None;
        Ok(())
    }

    /// Request body for the proxy: model, limits, system prompt with the map, history.
    pub fn payload(&self, settings: &CoachSettings, map: &WardleyMap) -> Value {
        json!({
            "model": settings.model,
            "max_tokens": settings.max_tokens,
            "system": format!("{SYSTEM_PROMPT}\n\nCurrent map:\n{}", map_context(map)),
            "messages": self.messages,
        })
    }

    /// Records the outcome of the request started by [`begin`](Self::begin).
    ///
    /// On failure the unanswered message is taken back out of the history and put
    /// back in the input box, so retrying is a plain send.
    pub fn finish(&mut self, result: Result<String, MapError>) {
        self.in_flight = false;
        match result {
            Ok(reply) => {
                self.messages.push(ChatMessage {
                    role: Role::Assistant,
                    content: reply,
                });
                self.last_error = None;
            }
            Err(err) => {
                log::warn!("coach request failed: {err}");
                if self.messages.last().is_some_and(|m| m.role == Role::User) {
                    if let Some(message) = self.messages.pop() {
                        if self.draft.trim().is_empty() {
                            self.draft = message.content;
                        }
                    }
                }
                self.last_error = Some(err.to_string());
            }
        }
    }

    /// Forgets the whole conversation.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.last_error = None;
    }
}

fn label_of(map: &WardleyMap, id: u64) -> String {
    map.node(id).map(|n| n.label.clone()).unwrap_or_else(|| id.to_string())
}

/// Compact text rendering of a map for the coach's system prompt.
pub fn map_context(map: &WardleyMap) -> String {
    if map.nodes().is_empty() && map.zones().is_empty() {
        return "The map is empty.".to_string();
    }
    let mut out = String::with_capacity(1024);

    out.push_str(&format!("COMPONENTS ({}):\n", map.nodes().len()));
    for node in map.nodes() {
        out.push_str(&format!(
            "- \"{}\" stage={} visibility={:.0}",
            node.label,
            node.stage,
            node.y
        ));
        if let Some(target) = node.evolving_to.filter(|_| node.evolving) {
            out.push_str(&format!(" evolving_to={target}"));
        }
        if let Some(note) = &node.note {
            out.push_str(&format!(" note=\"{note}\""));
        }
        out.push('\n');
    }

    if !map.connections().is_empty() {
        out.push_str("DEPENDENCIES:\n");
        for connection in map.connections() {
            out.push_str(&format!(
                "- \"{}\" -> \"{}\"\n",
                label_of(map, connection.from),
                label_of(map, connection.to)
            ));
        }
    }

    if !map.zones().is_empty() {
        out.push_str("ZONES:\n");
        for zone in map.zones() {
            out.push_str(&format!(
                "- {} at x={:.0}..{:.0}",
                zone.zone_type.as_str(),
                zone.x,
                zone.x + zone.width
            ));
            if let Some(note) = &zone.note {
                out.push_str(&format!(" note=\"{note}\""));
            }
            out.push('\n');
        }
    }
    out
}

/// Reply text from a messages-API response: every `text` block of `content`, joined.
pub fn extract_reply(body: &Value) -> Result<String, MapError> {
    let text: Vec<&str> = body
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str).unwrap_or("text") == "text")
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    let reply = text.join("\n");
    if reply.trim().is_empty() {
        return Err(MapError::Network("the response contained no text".to_string()));
    }
    Ok(reply)
}

/// Best-effort error message from a proxy error body.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        return if trimmed.is_empty() {
            "request failed".to_string()
        } else {
            trimmed.to_string()
        };
    };
    let error = value.get("error");
    error
        .and_then(Value::as_str)
        .or_else(|| error.and_then(|e| e.get("message")).and_then(Value::as_str))
        .or_else(|| value.get("message").and_then(Value::as_str))
        .unwrap_or("request failed")
        .to_string()
}

/// HTTP client for the chat proxy.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ChatClient {
    /// Creates a client posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Sends one chat request and returns the reply text.
    ///
    /// # Returns
    ///
    /// [`MapError::Network`] when the proxy cannot be reached or its answer is
    /// unreadable, [`MapError::Upstream`] when it answers with an error status.
    pub async fn send(&self, payload: &Value) -> Result<String, MapError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| MapError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MapError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(MapError::Upstream {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        let value: Value =
            serde_json::from_str(&body).map_err(|e| MapError::Network(format!("unreadable response: {e}")))?;
        extract_reply(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use crate::stage::Stage;
    use crate::types::{NoteTarget, ZoneType};

    #[test]
    fn test_begin_rejects_blank_and_busy() {
        let mut chat = CoachConversation::default();
        assert!(matches!(chat.begin("   "), Err(MapError::Validation(_))));
        assert!(chat.messages.is_empty());

        chat.begin("Analyze my map").unwrap();
        assert!(chat.is_waiting());
        assert_eq!(chat.begin("again"), Err(MapError::Busy));
        assert_eq!(chat.messages.len(), 1);
    }

    #[test]
    fn test_finish_success_appends_reply() {
        let mut chat = CoachConversation::default();
        chat.begin("Hello").unwrap();
        chat.finish(Ok("Hi there".to_string()));
        assert!(!chat.is_waiting());
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[1].role, Role::Assistant);
        assert_eq!(chat.last_error, None);
    }

    #[test]
    fn test_finish_failure_preserves_history() {
        let mut chat = CoachConversation::default();
        chat.begin("First").unwrap();
        chat.finish(Ok("Answer".to_string()));
        chat.begin("Second").unwrap();
        chat.finish(Err(MapError::Upstream {
            status: 500,
            message: "API key not configured on server".to_string(),
        }));

        assert!(!chat.is_waiting());
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.draft, "Second");
        let error = chat.last_error.clone().unwrap();
        assert!(error.contains("500"));
        assert!(error.contains("API key not configured"));

        let retry = chat.draft.clone();
        chat.begin(&retry).unwrap();
        assert_eq!(chat.messages.len(), 3);
    }

    #[test]
    fn test_payload_shape() {
        let mut map = WardleyMap::new();
        let a = map.add_node("Customer", Stage::Genesis).unwrap();
        let b = map.add_node("Hosting", Stage::Commodity).unwrap();
        map.add_connection(a, b);
        let mut chat = CoachConversation::default();
        chat.begin("What should I build vs buy?").unwrap();

        let payload = chat.payload(&CoachSettings::default(), &map);
        assert_eq!(payload["max_tokens"], 1024);
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["messages"][0]["content"], "What should I build vs buy?");
        let system = payload["system"].as_str().unwrap();
        assert!(system.contains("\"Customer\" -> \"Hosting\""));
    }

    #[test]
    fn test_map_context() {
        let mut map = WardleyMap::new();
        assert_eq!(map_context(&map), "The map is empty.");
        let a = map.add_node("Kettle", Stage::Custom).unwrap();
        map.toggle_evolution(a).unwrap();
        map.set_note(NoteTarget::Node(a), "aging").unwrap();
        map.add_zone(ZoneType::Inertia);
        let text = map_context(&map);
        assert!(text.contains("COMPONENTS (1)"));
        assert!(text.contains("stage=custom"));
        assert!(text.contains("evolving_to=product"));
        assert!(text.contains("note=\"aging\""));
        assert!(text.contains("- inertia at x=100..400"));
    }

    #[test]
    fn test_extract_reply() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Build the core."},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "Buy the rest."}
            ]
        });
        assert_eq!(extract_reply(&body).unwrap(), "Build the core.\nBuy the rest.");
        assert!(matches!(extract_reply(&json!({"content": []})), Err(MapError::Network(_))));
        assert!(extract_reply(&json!({"error": "nope"})).is_err());
    }

    #[test]
    fn test_error_message_formats() {
        assert_eq!(error_message(r#"{"error":"API key not configured on server"}"#), "API key not configured on server");
        assert_eq!(
            error_message(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#),
            "Overloaded"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(""), "request failed");
    }

    #[test]
    fn test_history_persists() {
        let mut storage = MemoryStorage::default();
        let mut chat = CoachConversation::default();
        chat.begin("Where are my risks?").unwrap();
        chat.finish(Ok("In the commodity layer.".to_string()));
        chat.save(&mut storage);

        let restored = CoachConversation::load(&storage);
        assert_eq!(restored.messages, chat.messages);
        assert!(!restored.is_waiting());
    }

    #[tokio::test]
    async fn test_unreachable_proxy_is_network_error() {
        let client = ChatClient::new("http://127.0.0.1:9/api/claude");
        let result = client.send(&json!({"messages": []})).await;
        assert!(matches!(result, Err(MapError::Network(_))));
    }
}
