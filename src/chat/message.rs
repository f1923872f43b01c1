//! Chat log entries and expert identities

use crate::profile::wire_enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

wire_enum! {
    /// Who authored a message
    MessageRole {
        User => "user",
        Assistant => "assistant",
        System => "system",
    }
}

/// Identity attributed to assistant replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertInfo {
    pub name: String,
    /// Role or title shown under the name
    pub role: String,
    pub emoji: String,
    /// Category tag (general, dermatology, ...)
    #[serde(default = "default_category")]
    pub category: String,
    /// Persona this expert was derived from, when chosen by the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
}

fn default_category() -> String {
    "general".to_string()
}

impl ExpertInfo {
    /// The identity used before any persona is chosen
    ///
    /// # Examples
    ///
    /// ```
    /// use sil_consult::chat::ExpertInfo;
    ///
    /// let expert = ExpertInfo::system_default();
    /// assert_eq!(expert.name, "SIL");
    /// assert!(expert.persona_id.is_none());
    /// ```
    pub fn system_default() -> Self {
        Self {
            name: "SIL".to_string(),
            role: "Clinical AI".to_string(),
            emoji: "🔬".to_string(),
            category: default_category(),
            persona_id: None,
        }
    }
}

impl Default for ExpertInfo {
    fn default() -> Self {
        Self::system_default()
    }
}

/// One entry in the chat log
///
/// User messages are complete on creation. Assistant placeholders start
/// empty and only the chat controller rewrites their content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique per message
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expert: Option<ExpertInfo>,
}

impl ChatMessage {
    /// Creates a complete user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content.into(), None)
    }

    /// Creates an assistant message attributed to `expert`
    pub fn assistant(content: impl Into<String>, expert: ExpertInfo) -> Self {
        Self::new(MessageRole::Assistant, content.into(), Some(expert))
    }

    fn new(role: MessageRole, content: String, expert: Option<ExpertInfo>) -> Self {
        Self {
            id: format!("msg-{}", uuid::Uuid::new_v4()),
            role,
            content,
            timestamp: Utc::now(),
            expert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ids_are_unique() {
        let a = ChatMessage::user("hi");
        let b = ChatMessage::user("hi");
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("msg-"));
    }

    #[test]
    fn test_assistant_message_carries_expert() {
        let msg = ChatMessage::assistant("", ExpertInfo::system_default());
        assert_eq!(msg.role, MessageRole::Assistant);
        assert!(msg.content.is_empty());
        assert_eq!(msg.expert.unwrap().emoji, "🔬");
    }

    #[test]
    fn test_expert_deserializes_without_optional_fields() {
        let json = r#"{"name":"Dr. Kim","role":"Dermatologist","emoji":"👩‍⚕️"}"#;
        let expert: ExpertInfo = serde_json::from_str(json).unwrap();
        assert_eq!(expert.category, "general");
        assert!(expert.persona_id.is_none());
    }
}
