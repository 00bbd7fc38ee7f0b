use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Who authored a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Message {
            role,
            content: content.into(),
        }
    }

    /// Create an empty system message
    pub fn system() -> Self {
        Message::new(Role::System, "")
    }

    /// Create an empty user message
    pub fn user() -> Self {
        Message::new(Role::User, "")
    }

    /// Create an empty assistant message
    pub fn assistant() -> Self {
        Message::new(Role::Assistant, "")
    }

    /// Append text to the message
    pub fn with_text<S: AsRef<str>>(mut self, text: S) -> Self {
        self.content.push_str(text.as_ref());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_builder() {
        let message = Message::user().with_text("Hello, ").with_text("StarkNet");
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content, "Hello, StarkNet");
    }

    #[test]
    fn test_role_wire_names() {
        let message = Message::assistant().with_text("ok");
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"role": "assistant", "content": "ok"})
        );
        assert_eq!("system".parse::<Role>().unwrap(), Role::System);
        assert_eq!(Role::User.to_string(), "user");
    }
}
