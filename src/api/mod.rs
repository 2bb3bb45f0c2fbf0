use serde::{Deserialize, Serialize};

use crate::core::message::Turn;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponseMessage {
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponseChoice {
    pub message: Option<ChatResponseMessage>,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatResponseChoice>,
}

impl ChatResponse {
    /// Content of the first choice, if the body carried one.
    pub fn into_first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
    }
}

impl From<&Turn> for ChatMessage {
    /// Only role and content travel; credential labels and timestamps stay local.
    fn from(turn: &Turn) -> Self {
        ChatMessage {
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_strips_turn_metadata() {
        let turn = Turn::assistant("hi", 1).with_timestamp(7);
        let request = ChatRequest {
            model: "deepseek-chat".to_string(),
            messages: vec![ChatMessage::from(&turn)],
            temperature: 0.5,
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "model": "deepseek-chat",
                "messages": [{"role": "assistant", "content": "hi"}],
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn first_content_requires_full_path() {
        let ok: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"yes"}}]}"#).expect("parse");
        assert_eq!(ok.into_first_content().as_deref(), Some("yes"));

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).expect("parse");
        assert!(empty.into_first_content().is_none());

        let missing: ChatResponse = serde_json::from_str(r#"{"id":"x"}"#).expect("parse");
        assert!(missing.into_first_content().is_none());
    }
}
