use serde::{Deserialize, Serialize};

use crate::core::constants::{FALLBACK_ERROR_CONTENT, FALLBACK_ERROR_CREDENTIAL_LABEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
}

/// One exchanged message. Turns are never edited after they are appended.
///
/// Field names use the camelCase history layout so histories written by other
/// clients can be read back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// 1-based label of the credential that produced an assistant turn; 0 marks
    /// the fallback error turn.
    #[serde(
        rename = "apiKeyIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub credential_index: Option<u32>,
    /// Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("invalid turn role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            credential_index: None,
            timestamp: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant reply produced with the credential at `used_index` (0-based).
    pub fn assistant(content: impl Into<String>, used_index: usize) -> Self {
        Self {
            credential_index: Some(used_index as u32 + 1),
            ..Self::new(Role::Assistant, content)
        }
    }

    /// The turn recorded when a send exhausted every credential.
    pub fn fallback_error() -> Self {
        Self {
            credential_index: Some(FALLBACK_ERROR_CREDENTIAL_LABEL),
            ..Self::new(Role::Assistant, FALLBACK_ERROR_CONTENT)
        }
    }

    pub fn with_timestamp(mut self, millis: i64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.role.is_assistant()
    }

    pub fn is_fallback_error(&self) -> bool {
        self.is_assistant() && self.credential_index == Some(FALLBACK_ERROR_CREDENTIAL_LABEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_turn_carries_one_based_label() {
        let turn = Turn::assistant("hi", 2);
        assert_eq!(turn.credential_index, Some(3));
        assert!(!turn.is_fallback_error());
    }

    #[test]
    fn fallback_turn_uses_label_zero() {
        let turn = Turn::fallback_error();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.content, FALLBACK_ERROR_CONTENT);
        assert_eq!(turn.credential_index, Some(0));
        assert!(turn.is_fallback_error());
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let turn = Turn::assistant("hello", 0).with_timestamp(42);
        let json = serde_json::to_value(&turn).expect("serialize");
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["apiKeyIndex"], 1);
        assert_eq!(json["timestamp"], 42);

        let user = serde_json::to_value(Turn::user("q")).expect("serialize");
        assert!(user.get("apiKeyIndex").is_none());
        assert!(user.get("timestamp").is_none());
    }

    #[test]
    fn invalid_role_strings_are_rejected() {
        assert!(Role::try_from("system").is_err());
        let parsed: Result<Turn, _> = serde_json::from_str(r#"{"role":"tool","content":"x"}"#);
        assert!(parsed.is_err());
    }
}
