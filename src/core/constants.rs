//! Shared constants used across the application

/// Storage key holding the JSON array of every persisted session.
pub const CHAT_HISTORY_KEY: &str = "chatHistory";

/// Content of the assistant turn appended when every credential failed.
pub const FALLBACK_ERROR_CONTENT: &str = "Meow... something went wrong, please try again later.";

/// Credential label carried by the fallback error turn.
pub const FALLBACK_ERROR_CREDENTIAL_LABEL: u32 = 0;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_PREFERRED_CREDENTIAL: usize = 1;
pub const DEFAULT_LAST_GOOD_CREDENTIAL: usize = 1;
pub const DEFAULT_RESERVED_CREDENTIAL: usize = 0;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Keyring service name under which credential slots are stored.
pub const KEYRING_SERVICE: &str = "purrchat";

/// Environment variable holding a comma-separated credential list.
pub const API_KEYS_ENV: &str = "PURRCHAT_API_KEYS";

/// Environment variable holding the tracing filter directive.
pub const LOG_FILTER_ENV: &str = "PURRCHAT_LOG";
