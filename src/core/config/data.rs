use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk configuration. Every field is optional; accessors in
/// [`super::defaults`] supply the fallbacks.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the OpenAI-compatible endpoint (e.g., "https://api.deepseek.com/v1")
    pub base_url: Option<String>,
    /// Model name sent with every request
    pub model: Option<String>,
    /// Sampling temperature in [0, 1]
    pub temperature: Option<f32>,
    /// 0-based credential tried first on every send
    pub preferred_credential: Option<usize>,
    /// 0-based credential recorded as last known good at startup
    pub last_good_credential: Option<usize>,
    /// Keep credential 0 as an emergency credential that only failover uses
    pub reserve_emergency_credential: Option<bool>,
    /// UI theme color ("yellow", "purple", "red", "orange", "blue")
    pub theme: Option<String>,
    /// Which index the failover walk skips: "preferred" or "last-good"
    pub failover_skip: Option<String>,
    /// Keyring account names holding the credentials, in pool order
    #[serde(default)]
    pub credential_slots: Vec<String>,
    /// Per-request timeout for the completion endpoint
    pub request_timeout_secs: Option<u64>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/purrchat` → `~/.config/purrchat`
/// - Windows: `C:\\Users\\user\\AppData\\Roaming\\purrchat` stays as-is
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn add_credential_slot(&mut self, slot: &str) -> bool {
        if self.has_credential_slot(slot) {
            return false;
        }
        self.credential_slots.push(slot.to_string());
        true
    }

    pub fn remove_credential_slot(&mut self, slot: &str) -> bool {
        let before = self.credential_slots.len();
        self.credential_slots.retain(|s| !s.eq_ignore_ascii_case(slot));
        before != self.credential_slots.len()
    }

    pub fn has_credential_slot(&self, slot: &str) -> bool {
        self.credential_slots
            .iter()
            .any(|s| s.eq_ignore_ascii_case(slot))
    }
}
