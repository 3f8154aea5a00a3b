//! The Places API key.
//!
//! The key is kept in a `SecretBox`, zeroed on drop, and prints as
//! `[REDACTED]`, so `{:?}` on a [`CensusConfig`](crate::config::CensusConfig)
//! is safe to log.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// Owned key text that formats as `[REDACTED]`.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// The raw key. The only caller is the searcher constructor.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_not_in_debug_or_display() {
        let secret = SecretString::new("AIzaSy-not-a-real-key");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_expose_and_clone() {
        let secret = SecretString::from("AIzaSy-not-a-real-key");
        assert_eq!(secret.clone().expose(), "AIzaSy-not-a-real-key");
        assert!(!secret.is_empty());
        assert!(SecretString::from("  ").is_empty());
    }
}
