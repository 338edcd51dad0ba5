//! Shared-password gate.
//!
//! This only decides whether the chat page is shown. It carries no session,
//! no lockout and no audit trail, and the chat endpoint does not consult it.

use serde::{Deserialize, Serialize};

/// Key under which clients persist the unlocked flag.
pub const AUTH_FLAG_KEY: &str = "sgcopy_authed";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub password: Option<String>,
}

/// Exact, full-value comparison of a submitted password with the configured one.
///
/// A missing or empty value on either side never matches.
pub fn verify_password(submitted: Option<&str>, configured: Option<&str>) -> bool {
    match (submitted, configured) {
        (Some(submitted), Some(configured)) if !submitted.is_empty() && !configured.is_empty() => {
            submitted.as_bytes() == configured.as_bytes()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(verify_password(Some("letmein"), Some("letmein")));
    }

    #[test]
    fn test_mismatches() {
        assert!(!verify_password(Some("wrong"), Some("letmein")));
        assert!(!verify_password(Some("LetMeIn"), Some("letmein")));
        assert!(!verify_password(Some("letme"), Some("letmein")));
        assert!(!verify_password(Some("letmein "), Some("letmein")));
    }

    #[test]
    fn test_missing_values_fail() {
        assert!(!verify_password(None, Some("letmein")));
        assert!(!verify_password(Some(""), Some("letmein")));
        assert!(!verify_password(Some("letmein"), None));
        assert!(!verify_password(Some(""), Some("")));
        assert!(!verify_password(None, None));
    }
}
