//! Wire types of the account, token and session endpoints.

use std::fmt;

use serde::Deserialize;

pub const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
pub const REFRESH_TOKEN_GRANT: &str = "refresh_token";

pub const AUTHORIZATION_PENDING: &str = "authorization_pending";
pub const SLOW_DOWN: &str = "slow_down";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: Option<String>,
    pub verification_uri: Option<String>,
    pub verification_uri_complete: Option<String>,
    pub expires_in: Option<u64>,
    pub interval: Option<u64>,
}

impl DeviceAuthorization {
    /// URL shown to the operator, preferring the one with the code embedded.
    pub fn display_uri(&self) -> Option<&str> {
        self.verification_uri_complete
            .as_deref()
            .or(self.verification_uri.as_deref())
    }
}

/// Token endpoint answer. Success and error bodies share this shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Tokens issued by a successful grant.
#[derive(Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Profile {
    pub uuid: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProfilesResponse {
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionResponse {
    pub session_token: Option<String>,
    pub identity_token: Option<String>,
    pub expires_at: Option<String>,
}

/// Short-lived credentials handed to the server process.
#[derive(Clone, PartialEq)]
pub struct GameSession {
    pub session_token: String,
    pub identity_token: String,
    pub profile_uuid: String,
    pub username: Option<String>,
    pub expires_at: Option<String>,
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("session_token", &"<redacted>")
            .field("identity_token", &"<redacted>")
            .field("profile_uuid", &self.profile_uuid)
            .field("username", &self.username)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_debug_hides_tokens() {
        let session = GameSession {
            session_token: "secret-session".to_string(),
            identity_token: "secret-identity".to_string(),
            profile_uuid: "uuid-1".to_string(),
            username: Some("builder".to_string()),
            expires_at: None,
        };
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("secret-session"));
        assert!(!rendered.contains("secret-identity"));
        assert!(rendered.contains("uuid-1"));
    }

    #[test]
    fn test_session_response_camel_case() {
        let parsed: SessionResponse = serde_json::from_str(
            r#"{"sessionToken":"s","identityToken":"i","expiresAt":"2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(parsed.session_token.as_deref(), Some("s"));
        assert_eq!(parsed.identity_token.as_deref(), Some("i"));
    }

    #[test]
    fn test_display_uri_prefers_complete() {
        let auth: DeviceAuthorization = serde_json::from_str(
            r#"{"device_code":"d","verification_uri":"https://a/","verification_uri_complete":"https://a/?c=X"}"#,
        )
        .unwrap();
        assert_eq!(auth.display_uri(), Some("https://a/?c=X"));
        assert_eq!(auth.interval, None);
    }
}
