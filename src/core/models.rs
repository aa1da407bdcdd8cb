use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// A registered OAuth 2.0 client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Client {
    pub id: String,
    pub secret: String,
    pub domain: String,
    pub user_id: String,
    pub public: bool,
}

impl Client {
    pub fn new(id: impl Into<String>, secret: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            domain: domain.into(),
            ..Default::default()
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }
}

/// Everything issued for a single grant: an authorization code, or an access
/// token with an optional refresh token.
///
/// Empty strings mean "not issued".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Token {
    pub client_id: String,
    pub user_id: String,
    pub redirect_uri: String,
    pub scope: String,

    pub code: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub code_create_at: Option<SystemTime>,
    pub code_expires_in: Duration,

    pub access: String,
    pub access_create_at: Option<SystemTime>,
    pub access_expires_in: Duration,

    pub refresh: String,
    pub refresh_create_at: Option<SystemTime>,
    pub refresh_expires_in: Duration,
}

impl Token {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(mut self, code: impl Into<String>, create_at: SystemTime, expires_in: Duration) -> Self {
        self.code = code.into();
        self.code_create_at = Some(create_at);
        self.code_expires_in = expires_in;
        self
    }

    pub fn with_access(mut self, access: impl Into<String>, create_at: SystemTime, expires_in: Duration) -> Self {
        self.access = access.into();
        self.access_create_at = Some(create_at);
        self.access_expires_in = expires_in;
        self
    }

    pub fn with_refresh(mut self, refresh: impl Into<String>, create_at: SystemTime, expires_in: Duration) -> Self {
        self.refresh = refresh.into();
        self.refresh_create_at = Some(create_at);
        self.refresh_expires_in = expires_in;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_payload_tolerates_missing_fields() {
        let token: Token = serde_json::from_str(r#"{"code":"abc123"}"#).unwrap();
        assert_eq!(token.code, "abc123");
        assert_eq!(token.access, "");
        assert_eq!(token.code_create_at, None);
    }

    #[test]
    fn client_keeps_fields_outside_columns() {
        let client = Client::new("id", "secret", "https://example.com").with_user_id("user-1");
        let data = serde_json::to_string(&client).unwrap();
        let back: Client = serde_json::from_str(&data).unwrap();
        assert_eq!(back.user_id, "user-1");
        assert_eq!(back, client);
    }
}
