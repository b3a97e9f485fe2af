use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `tokens` block of the login body. Only the access token is required;
/// everything else the server sends is kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tokens {
    pub fn refresh_token(&self) -> Option<&str> {
        self.extra.get("refresh_token").and_then(Value::as_str)
    }
}

/// Full login body. Fields other than `tokens` are carried untouched so the
/// body serializes back out as the server sent it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub tokens: Tokens,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoginResponse {
    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }

    pub fn message(&self) -> Option<&str> {
        self.extra.get("message").and_then(Value::as_str)
    }
}

/// Body of `/auth/me`, whatever its shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrentUserResponse(pub Value);

impl CurrentUserResponse {
    pub fn user_id(&self) -> Option<i64> {
        self.0.pointer("/user/id").and_then(Value::as_i64)
    }

    pub fn is_admin(&self) -> bool {
        self.0
            .pointer("/user/is_admin")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Name to show on the console: full name, then username, then email
    pub fn display_name(&self) -> String {
        ["/user/full_name", "/user/username", "/user/email"]
            .iter()
            .find_map(|p| self.0.pointer(p).and_then(Value::as_str))
            .map(str::to_string)
            .or_else(|| self.user_id().map(|id| format!("user #{}", id)))
            .unwrap_or_else(|| "unknown user".to_string())
    }
}
