use serde::{Deserialize, Serialize};

/// Authenticated user as returned by the auth API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthUser {
    /// Display name captured at sign-up, if any
    pub fn name(&self) -> Option<&str> {
        self.user_metadata.get("name").and_then(|n| n.as_str())
    }
}

/// Auth session returned by sign-in, sign-up and token refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Error body returned by the auth and REST endpoints
///
/// The auth API and the table API disagree on field names, so every known
/// variant is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn describe(&self) -> Option<String> {
        self.error_description
            .clone()
            .or_else(|| self.message.clone())
            .or_else(|| self.msg.clone())
            .or_else(|| self.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_prefers_description() {
        let body: ErrorResponse = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(body.describe().as_deref(), Some("Invalid login credentials"));

        let body: ErrorResponse =
            serde_json::from_str(r#"{"code":"23505","message":"duplicate key"}"#).unwrap();
        assert_eq!(body.describe().as_deref(), Some("duplicate key"));
    }

    #[test]
    fn test_auth_user_name() {
        let user: AuthUser = serde_json::from_str(
            r#"{"id":"u1","email":"a@b.c","user_metadata":{"name":"Sarah"}}"#,
        )
        .unwrap();
        assert_eq!(user.name(), Some("Sarah"));
    }
}
