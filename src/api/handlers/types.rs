//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfoResponse {
    pub email: String,
    /// Unix seconds.
    pub issued_at: u64,
    /// Unix seconds.
    pub expires_at: u64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct StatusResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn session_response_uses_camel_case() -> Result<()> {
        let value = serde_json::to_value(SessionResponse {
            session_token: "abc".to_string(),
        })?;
        let token = value
            .get("sessionToken")
            .and_then(serde_json::Value::as_str)
            .context("missing sessionToken")?;
        assert_eq!(token, "abc");
        Ok(())
    }

    #[test]
    fn credentials_request_debug_hides_password() -> Result<()> {
        let request: CredentialsRequest = serde_json::from_str(
            r#"{"email":"alice@example.com","password":"hunter2hunter2"}"#,
        )?;
        let debug = format!("{request:?}");
        assert!(debug.contains("alice@example.com"));
        assert!(!debug.contains("hunter2"));
        Ok(())
    }
}
