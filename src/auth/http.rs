use super::{check_credentials, AuthError, AuthResult, AuthSession, SessionToken};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct AuthResponse {
    pub token: String,
    pub user_id: String,
}

/// Email/password sign-in against the notes backend.
///
/// The bearer token lands in a [`SessionToken`] that the caller also hands to
/// [`crate::docstore::HttpDocumentStore`].
pub struct HttpAuth {
    base_url: String,
    client: reqwest::Client,
    token: SessionToken,
    user_id: RwLock<Option<String>>,
}

impl HttpAuth {
    pub fn new(base_url: impl Into<String>, token: SessionToken) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            token,
            user_id: RwLock::new(None),
        }
    }

    /// Resume a session persisted by the caller.
    pub fn restore(&self, token: String, user_id: String) {
        self.token.set(token);
        *self.user_id.write().unwrap_or_else(PoisonError::into_inner) = Some(user_id);
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authenticate(&self, path: &str, email: &str, password: &str) -> AuthResult<()> {
        check_credentials(email, password)?;

        let res = self
            .client
            .post(self.endpoint(path))
            .json(&CredentialsRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = res.status();
        if status.is_success() {
            let body: AuthResponse = res
                .json()
                .await
                .map_err(|e| AuthError::Parse(e.to_string()))?;
            self.restore(body.token, body.user_id);
            tracing::info!(path, "signed in");
            Ok(())
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(map_status(status.as_u16(), body))
        }
    }
}

pub(crate) fn map_status(status: u16, body: String) -> AuthError {
    match status {
        401 | 403 => AuthError::InvalidCredentials,
        409 => AuthError::EmailTaken,
        _ => AuthError::Http { status, body },
    }
}

#[async_trait]
impl AuthSession for HttpAuth {
    fn current_user_id(&self) -> Option<String> {
        self.user_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn register(&self, email: &str, password: &str) -> AuthResult<()> {
        self.authenticate("/auth/register", email, password).await
    }

    async fn login(&self, email: &str, password: &str) -> AuthResult<()> {
        self.authenticate("/auth/login", email, password).await
    }

    fn logout(&self) {
        self.token.clear();
        *self.user_id.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_contract_deserialize() {
        let json = r#"{ "token": "jwt-token", "user_id": "u-1234" }"#;
        let parsed: AuthResponse = serde_json::from_str(json).expect("auth response should parse");
        assert_eq!(parsed.token, "jwt-token");
        assert_eq!(parsed.user_id, "u-1234");
    }

    #[test]
    fn test_credentials_request_serialization() {
        let req = CredentialsRequest {
            email: "u@example.com".to_string(),
            password: "pass".to_string(),
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["email"], "u@example.com");
        assert_eq!(v["password"], "pass");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let auth = HttpAuth::new("http://localhost:6689/", SessionToken::new());
        assert_eq!(auth.endpoint("/auth/login"), "http://localhost:6689/auth/login");
    }

    #[test]
    fn test_restore_and_logout() {
        let token = SessionToken::new();
        let auth = HttpAuth::new("http://localhost:6689", token.clone());
        assert!(!auth.is_logged_in());

        auth.restore("t1".to_string(), "u1".to_string());
        assert_eq!(auth.current_user_id().as_deref(), Some("u1"));
        assert_eq!(token.get().as_deref(), Some("t1"));

        auth.logout();
        assert!(auth.current_user_id().is_none());
        assert!(token.get().is_none());
    }

    #[test]
    fn test_map_status() {
        assert_eq!(map_status(401, String::new()), AuthError::InvalidCredentials);
        assert_eq!(map_status(409, String::new()), AuthError::EmailTaken);
        assert_eq!(
            map_status(500, "boom".to_string()),
            AuthError::Http {
                status: 500,
                body: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_login_rejects_blank_before_network() {
        let auth = HttpAuth::new("http://127.0.0.1:9", SessionToken::new());
        let err = auth.login("", "pw").await.expect_err("blank email");
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }
}
