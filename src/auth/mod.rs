pub mod http;
pub mod memory;

use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};

pub use http::HttpAuth;
pub use memory::MemoryAuth;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Parse(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Who is signed in, and how to change that.
///
/// Handed to the service explicitly so tests can substitute their own provider.
#[async_trait]
pub trait AuthSession: Send + Sync {
    /// Opaque id of the signed-in principal.
    fn current_user_id(&self) -> Option<String>;

    async fn register(&self, email: &str, password: &str) -> AuthResult<()>;

    async fn login(&self, email: &str, password: &str) -> AuthResult<()>;

    fn logout(&self);

    fn is_logged_in(&self) -> bool {
        self.current_user_id().is_some()
    }
}

#[async_trait]
impl<T: AuthSession + ?Sized> AuthSession for Arc<T> {
    fn current_user_id(&self) -> Option<String> {
        (**self).current_user_id()
    }

    async fn register(&self, email: &str, password: &str) -> AuthResult<()> {
        (**self).register(email, password).await
    }

    async fn login(&self, email: &str, password: &str) -> AuthResult<()> {
        (**self).login(email, password).await
    }

    fn logout(&self) {
        (**self).logout()
    }
}

pub(crate) fn check_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() || password.trim().is_empty() {
        return Err(AuthError::InvalidInput(
            "Email and password must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Bearer token shared between the auth provider that obtains it and the
/// HTTP document store that sends it.
#[derive(Clone, Debug, Default)]
pub struct SessionToken(Arc<RwLock<Option<String>>>);

impl SessionToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set(&self, token: String) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn auth_header(&self) -> Option<String> {
        self.get().map(|t| format!("Bearer {t}"))
    }
}
