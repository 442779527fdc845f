use super::{check_credentials, AuthError, AuthResult, AuthSession};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Accounts {
    /// email -> (password, user id)
    by_email: HashMap<String, (String, String)>,
    current: Option<String>,
}

/// Accounts kept in process. Used by tests and local tooling.
#[derive(Default)]
pub struct MemoryAuth {
    state: Mutex<Accounts>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider already signed in as `user_id`, without a registered account.
    pub fn signed_in(user_id: &str) -> Self {
        let auth = Self::new();
        auth.lock().current = Some(user_id.to_string());
        auth
    }

    fn lock(&self) -> MutexGuard<'_, Accounts> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AuthSession for MemoryAuth {
    fn current_user_id(&self) -> Option<String> {
        self.lock().current.clone()
    }

    async fn register(&self, email: &str, password: &str) -> AuthResult<()> {
        check_credentials(email, password)?;
        let mut state = self.lock();
        let key = email_key(email);
        if state.by_email.contains_key(&key) {
            return Err(AuthError::EmailTaken);
        }
        let user_id = uuid::Uuid::new_v4().simple().to_string();
        state
            .by_email
            .insert(key, (password.to_string(), user_id.clone()));
        state.current = Some(user_id);
        tracing::debug!("registered in-memory account");
        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> AuthResult<()> {
        check_credentials(email, password)?;
        let mut state = self.lock();
        let user_id = match state.by_email.get(&email_key(email)) {
            Some((pw, id)) if pw == password => id.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        state.current = Some(user_id);
        Ok(())
    }

    fn logout(&self) {
        self.lock().current = None;
    }
}
