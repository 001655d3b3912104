use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use log::{info, warn};

use crate::auth::{decode_jwt, AuthError};
use crate::models::User;

use super::router::Route;

/// Who is signed in, as far as the portal knows right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
}

impl SessionState {
    pub fn loading() -> Self {
        Self { user: None, loading: true }
    }

    pub fn signed_out() -> Self {
        Self { user: None, loading: false }
    }

    pub fn signed_in(user: User) -> Self {
        Self { user: Some(user), loading: false }
    }
}

/// The external identity provider: owns login, session persistence and logout.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<User>, AuthError>;
    async fn logout(&self);
}

/// Identity backed by a bearer token issued elsewhere and verified locally.
#[derive(Default)]
pub struct TokenIdentity {
    token: Mutex<Option<String>>,
}

impl TokenIdentity {
    pub fn new(token: Option<String>) -> Self {
        Self { token: Mutex::new(token) }
    }
}

#[async_trait]
impl IdentityProvider for TokenIdentity {
    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        let token = self.token.lock().unwrap_or_else(PoisonError::into_inner).clone();
        match token {
            Some(t) => Ok(Some(decode_jwt(&t)?.user())),
            None => Ok(None),
        }
    }

    async fn logout(&self) {
        self.token.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

/// Session context handed to views. Starts out loading until [`Session::init`] runs.
pub struct Session {
    identity: Arc<dyn IdentityProvider>,
    state: SessionState,
}

impl Session {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity, state: SessionState::loading() }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    /// Resolves the current user. An identity failure leaves the session signed out.
    pub async fn init(&mut self) {
        self.state = SessionState::loading();
        self.state = match self.identity.current_user().await {
            Ok(Some(user)) => {
                info!("session established for {} ({})", user.id, user.role.as_str());
                SessionState::signed_in(user)
            }
            Ok(None) => SessionState::signed_out(),
            Err(e) => {
                warn!("could not resolve session: {e}");
                SessionState::signed_out()
            }
        };
    }

    /// Ends the session and returns where the portal should navigate.
    pub async fn logout(&mut self) -> Route {
        self.identity.logout().await;
        if let Some(user) = self.state.user.take() {
            info!("session closed for {}", user.id);
        }
        self.state = SessionState::signed_out();
        Route::Root
    }
}
