//! Login/logout state machine driving the login form.

use models::user::User;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use super::{
    api_client::{ApiClient, ApiError, GENERIC_ERROR_MESSAGE},
    cache::QueryCache,
    navigation::Route,
    validation::{self, FieldErrors},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    Anonymous,
    Authenticating,
    Authenticated { user: Option<User> },
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub identifier: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: SecretString::from(password.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("a login attempt is already in progress")]
    InProgress,
    #[error("invalid credentials: {0}")]
    Invalid(FieldErrors),
    #[error("{message}")]
    Rejected { message: String },
}

#[derive(Debug)]
pub struct AuthService {
    api: ApiClient,
    cache: QueryCache,
    state: watch::Sender<AuthState>,
}

impl AuthService {
    pub fn new(api: ApiClient, cache: QueryCache) -> Self {
        let session = api.session();
        let initial = if session.is_authenticated() {
            AuthState::Authenticated {
                user: session.user(),
            }
        } else {
            AuthState::Anonymous
        };
        Self {
            api,
            cache,
            state: watch::Sender::new(initial),
        }
    }

    /// Current state. A session dropped elsewhere (e.g. a 401) reads as Anonymous.
    pub fn state(&self) -> AuthState {
        let session_alive = self.api.session().is_authenticated();
        self.state.send_if_modified(|state| {
            if matches!(state, AuthState::Authenticated { .. }) && !session_alive {
                *state = AuthState::Anonymous;
                return true;
            }
            false
        });
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Exchange credentials for a session. Returns where to navigate on success.
    pub async fn submit(&self, credentials: &Credentials) -> Result<Route, AuthError> {
        validation::validate_login(
            &credentials.identifier,
            credentials.password.expose_secret(),
        )
        .map_err(AuthError::Invalid)?;

        let mut started = false;
        self.state.send_if_modified(|state| {
            if matches!(state, AuthState::Authenticating) {
                return false;
            }
            *state = AuthState::Authenticating;
            started = true;
            true
        });
        if !started {
            return Err(AuthError::InProgress);
        }
        let mut attempt = AttemptGuard {
            state: &self.state,
            settled: false,
        };

        let identifier = credentials.identifier.trim();
        let outcome = self
            .api
            .login(identifier, credentials.password.expose_secret())
            .await;

        match outcome {
            Ok(response) => {
                self.cache.clear().await;
                self.api
                    .session()
                    .login(SecretString::from(response.jwt), response.user.clone());
                info!(username = %response.user.username, "Logged in");
                attempt.settle(AuthState::Authenticated {
                    user: Some(response.user),
                });
                Ok(Route::Dashboard)
            }
            Err(e) => {
                let message = match e {
                    ApiError::ServerRejected { message, .. } => message,
                    other => {
                        warn!(error = %other, "Login request failed");
                        GENERIC_ERROR_MESSAGE.to_string()
                    }
                };
                attempt.settle(AuthState::Failed {
                    message: message.clone(),
                });
                Err(AuthError::Rejected { message })
            }
        }
    }

    /// End the session and forget everything fetched under it.
    pub async fn logout(&self) -> Route {
        self.api.session().logout();
        self.cache.clear().await;
        self.state.send_replace(AuthState::Anonymous);
        info!("Logged out");
        Route::Login
    }
}

/// Puts the state back to Anonymous if a login attempt is abandoned mid-flight.
struct AttemptGuard<'a> {
    state: &'a watch::Sender<AuthState>,
    settled: bool,
}

impl AttemptGuard<'_> {
    fn settle(&mut self, next: AuthState) {
        self.state.send_replace(next);
        self.settled = true;
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.state.send_replace(AuthState::Anonymous);
        }
    }
}
