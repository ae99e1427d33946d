//! Current bearer token and user, mirrored to durable storage.

use std::sync::{Arc, PoisonError, RwLock};

use models::user::User;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::storage::DurableStorage;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug)]
struct ActiveSession {
    token: SecretString,
    user: Option<User>,
}

/// Session state shared by every service that talks to the API.
///
/// Transitions never fail: storage errors are logged and the in-memory
/// state still changes.
#[derive(Debug)]
pub struct SessionStore {
    storage: Arc<dyn DurableStorage>,
    state: RwLock<Option<ActiveSession>>,
    authenticated: watch::Sender<bool>,
}

impl SessionStore {
    /// Build the store from whatever the previous run left in `storage`.
    pub fn restore(storage: Arc<dyn DurableStorage>) -> Self {
        let token = storage.get(TOKEN_KEY).filter(|t| !t.is_empty());
        let user = storage.get(USER_KEY).and_then(|raw| {
            serde_json::from_str::<User>(&raw)
                .map_err(|e| warn!(error = %e, "Discarding unreadable stored user"))
                .ok()
        });

        let state = token.map(|token| ActiveSession {
            token: SecretString::from(token),
            user,
        });
        if let Some(session) = &state {
            debug!(
                username = session.user.as_ref().map(|u| u.username.as_str()),
                "Restored session from storage"
            );
        }

        let authenticated = watch::Sender::new(state.is_some());
        Self {
            storage,
            state: RwLock::new(state),
            authenticated,
        }
    }

    pub fn login(&self, token: SecretString, user: User) {
        if let Err(e) = self.storage.set(TOKEN_KEY, token.expose_secret()) {
            warn!(error = %e, "Failed to persist session token");
        }
        match serde_json::to_string(&user) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(USER_KEY, &raw) {
                    warn!(error = %e, "Failed to persist session user");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize session user"),
        }

        info!(username = %user.username, "Session started");
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Some(ActiveSession {
            token,
            user: Some(user),
        });
        self.authenticated.send_replace(true);
    }

    pub fn logout(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to clear stored session value");
            }
        }

        let previous = self.state.write().unwrap_or_else(PoisonError::into_inner).take();
        if previous.is_some() {
            info!("Session ended");
        }
        self.authenticated.send_replace(false);
    }

    /// Bearer token, if a non-empty one is held.
    pub fn token(&self) -> Option<SecretString> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| SecretString::from(s.token.expose_secret().to_owned()))
    }

    pub fn user(&self) -> Option<User> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Receiver that flips whenever the session starts or ends.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }
}
