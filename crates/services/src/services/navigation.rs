//! Dashboard routes and the private-route guard.

use std::{fmt, str::FromStr};

use models::resource::DocumentId;
use thiserror::Error;
use tracing::debug;

use super::session::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Clients,
    Client(DocumentId),
    Projects,
    Project(DocumentId),
    Finances,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown route: {0}")]
pub struct UnknownRoute(pub String);

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::Dashboard => "/".to_string(),
            Self::Clients => "/clients".to_string(),
            Self::Client(id) => format!("/clients/{id}"),
            Self::Projects => "/projects".to_string(),
            Self::Project(id) => format!("/projects/{id}"),
            Self::Finances => "/finances".to_string(),
        }
    }

    /// Everything but the login page needs a session.
    pub fn is_private(&self) -> bool {
        !matches!(self, Self::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] | ["dashboard"] => Self::Dashboard,
            ["login"] => Self::Login,
            ["clients"] => Self::Clients,
            ["clients", id] => Self::Client(DocumentId::new(*id)),
            ["projects"] => Self::Projects,
            ["projects", id] => Self::Project(DocumentId::new(*id)),
            ["finances"] => Self::Finances,
            _ => return Err(UnknownRoute(path.to_string())),
        };
        Ok(route)
    }
}

/// Where a navigation to `requested` actually lands.
pub fn guard(session: &SessionStore, requested: Route) -> Route {
    if requested.is_private() && !session.is_authenticated() {
        debug!(route = %requested, "No session, redirecting to login");
        return Route::Login;
    }
    requested
}
