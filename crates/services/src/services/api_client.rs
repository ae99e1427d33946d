//! Client for the content API: login plus CRUD over the resource collections.

use std::sync::Arc;

use models::{
    envelope::{DataEnvelope, ErrorEnvelope, ListEnvelope, Page},
    resource::{DocumentId, Resource},
    user::{LoginRequest, LoginResponse},
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::{config::DashboardConfig, session::SessionStore};

pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("authentication token is missing")]
    AuthenticationMissing,
    #[error("http {status}: {message}")]
    ServerRejected { status: u16, message: String },
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid api url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Text suitable for an inline error region.
    pub fn user_message(&self) -> String {
        match self {
            Self::ServerRejected { message, .. } => message.clone(),
            Self::AuthenticationMissing => "Authentication token is missing".to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

/// Authenticated HTTP access to `{api_url}/api/...`
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(config: &DashboardConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        if config.api_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.api_url.to_string()));
        }

        let http = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("dashboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base: config.api_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// POST /api/auth/local
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(&["auth", "local"])?;
        let body = LoginRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };

        let res = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if res.status().is_success() {
            return decode(res).await;
        }
        Err(rejection(res, LOGIN_FAILED_MESSAGE).await)
    }

    /// GET /api/{resource}?populate=*&pagination[page]=P&pagination[pageSize]=S
    pub async fn list<R: Resource>(&self, page: u32, page_size: u32) -> Result<Page<R>, ApiError> {
        let mut url = self.endpoint(&[R::KIND.path()])?;
        url.query_pairs_mut()
            .append_pair("populate", "*")
            .append_pair("pagination[page]", &page.to_string())
            .append_pair("pagination[pageSize]", &page_size.to_string());

        debug!(resource = %R::KIND, page, page_size, "Listing resource");
        let res = self.send_authorized(self.http.get(url)).await?;
        let envelope: ListEnvelope<R> = decode(res).await?;
        Ok(Page::from_envelope(envelope, page, page_size))
    }

    /// GET /api/{resource}/{documentId}?populate=*
    pub async fn get<R: Resource>(&self, document_id: &DocumentId) -> Result<R, ApiError> {
        let mut url = self.endpoint(&[R::KIND.path(), document_id.as_str()])?;
        url.query_pairs_mut().append_pair("populate", "*");

        debug!(resource = %R::KIND, document_id = %document_id, "Fetching record");
        let res = self.send_authorized(self.http.get(url)).await?;
        let envelope: DataEnvelope<R> = decode(res).await?;
        Ok(envelope.data)
    }

    /// POST /api/{resource} with `{ data: draft }`
    pub async fn create<R: Resource>(&self, draft: &R::Draft) -> Result<R, ApiError> {
        let url = self.endpoint(&[R::KIND.path()])?;

        debug!(resource = %R::KIND, "Creating record");
        let res = self
            .send_authorized(self.http.post(url).json(&DataEnvelope { data: draft }))
            .await?;
        let envelope: DataEnvelope<R> = decode(res).await?;
        Ok(envelope.data)
    }

    /// PUT /api/{resource}/{documentId} with `{ data: draft }`
    pub async fn update<R: Resource>(
        &self,
        document_id: &DocumentId,
        draft: &R::Draft,
    ) -> Result<R, ApiError> {
        let url = self.endpoint(&[R::KIND.path(), document_id.as_str()])?;

        debug!(resource = %R::KIND, document_id = %document_id, "Updating record");
        let res = self
            .send_authorized(self.http.put(url).json(&DataEnvelope { data: draft }))
            .await?;
        let envelope: DataEnvelope<R> = decode(res).await?;
        Ok(envelope.data)
    }

    /// DELETE /api/{resource}/{documentId}
    pub async fn delete<R: Resource>(&self, document_id: &DocumentId) -> Result<DocumentId, ApiError> {
        let url = self.endpoint(&[R::KIND.path(), document_id.as_str()])?;

        debug!(resource = %R::KIND, document_id = %document_id, "Deleting record");
        self.send_authorized(self.http.delete(url)).await?;
        Ok(document_id.clone())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    /// Attach the bearer token and send. A missing token fails before any I/O;
    /// a 401 ends the session.
    async fn send_authorized(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let token = self.session.token().ok_or(ApiError::AuthenticationMissing)?;
        let res = request
            .header(header::AUTHORIZATION, format!("Bearer {}", token.expose_secret()))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        if status == StatusCode::UNAUTHORIZED {
            warn!("API rejected the session token, logging out");
            self.session.logout();
        }
        Err(rejection(res, GENERIC_ERROR_MESSAGE).await)
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ApiError> {
    res.json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

/// Build `ServerRejected` from a non-2xx response, preferring `error.message`.
async fn rejection(res: Response, fallback: &str) -> ApiError {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    let message = server_message(&body).unwrap_or_else(|| fallback.to_string());
    warn!(status, message = %message, "API request rejected");
    ApiError::ServerRejected { status, message }
}

fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .filter(|message| !message.trim().is_empty())
}

fn map_reqwest_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_extracts_error_message() {
        let body = r#"{"data": null, "error": {"status": 400, "name": "ValidationError", "message": "Invalid identifier or password"}}"#;
        assert_eq!(
            server_message(body).as_deref(),
            Some("Invalid identifier or password")
        );
    }

    #[test]
    fn test_server_message_ignores_other_shapes() {
        assert_eq!(server_message("<html>502 Bad Gateway</html>"), None);
        assert_eq!(server_message(r#"{"error": {"status": 500}}"#), None);
        assert_eq!(server_message(r#"{"error": {"message": "  "}}"#), None);
    }

    #[test]
    fn test_user_message_falls_back_to_generic() {
        assert_eq!(
            ApiError::Transport("connection refused".into()).user_message(),
            GENERIC_ERROR_MESSAGE
        );
        assert_eq!(
            ApiError::ServerRejected {
                status: 403,
                message: "Forbidden".into()
            }
            .user_message(),
            "Forbidden"
        );
    }
}
