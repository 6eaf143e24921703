use std::sync::Arc;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::ApiError;
use crate::auth::Session;
use crate::config::ApiConfig;
use crate::guard::{Location, Navigation, Navigator, LOGIN_PATH};
use crate::models::Token;

/// Endpoint that exchanges the current session for a fresh token.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// `{ "token": ... }`, returned by signin and refresh.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TokenResponse {
    pub token: String,
}

/// HTTP client for the backend that carries the session's bearer token.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        config: &ApiConfig,
        session: Arc<Session>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_in_ms))
            .build()?;
        info!("Creating API client for '{}'", config.base_url);
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            navigator,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn request(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&Token>,
    ) -> RequestBuilder {
        let mut request = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, token.bearer());
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    /// Sends a request with the stored token (if any) and no renewal.
    pub async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let token = self.session.get_token();
        debug!("{} {} (authenticated: {})", method, path, token.is_some());
        Ok(self.request(&method, path, body, token.as_ref()).send().await?)
    }

    /// Sends a request with an explicit token instead of the stored one.
    pub async fn send_with_token(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: &Token,
    ) -> Result<Response, ApiError> {
        Ok(self.request(&method, path, body, Some(token)).send().await?)
    }

    /// Sends a request with the stored token. On a 401, asks for a new token once;
    /// if that works the request is repeated once with it and that response is
    /// returned whatever its status. If renewal fails the session is cleared, the
    /// app is reloaded at the login page and `ApiError::SessionExpired` returned.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let response = self.send_once(method.clone(), path, body).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("{} {} returned 401, attempting token renewal", method, path);
        match self.renew().await {
            Ok(token) => {
                debug!("Renewal succeeded, retrying {} {}", method, path);
                self.send_with_token(method, path, body, &token).await
            }
            Err(e) => {
                warn!("Token renewal failed: {}", e);
                if let Err(e) = self.session.clear_session() {
                    error!("Failed to clear session after renewal failure: {}", e);
                }
                self.navigator
                    .navigate(Navigation::Reload(Location::new(LOGIN_PATH)));
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Calls the refresh endpoint and returns the new token without storing it.
    pub async fn refresh(&self) -> Result<Token, ApiError> {
        let response = self.send_once(Method::POST, REFRESH_PATH, None).await?;
        let body: TokenResponse = json_or_error(response, "Token refresh failed").await?;
        Ok(Token::new(body.token))
    }

    async fn renew(&self) -> Result<Token, ApiError> {
        let token = self.refresh().await?;
        self.session.tokens().set(&token)?;
        info!("Stored renewed token");
        Ok(token)
    }

    /// `send` followed by status checking and JSON decoding.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let response = self.send(method, path, body).await?;
        json_or_error(response, fallback).await
    }
}

/// Maps a non-success response to `ApiError::Status`.
pub(crate) async fn check_status(response: Response, fallback: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.json::<Value>().await.ok();
    Err(ApiError::from_body(status, body, fallback))
}

pub(crate) async fn json_or_error<T: DeserializeOwned>(
    response: Response,
    fallback: &str,
) -> Result<T, ApiError> {
    let response = check_status(response, fallback).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TOKEN_KEY;
    use crate::guard::RecordingNavigator;
    use crate::models::UserProfile;
    use crate::store::{MemoryStore, Storage};
    use mockito::{Matcher, Server};
    use serde_json::json;

    struct Fixture {
        client: ApiClient,
        session: Arc<Session>,
        storage: Arc<dyn Storage>,
        navigator: Arc<RecordingNavigator>,
    }

    fn fixture(base_url: String, token: Option<&str>) -> Fixture {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStore::new());
        let session = Arc::new(Session::new(storage.clone()));
        if let Some(token) = token {
            session
                .set_session(Token::new(token), UserProfile::new("u@example.com", "user"))
                .unwrap();
        }
        let navigator = Arc::new(RecordingNavigator::new());
        let config = ApiConfig {
            base_url,
            timeout_in_ms: 2000,
        };
        let client = ApiClient::new(&config, session.clone(), navigator.clone()).unwrap();
        Fixture {
            client,
            session,
            storage,
            navigator,
        }
    }

    #[tokio::test]
    async fn test_no_token_means_no_authorization_header() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/countries")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let f = fixture(server.url(), None);
        let response = f.client.send(Method::GET, "/countries", None).await.unwrap();

        m.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stored_token_is_attached_as_bearer() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/countries")
            .match_header("authorization", "Bearer abc.def.ghi")
            .with_status(200)
            .create_async()
            .await;

        let f = fixture(server.url(), Some("abc.def.ghi"));
        f.client.send(Method::GET, "/countries", None).await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_401_renews_once_and_retries_once() {
        let mut server = Server::new_async().await;
        let stale = server
            .mock("GET", "/users/me")
            .match_header("authorization", "Bearer old")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/auth/refresh")
            .match_header("authorization", "Bearer old")
            .with_status(200)
            .with_body(r#"{"token": "new"}"#)
            .expect(1)
            .create_async()
            .await;
        let retried = server
            .mock("GET", "/users/me")
            .match_header("authorization", "Bearer new")
            .with_status(200)
            .with_body(r#"{"email": "u@example.com"}"#)
            .expect(1)
            .create_async()
            .await;

        let f = fixture(server.url(), Some("old"));
        let response = f.client.send(Method::GET, "/users/me", None).await.unwrap();

        stale.assert_async().await;
        refresh.assert_async().await;
        retried.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(f.storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("new"));
        assert!(f.navigator.history().is_empty());
        // Renewal only touches the token; the profile stays.
        assert!(f.session.get_profile().is_some());
    }

    #[tokio::test]
    async fn test_retry_is_not_renewed_again() {
        let mut server = Server::new_async().await;
        let protected = server
            .mock("GET", "/tariffs")
            .with_status(401)
            .expect(2)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/auth/refresh")
            .with_status(200)
            .with_body(r#"{"token": "new"}"#)
            .expect(1)
            .create_async()
            .await;

        let f = fixture(server.url(), Some("old"));
        let response = f.client.send(Method::GET, "/tariffs", None).await.unwrap();

        protected.assert_async().await;
        refresh.assert_async().await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_failed_renewal_clears_session_and_reloads_login() {
        let mut server = Server::new_async().await;
        let protected = server
            .mock("GET", "/tariffs")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/auth/refresh")
            .with_status(401)
            .with_body(r#"{"message": "Refresh token expired"}"#)
            .expect(1)
            .create_async()
            .await;

        let f = fixture(server.url(), Some("old"));
        let result = f.client.send(Method::GET, "/tariffs", None).await;

        protected.assert_async().await;
        refresh.assert_async().await;
        assert!(matches!(result, Err(ApiError::SessionExpired)));
        assert!(f.session.get_token().is_none());
        assert!(f.session.get_profile().is_none());
        assert_eq!(
            f.navigator.history(),
            vec![Navigation::Reload(Location::new("/login"))]
        );
    }

    #[tokio::test]
    async fn test_refresh_without_token_field_counts_as_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/tariffs")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("POST", "/auth/refresh")
            .with_status(200)
            .with_body(r#"{"access": "nope"}"#)
            .create_async()
            .await;

        let f = fixture(server.url(), Some("old"));
        let result = f.client.send(Method::GET, "/tariffs", None).await;

        assert!(matches!(result, Err(ApiError::SessionExpired)));
        assert!(f.session.get_token().is_none());
    }

    #[tokio::test]
    async fn test_other_errors_are_not_renewed() {
        let mut server = Server::new_async().await;
        let forbidden = server
            .mock("GET", "/admin/users")
            .with_status(403)
            .with_body(r#"{"message": "Forbidden"}"#)
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/auth/refresh")
            .expect(0)
            .create_async()
            .await;

        let f = fixture(server.url(), Some("tok"));
        let result: Result<Value, ApiError> = f
            .client
            .request_json(Method::GET, "/admin/users", None, "Request failed")
            .await;

        forbidden.assert_async().await;
        refresh.assert_async().await;
        match result {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(message, "Forbidden");
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_json_body_is_sent() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/tariffs/calculate")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"hsCode": "0101"})))
            .with_status(200)
            .with_body(r#"{"duty": 1.5}"#)
            .create_async()
            .await;

        let f = fixture(format!("{}/", server.url()), Some("tok"));
        let body: Value = f
            .client
            .request_json(
                Method::POST,
                "/tariffs/calculate",
                Some(&json!({"hsCode": "0101"})),
                "Calculation failed",
            )
            .await
            .unwrap();

        m.assert_async().await;
        assert_eq!(body["duty"], json!(1.5));
    }
}
