use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use super::api_client::{check_status, json_or_error, TokenResponse};
use super::{ApiClient, ApiError};
use crate::guard::Navigator;
use crate::models::{Token, UserProfile};

const SIGNIN_PATH: &str = "/auth/signin";
const SIGNUP_PATH: &str = "/auth/signup";
const LOGOUT_PATH: &str = "/auth/logout";
const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";
const CURRENT_USER_PATH: &str = "/users/me";

/// `{ "token": ..., "user": ... }`, returned by signup.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SignupResponse {
    pub token: String,
    pub user: UserProfile,
}

/// The backend's authentication endpoints.
///
/// Credential endpoints go out without renewal: a 401 from signin means bad
/// credentials, not an expired session.
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Exchanges credentials for a token, loads the profile with it and only then
    /// stores both. Nothing is stored if either call fails.
    pub async fn signin(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        let body = json!({ "email": email, "password": password });
        let response = self
            .client
            .send_once(Method::POST, SIGNIN_PATH, Some(&body))
            .await?;
        let TokenResponse { token } = json_or_error(response, "Login failed").await?;
        let token = Token::new(token);

        let response = self
            .client
            .send_with_token(Method::GET, CURRENT_USER_PATH, None, &token)
            .await?;
        let mut profile: UserProfile = json_or_error(response, "Failed to get user").await?;
        normalize_profile(&mut profile, "password");

        self.client.session().set_session(token, profile.clone())?;
        info!("Signed in as '{}'", profile.email);
        Ok(profile)
    }

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, ApiError> {
        let body = json!({ "username": username, "email": email, "password": password });
        let response = self
            .client
            .send_once(Method::POST, SIGNUP_PATH, Some(&body))
            .await?;
        let SignupResponse { token, mut user } =
            json_or_error(response, "Registration failed").await?;
        normalize_profile(&mut user, "password");

        self.client
            .session()
            .set_session(Token::new(token), user.clone())?;
        info!("Registered and signed in as '{}'", user.email);
        Ok(user)
    }

    /// Tells the backend (best effort), then ends the local session.
    pub async fn logout(&self, navigator: &dyn Navigator) {
        let result = match self.client.send_once(Method::POST, LOGOUT_PATH, None).await {
            Ok(response) => check_status(response, "Logout failed").await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            error!("Logout error: {}", e);
        }
        self.client.session().logout(navigator);
    }

    /// The signed-in user's profile, renewing the token if it has expired.
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.client
            .request_json(Method::GET, CURRENT_USER_PATH, None, "Failed to get user")
            .await
    }

    /// A fresh token from the backend. The caller decides whether to store it.
    pub async fn refresh_token(&self) -> Result<Token, ApiError> {
        self.client.refresh().await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        let body = json!({ "email": email });
        let response = self
            .client
            .send_once(Method::POST, FORGOT_PASSWORD_PATH, Some(&body))
            .await?;
        check_status(response, "Password reset failed").await?;
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        let body = json!({ "token": token, "newPassword": new_password });
        let response = self
            .client
            .send_once(Method::POST, RESET_PASSWORD_PATH, Some(&body))
            .await?;
        check_status(response, "Password reset failed").await?;
        Ok(())
    }
}

// The backend reports roles as `ADMIN`/`USER`; the profile uses lowercase.
fn normalize_profile(profile: &mut UserProfile, provider: &str) {
    profile.role = profile.role.to_lowercase();
    if profile.login_time.is_none() {
        profile.login_time = Some(Utc::now());
    }
    if profile.provider.is_none() {
        profile.provider = Some(provider.to_string());
    }
}
