//! Outbound requests to the backend API.
//!
//! [`ApiClient`] is the request pipeline: it attaches the stored token and
//! renews it once on a 401. [`AuthApi`] layers the `/auth/*` and `/users/me`
//! endpoints on top and keeps the session in step with them.

mod api_client;
mod auth_api;
mod error;

pub use api_client::{ApiClient, TokenResponse, REFRESH_PATH};
pub use auth_api::{AuthApi, SignupResponse};
pub use error::ApiError;
