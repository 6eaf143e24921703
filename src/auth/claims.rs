use std::time::Duration;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use serde_json::{Map, Value};
use tracing::warn;

use crate::utils::log_throttle::should_emit;

const MALFORMED_LOG_WINDOW: Duration = Duration::from_secs(60);

/// Standard alphabet, lenient about padding and trailing bits like a browser's `atob`.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a token's claims could not be read.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,
    #[error("token has no claims segment")]
    MissingClaims,
    #[error("claims segment is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("claims segment is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("claims segment is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("claims segment is not a JSON object")]
    NotAnObject,
}

/// The decoded, unverified payload of a bearer token.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Decodes the middle segment of `token`.
    ///
    /// The segment is base64url; it is mapped to the standard alphabet and padded
    /// to a multiple of four before decoding. No signature check is performed.
    pub fn decode(token: &str) -> Result<Self, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Empty);
        }
        let segment = token.split('.').nth(1).ok_or(TokenError::MissingClaims)?;

        let mut base64: String = segment
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                other => other,
            })
            .collect();
        let remainder = base64.len() % 4;
        if remainder != 0 {
            base64.extend(std::iter::repeat('=').take(4 - remainder));
        }

        let bytes = LENIENT_STANDARD.decode(base64)?;
        let text = String::from_utf8(bytes)?;
        match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => Ok(Claims(map)),
            _ => Err(TokenError::NotAnObject),
        }
    }

    /// Like [`Claims::decode`], but any failure is logged and yields `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        match Self::decode(token) {
            Ok(claims) => Some(claims),
            Err(TokenError::Empty) => None,
            Err(e) => {
                if let Some(suppressed_count) =
                    should_emit("auth.claims.decode.failed", MALFORMED_LOG_WINDOW)
                {
                    warn!(
                        event_name = "auth.claims.decode.failed",
                        event_domain = "auth",
                        suppressed_count,
                        "Failed to decode token payload: {}",
                        e
                    );
                }
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The subject claim, which the backend sets to the user's email.
    pub fn sub(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    /// The raw `roles` claim: a comma-separated string or a list.
    pub fn roles(&self) -> Option<&Value> {
        self.get("roles")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// The email (subject) carried by a token, if it can be read.
pub fn email_from_token(token: &str) -> Option<String> {
    Claims::from_token(token)?.sub().map(str::to_string)
}
