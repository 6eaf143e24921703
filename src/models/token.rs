use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::claims::{Claims, TokenError};
use crate::auth::roles;

/// An opaque bearer credential as issued by the backend.
///
/// Structurally `header.claims.signature`, but nothing here validates that shape;
/// the claims segment is only inspected on demand and never verified.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Token(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the claims segment, reporting why decoding failed.
    pub fn decode_claims(&self) -> Result<Claims, TokenError> {
        Claims::decode(&self.0)
    }

    /// Roles embedded in the token; empty when the token is malformed.
    pub fn roles(&self) -> Vec<String> {
        roles::roles_from_token(&self.0)
    }

    /// The `Authorization` header value for this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl From<String> for Token {
    fn from(token: String) -> Self {
        Token(token)
    }
}

impl From<&str> for Token {
    fn from(token: &str) -> Self {
        Token(token.to_string())
    }
}

/// Tokens are credentials: only a short prefix is ever printed.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "Token({}…)", prefix)
    }
}
