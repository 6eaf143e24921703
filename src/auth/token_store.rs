use std::sync::Arc;

use tracing::{debug, error};

use crate::models::Token;
use crate::store::{Storage, StoreError};

/// Storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "authToken";

/// Reads and writes the bearer token. Every call goes to storage; nothing is cached.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The current token. A storage fault is logged and reads as "no token".
    pub fn get(&self) -> Option<Token> {
        match self.storage.get_item(TOKEN_KEY) {
            Ok(token) => token.map(Token::from),
            Err(e) => {
                error!("Failed to read token from storage: {}", e);
                None
            }
        }
    }

    pub fn set(&self, token: &Token) -> Result<(), StoreError> {
        debug!("Storing token {:?}", token);
        self.storage.set_item(TOKEN_KEY, token.as_str())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        debug!("Clearing stored token");
        self.storage.remove_item(TOKEN_KEY)
    }
}
