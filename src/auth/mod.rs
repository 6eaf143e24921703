pub mod claims;
pub mod roles;
pub mod session;
pub mod token_store;

// Re-exports so we can do "use crate::auth::{Session, Claims};"
pub use claims::{email_from_token, Claims, TokenError};
pub use roles::{has_admin_role, is_admin_role, roles_from_claims, roles_from_token};
pub use session::{Session, USER_KEY};
pub use token_store::{TokenStore, TOKEN_KEY};
