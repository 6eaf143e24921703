use serde_json::Value;

use super::claims::Claims;
use crate::utils::value::value_to_string;

/// Role names that grant admin access, compared after uppercasing.
pub const ADMIN_ROLES: [&str; 2] = ["ROLE_ADMIN", "ADMIN"];

/// Normalizes the `roles` claim into an ordered list of non-empty strings.
///
/// A list is taken element by element; a scalar is split on `,`. Entries are
/// trimmed and empty ones dropped. Duplicates and order are preserved.
pub fn roles_from_claims(claims: &Claims) -> Vec<String> {
    let raw: Vec<String> = match claims.roles() {
        None => return Vec::new(),
        Some(value) if is_falsy(value) => return Vec::new(),
        Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
        Some(scalar) => value_to_string(scalar)
            .split(',')
            .map(str::to_string)
            .collect(),
    };

    raw.into_iter()
        .map(|role| role.trim().to_string())
        .filter(|role| !role.is_empty())
        .collect()
}

/// Roles carried by `token`; empty when the token has no readable claims.
pub fn roles_from_token(token: &str) -> Vec<String> {
    Claims::from_token(token)
        .map(|claims| roles_from_claims(&claims))
        .unwrap_or_default()
}

pub fn is_admin_role(role: &str) -> bool {
    let upper = role.to_uppercase();
    ADMIN_ROLES.contains(&upper.as_str())
}

pub fn has_admin_role<S: AsRef<str>>(roles: &[S]) -> bool {
    roles.iter().any(|role| is_admin_role(role.as_ref()))
}

// An absent-looking claim (`null`, `false`, `0`, `""`) carries no roles.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}
