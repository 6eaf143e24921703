use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The application's view of the signed-in user, persisted next to the token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// `admin` or `user`; other values are kept but grant neither flag.
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl UserProfile {
    pub fn new(email: impl Into<String>, role: impl Into<String>) -> Self {
        UserProfile {
            email: email.into(),
            role: role.into(),
            ..Default::default()
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    pub fn is_user(&self) -> bool {
        self.role == "user"
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_camel_case_profile() {
        let raw = r#"{
            "email": "ada@example.com",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "role": "admin",
            "loginTime": "2024-03-01T10:00:00Z",
            "provider": "password"
        }"#;
        let profile: UserProfile = serde_json::from_str(raw).unwrap();

        assert!(profile.is_admin());
        assert!(!profile.is_user());
        assert_eq!(profile.full_name(), "Ada Lovelace");
        assert_eq!(profile.provider.as_deref(), Some("password"));
        assert!(profile.login_time.is_some());
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let profile: UserProfile = serde_json::from_str(r#"{"email":"u@example.com"}"#).unwrap();
        assert_eq!(profile.role, "");
        assert_eq!(profile.full_name(), "");
        assert!(!profile.is_admin() && !profile.is_user());
    }

    #[test]
    fn test_full_name_trims_missing_parts() {
        let mut profile = UserProfile::new("u@example.com", "user");
        profile.first_name = "Grace".to_string();
        assert_eq!(profile.full_name(), "Grace");
    }
}
