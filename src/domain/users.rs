use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::codec::empty_string_as_none;

/// Account seen by the sign-in flow, listed so admins can link players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub email: String,
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_string_as_none"
    )]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

/// Email/password account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    #[serde(default)]
    pub email_verified: bool,
    /// Approved by an admin
    #[serde(default)]
    pub confirmed: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_string_as_none"
    )]
    pub verification_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Unverified,
    PendingApproval,
    Active,
}

impl AccountStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AccountStatus::Unverified => "unverified",
            AccountStatus::PendingApproval => "pending approval",
            AccountStatus::Active => "active",
        }
    }
}

/// Registry key for an email address
pub fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl LocalUser {
    pub fn key(&self) -> String {
        email_key(&self.email)
    }

    pub fn status(&self) -> AccountStatus {
        match (self.email_verified, self.confirmed) {
            (true, true) => AccountStatus::Active,
            (true, false) => AccountStatus::PendingApproval,
            _ => AccountStatus::Unverified,
        }
    }

    pub fn has_token(&self, token: &str) -> bool {
        !token.is_empty() && self.verification_token.as_deref() == Some(token)
    }

    pub fn mark_verified(&mut self) {
        self.email_verified = true;
        self.verification_token = None;
    }
}

impl RegisteredUser {
    pub fn key(&self) -> String {
        email_key(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_user(token: Option<&str>) -> LocalUser {
        LocalUser {
            email: "Ana@Example.com".to_string(),
            name: "Ana".to_string(),
            password_hash: "hash".to_string(),
            email_verified: false,
            confirmed: false,
            verification_token: token.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_progression() {
        let mut user = local_user(Some("tok"));
        assert_eq!(user.status(), AccountStatus::Unverified);

        user.mark_verified();
        assert_eq!(user.status(), AccountStatus::PendingApproval);
        assert!(user.verification_token.is_none());

        user.confirmed = true;
        assert_eq!(user.status().as_str(), "active");
    }

    #[test]
    fn test_empty_token_never_matches() {
        assert!(!local_user(None).has_token(""));
        assert!(local_user(Some("abc")).has_token("abc"));
        assert!(!local_user(Some("abc")).has_token("abd"));
    }

    #[test]
    fn test_key_is_lowercased() {
        assert_eq!(local_user(None).key(), "ana@example.com");
        assert_eq!(email_key("  Bob@X.io "), "bob@x.io");
    }

    #[test]
    fn test_empty_token_decodes_as_absent() {
        let json = r#"{"email":"a@b.c","name":"A","passwordHash":"h","emailVerified":true,
            "confirmed":false,"verificationToken":"","createdAt":"2025-01-01T00:00:00Z"}"#;
        let user: LocalUser = serde_json::from_str(json).unwrap();
        assert!(user.verification_token.is_none());
    }
}
