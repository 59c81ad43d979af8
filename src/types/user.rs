//! User types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Longest accepted userName, first name, last name or password.
pub const MAX_NAME_LEN: usize = 30;

/// Longest accepted email address.
pub const MAX_EMAIL_LEN: usize = 254;

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a new UserId from its raw value.
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Signup input as submitted by the caller.
///
/// The password is plaintext here; it is hashed before anything reaches the
/// store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// Requested userName.
    pub user_name: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

impl NewUser {
    /// Create a signup request.
    pub fn new(
        user_name: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Check field formats.
    ///
    /// Names and the password must be non-empty ASCII alphanumerics of at
    /// most [`MAX_NAME_LEN`] characters; the email must look like
    /// `local@domain`.
    pub fn validate(&self) -> Result<(), String> {
        check_alphanumeric("userName", &self.user_name)?;
        check_alphanumeric("firstName", &self.first_name)?;
        check_alphanumeric("lastName", &self.last_name)?;
        check_alphanumeric("password", &self.password)?;

        if self.email.is_empty() {
            return Err("email must not be empty".to_string());
        }
        if self.email.len() > MAX_EMAIL_LEN {
            return Err(format!("email must be at most {} characters", MAX_EMAIL_LEN));
        }
        if !email_regex().is_match(&self.email) {
            return Err(format!("email is not a valid address: {}", self.email));
        }
        Ok(())
    }
}

fn check_alphanumeric(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(format!("{} must be at most {} characters", field, MAX_NAME_LEN));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!("{} must be alphanumeric", field));
    }
    Ok(())
}

fn email_regex() -> &'static regex_lite::Regex {
    static EMAIL: OnceLock<regex_lite::Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        regex_lite::Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

/// A validated user ready for insertion.
#[derive(Debug, Clone)]
pub struct UserDraft {
    /// userName as submitted (case preserved).
    pub user_name: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email as submitted (case preserved).
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
}

/// A registered user.
///
/// Never hard-deleted: account deletion sets `is_deleted` so authored
/// revisions keep a stable author. Relations (created, liked and followed
/// sets) live in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Canonical userName.
    pub user_name: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Argon2id PHC string; never serialized.
    #[serde(skip)]
    pub password_hash: String,
    /// Tombstone flag.
    pub is_deleted: bool,
    /// Signup time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Materialize a draft with store-assigned fields.
    pub fn from_draft(id: UserId, draft: UserDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_name: draft.user_name,
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            password_hash: draft.password_hash,
            is_deleted: false,
            created_at,
        }
    }

    /// Case-insensitive userName match.
    pub fn has_user_name(&self, user_name: &str) -> bool {
        self.user_name.to_lowercase() == user_name.to_lowercase()
    }

    /// Case-insensitive email match.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.to_lowercase() == email.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewUser {
        NewUser::new("testUserName1", "testFirstName1", "testLastName1", "Test1@email.com", "testPassword1")
    }

    #[test]
    fn test_valid_signup() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_empty_fields_rejected() {
        let mut u = valid();
        u.user_name.clear();
        assert!(u.validate().is_err());

        let mut u = valid();
        u.email.clear();
        assert!(u.validate().is_err());

        let mut u = valid();
        u.password.clear();
        assert!(u.validate().is_err());
    }

    #[test]
    fn test_non_alphanumeric_rejected() {
        let mut u = valid();
        u.user_name = "testUserN@me5".to_string();
        assert!(u.validate().unwrap_err().contains("userName"));

        let mut u = valid();
        u.first_name = "testFirstN@me5".to_string();
        assert!(u.validate().unwrap_err().contains("firstName"));

        let mut u = valid();
        u.password = "testP@ssword5".to_string();
        assert!(u.validate().unwrap_err().contains("password"));
    }

    #[test]
    fn test_too_long_rejected() {
        let mut u = valid();
        u.user_name = "testUserName123456789012345678901".to_string();
        assert!(u.validate().is_err());

        let mut u = valid();
        u.last_name = "testLastName123456789012345678901".to_string();
        assert!(u.validate().is_err());
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut u = valid();
        u.email = "testEmail5".to_string();
        assert!(u.validate().unwrap_err().contains("email"));
    }

    #[test]
    fn test_case_insensitive_matches() {
        let user = User::from_draft(
            UserId::new(1),
            UserDraft {
                user_name: "testUserName1".to_string(),
                first_name: "a".to_string(),
                last_name: "b".to_string(),
                email: "Test1@email.com".to_string(),
                password_hash: String::new(),
            },
            Utc::now(),
        );
        assert!(user.has_user_name("TESTUSERNAME1"));
        assert!(user.has_email("test1@EMAIL.com"));
        assert!(!user.has_user_name("testUserName"));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::from_draft(
            UserId::new(1),
            UserDraft {
                user_name: "u".to_string(),
                first_name: "a".to_string(),
                last_name: "b".to_string(),
                email: "u@example.com".to_string(),
                password_hash: "$argon2id$secret".to_string(),
            },
            Utc::now(),
        );
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("\"userName\":\"u\""));
    }
}
