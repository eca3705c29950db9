use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::filter::{ConditionSet, TimestampFilter, ToConditionSet, Value};
use crate::repository::{Entity, Patch};

lazy_static! {
    // Full names: no leading or trailing whitespace.
    pub(crate) static ref FULL_NAME_REGEX: Regex = Regex::new(r"^\S(?:.*\S)?$").unwrap();
}

/// Corresponds to the `user_role` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl From<Role> for Value {
    fn from(r: Role) -> Self {
        Value::Enum {
            type_name: "user_role",
            label: r.label(),
            rank: r as u8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    /// bcrypt hash; never part of a response body.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, full_name: String, role: Role, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            full_name,
            role,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The public part of a user, embedded in other records (e.g. a task's owner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Admin-side user creation.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(email)]
    pub email: String,
    #[validate(
        length(min = 1, max = 100),
        regex(path = "FULL_NAME_REGEX", message = "Full name must not start or end with whitespace")
    )]
    pub full_name: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(
        length(min = 1, max = 100),
        regex(path = "FULL_NAME_REGEX", message = "Full name must not start or end with whitespace")
    )]
    pub full_name: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl Entity for User {
    type Patch = UserPatch;

    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "email",
        "full_name",
        "role",
        "password_hash",
        "created_at",
        "updated_at",
    ];
    const SORTABLE: &'static [&'static str] =
        &["created_at", "updated_at", "email", "full_name", "role"];
    const UNIQUE: &'static [&'static str] = &["email"];

    fn field(&self, name: &str) -> Option<Value> {
        let value: Value = match name {
            "id" => self.id.into(),
            "email" => self.email.as_str().into(),
            "full_name" => self.full_name.as_str().into(),
            "role" => self.role.into(),
            "password_hash" => self.password_hash.as_str().into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        };
        Some(value)
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        Self::COLUMNS
            .iter()
            .filter_map(|c| self.field(c).map(|v| (*c, v)))
            .collect()
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// Field-by-field user update. The password arrives already hashed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl Patch<User> for UserPatch {
    fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        if let Some(email) = &self.email {
            out.push(("email", Value::from(email.as_str())));
        }
        if let Some(full_name) = &self.full_name {
            out.push(("full_name", Value::from(full_name.as_str())));
        }
        if let Some(hash) = &self.password_hash {
            out.push(("password_hash", Value::from(hash.as_str())));
        }
        if let Some(role) = self.role {
            out.push(("role", role.into()));
        }
        out
    }

    fn apply(&self, user: &mut User) {
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(full_name) = &self.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(hash) = &self.password_hash {
            user.password_hash = hash.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserFilter {
    #[serde(flatten)]
    pub timestamps: TimestampFilter,
    /// Partial, case-insensitive.
    pub email: Option<String>,
    /// Partial, case-insensitive.
    #[serde(alias = "fullName")]
    pub full_name: Option<String>,
    pub role: Option<Role>,
}

impl ToConditionSet for UserFilter {
    fn to_condition_set(&self) -> ConditionSet {
        self.timestamps
            .to_condition_set()
            .contains("email", self.email.as_deref())
            .contains("full_name", self.full_name.as_deref())
            .eq_opt("role", self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Predicate;
    use validator::Validate;

    fn create_input(email: &str, full_name: &str, password: &str) -> CreateUserInput {
        CreateUserInput {
            email: email.to_string(),
            full_name: full_name.to_string(),
            password: password.to_string(),
            role: None,
        }
    }

    #[test]
    fn test_user_input_validation() {
        assert!(create_input("test@example.com", "Test User", "password123")
            .validate()
            .is_ok());
        assert!(create_input("invalid-email", "Test User", "password123")
            .validate()
            .is_err());
        assert!(create_input("test@example.com", "Test User", "short")
            .validate()
            .is_err());
        assert!(create_input("test@example.com", " Padded ", "password123")
            .validate()
            .is_err());
        assert!(create_input("test@example.com", "", "password123")
            .validate()
            .is_err());
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = User::new(
            "a@example.com".into(),
            "A".into(),
            Role::User,
            "$2b$12$secret".into(),
        );
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_user_filter_translation() {
        let filter = UserFilter {
            email: Some("example.com".into()),
            full_name: Some(String::new()),
            role: Some(Role::Admin),
            ..Default::default()
        };
        let set = filter.to_condition_set();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("email"), Some(&Predicate::Contains("example.com".into())));
        assert_eq!(set.get("role"), Some(&Predicate::Eq(Role::Admin.into())));
        assert!(set.get("full_name").is_none());
    }

    #[test]
    fn test_user_patch() {
        let mut user = User::new("old@example.com".into(), "Old".into(), Role::User, "h".into());
        let patch = UserPatch {
            email: Some("new@example.com".into()),
            role: Some(Role::Admin),
            ..Default::default()
        };
        patch.apply(&mut user);
        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.full_name, "Old");
        assert_eq!(
            patch.assignments().into_iter().map(|(c, _)| c).collect::<Vec<_>>(),
            vec!["email", "role"]
        );
    }

    #[test]
    fn test_user_filter_accepts_camel_case_full_name() {
        let raw = std::collections::HashMap::from([("fullName".to_string(), "doe".to_string())]);
        let set = crate::filter::translate_filter::<UserFilter>(&raw).unwrap();
        assert_eq!(set.get("full_name"), Some(&Predicate::Contains("doe".into())));
    }
}
