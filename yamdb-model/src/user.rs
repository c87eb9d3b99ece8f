use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Result, ValidationErrors};
use crate::ids::UserId;
use crate::role::Role;
use crate::validation::{self, PERSON_NAME_MAX_LEN};
use crate::wire;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
    pub is_superuser: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Administrators and superusers manage the catalog and accounts.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin || self.is_superuser
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }

    /// Moderators and administrators may edit content written by others.
    pub fn is_staff(&self) -> bool {
        self.is_moderator() || self.is_admin()
    }
}

/// Validated payload for inserting a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
    pub is_superuser: bool,
}

impl NewUser {
    /// Minimal account as created by self-service signup.
    pub fn signup(username: String, email: String) -> Self {
        Self {
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            role: Role::User,
            is_superuser: false,
        }
    }
}

/// Validated partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(bio) = &self.bio {
            user.bio = bio.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}

/// Account fields as they arrive on the wire.
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<String>,
    /// Fields that arrived with the wrong JSON type.
    pub decode_errors: ValidationErrors,
}

impl<'de> Deserialize<'de> for UserInput {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            username: Option<Value>,
            email: Option<Value>,
            first_name: Option<Value>,
            last_name: Option<Value>,
            bio: Option<Value>,
            role: Option<Value>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let mut decode_errors = ValidationErrors::new();
        Ok(UserInput {
            username: wire::text(&mut decode_errors, "username", raw.username),
            email: wire::text(&mut decode_errors, "email", raw.email),
            first_name: wire::text(&mut decode_errors, "first_name", raw.first_name),
            last_name: wire::text(&mut decode_errors, "last_name", raw.last_name),
            bio: wire::text(&mut decode_errors, "bio", raw.bio),
            role: wire::text(&mut decode_errors, "role", raw.role),
            decode_errors,
        })
    }
}

impl UserInput {
    pub fn into_new_user(self) -> Result<NewUser> {
        let mut errors = self.decode_errors;

        let username =
            validation::required_text(&mut errors, "username", self.username.as_deref());
        if let Some(username) = &username {
            validation::check_username(&mut errors, username);
        }
        let email =
            validation::required_text(&mut errors, "email", self.email.as_deref());
        if let Some(email) = &email {
            validation::check_email(&mut errors, email);
        }

        let first_name = person_name(&mut errors, "first_name", self.first_name);
        let last_name = person_name(&mut errors, "last_name", self.last_name);
        let role = parse_role(&mut errors, self.role.as_deref());

        let new_user = NewUser {
            username: username.unwrap_or_default(),
            email: email.unwrap_or_default(),
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
            bio: self.bio.unwrap_or_default(),
            role: role.unwrap_or_default(),
            is_superuser: false,
        };
        errors.finish(new_user)
    }

    /// Validates a partial update. When `allow_role` is false the role field
    /// is ignored rather than rejected.
    pub fn into_changes(self, allow_role: bool) -> Result<UserChanges> {
        let mut errors = self.decode_errors;
        if !allow_role {
            errors.remove("role");
        }

        let username = validation::optional_text(
            &mut errors,
            "username",
            self.username.as_deref(),
        );
        if let Some(username) = &username {
            validation::check_username(&mut errors, username);
        }
        let email =
            validation::optional_text(&mut errors, "email", self.email.as_deref());
        if let Some(email) = &email {
            validation::check_email(&mut errors, email);
        }

        let first_name = person_name(&mut errors, "first_name", self.first_name);
        let last_name = person_name(&mut errors, "last_name", self.last_name);
        let role = if allow_role {
            parse_role(&mut errors, self.role.as_deref())
        } else {
            None
        };

        errors.finish(UserChanges {
            username,
            email,
            first_name,
            last_name,
            bio: self.bio,
            role,
        })
    }
}

fn person_name(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
) -> Option<String> {
    let value = value.map(|v| v.trim().to_string())?;
    validation::max_len(errors, field, &value, PERSON_NAME_MAX_LEN).then_some(value)
}

fn parse_role(errors: &mut ValidationErrors, value: Option<&str>) -> Option<Role> {
    match value?.parse::<Role>() {
        Ok(role) => Some(role),
        Err(err) => {
            errors.add("role", err.to_string());
            None
        }
    }
}
