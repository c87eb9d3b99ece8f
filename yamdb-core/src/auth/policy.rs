//! Role based access rules.
//!
//! Checks come in two stages. [`AccessPolicy::check_request`] runs before any
//! lookup and only looks at the caller and the kind of access.
//! [`AccessPolicy::check_object`] runs once the target has been loaded and may
//! consult its author.

use thiserror::Error;
use yamdb_model::{User, UserId};

use crate::error::CoreError;

/// Whether a request only reads state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    /// GET, HEAD and OPTIONS are reads; everything else writes.
    pub fn from_method(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" | "HEAD" | "OPTIONS" => Access::Read,
            _ => Access::Write,
        }
    }

    pub fn is_read(self) -> bool {
        self == Access::Read
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denied {
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,
    #[error("You do not have permission to perform this action.")]
    Forbidden,
}

impl From<Denied> for CoreError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::Unauthenticated => CoreError::Unauthenticated(denied.to_string()),
            Denied::Forbidden => CoreError::Forbidden(denied.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    AllowAny,
    Authenticated,
    AdminOnly,
    AdminOrReadOnly,
    AuthorStaffOrReadOnly,
}

impl AccessPolicy {
    pub fn check_request(self, actor: Option<&User>, access: Access) -> Result<(), Denied> {
        match self {
            AccessPolicy::AllowAny => Ok(()),
            AccessPolicy::Authenticated => authenticated(actor).map(|_| ()),
            AccessPolicy::AdminOnly => admin(actor),
            AccessPolicy::AdminOrReadOnly => {
                if access.is_read() {
                    Ok(())
                } else {
                    admin(actor)
                }
            }
            AccessPolicy::AuthorStaffOrReadOnly => {
                if access.is_read() {
                    Ok(())
                } else {
                    authenticated(actor).map(|_| ())
                }
            }
        }
    }

    pub fn check_object(
        self,
        actor: Option<&User>,
        access: Access,
        author: UserId,
    ) -> Result<(), Denied> {
        match self {
            AccessPolicy::AuthorStaffOrReadOnly => {
                if access.is_read() {
                    return Ok(());
                }
                let user = authenticated(actor)?;
                if user.id == author || user.is_staff() {
                    Ok(())
                } else {
                    Err(Denied::Forbidden)
                }
            }
            other => other.check_request(actor, access),
        }
    }
}

fn authenticated(actor: Option<&User>) -> Result<&User, Denied> {
    actor.ok_or(Denied::Unauthenticated)
}

fn admin(actor: Option<&User>) -> Result<(), Denied> {
    if authenticated(actor)?.is_admin() {
        Ok(())
    } else {
        Err(Denied::Forbidden)
    }
}
