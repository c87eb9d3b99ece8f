use async_trait::async_trait;
use chrono::{DateTime, Utc};
use yamdb_model::{NewUser, Page, PageRequest, User, UserChanges, UserId};

use crate::error::Result;

/// Account storage. Username and email are unique; violations surface as
/// [`crate::error::CoreError::Conflict`] against the offending field.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Users ordered by username, optionally narrowed to usernames containing
    /// `search` (case-insensitive).
    async fn list_users(&self, search: Option<&str>, page: PageRequest) -> Result<Page<User>>;
    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn create_user(&self, user: &NewUser) -> Result<User>;
    /// Returns `None` when the user does not exist.
    async fn update_user(&self, id: UserId, changes: &UserChanges) -> Result<Option<User>>;
    /// Removes the user together with their reviews and comments.
    async fn delete_user(&self, id: UserId) -> Result<bool>;
    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()>;
}
