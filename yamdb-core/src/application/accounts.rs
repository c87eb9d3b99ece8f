//! Signup, token exchange and account administration.

use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use yamdb_model::{
    ModelError, NewUser, Page, PageRequest, Role, User, UserChanges, UserId, UserInput, ValidationErrors,
    validation, wire,
};

use super::unit_of_work::AppUnitOfWork;
use crate::auth::{Access, AccessPolicy, AccessTokens, ConfirmationCodes, TokenError};
use crate::database::ports::users::UsersRepository;
use crate::database::{EMAIL_TAKEN, USERNAME_TAKEN};
use crate::error::{CoreError, Result};
use crate::mail::{Mailer, OutgoingEmail};

pub const INVALID_CONFIRMATION_CODE: &str = "Invalid confirmation code.";
pub const USER_NOT_FOUND: &str = "No User matches the given query.";

#[derive(Debug, Clone, Default)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub decode_errors: ValidationErrors,
}

impl<'de> Deserialize<'de> for SignupRequest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            username: Option<Value>,
            email: Option<Value>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let mut decode_errors = ValidationErrors::new();
        Ok(SignupRequest {
            username: wire::text(&mut decode_errors, "username", raw.username),
            email: wire::text(&mut decode_errors, "email", raw.email),
            decode_errors,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupReceipt {
    pub email: String,
    pub username: String,
}

#[derive(Debug, Clone, Default)]
pub struct TokenRequest {
    pub username: Option<String>,
    pub confirmation_code: Option<String>,
    pub decode_errors: ValidationErrors,
}

impl<'de> Deserialize<'de> for TokenRequest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            username: Option<Value>,
            confirmation_code: Option<Value>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let mut decode_errors = ValidationErrors::new();
        Ok(TokenRequest {
            username: wire::text(&mut decode_errors, "username", raw.username),
            confirmation_code: wire::text(
                &mut decode_errors,
                "confirmation_code",
                raw.confirmation_code,
            ),
            decode_errors,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UsersRepository>,
    codes: ConfirmationCodes,
    tokens: AccessTokens,
    mailer: Arc<dyn Mailer>,
    mail_from: String,
}

impl fmt::Debug for AccountService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountService")
            .field("users", &type_name_of_val(self.users.as_ref()))
            .field("mailer", &self.mailer)
            .field("mail_from", &self.mail_from)
            .finish()
    }
}

impl AccountService {
    pub fn new(
        uow: &AppUnitOfWork,
        codes: ConfirmationCodes,
        tokens: AccessTokens,
        mailer: Arc<dyn Mailer>,
        mail_from: impl Into<String>,
    ) -> Self {
        Self {
            users: uow.users.clone(),
            codes,
            tokens,
            mailer,
            mail_from: mail_from.into(),
        }
    }

    /// Registers an account or, when the exact username/email pair already
    /// exists, mails a fresh code to it.
    pub async fn signup(&self, request: SignupRequest) -> Result<SignupReceipt> {
        let pair = (
            request.username.as_deref().map(str::trim),
            request.email.as_deref().map(str::trim),
        );
        if let (Some(username), Some(email)) = pair
            && let Some(existing) = self.users.get_user_by_username(username).await?
            && existing.email == email
        {
            self.send_code(&existing).await?;
            return Ok(receipt(&existing));
        }

        let input = UserInput {
            username: request.username,
            email: request.email,
            decode_errors: request.decode_errors,
            ..UserInput::default()
        };
        let new_user = self.validate_new_user(input).await?;
        let user = self.users.create_user(&new_user).await?;
        info!(user_id = %user.id, username = %user.username, "user signed up");

        self.send_code(&user).await?;
        Ok(receipt(&user))
    }

    pub async fn issue_token(&self, request: TokenRequest) -> Result<IssuedToken> {
        let mut errors = request.decode_errors;
        let username =
            validation::required_text(&mut errors, "username", request.username.as_deref());
        let code = validation::required_text(
            &mut errors,
            "confirmation_code",
            request.confirmation_code.as_deref(),
        );
        let (Some(username), Some(code)) = (username, code) else {
            return Err(CoreError::Validation(errors));
        };

        let user = self
            .users
            .get_user_by_username(&username)
            .await?
            .ok_or_else(|| CoreError::NotFound(USER_NOT_FOUND.to_string()))?;

        if !self.codes.check_code(&user, &code) {
            warn!(username = %user.username, "rejected confirmation code");
            return Err(CoreError::invalid("confirmation_code", INVALID_CONFIRMATION_CODE));
        }

        let token = self.tokens.issue(user.id).map_err(token_error)?;
        self.users.record_login(user.id, Utc::now()).await?;
        info!(user_id = %user.id, "access token issued");
        Ok(IssuedToken { token })
    }

    /// Resolves a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.tokens.validate(token).map_err(token_error)?;
        self.users
            .get_user_by_id(claims.user_id)
            .await?
            .ok_or_else(|| CoreError::InvalidToken("User not found".to_string()))
    }

    pub async fn list_users(
        &self,
        actor: Option<&User>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<User>> {
        AccessPolicy::AdminOnly.check_request(actor, Access::Read)?;
        self.users.list_users(search, page).await
    }

    pub async fn create_user(&self, actor: Option<&User>, input: UserInput) -> Result<User> {
        AccessPolicy::AdminOnly.check_request(actor, Access::Write)?;
        let new_user = self.validate_new_user(input).await?;
        let user = self.users.create_user(&new_user).await?;
        info!(user_id = %user.id, role = user.role.as_str(), "user created by admin");
        Ok(user)
    }

    pub async fn get_user(&self, actor: Option<&User>, username: &str) -> Result<User> {
        AccessPolicy::AdminOnly.check_request(actor, Access::Read)?;
        self.find_user(username).await
    }

    pub async fn update_user(
        &self,
        actor: Option<&User>,
        username: &str,
        input: UserInput,
    ) -> Result<User> {
        AccessPolicy::AdminOnly.check_request(actor, Access::Write)?;
        let user = self.find_user(username).await?;
        let changes = self.validate_changes(&user, input, true).await?;
        self.apply_changes(user.id, &changes).await
    }

    pub async fn delete_user(&self, actor: Option<&User>, username: &str) -> Result<()> {
        AccessPolicy::AdminOnly.check_request(actor, Access::Write)?;
        let user = self.find_user(username).await?;
        self.users.delete_user(user.id).await?;
        info!(user_id = %user.id, username = %user.username, "user deleted");
        Ok(())
    }

    pub fn me(&self, actor: Option<&User>) -> Result<User> {
        AccessPolicy::Authenticated.check_request(actor, Access::Read)?;
        actor
            .cloned()
            .ok_or_else(|| CoreError::Unauthenticated("no user".to_string()))
    }

    /// Self-service profile edit. A role in the payload is ignored.
    pub async fn update_me(&self, actor: Option<&User>, input: UserInput) -> Result<User> {
        let user = self.me(actor)?;
        let changes = self.validate_changes(&user, input, false).await?;
        self.apply_changes(user.id, &changes).await
    }

    /// Creates an administrator with superuser rights, bypassing signup.
    pub async fn create_superuser(&self, username: String, email: String) -> Result<User> {
        let input = UserInput {
            username: Some(username),
            email: Some(email),
            role: Some(Role::Admin.as_str().to_string()),
            ..UserInput::default()
        };
        let mut new_user = self.validate_new_user(input).await?;
        new_user.is_superuser = true;
        let user = self.users.create_user(&new_user).await?;
        info!(user_id = %user.id, username = %user.username, "superuser created");
        Ok(user)
    }

    async fn find_user(&self, username: &str) -> Result<User> {
        self.users
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| CoreError::NotFound(USER_NOT_FOUND.to_string()))
    }

    async fn send_code(&self, user: &User) -> Result<()> {
        let code = self.codes.make_code(user);
        let email = OutgoingEmail::confirmation(&self.mail_from, &user.email, &code);
        self.mailer.send(&email).await
    }

    /// Field rules plus uniqueness, reported together.
    async fn validate_new_user(&self, input: UserInput) -> Result<NewUser> {
        let username = input.username.clone();
        let email = input.email.clone();
        let (new_user, mut errors) = match input.into_new_user() {
            Ok(new_user) => (Some(new_user), ValidationErrors::new()),
            Err(ModelError::Validation(errors)) => (None, errors),
        };

        let mut unique = ValidationErrors::new();
        self.check_unique(
            &mut unique,
            username
                .as_deref()
                .map(str::trim)
                .filter(|_| !errors.contains("username")),
            email
                .as_deref()
                .map(str::trim)
                .filter(|_| !errors.contains("email")),
            None,
        )
        .await?;
        errors.merge(unique);

        match new_user {
            Some(new_user) if errors.is_empty() => Ok(new_user),
            _ => Err(CoreError::Validation(errors)),
        }
    }

    async fn validate_changes(
        &self,
        user: &User,
        input: UserInput,
        allow_role: bool,
    ) -> Result<UserChanges> {
        let changes = input.into_changes(allow_role)?;
        let mut errors = ValidationErrors::new();
        self.check_unique(
            &mut errors,
            changes.username.as_deref(),
            changes.email.as_deref(),
            Some(user.id),
        )
        .await?;
        errors.finish(changes).map_err(CoreError::from)
    }

    async fn apply_changes(&self, id: UserId, changes: &UserChanges) -> Result<User> {
        self.users
            .update_user(id, changes)
            .await?
            .ok_or_else(|| CoreError::NotFound(USER_NOT_FOUND.to_string()))
    }

    async fn check_unique(
        &self,
        errors: &mut ValidationErrors,
        username: Option<&str>,
        email: Option<&str>,
        except: Option<UserId>,
    ) -> Result<()> {
        if let Some(username) = username
            && let Some(owner) = self.users.get_user_by_username(username).await?
            && Some(owner.id) != except
        {
            errors.add("username", USERNAME_TAKEN);
        }
        if let Some(email) = email
            && let Some(owner) = self.users.get_user_by_email(email).await?
            && Some(owner.id) != except
        {
            errors.add("email", EMAIL_TAKEN);
        }
        Ok(())
    }
}

fn receipt(user: &User) -> SignupReceipt {
    SignupReceipt {
        email: user.email.clone(),
        username: user.username.clone(),
    }
}

fn token_error(err: TokenError) -> CoreError {
    match err {
        TokenError::LifetimeOverflow => CoreError::Internal(err.to_string()),
        _ => CoreError::InvalidToken(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthCrypto;
    use crate::database::memory::MemoryDatabase;
    use crate::mail::RecordingMailer;
    use std::time::Duration;

    struct Harness {
        service: AccountService,
        mailer: Arc<RecordingMailer>,
        db: Arc<MemoryDatabase>,
    }

    fn harness() -> Harness {
        let db = Arc::new(MemoryDatabase::new());
        let uow = AppUnitOfWork::in_memory(db.clone());
        let crypto = Arc::new(AuthCrypto::new("account-tests").unwrap());
        let mailer = Arc::new(RecordingMailer::new());
        let service = AccountService::new(
            &uow,
            ConfirmationCodes::new(crypto, Duration::from_secs(3600)),
            AccessTokens::new(b"account-tests", Duration::from_secs(3600)),
            mailer.clone(),
            "yamdb@example.com",
        );
        Harness {
            service,
            mailer,
            db,
        }
    }

    fn signup(username: &str, email: &str) -> SignupRequest {
        SignupRequest {
            username: Some(username.into()),
            email: Some(email.into()),
            ..SignupRequest::default()
        }
    }

    async fn admin(h: &Harness) -> User {
        let mut new_user = NewUser::signup("boss".into(), "boss@yamdb.example".into());
        new_user.role = Role::Admin;
        h.db.create_user(&new_user).await.unwrap()
    }

    #[tokio::test]
    async fn signup_then_token_round_trip() {
        let h = harness();
        let receipt = h
            .service
            .signup(signup("reader", "reader@yamdb.example"))
            .await
            .unwrap();
        assert_eq!(receipt.username, "reader");

        let code = h.mailer.last_code_for("reader@yamdb.example").await.unwrap();
        let issued = h
            .service
            .issue_token(TokenRequest {
                username: Some("reader".into()),
                confirmation_code: Some(code.clone()),
                ..TokenRequest::default()
            })
            .await
            .unwrap();

        let user = h.service.authenticate(&issued.token).await.unwrap();
        assert_eq!(user.username, "reader");
        assert!(user.last_login.is_some());

        let reused = h
            .service
            .issue_token(TokenRequest {
                username: Some("reader".into()),
                confirmation_code: Some(code),
                ..TokenRequest::default()
            })
            .await;
        assert!(matches!(reused, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn repeated_signup_resends_code() {
        let h = harness();
        h.service
            .signup(signup("reader", "reader@yamdb.example"))
            .await
            .unwrap();
        h.service
            .signup(signup("reader", "reader@yamdb.example"))
            .await
            .unwrap();
        assert_eq!(h.mailer.sent().await.len(), 2);
    }

    #[tokio::test]
    async fn repeated_signup_matches_the_pair_after_trimming() {
        let h = harness();
        h.service
            .signup(signup("reader", "reader@yamdb.example"))
            .await
            .unwrap();
        let receipt = h
            .service
            .signup(signup(" reader ", " reader@yamdb.example "))
            .await
            .unwrap();
        assert_eq!(receipt.username, "reader");
        assert_eq!(receipt.email, "reader@yamdb.example");
        assert_eq!(h.mailer.sent().await.len(), 2);
    }

    #[tokio::test]
    async fn signup_rejects_taken_username_with_other_email() {
        let h = harness();
        h.service
            .signup(signup("reader", "reader@yamdb.example"))
            .await
            .unwrap();
        let err = h
            .service
            .signup(signup("reader", "other@yamdb.example"))
            .await
            .unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains("username"));
        assert!(!fields.contains("email"));
    }

    #[tokio::test]
    async fn signup_rejects_reserved_name_and_missing_fields() {
        let h = harness();
        let err = h
            .service
            .signup(signup("me", "me@yamdb.example"))
            .await
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains("username"));

        let err = h.service.signup(SignupRequest::default()).await.unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains("username") && fields.contains("email"));
        assert!(h.mailer.sent().await.is_empty());
    }

    #[tokio::test]
    async fn token_requires_known_user() {
        let h = harness();
        let err = h
            .service
            .issue_token(TokenRequest {
                username: Some("ghost".into()),
                confirmation_code: Some("0-abc".into()),
                ..TokenRequest::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        let err = h.service.issue_token(TokenRequest::default()).await.unwrap_err();
        assert!(err.field_errors().unwrap().contains("confirmation_code"));
    }

    #[tokio::test]
    async fn admin_manages_users_and_others_cannot() {
        let h = harness();
        let boss = admin(&h).await;
        let created = h
            .service
            .create_user(
                Some(&boss),
                UserInput {
                    username: Some("moder".into()),
                    email: Some("moder@yamdb.example".into()),
                    role: Some("moderator".into()),
                    ..UserInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(created.role, Role::Moderator);

        let denied = h
            .service
            .list_users(Some(&created), None, PageRequest::first(10))
            .await;
        assert!(matches!(denied, Err(CoreError::Forbidden(_))));
        let anonymous = h.service.list_users(None, None, PageRequest::first(10)).await;
        assert!(matches!(anonymous, Err(CoreError::Unauthenticated(_))));

        let page = h
            .service
            .list_users(Some(&boss), Some("mod"), PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(page.count, 1);

        h.service.delete_user(Some(&boss), "moder").await.unwrap();
        assert!(matches!(
            h.service.get_user(Some(&boss), "moder").await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn me_cannot_change_own_role() {
        let h = harness();
        h.service
            .signup(signup("reader", "reader@yamdb.example"))
            .await
            .unwrap();
        let reader = h.db.get_user_by_username("reader").await.unwrap().unwrap();

        let updated = h
            .service
            .update_me(
                Some(&reader),
                UserInput {
                    bio: Some("cinephile".into()),
                    role: Some("admin".into()),
                    ..UserInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::User);
        assert_eq!(updated.bio, "cinephile");
        assert!(matches!(h.service.me(None), Err(CoreError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn superuser_is_admin() {
        let h = harness();
        let root = h
            .service
            .create_superuser("root".into(), "root@yamdb.example".into())
            .await
            .unwrap();
        assert!(root.is_superuser);
        assert!(root.is_admin());
    }
}
