//! Authentication service.
//!
//! Provides password registration/login and bearer token issuing.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenError, TokenSigner};

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use shopfront_core::{Email, Role, UserId};

use crate::db::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

/// Verified against when no active account matches a login, so a miss
/// pays the same Argon2 cost as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("not-a-real-account-password").ok());

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Allowed display name length, in characters.
const NAME_LENGTH: std::ops::RangeInclusive<usize> = 2..=50;

/// Authentication service.
///
/// Handles user registration, login, and current-user lookup.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
    tokens: &'a TokenSigner,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore, tokens: &'a TokenSigner) -> Self {
        Self { users, tokens }
    }

    /// Register a new user and return a bearer token for it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidName`, `InvalidEmail`, `WeakPassword` or
    /// `InvalidRole` if the input is rejected.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> Result<String, AuthError> {
        let name = validate_name(name)?;
        let email = Email::parse(email)?;
        validate_password(password)?;
        let role = role
            .map(str::parse::<Role>)
            .transpose()
            .map_err(AuthError::InvalidRole)?
            .unwrap_or_default();

        let password_hash = hash_password_blocking(password.to_owned()).await?;

        let user = self
            .users
            .create(NewUser {
                name,
                email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        Ok(self.tokens.issue(user.id, user.role)?)
    }

    /// Login with email and password and return a bearer token.
    ///
    /// Unknown emails, wrong passwords and deleted accounts all produce the
    /// same error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let found = self
            .users
            .find_credentials(&email)
            .await?
            .filter(|(user, _)| !user.is_deleted);

        let Some((user, password_hash)) = found else {
            verify_dummy_blocking(password.to_owned()).await;
            return Err(AuthError::InvalidCredentials);
        };

        verify_password_blocking(password.to_owned(), password_hash).await?;

        Ok(self.tokens.issue(user.id, user.role)?)
    }

    /// Look up the account behind a verified token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account is gone or deleted.
    pub async fn current_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get(user_id)
            .await?
            .filter(|u| !u.is_deleted)
            .ok_or(AuthError::UserNotFound)
    }
}

/// Validate and trim a display name.
///
/// # Errors
///
/// Returns `AuthError::InvalidName` if the trimmed name is too short or too long.
pub fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    let len = name.chars().count();
    if !NAME_LENGTH.contains(&len) {
        return Err(AuthError::InvalidName(format!(
            "name must be between {} and {} characters",
            NAME_LENGTH.start(),
            NAME_LENGTH.end()
        )));
    }
    Ok(name.to_owned())
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

// Argon2 is CPU-bound; keep it off the async workers.

async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| AuthError::PasswordHash)?
}

async fn verify_password_blocking(password: String, hash: String) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|_| AuthError::PasswordHash)?
}

async fn verify_dummy_blocking(password: String) {
    let _ = tokio::task::spawn_blocking(move || {
        DUMMY_HASH
            .as_deref()
            .map(|hash| verify_password(&password, hash))
    })
    .await;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::db::MemoryStore;

    fn signer() -> TokenSigner {
        TokenSigner::new(&SecretString::from("k3Y$9xQ!vB7@pL2#mN5&rT8*wZ1^cF4%".to_string()))
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Ada ").unwrap(), "Ada");
        assert!(validate_name("A").is_err());
        assert!(validate_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret1", &hash).is_ok());
        assert!(matches!(
            verify_password("secret2", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_dummy_hash_is_a_real_argon2_hash() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        let parsed = PasswordHash::new(hash).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(verify_password("secret1", hash).is_err());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);

        auth.register("Ada", "ada@x.com", "secret1", None)
            .await
            .unwrap();
        let token = auth.login("ADA@x.com", "secret1").await.unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.role, Role::User);

        let me = auth.current_user(claims.sub).await.unwrap();
        assert_eq!(me.email.as_str(), "ada@x.com");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);

        auth.register("Ada", "ada@x.com", "secret1", None)
            .await
            .unwrap();
        let err = auth
            .register("Other", "ada@x.com", "secret2", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_role() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);

        let err = auth
            .register("Ada", "ada@x.com", "secret1", Some("root"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRole(_)));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);
        auth.register("Ada", "ada@x.com", "secret1", None)
            .await
            .unwrap();

        let wrong_password = auth.login("ada@x.com", "wrong-pw").await.unwrap_err();
        let unknown_email = auth.login("bob@x.com", "secret1").await.unwrap_err();
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_deleted_user_cannot_login() {
        let store = MemoryStore::new();
        let tokens = signer();
        let auth = AuthService::new(&store, &tokens);
        let token = auth
            .register("Ada", "ada@x.com", "secret1", None)
            .await
            .unwrap();
        let id = tokens.verify(&token).unwrap().sub;

        UserStore::soft_delete(&store, id).await.unwrap();

        assert!(matches!(
            auth.login("ada@x.com", "secret1").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.current_user(id).await,
            Err(AuthError::UserNotFound)
        ));
    }
}
