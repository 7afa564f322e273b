//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin with a chosen password
//! sf-cli admin create -e admin@example.com -n "Admin Name" -p 'a long passphrase'
//!
//! # Create an admin with a generated password
//! sf-cli admin create -e admin@example.com -n "Admin Name"
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use rand::{Rng, distr::Alphanumeric};
use thiserror::Error;

use shopfront_api::db::{self, PgUserRepository, RepositoryError, UserStore};
use shopfront_api::models::NewUser;
use shopfront_api::services::auth::{self, AuthError};
use shopfront_core::{Email, Role, UserId};

/// Length of generated passwords.
const GENERATED_PASSWORD_LENGTH: usize = 20;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    /// Name, email or password rejected.
    #[error("Invalid input: {0}")]
    Invalid(#[from] AuthError),

    /// Account already exists.
    #[error("An account already exists with email: {0}")]
    UserExists(String),
}

/// Generate a random alphanumeric password.
fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Create a new admin account.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `name` - Admin's display name
/// * `password` - Password to set; one is generated when `None`
///
/// # Returns
///
/// The ID of the created account.
///
/// # Errors
///
/// Returns `AdminError` if input is invalid, the email is taken or the
/// database fails.
pub async fn create_user(
    email: &str,
    name: &str,
    password: Option<String>,
) -> Result<UserId, AdminError> {
    let name = auth::validate_name(name)?;
    let email = Email::parse(email).map_err(AuthError::from)?;
    let generated = password.is_none();
    let password = password.unwrap_or_else(generate_password);
    auth::validate_password(&password)?;

    let database_url =
        super::database_url().ok_or(AdminError::MissingEnvVar("SHOPFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    let users = PgUserRepository::new(pool);

    tracing::info!("Creating admin account: {}", email);

    let password_hash = auth::hash_password(&password)?;
    let user = users
        .create(NewUser {
            name,
            email: email.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    if generated {
        tracing::info!("Generated password: {}", password);
        tracing::warn!("Store this password now; it is not shown again.");
    }

    Ok(user.id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_passes_validation() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        auth::validate_password(&password).unwrap();
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_connecting() {
        let err = create_user("not-an-email", "Admin", Some("secret123".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Invalid(AuthError::InvalidEmail(_))));

        let err = create_user("admin@example.com", "A", Some("secret123".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Invalid(AuthError::InvalidName(_))));

        let err = create_user("admin@example.com", "Admin", Some("123".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Invalid(AuthError::WeakPassword(_))));
    }
}
