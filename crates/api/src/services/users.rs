//! Admin management of shopper accounts.

use serde::Deserialize;
use tracing::instrument;

use shopfront_core::{Email, Role, UserId};

use crate::db::{RepositoryError, UserStore};
use crate::error::{AppError, Result, or_not_found};
use crate::models::{User, UserUpdate};
use crate::services::auth::validate_name;

/// Fields an admin may change on an account.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

pub struct UserAdminService<'a> {
    users: &'a dyn UserStore,
}

impl<'a> UserAdminService<'a> {
    #[must_use]
    pub const fn new(users: &'a dyn UserStore) -> Self {
        Self { users }
    }

    /// Non-deleted accounts with the `user` role.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn list(&self) -> Result<Vec<User>> {
        Ok(self.users.list_customers().await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Validation` for bad fields, `AppError::NotFound`
    /// for an unknown or deleted account and `AppError::Conflict` if the
    /// email belongs to another account.
    #[instrument(skip(self, form))]
    pub async fn update(&self, id: UserId, form: UserForm) -> Result<User> {
        let update = UserUpdate {
            name: form
                .name
                .as_deref()
                .map(validate_name)
                .transpose()?,
            email: form
                .email
                .as_deref()
                .map(Email::parse)
                .transpose()
                .map_err(|e| AppError::Validation(format!("Invalid email address: {e}")))?,
            role: form
                .role
                .as_deref()
                .map(str::parse::<Role>)
                .transpose()
                .map_err(AppError::Validation)?,
        };

        let user = self.users.update(id, update).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::Conflict("Email already in use".to_string()),
            other => or_not_found("User")(other),
        })?;

        tracing::info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown or already deleted account.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: UserId) -> Result<User> {
        let user = self
            .users
            .soft_delete(id)
            .await
            .map_err(or_not_found("User"))?;
        tracing::info!(user_id = %id, "User soft deleted");
        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewUser;

    async fn seed(store: &MemoryStore, email: &str, role: Role) -> User {
        UserStore::create(
            store,
            NewUser {
                name: "Someone".to_string(),
                email: Email::parse(email).unwrap(),
                password_hash: "hash".to_string(),
                role,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_excludes_admins_and_deleted() {
        let store = MemoryStore::new();
        let admin = UserAdminService::new(&store);
        seed(&store, "boss@x.com", Role::Admin).await;
        let kept = seed(&store, "a@x.com", Role::User).await;
        let gone = seed(&store, "b@x.com", Role::User).await;
        admin.soft_delete(gone.id).await.unwrap();

        let users = admin.list().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_update_validates_and_applies() {
        let store = MemoryStore::new();
        let admin = UserAdminService::new(&store);
        let user = seed(&store, "a@x.com", Role::User).await;

        let bad = UserForm {
            role: Some("root".to_string()),
            ..UserForm::default()
        };
        assert!(matches!(
            admin.update(user.id, bad).await,
            Err(AppError::Validation(_))
        ));

        let good = UserForm {
            name: Some("Renamed".to_string()),
            role: Some("admin".to_string()),
            ..UserForm::default()
        };
        let updated = admin.update(user.id, good).await.unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.email.as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_update_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let admin = UserAdminService::new(&store);
        seed(&store, "a@x.com", Role::User).await;
        let b = seed(&store, "b@x.com", Role::User).await;

        let form = UserForm {
            email: Some("a@x.com".to_string()),
            ..UserForm::default()
        };
        assert!(matches!(
            admin.update(b.id, form).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_user() {
        let store = MemoryStore::new();
        let admin = UserAdminService::new(&store);
        assert!(matches!(
            admin.soft_delete(UserId::new(9)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
