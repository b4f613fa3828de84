//! User Service - Business logic layer

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{RegisterRequest, Role, UpdateUser, User, UserFilter};
use crate::repository::UserRepository;

/// Service layer for User business logic
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Register a new user.
    ///
    /// Role defaults to `user`; `admin` cannot be self-assigned and the
    /// `store` role requires a store name.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterRequest) -> UserResult<User> {
        let role = input.role.unwrap_or_default();

        if role == Role::Admin {
            return Err(UserError::Validation(
                "The admin role cannot be self-assigned".to_string(),
            ));
        }

        let store_info = match (role, input.store_info) {
            (Role::Store, Some(info)) => Some(info.into()),
            (Role::Store, None) => {
                return Err(UserError::Validation(
                    "Store accounts require store_info.store_name".to_string(),
                ));
            }
            // Store details are meaningless for plain users
            (_, _) => None,
        };

        if self.repository.email_exists(&input.email).await? {
            return Err(UserError::DuplicateEmail(input.email));
        }
        if self.repository.username_exists(&input.username).await? {
            return Err(UserError::DuplicateUsername(input.username));
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(
            input.email,
            input.username,
            password_hash,
            role,
            input.profile,
            store_info,
        );

        self.repository.create(user).await
    }

    /// Verify credentials for login.
    ///
    /// Unknown email and wrong password both map to InvalidCredentials so
    /// the response does not reveal which one failed. A deactivated
    /// account with valid credentials fails with a distinct error.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> UserResult<User> {
        let user = self
            .repository
            .get_by_email(email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(UserError::Inactive);
        }

        Ok(user)
    }

    /// Change a user's password after verifying the current one
    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> UserResult<()> {
        let mut user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        if !verify_password(current_password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        user.password_hash = hash_password(new_password)?;
        user.updated_at = Some(chrono::Utc::now());

        self.repository.update(user).await?;
        Ok(())
    }

    /// Get a user by ID
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// List users with filters
    #[instrument(skip(self))]
    pub async fn list_users(&self, filter: UserFilter) -> UserResult<(Vec<User>, u64)> {
        let total = self.repository.count(filter.clone()).await?;
        let users = self.repository.list(filter).await?;
        Ok((users, total))
    }

    /// Update a user, checking uniqueness of changed email/username
    #[instrument(skip(self, input))]
    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> UserResult<User> {
        let mut user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        if let Some(ref new_email) = input.email {
            if !new_email.eq_ignore_ascii_case(&user.email)
                && self.repository.email_exists(new_email).await?
            {
                return Err(UserError::DuplicateEmail(new_email.clone()));
            }
        }

        if let Some(ref new_username) = input.username {
            if new_username != &user.username
                && self.repository.username_exists(new_username).await?
            {
                return Err(UserError::DuplicateUsername(new_username.clone()));
            }
        }

        user.apply_update(input);

        self.repository.update(user).await
    }

    /// Delete a user
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> UserResult<()> {
        let deleted = self.repository.delete(id).await?;

        if !deleted {
            return Err(UserError::NotFound(id));
        }

        Ok(())
    }

    /// Flip a user's active flag, returning the updated user
    #[instrument(skip(self))]
    pub async fn toggle_status(&self, id: Uuid) -> UserResult<User> {
        let mut user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        user.is_active = !user.is_active;
        user.updated_at = Some(chrono::Utc::now());

        self.repository.update(user).await
    }
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

// Password helpers

fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoreInfoInput;
    use crate::repository::InMemoryUserRepository;

    fn register_input(email: &str, username: &str, role: Option<Role>) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: "secret123".to_string(),
            role,
            profile: None,
            store_info: None,
        }
    }

    fn service() -> UserService<InMemoryUserRepository> {
        UserService::new(InMemoryUserRepository::new())
    }

    #[tokio::test]
    async fn test_register_defaults_to_user_role() {
        let service = service();
        let user = service
            .register(register_input("a@example.com", "alice", None))
            .await
            .unwrap();

        assert_eq!(user.role, Role::User);
        assert!(user.store_info.is_none());
        assert_ne!(user.password_hash, "secret123");
    }

    #[tokio::test]
    async fn test_register_rejects_self_assigned_admin() {
        let service = service();
        let err = service
            .register(register_input("a@example.com", "alice", Some(Role::Admin)))
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_store_requires_store_info() {
        let service = service();
        let err = service
            .register(register_input("s@example.com", "shop", Some(Role::Store)))
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_store_initializes_store_defaults() {
        let service = service();
        let mut input = register_input("s@example.com", "shop", Some(Role::Store));
        input.store_info = Some(StoreInfoInput {
            store_name: "Acme".to_string(),
            description: None,
            logo: None,
        });

        let user = service.register(input).await.unwrap();
        let info = user.store_info.unwrap();
        assert!(!info.verified);
        assert_eq!(info.total_sales, 0);
        assert_eq!(info.rating, 0.0);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_rejected() {
        let service = service();
        service
            .register(register_input("a@example.com", "alice", None))
            .await
            .unwrap();

        let err = service
            .register(register_input("A@Example.com", "bob", None))
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_email_look_identical() {
        let service = service();
        service
            .register(register_input("a@example.com", "alice", None))
            .await
            .unwrap();

        let wrong_password = service.login("a@example.com", "nope12").await.unwrap_err();
        let unknown_email = service.login("ghost@example.com", "secret123").await.unwrap_err();

        assert!(matches!(wrong_password, UserError::InvalidCredentials));
        assert!(matches!(unknown_email, UserError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_inactive_account_is_distinct() {
        let service = service();
        let user = service
            .register(register_input("a@example.com", "alice", None))
            .await
            .unwrap();

        service.toggle_status(user.id).await.unwrap();

        let err = service.login("a@example.com", "secret123").await.unwrap_err();
        assert!(matches!(err, UserError::Inactive));
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let service = service();
        let user = service
            .register(register_input("a@example.com", "alice", None))
            .await
            .unwrap();

        let err = service
            .change_password(user.id, "wrong-current", "newsecret")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::InvalidCredentials));

        service
            .change_password(user.id, "secret123", "newsecret")
            .await
            .unwrap();

        assert!(service.login("a@example.com", "newsecret").await.is_ok());
    }

    #[tokio::test]
    async fn test_toggle_status_flips_flag() {
        let service = service();
        let user = service
            .register(register_input("a@example.com", "alice", None))
            .await
            .unwrap();
        assert!(user.is_active);

        let toggled = service.toggle_status(user.id).await.unwrap();
        assert!(!toggled.is_active);

        let toggled = service.toggle_status(user.id).await.unwrap();
        assert!(toggled.is_active);
    }

    #[tokio::test]
    async fn test_update_user_checks_username_uniqueness() {
        let service = service();
        service
            .register(register_input("a@example.com", "alice", None))
            .await
            .unwrap();
        let bob = service
            .register(register_input("b@example.com", "bob", None))
            .await
            .unwrap();

        let err = service
            .update_user(
                bob.id,
                UpdateUser {
                    username: Some("alice".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::DuplicateUsername(_)));
    }
}
