use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use database_adapter::db::{DbError, Repository};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub password_hash: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
pub enum AuthError {
    UserNotFound,
    InvalidPassword,
    UserAlreadyExists,
    WeakPassword,
    InvalidEmail,
    Hashing(String),
    Storage(DbError),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::UserNotFound => write!(f, "User not found"),
            AuthError::InvalidPassword => write!(f, "Invalid password"),
            AuthError::UserAlreadyExists => write!(f, "User already exists"),
            AuthError::WeakPassword => write!(
                f,
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            ),
            AuthError::InvalidEmail => write!(f, "Invalid email address"),
            AuthError::Hashing(msg) => write!(f, "Password hashing failed: {msg}"),
            AuthError::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<DbError> for AuthError {
    fn from(error: DbError) -> Self {
        AuthError::Storage(error)
    }
}

/// Lowercased, trimmed form used for lookups.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a user, hashing the password.
    /// # Errors
    /// - `AuthError::InvalidEmail` if the email has no `@`
    /// - `AuthError::WeakPassword` if the password is too short
    pub fn new(email: &str, password: &str) -> Result<Self, AuthError> {
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        Ok(Self {
            email,
            password_hash: Self::hash_password(password)?,
            created_at: chrono::Utc::now(),
        })
    }

    #[must_use]
    pub fn verify_password(&self, password: &str) -> bool {
        PasswordHash::new(&self.password_hash).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }

    fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }
}

pub type UserId = Uuid;

pub type UserRepo = Arc<dyn Repository<User, UserId>>;

#[async_trait]
pub trait UserRepoExt {
    /// Creates a new user with the given credentials
    async fn create_user(&self, email: &str, password: &str) -> Result<UserId, AuthError>;

    /// Authenticates a user by email and password
    async fn authenticate_user(&self, email: &str, password: &str) -> Result<UserId, AuthError>;

    /// Gets a user and its ID by email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<(UserId, User)>, DbError>;
}

#[async_trait]
impl<R> UserRepoExt for R
where
    R: Repository<User, UserId> + ?Sized,
{
    async fn create_user(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let user = User::new(email, password)?;

        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let user_id = Uuid::new_v4();
        self.insert(user_id, user).await?;
        Ok(user_id)
    }

    async fn authenticate_user(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let (user_id, user) = self
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.verify_password(password) {
            Ok(user_id)
        } else {
            Err(AuthError::InvalidPassword)
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<(UserId, User)>, DbError> {
        self.find_by_field("email", &normalize_email(email)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use in_memory_adapter::InMemoryRepo;

    #[test]
    fn test_password_is_hashed() {
        let user = User::new("a@b.c", "secret1").unwrap();
        assert_ne!(user.password_hash, "secret1");
        assert!(user.verify_password("secret1"));
        assert!(!user.verify_password("secret2"));
    }

    #[test]
    fn test_weak_password_rejected() {
        assert!(matches!(
            User::new("a@b.c", "12345"),
            Err(AuthError::WeakPassword)
        ));
    }

    #[test]
    fn test_invalid_email_rejected() {
        assert!(matches!(
            User::new("not-an-email", "secret1"),
            Err(AuthError::InvalidEmail)
        ));
    }

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let repo: InMemoryRepo<User, UserId> = InMemoryRepo::new();
        let id = repo.create_user("Alice@Example.com ", "secret1").await.unwrap();

        assert_eq!(
            repo.authenticate_user("alice@example.com", "secret1")
                .await
                .unwrap(),
            id
        );
        assert!(matches!(
            repo.authenticate_user("alice@example.com", "nope-nope").await,
            Err(AuthError::InvalidPassword)
        ));
        assert!(matches!(
            repo.authenticate_user("bob@example.com", "secret1").await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo: InMemoryRepo<User, UserId> = InMemoryRepo::new();
        repo.create_user("alice@example.com", "secret1").await.unwrap();
        assert!(matches!(
            repo.create_user("ALICE@example.com", "secret2").await,
            Err(AuthError::UserAlreadyExists)
        ));
        assert_eq!(repo.len().await.unwrap(), 1);
    }
}
