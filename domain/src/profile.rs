use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use database_adapter::db::{DbError, Repository};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::user::UserId;

/// Personal details of a user. Stored under the owner's user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    #[schema(value_type = String, format = Uuid)]
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub dob: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ProfileInput {
    #[validate(length(min = 1, max = 100, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last name is required"))]
    pub last_name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
    pub dob: Option<NaiveDate>,
}

impl ProfileInput {
    /// Trims every text field and drops blank optional ones, ready for validation.
    #[must_use]
    pub fn normalized(self) -> Self {
        let optional = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: optional(self.phone),
            address: optional(self.address),
            dob: self.dob,
        }
    }
}

pub type ProfileRepo = Arc<dyn Repository<UserProfile, UserId>>;

#[async_trait]
pub trait ProfileRepoExt {
    /// Creates or replaces the profile of `user_id`, keeping its creation time.
    async fn upsert_profile(
        &self,
        user_id: UserId,
        input: ProfileInput,
    ) -> Result<UserProfile, DbError>;

    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, DbError>;
}

#[async_trait]
impl<R> ProfileRepoExt for R
where
    R: Repository<UserProfile, UserId> + ?Sized,
{
    async fn upsert_profile(
        &self,
        user_id: UserId,
        input: ProfileInput,
    ) -> Result<UserProfile, DbError> {
        let now = Utc::now();
        let existing = self.get(&user_id).await?;

        let profile = UserProfile {
            user_id,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone,
            address: input.address,
            dob: input.dob,
            created_at: existing.as_ref().map_or(now, |p| p.created_at),
            updated_at: now,
        };

        if existing.is_some() {
            self.update(user_id, profile.clone()).await?;
        } else {
            self.insert(user_id, profile.clone()).await?;
        }
        Ok(profile)
    }

    async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, DbError> {
        self.get(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use in_memory_adapter::InMemoryRepo;
    use uuid::Uuid;

    fn input(first_name: &str) -> ProfileInput {
        ProfileInput {
            first_name: first_name.to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: None,
            address: Some("1 Main St".to_string()),
            dob: NaiveDate::from_ymd_opt(1990, 4, 2),
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_created_at() {
        let repo: InMemoryRepo<UserProfile, UserId> = InMemoryRepo::new();
        let user_id = Uuid::new_v4();

        let first = repo.upsert_profile(user_id, input("Jane")).await.unwrap();
        let second = repo.upsert_profile(user_id, input("Janet")).await.unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert_eq!(repo.len().await.unwrap(), 1);
        let stored = repo.get_profile(&user_id).await.unwrap().unwrap();
        assert_eq!(stored.first_name, "Janet");
    }

    #[test]
    fn test_profile_validation() {
        let mut bad = input("");
        bad.email = "nope".to_string();
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("first_name"));
        assert!(errors.field_errors().contains_key("email"));
        assert!(input("Jane").validate().is_ok());
    }
}
