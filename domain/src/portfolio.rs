use std::sync::Arc;

use async_trait::async_trait;
use database_adapter::db::{DbError, Repository};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::user::UserId;

pub type PortfolioId = Uuid;

/// Per-user container of investments. Every user owns at most one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Portfolio {
    #[schema(value_type = String, format = Uuid)]
    pub id: PortfolioId,
    #[schema(value_type = String, format = Uuid)]
    pub user_id: UserId,
    /// Sum of the current investment values, refreshed after every change.
    pub total_investments: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl Portfolio {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            total_investments: 0.0,
            created_at: now,
            last_updated: now,
        }
    }
}

pub type PortfolioRepo = Arc<dyn Repository<Portfolio, PortfolioId>>;

#[async_trait]
pub trait PortfolioRepoExt {
    async fn get_portfolio_for_user(&self, user_id: &UserId) -> Result<Option<Portfolio>, DbError>;

    /// Returns the user's portfolio, creating an empty one when missing.
    ///
    /// Two concurrent callers may both miss; callers that need a single
    /// portfolio per user must serialize calls for the same user.
    async fn get_or_create_portfolio(&self, user_id: &UserId) -> Result<Portfolio, DbError>;

    /// Stores a new cached total. Returns `None` if the portfolio does not exist.
    async fn set_total(
        &self,
        portfolio_id: &PortfolioId,
        total: f64,
    ) -> Result<Option<Portfolio>, DbError>;
}

#[async_trait]
impl<R> PortfolioRepoExt for R
where
    R: Repository<Portfolio, PortfolioId> + ?Sized,
{
    async fn get_portfolio_for_user(&self, user_id: &UserId) -> Result<Option<Portfolio>, DbError> {
        Ok(self
            .find_by_field("user_id", &user_id.to_string())
            .await?
            .map(|(_, portfolio)| portfolio))
    }

    async fn get_or_create_portfolio(&self, user_id: &UserId) -> Result<Portfolio, DbError> {
        if let Some(portfolio) = self.get_portfolio_for_user(user_id).await? {
            return Ok(portfolio);
        }

        let portfolio = Portfolio::new(*user_id);
        self.insert(portfolio.id, portfolio.clone()).await?;
        tracing::debug!(user_id = %user_id, portfolio_id = %portfolio.id, "Created portfolio");
        Ok(portfolio)
    }

    async fn set_total(
        &self,
        portfolio_id: &PortfolioId,
        total: f64,
    ) -> Result<Option<Portfolio>, DbError> {
        let Some(mut portfolio) = self.get(portfolio_id).await? else {
            return Ok(None);
        };
        portfolio.total_investments = total;
        portfolio.last_updated = chrono::Utc::now();
        self.update(*portfolio_id, portfolio.clone()).await?;
        Ok(Some(portfolio))
    }
}
