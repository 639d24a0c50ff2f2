use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database_adapter::db::{DbError, Repository};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::investment::RiskLevel;
use crate::portfolio::PortfolioId;
use crate::user::UserId;

pub type ReportId = Uuid;

/// A persisted run of the suggestion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisReport {
    #[schema(value_type = String, format = Uuid)]
    pub id: ReportId,
    #[schema(value_type = String, format = Uuid)]
    pub user_id: UserId,
    #[schema(value_type = String, format = Uuid)]
    pub portfolio_id: PortfolioId,
    pub risk_level: RiskLevel,
    /// Suggestions joined by blank lines.
    pub prediction: String,
    pub created_at: DateTime<Utc>,
}

impl AnalysisReport {
    #[must_use]
    pub fn new(
        user_id: UserId,
        portfolio_id: PortfolioId,
        risk_level: RiskLevel,
        prediction: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            portfolio_id,
            risk_level,
            prediction,
            created_at: Utc::now(),
        }
    }
}

pub type ReportRepo = Arc<dyn Repository<AnalysisReport, ReportId>>;

#[async_trait]
pub trait ReportRepoExt {
    async fn create_report(&self, report: AnalysisReport) -> Result<ReportId, DbError>;

    /// Reports of a user, newest first.
    async fn get_reports_for_user(&self, user_id: &UserId) -> Result<Vec<AnalysisReport>, DbError>;
}

#[async_trait]
impl<R> ReportRepoExt for R
where
    R: Repository<AnalysisReport, ReportId> + ?Sized,
{
    async fn create_report(&self, report: AnalysisReport) -> Result<ReportId, DbError> {
        let id = report.id;
        self.insert(id, report).await?;
        Ok(id)
    }

    async fn get_reports_for_user(&self, user_id: &UserId) -> Result<Vec<AnalysisReport>, DbError> {
        // Reversed first so reports sharing a timestamp still come newest first.
        let mut reports: Vec<AnalysisReport> = self
            .find_all_by_field("user_id", &user_id.to_string())
            .await?
            .into_iter()
            .rev()
            .map(|(_, report)| report)
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }
}
