use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database_adapter::db::{DbError, Repository};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::analysis::AnalysisError;
use crate::portfolio::PortfolioId;
use crate::user::UserId;

/// Asset class of an investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum InvestmentType {
    #[serde(rename = "Real Estate")]
    RealEstate,
    Stocks,
    Bonds,
    Crypto,
    Deposits,
}

impl InvestmentType {
    /// Every asset class, in the order suggestions name them.
    pub const ALL: [InvestmentType; 5] = [
        InvestmentType::RealEstate,
        InvestmentType::Stocks,
        InvestmentType::Bonds,
        InvestmentType::Crypto,
        InvestmentType::Deposits,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InvestmentType::RealEstate => "Real Estate",
            InvestmentType::Stocks => "Stocks",
            InvestmentType::Bonds => "Bonds",
            InvestmentType::Crypto => "Crypto",
            InvestmentType::Deposits => "Deposits",
        }
    }
}

impl fmt::Display for InvestmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestmentType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvestmentType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AnalysisError::InvalidInput(format!("unknown investment type {s:?}")))
    }
}

/// Qualitative risk of a single investment or of a whole portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Numeric weight used to average risk: Low=1, Medium=2, High=3.
    #[must_use]
    pub fn weight(self) -> f64 {
        match self {
            RiskLevel::Low => 1.0,
            RiskLevel::Medium => 2.0,
            RiskLevel::High => 3.0,
        }
    }

    /// Buckets a mean weight. Ties at 1.5 and 2.5 go to the lower bucket.
    #[must_use]
    pub fn from_mean_weight(mean: f64) -> Self {
        if mean <= 1.5 {
            RiskLevel::Low
        } else if mean <= 2.5 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(RiskLevel::Low),
            "Medium" => Ok(RiskLevel::Medium),
            "High" => Ok(RiskLevel::High),
            other => Err(AnalysisError::InvalidInput(format!(
                "unknown risk level {other:?}"
            ))),
        }
    }
}

pub type InvestmentId = Uuid;

/// An investment row as it is stored.
///
/// Type and risk are kept as plain strings, so rows written by other clients
/// may hold values outside the known sets. Convert to [`Investment`] before
/// doing anything with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InvestmentRecord {
    #[schema(value_type = String, format = Uuid)]
    pub id: InvestmentId,
    #[schema(value_type = String, format = Uuid)]
    pub user_id: UserId,
    #[schema(value_type = String, format = Uuid)]
    pub portfolio_id: PortfolioId,
    pub asset_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    pub risk: String,
    pub sector: String,
    pub created_at: DateTime<Utc>,
}

/// A validated investment.
#[derive(Debug, Clone, PartialEq)]
pub struct Investment {
    pub id: InvestmentId,
    pub user_id: UserId,
    pub portfolio_id: PortfolioId,
    pub asset_name: String,
    pub kind: InvestmentType,
    pub value: f64,
    pub risk: RiskLevel,
    pub sector: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&InvestmentRecord> for Investment {
    type Error = AnalysisError;

    fn try_from(record: &InvestmentRecord) -> Result<Self, Self::Error> {
        if !record.value.is_finite() || record.value < 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "investment {} has invalid value {}",
                record.id, record.value
            )));
        }

        Ok(Self {
            id: record.id,
            user_id: record.user_id,
            portfolio_id: record.portfolio_id,
            asset_name: record.asset_name.clone(),
            kind: record.kind.parse()?,
            value: record.value,
            risk: record.risk.parse()?,
            sector: record.sector.clone(),
            created_at: record.created_at,
        })
    }
}

impl From<&Investment> for InvestmentRecord {
    fn from(investment: &Investment) -> Self {
        Self {
            id: investment.id,
            user_id: investment.user_id,
            portfolio_id: investment.portfolio_id,
            asset_name: investment.asset_name.clone(),
            kind: investment.kind.as_str().to_string(),
            value: investment.value,
            risk: investment.risk.as_str().to_string(),
            sector: investment.sector.clone(),
            created_at: investment.created_at,
        }
    }
}

/// User input for creating or replacing an investment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewInvestment {
    #[validate(length(min = 1, max = 200, message = "asset name is required"))]
    pub asset_name: String,
    #[serde(rename = "type")]
    pub kind: InvestmentType,
    #[validate(range(min = 0.0, message = "value must not be negative"))]
    pub value: f64,
    pub risk: RiskLevel,
    #[validate(length(min = 1, max = 100, message = "sector is required"))]
    pub sector: String,
}

impl NewInvestment {
    /// Trims the text fields so blank names fail validation.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            asset_name: self.asset_name.trim().to_string(),
            sector: self.sector.trim().to_string(),
            ..self
        }
    }

    /// Builds the stored row for this input.
    #[must_use]
    pub fn into_record(
        self,
        id: InvestmentId,
        user_id: UserId,
        portfolio_id: PortfolioId,
        created_at: DateTime<Utc>,
    ) -> InvestmentRecord {
        InvestmentRecord {
            id,
            user_id,
            portfolio_id,
            asset_name: self.asset_name.trim().to_string(),
            kind: self.kind.as_str().to_string(),
            value: self.value,
            risk: self.risk.as_str().to_string(),
            sector: self.sector.trim().to_string(),
            created_at,
        }
    }
}

pub type InvestmentRepo = Arc<dyn Repository<InvestmentRecord, InvestmentId>>;

#[async_trait]
pub trait InvestmentRepoExt {
    /// Stores a new investment row under its own id.
    async fn create_investment(&self, record: InvestmentRecord) -> Result<InvestmentId, DbError>;

    /// Every investment of a portfolio, in creation order.
    async fn get_investments_for_portfolio(
        &self,
        portfolio_id: &PortfolioId,
    ) -> Result<Vec<InvestmentRecord>, DbError>;
}

#[async_trait]
impl<R> InvestmentRepoExt for R
where
    R: Repository<InvestmentRecord, InvestmentId> + ?Sized,
{
    async fn create_investment(&self, record: InvestmentRecord) -> Result<InvestmentId, DbError> {
        let id = record.id;
        self.insert(id, record).await?;
        Ok(id)
    }

    async fn get_investments_for_portfolio(
        &self,
        portfolio_id: &PortfolioId,
    ) -> Result<Vec<InvestmentRecord>, DbError> {
        let rows = self
            .find_all_by_field("portfolio_id", &portfolio_id.to_string())
            .await?;
        Ok(rows.into_iter().map(|(_, record)| record).collect())
    }
}
