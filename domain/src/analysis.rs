use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::investment::{Investment, InvestmentRecord, InvestmentType, RiskLevel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// A stored investment carries an unknown type, an unknown risk or an unusable value.
    InvalidInput(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Summed value of one asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TypeAllocation {
    #[serde(rename = "type")]
    pub kind: InvestmentType,
    pub value: f64,
}

/// Summed value of one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SectorAllocation {
    pub sector: String,
    pub value: f64,
}

/// Aggregated view of a portfolio's investments.
///
/// Allocation entries appear in the order their key is first seen in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub risk_level: RiskLevel,
    pub type_allocation: Vec<TypeAllocation>,
    pub sector_allocation: Vec<SectorAllocation>,
}

impl PortfolioSummary {
    /// The summary of a portfolio without investments.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            total_value: 0.0,
            risk_level: RiskLevel::Low,
            type_allocation: Vec::new(),
            sector_allocation: Vec::new(),
        }
    }
}

/// Validates every stored row, failing on the first malformed one.
/// # Errors
/// - Returns `AnalysisError::InvalidInput` naming the first bad record
pub fn validate_records(records: &[InvestmentRecord]) -> Result<Vec<Investment>, AnalysisError> {
    records.iter().map(Investment::try_from).collect()
}

/// Mean risk weight of the investments, `None` when there are none.
#[must_use]
pub fn mean_risk_weight(investments: &[Investment]) -> Option<f64> {
    if investments.is_empty() {
        return None;
    }
    let sum: f64 = investments.iter().map(|inv| inv.risk.weight()).sum();
    #[allow(clippy::cast_precision_loss)]
    Some(sum / investments.len() as f64)
}

/// Summarizes stored rows.
/// # Errors
/// - Returns `AnalysisError::InvalidInput` if any row is malformed
pub fn summarize(records: &[InvestmentRecord]) -> Result<PortfolioSummary, AnalysisError> {
    let investments = validate_records(records)?;
    summarize_investments(&investments)
}

/// Summarizes already validated investments.
/// # Errors
/// - Returns `AnalysisError::InvalidInput` if the values add up past `f64::MAX`
pub fn summarize_investments(investments: &[Investment]) -> Result<PortfolioSummary, AnalysisError> {
    let Some(mean) = mean_risk_weight(investments) else {
        return Ok(PortfolioSummary::empty());
    };

    let total_value: f64 = investments.iter().map(|inv| inv.value).sum();
    if !total_value.is_finite() {
        return Err(AnalysisError::InvalidInput(
            "portfolio total value is out of range".to_string(),
        ));
    }

    let type_allocation = group_first_seen(investments, |inv| inv.kind)
        .into_iter()
        .map(|(kind, value)| TypeAllocation { kind, value })
        .collect();

    let sector_allocation = group_first_seen(investments, |inv| inv.sector.clone())
        .into_iter()
        .map(|(sector, value)| SectorAllocation { sector, value })
        .collect();

    Ok(PortfolioSummary {
        total_value,
        risk_level: RiskLevel::from_mean_weight(mean),
        type_allocation,
        sector_allocation,
    })
}

// Linear scan over the groups so output keeps first-seen order.
fn group_first_seen<K, F>(investments: &[Investment], key: F) -> Vec<(K, f64)>
where
    K: PartialEq,
    F: Fn(&Investment) -> K,
{
    let mut groups: Vec<(K, f64)> = Vec::new();
    for inv in investments {
        let k = key(inv);
        match groups.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, value)) => *value += inv.value,
            None => groups.push((k, inv.value)),
        }
    }
    groups
}
