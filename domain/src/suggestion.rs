use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisError, PortfolioSummary, mean_risk_weight, validate_records};
use crate::investment::{InvestmentRecord, InvestmentType, RiskLevel};
use crate::market::{MarketTick, latest_per_symbol, top_symbols_by_price};

/// Maximum number of suggestions kept in one report.
pub const MAX_SUGGESTIONS: usize = 5;

/// Separator between suggestions in a report's prediction text.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Portfolios spread over fewer sectors get a sector suggestion.
pub const MIN_SECTOR_SPREAD: usize = 4;

/// Number of symbols named by the market suggestion.
pub const MARKET_PICKS: usize = 3;

/// Symbols suggested when no market data has been recorded.
pub const FALLBACK_SYMBOLS: [&str; 8] = ["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "JPM", "JNJ", "V"];

const CONSERVATIVE_BOUND: f64 = 1.5;
const AGGRESSIVE_BOUND: f64 = 2.5;

/// How the final suggestions are picked from the candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// A random subset, kept in generation order.
    #[default]
    RandomSample,
    /// The first candidates in generation order.
    MostRelevant,
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::RandomSample => f.write_str("random"),
            SelectionPolicy::MostRelevant => f.write_str("relevant"),
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(SelectionPolicy::RandomSample),
            "relevant" => Ok(SelectionPolicy::MostRelevant),
            other => Err(format!(
                "unknown suggestion policy {other:?}, expected \"random\" or \"relevant\""
            )),
        }
    }
}

/// Output of one engine run.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestions {
    pub risk: RiskLevel,
    pub items: Vec<String>,
}

impl Suggestions {
    #[must_use]
    pub fn prediction(&self) -> String {
        self.items.join(PARAGRAPH_SEPARATOR)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine {
    policy: SelectionPolicy,
}

impl SuggestionEngine {
    #[must_use]
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Builds suggestions for a portfolio.
    ///
    /// Diversification hints come from `summary`; the risk level and the risk
    /// hints are recomputed from `investments`.
    /// # Errors
    /// - `AnalysisError::InvalidInput` if `investments` is `None` or holds a malformed record
    pub fn generate<R: Rng + ?Sized>(
        &self,
        summary: &PortfolioSummary,
        investments: Option<&[InvestmentRecord]>,
        market: &[MarketTick],
        rng: &mut R,
    ) -> Result<Suggestions, AnalysisError> {
        let records = investments.ok_or_else(|| {
            AnalysisError::InvalidInput("investment list is required".to_string())
        })?;
        let investments = validate_records(records)?;
        let mean = mean_risk_weight(&investments);
        let risk = mean.map_or(RiskLevel::Low, RiskLevel::from_mean_weight);

        let mut pool = diversification_suggestions(summary);
        pool.extend(market_suggestions(market, rng));
        pool.extend(risk_suggestions(mean));
        pool.extend(alternative_suggestions());

        let items = match self.policy {
            SelectionPolicy::RandomSample => sample_in_order(pool, MAX_SUGGESTIONS, rng),
            SelectionPolicy::MostRelevant => pool.into_iter().take(MAX_SUGGESTIONS).collect(),
        };

        tracing::debug!(risk = %risk, count = items.len(), policy = %self.policy, "Generated suggestions");
        Ok(Suggestions { risk, items })
    }
}

fn sample_in_order<R: Rng + ?Sized>(pool: Vec<String>, amount: usize, rng: &mut R) -> Vec<String> {
    let amount = amount.min(pool.len());
    let mut picked = rand::seq::index::sample(rng, pool.len(), amount).into_vec();
    picked.sort_unstable();

    let mut pool: Vec<Option<String>> = pool.into_iter().map(Some).collect();
    picked
        .into_iter()
        .filter_map(|index| pool[index].take())
        .collect()
}

fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

/// Hints about missing asset classes and a narrow sector spread.
#[must_use]
pub fn diversification_suggestions(summary: &PortfolioSummary) -> Vec<String> {
    let mut suggestions = Vec::new();

    let missing: Vec<&str> = InvestmentType::ALL
        .into_iter()
        .filter(|kind| !summary.type_allocation.iter().any(|a| a.kind == *kind))
        .map(InvestmentType::as_str)
        .collect();
    if !missing.is_empty() {
        suggestions.push(format!(
            "Diversify across asset types: your portfolio has no {}. Spreading money over more asset types lowers overall risk.",
            join_names(&missing)
        ));
    }

    let sectors = summary.sector_allocation.len();
    if sectors < MIN_SECTOR_SPREAD {
        suggestions.push(format!(
            "Broaden your sector exposure: your investments cover {sectors} sector{}. Consider adding holdings in other sectors such as Healthcare, Energy or Consumer goods.",
            if sectors == 1 { "" } else { "s" }
        ));
    }

    suggestions
}

/// One hint naming the highest priced symbols, or random well-known ones
/// when no ticks are available.
pub fn market_suggestions<R: Rng + ?Sized>(market: &[MarketTick], rng: &mut R) -> Vec<String> {
    if market.is_empty() {
        let mut symbols = FALLBACK_SYMBOLS.to_vec();
        symbols.shuffle(rng);
        symbols.truncate(MARKET_PICKS);
        return vec![format!(
            "Market watch: no live market data is available right now. Well-known stocks worth researching include {}.",
            join_names(&symbols)
        )];
    }

    let top = top_symbols_by_price(&latest_per_symbol(market), MARKET_PICKS);
    let top: Vec<&str> = top.iter().map(String::as_str).collect();
    vec![format!(
        "Market watch: based on the latest market data, consider researching {}.",
        top.join(", ")
    )]
}

/// Hints balancing a portfolio that leans to either end of the risk scale.
#[must_use]
pub fn risk_suggestions(mean_weight: Option<f64>) -> Vec<String> {
    let Some(mean) = mean_weight else {
        return vec![
            "Getting started: start with a mix of low and medium risk investments to build a stable base before taking on more risk.".to_string(),
        ];
    };

    if mean <= CONSERVATIVE_BOUND {
        vec![
            "Your portfolio is conservative. Consider adding some growth investments for potentially higher returns.".to_string(),
            "Growth stocks: technology and healthcare companies with strong earnings growth.".to_string(),
            "Index funds: broad equity index funds add growth at a low cost.".to_string(),
        ]
    } else if mean >= AGGRESSIVE_BOUND {
        vec![
            "Your portfolio is aggressive. Consider adding some stable investments to balance the risk.".to_string(),
            "Government bonds: steady income with a low risk of default.".to_string(),
            "Fixed deposits: guaranteed returns that cushion market swings.".to_string(),
        ]
    } else {
        Vec::new()
    }
}

/// Ideas outside the usual asset classes. Always emitted.
#[must_use]
pub fn alternative_suggestions() -> Vec<String> {
    [
        "Real estate investment trusts: property exposure without buying a building.",
        "Precious metals: gold and silver tend to hold value when markets fall.",
        "Peer-to-peer lending: higher yields in exchange for credit risk.",
        "Collectibles: art, wine or rare items can diversify a long-term portfolio.",
        "Green energy: renewable energy funds combine growth with sustainability.",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}
