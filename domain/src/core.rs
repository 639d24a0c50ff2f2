use std::sync::Mutex;

use chrono::{DateTime, Utc};
use database_adapter::db::{DbError, Repository};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    analysis::{self, AnalysisError, PortfolioSummary},
    investment::{
        Investment, InvestmentId, InvestmentRecord, InvestmentRepoExt, InvestmentType,
        NewInvestment, RiskLevel,
    },
    market::{MarketTick, MarketTickRepoExt},
    portfolio::{Portfolio, PortfolioId, PortfolioRepoExt},
    profile::{ProfileInput, ProfileRepoExt, UserProfile},
    report::{AnalysisReport, ReportId, ReportRepoExt},
    store::Stores,
    suggestion::SuggestionEngine,
    user::{AuthError, UserId, UserRepoExt},
};

pub const DEMO_EMAIL: &str = "demo@portfolio.local";
pub const DEMO_PASSWORD: &str = "demo-password";

#[derive(Debug)]
pub enum ServiceError {
    Db(DbError),
    Auth(AuthError),
    Analysis(AnalysisError),
    NotFound(String),
    Forbidden,
    Validation(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Db(e) => write!(f, "{e}"),
            ServiceError::Auth(e) => write!(f, "{e}"),
            ServiceError::Analysis(e) => write!(f, "{e}"),
            ServiceError::NotFound(what) => write!(f, "{what} not found"),
            ServiceError::Forbidden => write!(f, "Access denied"),
            ServiceError::Validation(msg) => write!(f, "Validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<DbError> for ServiceError {
    fn from(error: DbError) -> Self {
        ServiceError::Db(error)
    }
}

impl From<AuthError> for ServiceError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Storage(db) => ServiceError::Db(db),
            other => ServiceError::Auth(other),
        }
    }
}

impl From<AnalysisError> for ServiceError {
    fn from(error: AnalysisError) -> Self {
        ServiceError::Analysis(error)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

/// Entry point of the application: accounts, portfolios, market data and reports.
///
/// Every operation takes the acting user explicitly.
#[derive(Debug)]
pub struct PortfolioManager {
    stores: Stores,
    engine: SuggestionEngine,
    rng: Mutex<StdRng>,
    // Serializes portfolio creation and investment writes.
    portfolio_lock: tokio::sync::Mutex<()>,
}

impl PortfolioManager {
    /// Creates a manager whose suggestions are drawn from OS entropy.
    #[must_use]
    pub fn new(stores: Stores, engine: SuggestionEngine) -> Self {
        Self::with_rng(stores, engine, StdRng::from_os_rng())
    }

    /// Creates a manager with reproducible suggestions.
    #[must_use]
    pub fn with_seed(stores: Stores, engine: SuggestionEngine, seed: u64) -> Self {
        Self::with_rng(stores, engine, StdRng::seed_from_u64(seed))
    }

    fn with_rng(stores: Stores, engine: SuggestionEngine, rng: StdRng) -> Self {
        Self {
            stores,
            engine,
            rng: Mutex::new(rng),
            portfolio_lock: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Stores::in_memory(), SuggestionEngine::default())
    }

    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Registers a new account.
    /// # Errors
    /// - `ServiceError::Auth` if the email is taken or the credentials are too weak
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserId, ServiceError> {
        let user_id = self.stores.users.create_user(email, password).await?;
        info!(%user_id, "User signed up");
        Ok(user_id)
    }

    /// Checks credentials.
    /// # Errors
    /// - `ServiceError::Auth` if the user is unknown or the password is wrong
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, ServiceError> {
        match self.stores.users.authenticate_user(email, password).await {
            Ok(user_id) => {
                info!(%user_id, "User signed in");
                Ok(user_id)
            }
            Err(e) => {
                warn!("Failed sign in: {e}");
                Err(e.into())
            }
        }
    }

    /// Whether the account still exists.
    /// # Errors
    /// - `ServiceError::Db` on storage failure
    pub async fn user_exists(&self, user_id: &UserId) -> Result<bool, ServiceError> {
        Ok(self.stores.users.get(user_id).await?.is_some())
    }

    /// Creates or replaces the user's profile.
    /// # Errors
    /// - `ServiceError::Validation` if the input is invalid
    pub async fn save_profile(
        &self,
        user_id: UserId,
        input: ProfileInput,
    ) -> Result<UserProfile, ServiceError> {
        let input = input.normalized();
        input.validate()?;
        let profile = self.stores.profiles.upsert_profile(user_id, input).await?;
        debug!(%user_id, "Profile saved");
        Ok(profile)
    }

    /// # Errors
    /// - `ServiceError::Db` on storage failure
    pub async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, ServiceError> {
        Ok(self.stores.profiles.get_profile(user_id).await?)
    }

    /// Returns the user's portfolio, creating an empty one on first use.
    /// # Errors
    /// - `ServiceError::Db` on storage failure
    pub async fn get_or_create_portfolio(&self, user_id: &UserId) -> Result<Portfolio, ServiceError> {
        let _guard = self.portfolio_lock.lock().await;
        Ok(self.stores.portfolios.get_or_create_portfolio(user_id).await?)
    }

    /// Adds an investment to the user's portfolio.
    /// # Errors
    /// - `ServiceError::Validation` if the input is invalid or the portfolio total would overflow
    pub async fn add_investment(
        &self,
        user_id: UserId,
        input: NewInvestment,
    ) -> Result<InvestmentRecord, ServiceError> {
        let input = input.normalized();
        input.validate()?;
        let portfolio = self.get_or_create_portfolio(&user_id).await?;

        let record = input.into_record(Uuid::new_v4(), user_id, portfolio.id, Utc::now());
        Investment::try_from(&record).map_err(|e| ServiceError::Validation(e.to_string()))?;

        let _guard = self.portfolio_lock.lock().await;
        let total = self.checked_total(&portfolio.id, None, record.value).await?;
        self.stores.investments.create_investment(record.clone()).await?;
        self.stores.portfolios.set_total(&portfolio.id, total).await?;

        info!(%user_id, investment_id = %record.id, value = record.value, "Investment added");
        Ok(record)
    }

    /// Replaces an investment's fields, keeping its id and creation time.
    /// # Errors
    /// - `ServiceError::Validation` if the input is invalid or the portfolio total would overflow
    /// - `ServiceError::NotFound` if the investment does not exist
    /// - `ServiceError::Forbidden` if it belongs to another user
    pub async fn update_investment(
        &self,
        user_id: UserId,
        investment_id: InvestmentId,
        input: NewInvestment,
    ) -> Result<InvestmentRecord, ServiceError> {
        let input = input.normalized();
        input.validate()?;
        let existing = self.owned_investment(&user_id, &investment_id).await?;

        let record = input.into_record(
            existing.id,
            existing.user_id,
            existing.portfolio_id,
            existing.created_at,
        );
        Investment::try_from(&record).map_err(|e| ServiceError::Validation(e.to_string()))?;

        let _guard = self.portfolio_lock.lock().await;
        let total = self
            .checked_total(&record.portfolio_id, Some(&investment_id), record.value)
            .await?;
        self.stores
            .investments
            .update(investment_id, record.clone())
            .await?;
        self.stores.portfolios.set_total(&record.portfolio_id, total).await?;

        info!(%user_id, %investment_id, "Investment updated");
        Ok(record)
    }

    /// # Errors
    /// - `ServiceError::NotFound` if the investment does not exist
    /// - `ServiceError::Forbidden` if it belongs to another user
    pub async fn delete_investment(
        &self,
        user_id: UserId,
        investment_id: InvestmentId,
    ) -> Result<(), ServiceError> {
        let existing = self.owned_investment(&user_id, &investment_id).await?;

        let _guard = self.portfolio_lock.lock().await;
        let total = self
            .checked_total(&existing.portfolio_id, Some(&investment_id), 0.0)
            .await?;
        self.stores.investments.remove(investment_id).await?;
        self.stores.portfolios.set_total(&existing.portfolio_id, total).await?;

        info!(%user_id, %investment_id, "Investment deleted");
        Ok(())
    }

    /// The user's investments in creation order.
    /// # Errors
    /// - `ServiceError::Db` on storage failure
    pub async fn list_investments(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<InvestmentRecord>, ServiceError> {
        let portfolio = self.get_or_create_portfolio(user_id).await?;
        Ok(self
            .stores
            .investments
            .get_investments_for_portfolio(&portfolio.id)
            .await?)
    }

    /// # Errors
    /// - `ServiceError::Analysis` if a stored investment is malformed
    pub async fn portfolio_summary(&self, user_id: &UserId) -> Result<PortfolioSummary, ServiceError> {
        let records = self.list_investments(user_id).await?;
        Ok(analysis::summarize(&records)?)
    }

    /// Runs the suggestion engine on the user's portfolio and stores the result.
    /// # Errors
    /// - `ServiceError::Analysis` if a stored investment is malformed
    pub async fn generate_report(&self, user_id: UserId) -> Result<AnalysisReport, ServiceError> {
        let portfolio = self.get_or_create_portfolio(&user_id).await?;
        let records = self
            .stores
            .investments
            .get_investments_for_portfolio(&portfolio.id)
            .await?;
        let summary = analysis::summarize(&records)?;
        let market = self.stores.market.latest_ticks().await?;

        let suggestions = {
            let mut rng = self
                .rng
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            self.engine
                .generate(&summary, Some(&records[..]), &market, &mut *rng)?
        };

        let report = AnalysisReport::new(
            user_id,
            portfolio.id,
            suggestions.risk,
            suggestions.prediction(),
        );
        self.stores.reports.create_report(report.clone()).await?;

        info!(%user_id, report_id = %report.id, risk = %report.risk_level, "Report generated");
        Ok(report)
    }

    /// # Errors
    /// - `ServiceError::Db` on storage failure
    pub async fn list_reports(&self, user_id: &UserId) -> Result<Vec<AnalysisReport>, ServiceError> {
        Ok(self.stores.reports.get_reports_for_user(user_id).await?)
    }

    /// Fetches one of the user's reports.
    /// # Errors
    /// - `ServiceError::NotFound` if it does not exist
    /// - `ServiceError::Forbidden` if it belongs to another user
    pub async fn get_report(
        &self,
        user_id: &UserId,
        report_id: &ReportId,
    ) -> Result<AnalysisReport, ServiceError> {
        let report = self
            .stores
            .reports
            .get(report_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Report {report_id}")))?;
        if report.user_id != *user_id {
            return Err(ServiceError::Forbidden);
        }
        Ok(report)
    }

    /// Records a price observation. Defaults the timestamp to now.
    /// # Errors
    /// - `ServiceError::Validation` if the symbol is blank or the price is negative or not finite
    pub async fn record_market_tick(
        &self,
        symbol: &str,
        price: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<MarketTick, ServiceError> {
        if symbol.trim().is_empty() {
            return Err(ServiceError::Validation("symbol is required".to_string()));
        }
        if !price.is_finite() || price < 0.0 {
            return Err(ServiceError::Validation(format!("invalid price {price}")));
        }

        let tick = MarketTick::new(symbol, price, timestamp.unwrap_or_else(Utc::now));
        self.stores.market.record_tick(tick.clone()).await?;
        debug!(symbol = %tick.symbol, price, "Market tick recorded");
        Ok(tick)
    }

    /// Latest tick of every symbol, ordered by symbol.
    /// # Errors
    /// - `ServiceError::Db` on storage failure
    pub async fn latest_market_data(&self) -> Result<Vec<MarketTick>, ServiceError> {
        Ok(self.stores.market.latest_ticks().await?)
    }

    /// Creates the demo account with a few investments, unless it exists.
    /// # Errors
    /// - `ServiceError` if any write fails
    pub async fn seed_demo_data(&self) -> Result<UserId, ServiceError> {
        if let Some((user_id, _)) = self.stores.users.get_user_by_email(DEMO_EMAIL).await? {
            return Ok(user_id);
        }

        let user_id = self.sign_up(DEMO_EMAIL, DEMO_PASSWORD).await?;
        let holdings = [
            ("Apple Inc.", InvestmentType::Stocks, 5000.0, RiskLevel::High, "Technology"),
            ("Treasury Bond 2030", InvestmentType::Bonds, 3000.0, RiskLevel::Low, "Finance"),
            ("Downtown Apartment", InvestmentType::RealEstate, 12000.0, RiskLevel::Medium, "Consumer"),
        ];
        for (asset_name, kind, value, risk, sector) in holdings {
            self.add_investment(
                user_id,
                NewInvestment {
                    asset_name: asset_name.to_string(),
                    kind,
                    value,
                    risk,
                    sector: sector.to_string(),
                },
            )
            .await?;
        }

        for (symbol, price) in [("AAPL", 189.5), ("MSFT", 415.2), ("NVDA", 120.8), ("JPM", 198.1)] {
            self.record_market_tick(symbol, price, None).await?;
        }

        info!(%user_id, "Demo data seeded");
        Ok(user_id)
    }

    async fn owned_investment(
        &self,
        user_id: &UserId,
        investment_id: &InvestmentId,
    ) -> Result<InvestmentRecord, ServiceError> {
        let record = self
            .stores
            .investments
            .get(investment_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Investment {investment_id}")))?;
        if record.user_id != *user_id {
            warn!(%user_id, %investment_id, "Attempt to access another user's investment");
            return Err(ServiceError::Forbidden);
        }
        Ok(record)
    }

    // Total the portfolio would hold with `replaced` swapped for `added`.
    // Callers hold `portfolio_lock` until the new total is stored.
    async fn checked_total(
        &self,
        portfolio_id: &PortfolioId,
        replaced: Option<&InvestmentId>,
        added: f64,
    ) -> Result<f64, ServiceError> {
        let records = self
            .stores
            .investments
            .get_investments_for_portfolio(portfolio_id)
            .await?;
        let kept: f64 = records
            .iter()
            .filter(|r| Some(&r.id) != replaced)
            .map(|r| r.value)
            .sum();
        let total = kept + added;
        if !total.is_finite() {
            warn!(%portfolio_id, "Rejected investment, portfolio total would overflow");
            return Err(ServiceError::Validation(
                "portfolio total value is out of range".to_string(),
            ));
        }
        Ok(total)
    }
}

impl Default for PortfolioManager {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests;
