use std::sync::Arc;

use database_adapter::db::{DbError, PostgresRepo, connect};
use in_memory_adapter::InMemoryRepo;

use crate::{
    investment::{InvestmentId, InvestmentRecord, InvestmentRepo},
    market::{MarketTick, MarketTickRepo, TickId},
    portfolio::{Portfolio, PortfolioId, PortfolioRepo},
    profile::{ProfileRepo, UserProfile},
    report::{AnalysisReport, ReportId, ReportRepo},
    user::{User, UserId, UserRepo},
};

/// The repositories behind a `PortfolioManager`.
#[derive(Clone)]
pub struct Stores {
    pub users: UserRepo,
    pub profiles: ProfileRepo,
    pub portfolios: PortfolioRepo,
    pub investments: InvestmentRepo,
    pub reports: ReportRepo,
    pub market: MarketTickRepo,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

impl Stores {
    /// Process-local stores. Data is lost on exit.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryRepo::<User, UserId>::new()),
            profiles: Arc::new(InMemoryRepo::<UserProfile, UserId>::new()),
            portfolios: Arc::new(InMemoryRepo::<Portfolio, PortfolioId>::new()),
            investments: Arc::new(InMemoryRepo::<InvestmentRecord, InvestmentId>::new()),
            reports: Arc::new(InMemoryRepo::<AnalysisReport, ReportId>::new()),
            market: Arc::new(InMemoryRepo::<MarketTick, TickId>::new()),
        }
    }

    /// Postgres stores sharing one pool. Tables are created when missing.
    /// # Errors
    /// - Returns `DbError` if the database is unreachable or a table cannot be created
    pub async fn postgres(database_url: &str) -> Result<Self, DbError> {
        let pool = connect(database_url).await?;

        Ok(Self {
            users: Arc::new(PostgresRepo::<User, UserId>::new(pool.clone(), "users").await?),
            profiles: Arc::new(PostgresRepo::<UserProfile, UserId>::new(pool.clone(), "user_profiles").await?),
            portfolios: Arc::new(PostgresRepo::<Portfolio, PortfolioId>::new(pool.clone(), "portfolios").await?),
            investments: Arc::new(PostgresRepo::<InvestmentRecord, InvestmentId>::new(pool.clone(), "investments").await?),
            reports: Arc::new(PostgresRepo::<AnalysisReport, ReportId>::new(pool.clone(), "analysis_reports").await?),
            market: Arc::new(PostgresRepo::<MarketTick, TickId>::new(pool, "market_data").await?),
        })
    }
}
