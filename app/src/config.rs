use std::net::SocketAddr;

use color_eyre::{Result, eyre::WrapErr};
use domain::suggestion::SelectionPolicy;

lazy_static::lazy_static! {
    pub static ref PROJECT_NAME: String = String::from("portfolio_manager").to_uppercase();
}

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const DEV_JWT_SECRET: &str = "portfolio-manager-development-secret";

/// Name of a setting in the environment, prefixed with the project name.
fn var_name(suffix: &str) -> String {
    format!("{}_{suffix}", PROJECT_NAME.as_str())
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub database_url: Option<String>,
    pub suggestion_policy: SelectionPolicy,
    pub suggestion_seed: Option<u64>,
    pub seed_demo: bool,
    pub log_level: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("database", &self.database_url.as_ref().map(|_| "postgres"))
            .field("suggestion_policy", &self.suggestion_policy)
            .field("suggestion_seed", &self.suggestion_seed)
            .field("seed_demo", &self.seed_demo)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Reads the configuration from the environment and `.env`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let setting = |suffix: &str| lookup(&var_name(suffix)).filter(|v| !v.trim().is_empty());

        let bind_addr = setting("BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .wrap_err_with(|| format!("Invalid {}", var_name("BIND")))?;

        let token_ttl_hours = match setting("TOKEN_TTL_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .wrap_err_with(|| format!("Invalid {}", var_name("TOKEN_TTL_HOURS")))?,
            None => DEFAULT_TOKEN_TTL_HOURS,
        };

        let suggestion_policy = match setting("SUGGESTION_POLICY") {
            Some(raw) => raw
                .parse::<SelectionPolicy>()
                .map_err(color_eyre::eyre::Report::msg)?,
            None => SelectionPolicy::default(),
        };

        let suggestion_seed = setting("SUGGESTION_SEED")
            .map(|raw| raw.parse::<u64>())
            .transpose()
            .wrap_err_with(|| format!("Invalid {}", var_name("SUGGESTION_SEED")))?;

        let seed_demo = setting("DEMO").is_some_and(|v| matches!(v.as_str(), "1" | "true" | "yes"));

        let log_level = setting("LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());

        Ok(Self {
            bind_addr,
            jwt_secret: setting("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            token_ttl_hours,
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            suggestion_policy,
            suggestion_seed,
            seed_demo,
            log_level,
        })
    }

    /// Whether the JWT secret is the built-in development value.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}
