use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database_adapter::db::{DbError, Repository};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub type TickId = Uuid;

/// One observed price of a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MarketTick {
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl MarketTick {
    #[must_use]
    pub fn new(symbol: &str, price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            price,
            timestamp,
        }
    }
}

/// Keeps the most recent tick of every symbol, ordered by symbol.
///
/// When two ticks of a symbol share a timestamp the later one in `ticks` wins.
#[must_use]
pub fn latest_per_symbol(ticks: &[MarketTick]) -> Vec<MarketTick> {
    let mut latest: BTreeMap<&str, &MarketTick> = BTreeMap::new();
    for tick in ticks {
        match latest.get(tick.symbol.as_str()) {
            Some(current) if current.timestamp > tick.timestamp => {}
            _ => {
                latest.insert(&tick.symbol, tick);
            }
        }
    }
    latest.into_values().cloned().collect()
}

/// Symbols of the `n` highest priced ticks, ties broken by symbol.
///
/// Expects at most one tick per symbol; see [`latest_per_symbol`].
#[must_use]
pub fn top_symbols_by_price(ticks: &[MarketTick], n: usize) -> Vec<String> {
    let mut ranked: Vec<&MarketTick> = ticks.iter().collect();
    ranked.sort_by(|a, b| {
        b.price
            .total_cmp(&a.price)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    ranked
        .into_iter()
        .take(n)
        .map(|tick| tick.symbol.clone())
        .collect()
}

pub type MarketTickRepo = Arc<dyn Repository<MarketTick, TickId>>;

#[async_trait]
pub trait MarketTickRepoExt {
    async fn record_tick(&self, tick: MarketTick) -> Result<TickId, DbError>;

    /// Latest tick of every symbol seen so far.
    async fn latest_ticks(&self) -> Result<Vec<MarketTick>, DbError>;
}

#[async_trait]
impl<R> MarketTickRepoExt for R
where
    R: Repository<MarketTick, TickId> + ?Sized,
{
    async fn record_tick(&self, tick: MarketTick) -> Result<TickId, DbError> {
        let id = Uuid::new_v4();
        self.insert(id, tick).await?;
        Ok(id)
    }

    async fn latest_ticks(&self) -> Result<Vec<MarketTick>, DbError> {
        let ticks: Vec<MarketTick> = self.all().await?.into_iter().map(|(_, t)| t).collect();
        Ok(latest_per_symbol(&ticks))
    }
}
