//! Analytics fetch behind a trait, for the same reason [`rangekeeper_actions::ChainOps`]
//! is a trait: tests drive the pipeline without a real exchange-data round trip.

use rust_decimal::Decimal;

use crate::error::Result;

pub trait Analytics: Send + Sync {
    fn atr(&self, interval: &str, period: usize) -> impl std::future::Future<Output = Result<Decimal>> + Send;
    fn rsi(&self, interval: &str, period: usize) -> impl std::future::Future<Output = Result<Decimal>> + Send;
}

impl Analytics for rangekeeper_market_data::MarketDataClient {
    async fn atr(&self, interval: &str, period: usize) -> Result<Decimal> {
        Ok(rangekeeper_market_data::MarketDataClient::atr(self, interval, period).await?)
    }

    async fn rsi(&self, interval: &str, period: usize) -> Result<Decimal> {
        Ok(rangekeeper_market_data::MarketDataClient::rsi(self, interval, period).await?)
    }
}

#[cfg(test)]
pub mod mock {
    use super::Analytics;
    use crate::error::{PipelineError, Result};
    use parking_lot::RwLock;
    use rangekeeper_market_data::MarketDataError;
    use rust_decimal::Decimal;

    pub struct MockAnalytics {
        pub atr_result: RwLock<Option<Decimal>>,
        pub rsi_result: RwLock<Option<Decimal>>,
    }

    impl MockAnalytics {
        #[must_use]
        pub fn new(atr: Decimal, rsi: Decimal) -> Self {
            Self {
                atr_result: RwLock::new(Some(atr)),
                rsi_result: RwLock::new(Some(rsi)),
            }
        }

        #[must_use]
        pub fn unavailable() -> Self {
            Self {
                atr_result: RwLock::new(None),
                rsi_result: RwLock::new(None),
            }
        }
    }

    impl Analytics for MockAnalytics {
        async fn atr(&self, _interval: &str, _period: usize) -> Result<Decimal> {
            self.atr_result
                .read()
                .ok_or_else(|| PipelineError::Analytics(MarketDataError::EmptyCandles))
        }

        async fn rsi(&self, _interval: &str, _period: usize) -> Result<Decimal> {
            self.rsi_result
                .read()
                .ok_or_else(|| PipelineError::Analytics(MarketDataError::EmptyCandles))
        }
    }
}
