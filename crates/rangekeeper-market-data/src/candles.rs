//! Candle data and the providers that fetch it.

use rust_decimal::Decimal;

/// OHLC candles for one interval, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Candles {
    pub high: Vec<Decimal>,
    pub low: Vec<Decimal>,
    pub close: Vec<Decimal>,
}

impl Candles {
    #[must_use]
    pub fn len(&self) -> usize {
        self.close.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    #[must_use]
    pub fn last_close(&self) -> Option<Decimal> {
        self.close.last().copied()
    }
}

/// One provider in the failover chain. Each call carries its own timeout at
/// the HTTP client layer; a 451 (geo-block) or any transport error is
/// treated identically by the caller — advance to the next provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Coinbase,
    Kraken,
    Binance,
}

impl Provider {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Coinbase => "coinbase",
            Provider::Kraken => "kraken",
            Provider::Binance => "binance",
        }
    }

    /// Providers are tried in this fixed order.
    #[must_use]
    pub fn chain() -> &'static [Provider] {
        &[Provider::Coinbase, Provider::Kraken, Provider::Binance]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn candles_last_close_returns_most_recent() {
        let c = Candles {
            high: vec![dec!(1), dec!(2)],
            low: vec![dec!(1), dec!(2)],
            close: vec![dec!(10), dec!(11)],
        };
        assert_eq!(c.last_close(), Some(dec!(11)));
    }

    #[test]
    fn provider_chain_has_fixed_order() {
        assert_eq!(
            Provider::chain(),
            &[Provider::Coinbase, Provider::Kraken, Provider::Binance]
        );
    }
}
