//! RSI and ATR over closed candles only — never the in-progress candle.

use rust_decimal::Decimal;

use crate::candles::Candles;

/// Average True Range over `period` candles: mean true range over a plain
/// trailing window, not Wilder's recursive smoothing.
#[must_use]
pub fn atr(candles: &Candles, period: usize) -> Option<Decimal> {
    if candles.len() < period + 1 {
        return None;
    }
    let n = candles.len();
    let mut true_ranges = Vec::with_capacity(n - 1);
    for i in 1..n {
        let high_low = candles.high[i] - candles.low[i];
        let high_close = (candles.high[i] - candles.close[i - 1]).abs();
        let low_close = (candles.low[i] - candles.close[i - 1]).abs();
        true_ranges.push(high_low.max(high_close).max(low_close));
    }
    let window = &true_ranges[true_ranges.len() - period..];
    let sum: Decimal = window.iter().copied().sum();
    Some(sum / Decimal::from(period))
}

/// Relative Strength Index over `period` candles: a simple (not Wilder-smoothed)
/// average gain/loss ratio over a plain trailing window.
#[must_use]
pub fn rsi(candles: &Candles, period: usize) -> Option<Decimal> {
    if candles.len() < period + 1 {
        return None;
    }
    let closes = &candles.close;
    let n = closes.len();
    let mut gains = Decimal::ZERO;
    let mut losses = Decimal::ZERO;
    for i in n - period..n {
        let delta = closes[i] - closes[i - 1];
        if delta > Decimal::ZERO {
            gains += delta;
        } else {
            losses += -delta;
        }
    }
    if losses.is_zero() {
        return Some(Decimal::from(100));
    }
    let avg_gain = gains / Decimal::from(period);
    let avg_loss = losses / Decimal::from(period);
    let rs = avg_gain / avg_loss;
    Some(Decimal::from(100) - (Decimal::from(100) / (Decimal::ONE + rs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flat_candles(n: usize, value: Decimal) -> Candles {
        Candles {
            high: vec![value; n],
            low: vec![value; n],
            close: vec![value; n],
        }
    }

    #[test]
    fn atr_is_zero_for_flat_candles() {
        let c = flat_candles(20, dec!(3000));
        assert_eq!(atr(&c, 14), Some(dec!(0)));
    }

    #[test]
    fn atr_returns_none_when_insufficient_history() {
        let c = flat_candles(5, dec!(3000));
        assert_eq!(atr(&c, 14), None);
    }

    #[test]
    fn rsi_is_100_for_strictly_increasing_closes() {
        let closes: Vec<Decimal> = (0..20).map(|i| Decimal::from(3000 + i)).collect();
        let c = Candles {
            high: closes.clone(),
            low: closes.clone(),
            close: closes,
        };
        assert_eq!(rsi(&c, 14), Some(dec!(100)));
    }

    #[test]
    fn rsi_is_100_when_there_are_no_losses_at_all() {
        let c = flat_candles(20, dec!(3000));
        assert_eq!(rsi(&c, 14), Some(dec!(100)));
    }
}
