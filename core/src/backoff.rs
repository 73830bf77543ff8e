use std::time::Duration;

use crate::config::BackoffConfig;

/// Multiplicative reconnect delay: grows by `factor` after every failed
/// attempt up to `max`, and drops back to `base` after a successful open.
#[derive(Clone, Debug, PartialEq)]
pub struct Backoff {
    base: Duration,
    factor: f64,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, factor: f64, max: Duration) -> Self {
        let max = max.max(base);
        Self {
            base,
            factor: factor.max(1.0),
            max,
            current: base,
        }
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(config.base(), config.factor, config.max())
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    /// Returns the delay to wait now and grows the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.mul_f64(self.factor).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_config(&BackoffConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_until_capped_then_resets() {
        let mut backoff = Backoff::default();
        let delays: Vec<u128> = (0..12).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(
            delays,
            vec![1000, 1500, 2250, 3375, 5062, 7593, 11390, 17085, 25628, 30000, 30000, 30000]
        );
        backoff.reset();
        assert_eq!(backoff.current(), Duration::from_secs(1));
    }

    #[test]
    fn factor_below_one_never_shrinks() {
        let mut backoff = Backoff::new(Duration::from_millis(10), 0.5, Duration::from_millis(40));
        assert_eq!(backoff.next_delay(), Duration::from_millis(10));
        assert_eq!(backoff.next_delay(), Duration::from_millis(10));
    }
}
