use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// Used when the authority says "Wait" but gives no readable number.
pub const FALLBACK_COOLDOWN_SECS: f64 = 1.0;
pub const COUNTDOWN_TICK: Duration = Duration::from_millis(100);

fn wait_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"Wait (\d+(?:\.\d+)?) seconds").ok())
        .as_ref()
}

/// Extracts the remaining cooldown from a rejection message. `None` means the
/// rejection was not a cooldown.
pub fn parse_cooldown(message: &str) -> Option<f64> {
    if !message.contains("Wait") {
        return None;
    }
    let seconds = wait_pattern()
        .and_then(|pattern| pattern.captures(message))
        .and_then(|caps| caps.get(1))
        .and_then(|value| value.as_str().parse::<f64>().ok())
        .unwrap_or(FALLBACK_COOLDOWN_SECS);
    Some(seconds)
}

/// Countdown shown after a cooldown rejection, ticking every 100ms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CooldownTimer {
    remaining: f64,
}

impl CooldownTimer {
    pub fn new(seconds: f64) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    /// Advances by one tick. Returns false once the countdown has finished.
    pub fn tick(&mut self) -> bool {
        self.remaining = (self.remaining - COUNTDOWN_TICK.as_secs_f64()).max(0.0);
        // Snap float drift to zero.
        if self.remaining < 1e-9 {
            self.remaining = 0.0;
        }
        self.is_active()
    }

    pub fn label(&self) -> String {
        format!("{:.1}", self.remaining)
    }
}
