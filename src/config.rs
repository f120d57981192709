//! Operator-tunable configuration.
//!
//! Similarity weights and strength tiers are deliberately configuration, not
//! constants: the right values depend on the venues being monitored and are
//! expected to be tuned from the environment.

use crate::types::Venue;

/// Default minimum combined similarity for accepting a cross-venue match
pub const DEFAULT_MIN_SCORE: f64 = 0.60;

/// Default additive bonus when both markets carry the same category bucket
pub const DEFAULT_CATEGORY_BONUS: f64 = 0.10;

/// Default additive bonus when both titles carry identical numeric thresholds
pub const DEFAULT_NUMERIC_BONUS: f64 = 0.15;

/// Default strength tiers, in USD of spread
pub const DEFAULT_MARGINAL_SPREAD: f64 = 0.01;
pub const DEFAULT_ACTIONABLE_SPREAD: f64 = 0.03;

/// Tunables for the cross-venue matcher
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Minimum combined score for a candidate to be eligible for acceptance
    pub min_score: f64,
    /// Bonus added when category buckets agree
    pub category_bonus: f64,
    /// Bonus added when extracted numeric thresholds are exactly equal
    pub numeric_bonus: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            category_bonus: DEFAULT_CATEGORY_BONUS,
            numeric_bonus: DEFAULT_NUMERIC_BONUS,
        }
    }
}

impl MatchConfig {
    /// Load from environment, falling back to defaults for unset or
    /// unparseable values
    pub fn from_env() -> Self {
        Self {
            min_score: env_f64("MATCH_MIN_SCORE", DEFAULT_MIN_SCORE),
            category_bonus: env_f64("MATCH_CATEGORY_BONUS", DEFAULT_CATEGORY_BONUS),
            numeric_bonus: env_f64("MATCH_NUMERIC_BONUS", DEFAULT_NUMERIC_BONUS),
        }
    }

    #[must_use]
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    #[must_use]
    pub fn with_category_bonus(mut self, bonus: f64) -> Self {
        self.category_bonus = bonus;
        self
    }

    #[must_use]
    pub fn with_numeric_bonus(mut self, bonus: f64) -> Self {
        self.numeric_bonus = bonus;
        self
    }
}

/// Strength tier thresholds over the spread magnitude
#[derive(Debug, Clone)]
pub struct SpreadConfig {
    /// Spread at or above which an opportunity is at least marginal
    pub marginal: f64,
    /// Spread at or above which an opportunity is actionable
    pub actionable: f64,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            marginal: DEFAULT_MARGINAL_SPREAD,
            actionable: DEFAULT_ACTIONABLE_SPREAD,
        }
    }
}

impl SpreadConfig {
    pub fn from_env() -> Self {
        Self {
            marginal: env_f64("SPREAD_MARGINAL", DEFAULT_MARGINAL_SPREAD),
            actionable: env_f64("SPREAD_ACTIONABLE", DEFAULT_ACTIONABLE_SPREAD),
        }
    }

    #[must_use]
    pub fn with_tiers(mut self, marginal: f64, actionable: f64) -> Self {
        self.marginal = marginal;
        self.actionable = actionable;
        self
    }
}

// === Binary-level settings ===

/// Seconds between snapshot-file polls
pub fn refresh_secs() -> u64 {
    env_u64("REFRESH_SECS", 10)
}

/// Seconds between heartbeat status lines
pub fn heartbeat_secs() -> u64 {
    env_u64("HEARTBEAT_SECS", 15)
}

/// Path of the snapshot file a venue adapter writes for us to ingest
pub fn feed_path(venue: Venue) -> String {
    match venue {
        Venue::Kalshi => {
            std::env::var("KALSHI_FEED").unwrap_or_else(|_| "feeds/kalshi.json".to_string())
        }
        Venue::Polymarket => {
            std::env::var("POLY_FEED").unwrap_or_else(|_| "feeds/polymarket.json".to_string())
        }
    }
}

/// Optional USD FX rate for a venue's quote currency. Absent means non-USD
/// markets from that venue stay unconverted and are excluded from matching.
pub fn fx_rate(venue: Venue) -> Option<f64> {
    let key = match venue {
        Venue::Kalshi => "KALSHI_FX_RATE",
        Venue::Polymarket => "POLY_FX_RATE",
    };
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_config_defaults() {
        let cfg = MatchConfig::default();
        assert!((cfg.min_score - DEFAULT_MIN_SCORE).abs() < 1e-9);
        assert!((cfg.category_bonus - DEFAULT_CATEGORY_BONUS).abs() < 1e-9);
        assert!((cfg.numeric_bonus - DEFAULT_NUMERIC_BONUS).abs() < 1e-9);
    }

    #[test]
    fn test_match_config_builder() {
        let cfg = MatchConfig::default()
            .with_min_score(0.75)
            .with_category_bonus(0.05)
            .with_numeric_bonus(0.2);
        assert!((cfg.min_score - 0.75).abs() < 1e-9);
        assert!((cfg.category_bonus - 0.05).abs() < 1e-9);
        assert!((cfg.numeric_bonus - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_spread_config_tiers() {
        let cfg = SpreadConfig::default().with_tiers(0.02, 0.05);
        assert!((cfg.marginal - 0.02).abs() < 1e-9);
        assert!((cfg.actionable - 0.05).abs() < 1e-9);
    }
}
