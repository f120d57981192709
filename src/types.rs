//! Core type definitions for the cross-venue market scanner.
//!
//! This module provides the foundational types for raw and normalized market
//! records, cross-venue matches, and arbitrage signals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

// === Venues ===

/// One of the two monitored prediction-market venues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    Kalshi,
    Polymarket,
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Venue::Kalshi => write!(f, "KALSHI"),
            Venue::Polymarket => write!(f, "POLYMARKET"),
        }
    }
}

/// Sentinel for "no quote available on this side"
pub const NO_PRICE: f64 = 0.0;

/// Cross-venue category taxonomy; venue-native tags are mapped onto these
/// fixed buckets during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Politics,
    Sports,
    Finance,
    Crypto,
    Science,
    Entertainment,
    Weather,
    Uncategorized,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Politics => write!(f, "politics"),
            Category::Sports => write!(f, "sports"),
            Category::Finance => write!(f, "finance"),
            Category::Crypto => write!(f, "crypto"),
            Category::Science => write!(f, "science"),
            Category::Entertainment => write!(f, "entertainment"),
            Category::Weather => write!(f, "weather"),
            Category::Uncategorized => write!(f, "uncategorized"),
        }
    }
}

// === Market Records ===

/// A market listing as delivered by a venue adapter. Immutable once received;
/// superseded wholesale by the next snapshot, never mutated in place.
///
/// Optional fields default so that partially-populated adapter output still
/// deserializes; absent quotes land on the `NO_PRICE` sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMarket {
    pub venue: Venue,
    pub native_id: String,
    pub title: String,
    /// Venue-specific category/tag, if the venue supplies one
    #[serde(default)]
    pub category: Option<String>,
    /// Best bid in the venue's native quote currency
    #[serde(default)]
    pub bid: f64,
    /// Best ask in the venue's native quote currency
    #[serde(default)]
    pub ask: f64,
    /// ISO currency code of the venue's quotes
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub volume: i64,
    /// Unix seconds of the venue's last update for this market
    #[serde(default)]
    pub updated_at: u64,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Canonical form of a market, comparable across venues.
///
/// `canonical_title` and `tokens` are pure functions of the raw title;
/// re-normalizing identical input always yields identical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMarket {
    pub venue: Venue,
    pub native_id: Arc<str>,
    pub canonical_title: String,
    /// Token set from the canonical title (duplicates collapsed)
    pub tokens: BTreeSet<String>,
    /// Numeric thresholds extracted from the raw title, sorted
    pub numbers: Vec<f64>,
    pub category: Category,
    /// Best bid in USD when converted, native currency otherwise
    pub bid: f64,
    /// Best ask in USD when converted, native currency otherwise
    pub ask: f64,
    /// Native quote currency of the venue
    pub currency: Arc<str>,
    /// Set when the market is quoted in a non-USD currency and no FX rate was
    /// supplied; such markets are excluded from matching and signals.
    pub fx_missing: bool,
    pub volume: i64,
    pub updated_at: u64,
}

impl NormalizedMarket {
    /// Both sides quoted
    #[inline]
    pub fn has_quotes(&self) -> bool {
        self.bid > NO_PRICE && self.ask > NO_PRICE
    }

    /// Prices are in the common USD unit and safe to compare across venues
    #[inline]
    pub fn comparable(&self) -> bool {
        !self.fx_missing
    }
}

// === Matching ===

/// A scored cross-venue pairing prior to acceptance. Holds lookup keys only,
/// never ownership of the underlying market records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub kalshi_id: Arc<str>,
    pub poly_id: Arc<str>,
    /// Combined similarity in [0, 1]
    pub score: f64,
    /// Category buckets agreed (both categorized and equal)
    pub category_match: bool,
}

/// An accepted cross-venue match between one Kalshi and one Polymarket market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    /// Stable synthetic id, deterministic over the two native ids so the same
    /// true pair keeps the same id across refresh cycles
    pub pair_id: u64,
    pub kalshi_id: Arc<str>,
    pub poly_id: Arc<str>,
    pub score: f64,
    pub category_match: bool,
    /// Unix seconds when the pair was first formed
    pub matched_at: u64,
}

impl MatchedPair {
    /// Deterministic pair id for a (kalshi, polymarket) native-id pair
    pub fn id_for(kalshi_id: &str, poly_id: &str) -> u64 {
        fxhash_str(&format!("{}|{}", kalshi_id, poly_id))
    }
}

// === Signals ===

/// Which cross-venue round trip the spread refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadDirection {
    /// Buy on Kalshi at the ask, sell on Polymarket at the bid
    BuyKalshiSellPoly,
    /// Buy on Polymarket at the ask, sell on Kalshi at the bid
    BuyPolySellKalshi,
    /// Neither direction has a positive spread
    None,
}

impl std::fmt::Display for SpreadDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpreadDirection::BuyKalshiSellPoly => write!(f, "buy KALSHI / sell POLYMARKET"),
            SpreadDirection::BuyPolySellKalshi => write!(f, "buy POLYMARKET / sell KALSHI"),
            SpreadDirection::None => write!(f, "none"),
        }
    }
}

/// Opportunity strength, banded over the spread magnitude by configured
/// thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    None,
    Marginal,
    Actionable,
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strength::None => write!(f, "none"),
            Strength::Marginal => write!(f, "marginal"),
            Strength::Actionable => write!(f, "actionable"),
        }
    }
}

/// Computed cross-venue spread opportunity for a matched pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageSignal {
    pub pair_id: u64,
    pub kalshi_bid: f64,
    pub kalshi_ask: f64,
    pub poly_bid: f64,
    pub poly_ask: f64,
    /// Best directional spread in USD; positive means profitable before fees
    pub spread: f64,
    pub direction: SpreadDirection,
    pub strength: Strength,
    /// Timestamp of the newest quote the signal was derived from
    pub quoted_at: u64,
}

impl ArbitrageSignal {
    #[inline]
    pub fn is_actionable(&self) -> bool {
        self.strength == Strength::Actionable
    }
}

// === Helpers ===

/// Fast deterministic string hash used for stable pair ids
#[inline(always)]
pub fn fxhash_str(s: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = rustc_hash::FxHasher::default();
    s.hash(&mut hasher);
    hasher.finish()
}

pub fn current_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// =============================================================================
// TESTS
// =============================================================================
