//! Cross-venue matching and spread-computation engine.
//!
//! This crate pairs prediction markets across Kalshi and Polymarket that
//! represent the same real-world event and derives a ranked, continuously
//! refreshed list of cross-venue spread opportunities. It is a pure
//! in-memory transformation stage: venue adapters push raw snapshots in,
//! the display layer reads consistent snapshots out.

pub mod config;
pub mod matcher;
pub mod normalize;
pub mod spread;
pub mod store;
pub mod types;

pub use config::{MatchConfig, SpreadConfig};
pub use matcher::Matcher;
pub use spread::compute_signal;
pub use store::{AggregateStore, StoreStats};
pub use types::{
    ArbitrageSignal, Category, MatchCandidate, MatchedPair, NormalizedMarket, RawMarket,
    SpreadDirection, Strength, Venue,
};
