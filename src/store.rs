//! Aggregate store: the single source of truth for what is currently known.
//!
//! Feeders replace whole venue snapshots; every replacement re-normalizes,
//! re-matches, and re-computes signals before the new state becomes visible,
//! so a reader never observes normalized data without correspondingly
//! recomputed matches. Updates from either venue are serialized behind one
//! update lock; readers take a snapshot copy and never block writers.

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{MatchConfig, SpreadConfig};
use crate::matcher::Matcher;
use crate::normalize::{self, normalize};
use crate::spread::compute_signal;
use crate::types::{
    current_unix_secs, ArbitrageSignal, MatchedPair, NormalizedMarket, RawMarket, Venue,
};

type MarketTable = FxHashMap<Arc<str>, NormalizedMarket>;

/// Published state, swapped atomically under the write lock
#[derive(Debug, Default)]
struct StoreState {
    kalshi: MarketTable,
    poly: MarketTable,
    /// Last FX rate supplied with each venue's snapshot, re-applied to live
    /// quote updates for non-USD markets
    kalshi_fx: Option<f64>,
    poly_fx: Option<f64>,
    pairs: Vec<MatchedPair>,
    signals: Vec<ArbitrageSignal>,
    published_at: u64,
}

impl StoreState {
    fn table(&self, venue: Venue) -> &MarketTable {
        match venue {
            Venue::Kalshi => &self.kalshi,
            Venue::Polymarket => &self.poly,
        }
    }

    fn fx(&self, venue: Venue) -> Option<f64> {
        match venue {
            Venue::Kalshi => self.kalshi_fx,
            Venue::Polymarket => self.poly_fx,
        }
    }
}

/// Point-in-time counters for the display layer
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreStats {
    pub kalshi_markets: usize,
    pub poly_markets: usize,
    pub matched_pairs: usize,
    pub actionable_signals: usize,
    pub published_at: u64,
}

/// In-memory aggregate of both venues' current markets plus the derived
/// match set and signals
pub struct AggregateStore {
    state: RwLock<StoreState>,
    /// Serializes apply-snapshot -> rematch -> recompute -> publish cycles
    update_lock: Mutex<()>,
    matcher: Matcher,
    spread_cfg: SpreadConfig,
}

impl AggregateStore {
    pub fn new(match_cfg: MatchConfig, spread_cfg: SpreadConfig) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            update_lock: Mutex::new(()),
            matcher: Matcher::new(match_cfg),
            spread_cfg,
        }
    }

    /// Atomically replace a venue's market table with a fresh snapshot.
    ///
    /// The previous table is discarded, not merged: refresh is a full
    /// replace. Matching and signal computation run against the new combined
    /// state before publication, and concurrent readers only ever see the
    /// old or the new fully-consistent state.
    pub fn replace_venue_snapshot(&self, venue: Venue, raw: Vec<RawMarket>, fx: Option<f64>) {
        let _guard = self.update_lock.lock();
        let now = current_unix_secs();

        let mut table = MarketTable::default();
        for r in &raw {
            let m = normalize(r, fx);
            // Duplicate native ids within one snapshot: last record wins
            table.insert(m.native_id.clone(), m);
        }

        let (kalshi_v, poly_v, prev_pairs) = {
            let st = self.state.read();
            let other = match venue {
                Venue::Kalshi => &st.poly,
                Venue::Polymarket => &st.kalshi,
            };
            let own: Vec<NormalizedMarket> = table.values().cloned().collect();
            let other: Vec<NormalizedMarket> = other.values().cloned().collect();
            let pairs = st.pairs.clone();
            match venue {
                Venue::Kalshi => (own, other, pairs),
                Venue::Polymarket => (other, own, pairs),
            }
        };

        let (pairs, signals) = self.recompute(&kalshi_v, &poly_v, &prev_pairs, now);

        let mut st = self.state.write();
        match venue {
            Venue::Kalshi => {
                st.kalshi = table;
                st.kalshi_fx = fx;
            }
            Venue::Polymarket => {
                st.poly = table;
                st.poly_fx = fx;
            }
        }
        st.pairs = pairs;
        st.signals = signals;
        st.published_at = now;
        debug!(
            venue = %venue,
            markets = raw.len(),
            pairs = st.pairs.len(),
            "snapshot published"
        );
    }

    /// Apply a live quote update to a single market and recompute the signal
    /// of the pair it belongs to, if any. Returns false for unknown ids.
    pub fn update_quote(
        &self,
        venue: Venue,
        native_id: &str,
        bid: f64,
        ask: f64,
        volume: i64,
        updated_at: u64,
    ) -> bool {
        let _guard = self.update_lock.lock();
        let mut guard = self.state.write();
        let st = &mut *guard;

        let fx = st.fx(venue);
        let table = match venue {
            Venue::Kalshi => &mut st.kalshi,
            Venue::Polymarket => &mut st.poly,
        };
        let Some(market) = table.get_mut(native_id) else {
            return false;
        };

        let (bid, ask, fx_missing) = normalize::convert_quotes(bid, ask, &market.currency, fx);
        market.bid = bid;
        market.ask = ask;
        market.fx_missing = fx_missing;
        market.volume = volume.max(0);
        market.updated_at = updated_at;

        // Signals stay consistent with the latest quotes held for the pair
        let recomputed: Option<ArbitrageSignal> = st
            .pairs
            .iter()
            .find(|pair| match venue {
                Venue::Kalshi => &*pair.kalshi_id == native_id,
                Venue::Polymarket => &*pair.poly_id == native_id,
            })
            .and_then(|pair| {
                let k = st.kalshi.get(&pair.kalshi_id)?;
                let p = st.poly.get(&pair.poly_id)?;
                Some(compute_signal(pair, k, p, &self.spread_cfg))
            });
        if let Some(signal) = recomputed {
            if let Some(slot) = st.signals.iter_mut().find(|s| s.pair_id == signal.pair_id) {
                *slot = signal;
            }
            rank_signals(&mut st.signals);
        }
        true
    }

    /// Manual rematch + resignal over the currently held tables (the UI's
    /// refresh control)
    pub fn force_recompute(&self) {
        let _guard = self.update_lock.lock();
        let now = current_unix_secs();

        let (kalshi_v, poly_v, prev_pairs) = {
            let st = self.state.read();
            (
                st.kalshi.values().cloned().collect::<Vec<_>>(),
                st.poly.values().cloned().collect::<Vec<_>>(),
                st.pairs.clone(),
            )
        };
        let (pairs, signals) = self.recompute(&kalshi_v, &poly_v, &prev_pairs, now);

        let mut st = self.state.write();
        st.pairs = pairs;
        st.signals = signals;
        st.published_at = now;
        info!(pairs = st.pairs.len(), "forced recompute complete");
    }

    fn recompute(
        &self,
        kalshi: &[NormalizedMarket],
        poly: &[NormalizedMarket],
        prev_pairs: &[MatchedPair],
        now: u64,
    ) -> (Vec<MatchedPair>, Vec<ArbitrageSignal>) {
        let mut pairs = self.matcher.match_markets(kalshi, poly, now);

        // A pair that persists across cycles keeps its original formation
        // timestamp; only its recomputed membership is fresh
        let prev_by_id: FxHashMap<u64, u64> =
            prev_pairs.iter().map(|p| (p.pair_id, p.matched_at)).collect();
        for pair in &mut pairs {
            if let Some(&formed) = prev_by_id.get(&pair.pair_id) {
                pair.matched_at = formed;
            }
        }

        let kalshi_by_id: FxHashMap<&str, &NormalizedMarket> =
            kalshi.iter().map(|m| (&*m.native_id, m)).collect();
        let poly_by_id: FxHashMap<&str, &NormalizedMarket> =
            poly.iter().map(|m| (&*m.native_id, m)).collect();

        let mut signals: Vec<ArbitrageSignal> = pairs
            .iter()
            .filter_map(|pair| {
                let k = kalshi_by_id.get(&*pair.kalshi_id)?;
                let p = poly_by_id.get(&*pair.poly_id)?;
                Some(compute_signal(pair, k, p, &self.spread_cfg))
            })
            .collect();
        rank_signals(&mut signals);

        (pairs, signals)
    }

    // === Snapshot reads ===

    /// Current accepted matches, as of the moment of the call
    pub fn current_matches(&self) -> Vec<MatchedPair> {
        self.state.read().pairs.clone()
    }

    /// Current signals, ranked best spread first
    pub fn current_signals(&self) -> Vec<ArbitrageSignal> {
        self.state.read().signals.clone()
    }

    /// Current normalized markets for one venue
    pub fn markets_for(&self, venue: Venue) -> Vec<NormalizedMarket> {
        let st = self.state.read();
        let mut markets: Vec<NormalizedMarket> = st.table(venue).values().cloned().collect();
        markets.sort_by(|a, b| a.native_id.cmp(&b.native_id));
        markets
    }

    /// Canonical-substring search across both venues' current markets
    pub fn search(&self, query: &str) -> Vec<NormalizedMarket> {
        let needle = normalize::canonical_title(query);
        if needle.is_empty() {
            return Vec::new();
        }
        let st = self.state.read();
        let mut hits: Vec<NormalizedMarket> = st
            .kalshi
            .values()
            .chain(st.poly.values())
            .filter(|m| m.canonical_title.contains(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            (a.venue as u8, &a.native_id).cmp(&(b.venue as u8, &b.native_id))
        });
        hits
    }

    pub fn stats(&self) -> StoreStats {
        let st = self.state.read();
        StoreStats {
            kalshi_markets: st.kalshi.len(),
            poly_markets: st.poly.len(),
            matched_pairs: st.pairs.len(),
            actionable_signals: st.signals.iter().filter(|s| s.is_actionable()).count(),
            published_at: st.published_at,
        }
    }
}

/// Best spread first; pair id breaks exact ties for reproducible output
fn rank_signals(signals: &mut [ArbitrageSignal]) {
    signals.sort_by(|a, b| {
        b.spread
            .partial_cmp(&a.spread)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.pair_id.cmp(&b.pair_id))
    });
}
