//! Cross-venue market matching.
//!
//! Pairs markets across Kalshi and Polymarket that represent the same
//! real-world event. Scoring is a pure function of the normalized records and
//! assignment is a greedy stable matching processed in descending score
//! order, so re-running on an unchanged input set reproduces the identical
//! pair set regardless of input ordering.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::config::MatchConfig;
use crate::types::{Category, MatchCandidate, MatchedPair, NormalizedMarket, Venue};

/// Matches equivalent markets across the two venues
#[derive(Debug, Default)]
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Score a single cross-venue pairing. Returns `None` when the pair is
    /// not eligible: wrong venues, currency-incomparable sides, or
    /// incompatible category buckets.
    pub fn score_pair(
        &self,
        kalshi: &NormalizedMarket,
        poly: &NormalizedMarket,
    ) -> Option<MatchCandidate> {
        if kalshi.venue != Venue::Kalshi || poly.venue != Venue::Polymarket {
            return None;
        }
        // Markets without a usable USD conversion are never comparable
        if !kalshi.comparable() || !poly.comparable() {
            return None;
        }
        if !buckets_compatible(kalshi.category, poly.category) {
            return None;
        }

        let category_match = kalshi.category != Category::Uncategorized
            && kalshi.category == poly.category;

        let mut score = jaccard(&kalshi.tokens, &poly.tokens);
        if category_match {
            score += self.config.category_bonus;
        }
        if numbers_agree(&kalshi.numbers, &poly.numbers) {
            score += self.config.numeric_bonus;
        }

        Some(MatchCandidate {
            kalshi_id: kalshi.native_id.clone(),
            poly_id: poly.native_id.clone(),
            score: score.clamp(0.0, 1.0),
            category_match,
        })
    }

    /// Generate all scored candidates at or above the configured minimum.
    ///
    /// Comparison cost is bounded by indexing the Polymarket side per
    /// category bucket: a categorized Kalshi market is only scored against
    /// same-bucket and uncategorized counterparts.
    pub fn candidates(
        &self,
        kalshi: &[NormalizedMarket],
        poly: &[NormalizedMarket],
    ) -> Vec<MatchCandidate> {
        let mut by_bucket: FxHashMap<Category, Vec<&NormalizedMarket>> = FxHashMap::default();
        for p in poly.iter().filter(|p| p.comparable()) {
            by_bucket.entry(p.category).or_default().push(p);
        }

        let mut out = Vec::new();
        for k in kalshi.iter().filter(|k| k.comparable()) {
            if k.category == Category::Uncategorized {
                // Uncategorized is compatible with every bucket
                for bucket in by_bucket.values() {
                    self.collect_candidates(k, bucket, &mut out);
                }
            } else {
                if let Some(bucket) = by_bucket.get(&k.category) {
                    self.collect_candidates(k, bucket, &mut out);
                }
                if let Some(bucket) = by_bucket.get(&Category::Uncategorized) {
                    self.collect_candidates(k, bucket, &mut out);
                }
            }
        }
        out
    }

    fn collect_candidates(
        &self,
        kalshi: &NormalizedMarket,
        poly: &[&NormalizedMarket],
        out: &mut Vec<MatchCandidate>,
    ) {
        for p in poly {
            if let Some(cand) = self.score_pair(kalshi, p) {
                if cand.score >= self.config.min_score {
                    out.push(cand);
                }
            }
        }
    }

    /// Greedy stable assignment over a candidate list.
    ///
    /// Candidates are processed in descending score order (ties broken by the
    /// lexicographic native-id pair); a pair is accepted only if neither side
    /// is already claimed. This yields a one-to-one mapping and is
    /// deterministic for any input ordering.
    pub fn select(&self, mut candidates: Vec<MatchCandidate>, now: u64) -> Vec<MatchedPair> {
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.kalshi_id.cmp(&b.kalshi_id))
                .then_with(|| a.poly_id.cmp(&b.poly_id))
        });

        let mut claimed_kalshi: BTreeSet<Arc<str>> = BTreeSet::new();
        let mut claimed_poly: BTreeSet<Arc<str>> = BTreeSet::new();
        let mut pairs = Vec::new();

        for cand in candidates {
            if claimed_kalshi.contains(&cand.kalshi_id) || claimed_poly.contains(&cand.poly_id) {
                continue;
            }
            claimed_kalshi.insert(cand.kalshi_id.clone());
            claimed_poly.insert(cand.poly_id.clone());
            pairs.push(MatchedPair {
                pair_id: MatchedPair::id_for(&cand.kalshi_id, &cand.poly_id),
                kalshi_id: cand.kalshi_id,
                poly_id: cand.poly_id,
                score: cand.score,
                category_match: cand.category_match,
                matched_at: now,
            });
        }
        pairs
    }

    /// Full matching pass: candidate generation + greedy assignment.
    ///
    /// A market with no candidate above threshold simply stays unmatched;
    /// that is a normal outcome, not an error.
    pub fn match_markets(
        &self,
        kalshi: &[NormalizedMarket],
        poly: &[NormalizedMarket],
        now: u64,
    ) -> Vec<MatchedPair> {
        let candidates = self.candidates(kalshi, poly);
        let pairs = self.select(candidates, now);
        debug!(
            kalshi_count = kalshi.len(),
            poly_count = poly.len(),
            pairs = pairs.len(),
            "matching pass complete"
        );
        pairs
    }
}

/// Token-set Jaccard similarity; empty-vs-empty is 0, not 1
fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Same bucket, or either side uncategorized
fn buckets_compatible(a: Category, b: Category) -> bool {
    a == b || a == Category::Uncategorized || b == Category::Uncategorized
}

/// Numeric bonus gate: both titles carry numbers and the extracted sorted
/// lists are exactly equal. Ambiguous or absent extraction yields no bonus
/// and no penalty.
fn numbers_agree(a: &[f64], b: &[f64]) -> bool {
    !a.is_empty() && a == b
}
