//! Spread computation for matched pairs.
//!
//! For a matched pair the tradable spread in a direction is `bid - ask` in
//! the common USD unit: buy at one venue's ask, sell at the other venue's
//! bid. A positive spread on either direction indicates a profitable
//! cross-venue round trip before fees. Computation is pure and cheap; it is
//! re-run on every quote update for the affected pair.

use crate::config::SpreadConfig;
use crate::types::{ArbitrageSignal, MatchedPair, NormalizedMarket, SpreadDirection, Strength};

/// Compute the arbitrage signal for a matched pair from its current quotes.
///
/// Reports the direction with the larger positive spread, or
/// `SpreadDirection::None` when both directions are non-positive. Pairs with
/// a currency-incomparable side or without the quotes a direction needs
/// produce a `None` signal rather than a wrong one.
pub fn compute_signal(
    pair: &MatchedPair,
    kalshi: &NormalizedMarket,
    poly: &NormalizedMarket,
    cfg: &SpreadConfig,
) -> ArbitrageSignal {
    let quoted_at = kalshi.updated_at.max(poly.updated_at);

    let mut signal = ArbitrageSignal {
        pair_id: pair.pair_id,
        kalshi_bid: kalshi.bid,
        kalshi_ask: kalshi.ask,
        poly_bid: poly.bid,
        poly_ask: poly.ask,
        spread: 0.0,
        direction: SpreadDirection::None,
        strength: Strength::None,
        quoted_at,
    };

    if !kalshi.comparable() || !poly.comparable() {
        return signal;
    }

    // Buy Kalshi at the ask, sell Polymarket at the bid (and the reverse)
    let buy_kalshi = directional_spread(poly.bid, kalshi.ask);
    let buy_poly = directional_spread(kalshi.bid, poly.ask);

    let (spread, direction) = match (buy_kalshi, buy_poly) {
        (Some(k), Some(p)) if k >= p => (k, SpreadDirection::BuyKalshiSellPoly),
        (Some(_), Some(p)) => (p, SpreadDirection::BuyPolySellKalshi),
        (Some(k), None) => (k, SpreadDirection::BuyKalshiSellPoly),
        (None, Some(p)) => (p, SpreadDirection::BuyPolySellKalshi),
        (None, None) => return signal,
    };

    signal.spread = spread;
    if spread > 0.0 {
        signal.direction = direction;
        signal.strength = classify(spread, cfg);
    }
    signal
}

/// `sell_bid - buy_ask`, defined only when both sides are quoted
#[inline]
fn directional_spread(sell_bid: f64, buy_ask: f64) -> Option<f64> {
    if sell_bid > 0.0 && buy_ask > 0.0 {
        Some(sell_bid - buy_ask)
    } else {
        None
    }
}

/// Band a positive spread into the configured strength tiers
fn classify(spread: f64, cfg: &SpreadConfig) -> Strength {
    if spread >= cfg.actionable {
        Strength::Actionable
    } else if spread >= cfg.marginal {
        Strength::Marginal
    } else {
        Strength::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Venue};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn market(venue: Venue, bid: f64, ask: f64) -> NormalizedMarket {
        NormalizedMarket {
            venue,
            native_id: match venue {
                Venue::Kalshi => "K1".into(),
                Venue::Polymarket => "p1".into(),
            },
            canonical_title: String::new(),
            tokens: BTreeSet::new(),
            numbers: vec![],
            category: Category::Uncategorized,
            bid,
            ask,
            currency: "USD".into(),
            fx_missing: false,
            volume: 0,
            updated_at: 1_700_000_000,
        }
    }

    fn pair() -> MatchedPair {
        MatchedPair {
            pair_id: MatchedPair::id_for("K1", "p1"),
            kalshi_id: Arc::from("K1"),
            poly_id: Arc::from("p1"),
            score: 0.9,
            category_match: true,
            matched_at: 0,
        }
    }

    #[test]
    fn test_spread_sign_convention_buy_kalshi() {
        // Kalshi ask 0.40, Polymarket bid 0.55 -> buy Kalshi / sell Poly, 0.15
        let kalshi = market(Venue::Kalshi, 0.38, 0.40);
        let poly = market(Venue::Polymarket, 0.55, 0.57);

        let sig = compute_signal(&pair(), &kalshi, &poly, &SpreadConfig::default());
        assert_eq!(sig.direction, SpreadDirection::BuyKalshiSellPoly);
        assert!((sig.spread - 0.15).abs() < 1e-9);
        assert!(sig.is_actionable());
    }

    #[test]
    fn test_spread_sign_convention_none() {
        // Kalshi ask 0.60, Polymarket bid 0.55 -> both directions non-positive
        let kalshi = market(Venue::Kalshi, 0.58, 0.60);
        let poly = market(Venue::Polymarket, 0.55, 0.57);

        let sig = compute_signal(&pair(), &kalshi, &poly, &SpreadConfig::default());
        assert_eq!(sig.direction, SpreadDirection::None);
        assert_eq!(sig.strength, Strength::None);
        assert!(sig.spread <= 0.0);
    }

    #[test]
    fn test_reverse_direction() {
        // Polymarket ask 0.45, Kalshi bid 0.53 -> buy Poly / sell Kalshi, 0.08
        let kalshi = market(Venue::Kalshi, 0.53, 0.55);
        let poly = market(Venue::Polymarket, 0.43, 0.45);

        let sig = compute_signal(&pair(), &kalshi, &poly, &SpreadConfig::default());
        assert_eq!(sig.direction, SpreadDirection::BuyPolySellKalshi);
        assert!((sig.spread - 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_larger_direction_wins() {
        // Wide quotes in both directions; report the better round trip
        let kalshi = market(Venue::Kalshi, 0.70, 0.30);
        let poly = market(Venue::Polymarket, 0.50, 0.50);

        let sig = compute_signal(&pair(), &kalshi, &poly, &SpreadConfig::default());
        // buy kalshi: 0.50 - 0.30 = 0.20; buy poly: 0.70 - 0.50 = 0.20 -> tie
        // prefers the kalshi-buy direction
        assert_eq!(sig.direction, SpreadDirection::BuyKalshiSellPoly);
        assert!((sig.spread - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_strength_tiers_parametrized() {
        // Tier thresholds are operator configuration, not domain truths
        let cases = [
            (SpreadConfig::default().with_tiers(0.01, 0.03), 0.02, Strength::Marginal),
            (SpreadConfig::default().with_tiers(0.01, 0.03), 0.05, Strength::Actionable),
            (SpreadConfig::default().with_tiers(0.05, 0.10), 0.02, Strength::None),
            (SpreadConfig::default().with_tiers(0.005, 0.50), 0.02, Strength::Marginal),
        ];

        for (cfg, spread, expected) in cases {
            let kalshi = market(Venue::Kalshi, 0.40, 0.40);
            let poly = market(Venue::Polymarket, 0.40 + spread, 0.90);

            let sig = compute_signal(&pair(), &kalshi, &poly, &cfg);
            assert_eq!(sig.strength, expected, "spread {spread} under {cfg:?}");
        }
    }

    #[test]
    fn test_missing_quote_side_skips_direction() {
        // No poly bid: the kalshi-buy direction is incomputable, the other
        // direction still is
        let kalshi = market(Venue::Kalshi, 0.53, 0.55);
        let mut poly = market(Venue::Polymarket, 0.0, 0.45);
        poly.bid = crate::types::NO_PRICE;

        let sig = compute_signal(&pair(), &kalshi, &poly, &SpreadConfig::default());
        assert_eq!(sig.direction, SpreadDirection::BuyPolySellKalshi);
        assert!((sig.spread - 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_no_quotes_yields_none() {
        let kalshi = market(Venue::Kalshi, 0.0, 0.0);
        let poly = market(Venue::Polymarket, 0.0, 0.0);

        let sig = compute_signal(&pair(), &kalshi, &poly, &SpreadConfig::default());
        assert_eq!(sig.direction, SpreadDirection::None);
        assert_eq!(sig.spread, 0.0);
    }

    #[test]
    fn test_fx_missing_side_yields_none() {
        let kalshi = market(Venue::Kalshi, 0.38, 0.40);
        let mut poly = market(Venue::Polymarket, 0.55, 0.57);
        poly.fx_missing = true;

        let sig = compute_signal(&pair(), &kalshi, &poly, &SpreadConfig::default());
        assert_eq!(sig.direction, SpreadDirection::None);
        assert_eq!(sig.strength, Strength::None);
    }

    #[test]
    fn test_quoted_at_is_newest_quote() {
        let mut kalshi = market(Venue::Kalshi, 0.38, 0.40);
        let mut poly = market(Venue::Polymarket, 0.55, 0.57);
        kalshi.updated_at = 100;
        poly.updated_at = 200;

        let sig = compute_signal(&pair(), &kalshi, &poly, &SpreadConfig::default());
        assert_eq!(sig.quoted_at, 200);
    }
}
