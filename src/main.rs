//! Cross-venue prediction market scanner.
//!
//! Pairs markets across Kalshi and Polymarket that represent the same
//! real-world event and continuously derives the tradable price spread
//! between the two legs of each pair.
//!
//! ## Architecture
//!
//! - **Normalizer** canonicalizes raw venue listings into a comparable shape
//! - **Matcher** scores cross-venue title similarity and selects one-to-one
//!   best matches with a deterministic greedy assignment
//! - **Spread calculator** derives the directional spread and strength tier
//!   for every matched pair
//! - **Aggregate store** holds the current state behind an atomic-replace,
//!   snapshot-read contract
//!
//! Venue adapters are external collaborators: each one writes a JSON
//! snapshot file that a feeder task here polls and ingests wholesale. A
//! venue that stops writing simply goes stale without affecting the other.

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use arb_scanner::config;
use arb_scanner::{
    AggregateStore, MatchConfig, RawMarket, SpreadConfig, SpreadDirection, Strength, Venue,
};

/// Poll one venue's snapshot file and ingest it on every refresh tick.
///
/// A missing or malformed file leaves the venue's previous snapshot current:
/// graceful staleness, not failure.
async fn feed_task(
    store: Arc<AggregateStore>,
    venue: Venue,
    path: String,
    fx: Option<f64>,
    refresh_secs: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(refresh_secs));
    loop {
        interval.tick().await;

        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) => {
                warn!("[{}] feed unavailable ({}): {}", venue, path, e);
                continue;
            }
        };

        match serde_json::from_str::<Vec<RawMarket>>(&data) {
            Ok(raw) => {
                let count = raw.len();
                store.replace_venue_snapshot(venue, raw, fx);
                tracing::debug!("[{}] snapshot ingested: {} markets", venue, count);
            }
            Err(e) => warn!("[{}] malformed snapshot in {}: {}", venue, path, e),
        }
    }
}

/// Periodic status line plus a report of the best current opportunity
async fn heartbeat_task(store: Arc<AggregateStore>, secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(secs));
    loop {
        interval.tick().await;

        let stats = store.stats();
        let now = chrono::Local::now().format("%H:%M:%S");
        print!(
            "\r[{}] 💓 K:{} P:{} | pairs:{} actionable:{}    ",
            now,
            stats.kalshi_markets,
            stats.poly_markets,
            stats.matched_pairs,
            stats.actionable_signals
        );
        let _ = std::io::stdout().flush();

        let best = store
            .current_signals()
            .into_iter()
            .find(|s| s.direction != SpreadDirection::None);
        if let Some(best) = best {
            if best.strength >= Strength::Marginal {
                println!(); // Move off the status line before logging
                info!(
                    "📊 Best opportunity: pair {:016x} | {} | spread {:+.3} ({}) | [K bid={:.2} ask={:.2} | P bid={:.2} ask={:.2}]",
                    best.pair_id,
                    best.direction,
                    best.spread,
                    best.strength,
                    best.kalshi_bid,
                    best.kalshi_ask,
                    best.poly_bid,
                    best.poly_ask,
                );
            }
        }
    }
}

/// Optional timer mirroring the UI's manual refresh control
async fn recompute_task(store: Arc<AggregateStore>, interval_secs: u64) {
    if interval_secs == 0 {
        info!("[RECOMPUTE] Periodic forced recompute disabled (FORCE_RECOMPUTE_SECS=0)");
        return;
    }
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // Skip immediate first tick
    loop {
        interval.tick().await;
        store.force_recompute();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("arb_scanner=info".parse().unwrap()),
        )
        .init();

    dotenvy::dotenv().ok();

    let match_cfg = MatchConfig::from_env();
    let spread_cfg = SpreadConfig::from_env();

    info!("🚀 Cross-Venue Spread Scanner");
    info!(
        "   Match threshold: {:.2} (category bonus {:.2}, numeric bonus {:.2})",
        match_cfg.min_score, match_cfg.category_bonus, match_cfg.numeric_bonus
    );
    info!(
        "   Strength tiers: marginal ≥{:.3} | actionable ≥{:.3}",
        spread_cfg.marginal, spread_cfg.actionable
    );

    let store = Arc::new(AggregateStore::new(match_cfg, spread_cfg));

    let refresh = config::refresh_secs();
    let mut handles = Vec::new();
    for venue in [Venue::Kalshi, Venue::Polymarket] {
        let path = config::feed_path(venue);
        let fx = config::fx_rate(venue);
        info!(
            "[{}] feed: {} (refresh {}s{})",
            venue,
            path,
            refresh,
            fx.map(|r| format!(", fx rate {r}")).unwrap_or_default()
        );
        handles.push(tokio::spawn(feed_task(
            store.clone(),
            venue,
            path,
            fx,
            refresh,
        )));
    }

    handles.push(tokio::spawn(heartbeat_task(
        store.clone(),
        config::heartbeat_secs(),
    )));

    let recompute_secs = std::env::var("FORCE_RECOMPUTE_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    handles.push(tokio::spawn(recompute_task(store.clone(), recompute_secs)));

    info!("✅ Scanner running - entering main event loop");
    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}
