//! Canonicalization of raw venue listings into a comparable common shape.
//!
//! Normalization is a total function: malformed or missing optional fields
//! degrade to empty/default values, never to an error. Canonical titles and
//! token sets are deterministic pure functions of the raw title, so
//! re-normalizing identical input always yields identical output.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::types::{Category, NormalizedMarket, RawMarket};

/// Fixed stop-word list applied during canonicalization. Sorted so membership
/// is a binary search.
const STOP_WORDS: &[&str] = &[
    "a", "all", "an", "and", "are", "at", "be", "been", "being", "both", "but", "by", "can",
    "could", "did", "do", "does", "each", "else", "event", "every", "few", "for", "from", "had",
    "happen", "has", "have", "he", "how", "i", "if", "in", "is", "it", "its", "just", "may",
    "might", "more", "most", "must", "no", "nor", "not", "occur", "of", "on", "only", "or",
    "other", "ought", "own", "same", "shall", "she", "should", "so", "some", "such", "than",
    "that", "the", "then", "these", "they", "this", "those", "to", "too", "very", "was", "we",
    "were", "what", "when", "where", "which", "who", "whom", "why", "will", "would", "you",
];

static RE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    // Digits with optional thousands commas, decimal part, and "k" multiplier
    Regex::new(r"(\d[\d,]*(?:\.\d+)?)([kK])?").unwrap()
});

#[inline]
fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// Lower-case, strip punctuation, drop stop words, collapse whitespace.
pub fn canonical_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut out = String::with_capacity(cleaned.len());
    for word in cleaned.split_whitespace() {
        if is_stop_word(word) {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Token set of the canonical title, duplicates collapsed
pub fn title_tokens(title: &str) -> BTreeSet<String> {
    canonical_title(title)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Extract numeric thresholds (dates, price levels) from a raw title.
///
/// Handles "$100,000", "100k", "0.40" and plain integers. Returns a sorted,
/// deduplicated list; an empty list means "no extractable numbers" and never
/// penalizes matching.
pub fn numeric_values(title: &str) -> Vec<f64> {
    let mut values: Vec<f64> = RE_NUMBER
        .captures_iter(title)
        .filter_map(|caps| {
            let digits = caps.get(1)?.as_str().replace(',', "");
            let value: f64 = digits.parse().ok()?;
            Some(if caps.get(2).is_some() { value * 1000.0 } else { value })
        })
        .collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    values.dedup();
    values
}

/// Map a venue-native category/tag onto the fixed cross-venue taxonomy.
/// Absent or unrecognized tags land in `Uncategorized`.
pub fn category_bucket(tag: Option<&str>) -> Category {
    let tag = match tag {
        Some(t) if !t.trim().is_empty() => t.to_lowercase(),
        _ => return Category::Uncategorized,
    };

    if tag.contains("politic") || tag.contains("election") || tag.contains("government") {
        Category::Politics
    } else if tag.contains("crypto") || tag.contains("bitcoin") || tag.contains("btc") {
        Category::Crypto
    } else if tag.contains("sport")
        || tag.contains("nba")
        || tag.contains("nfl")
        || tag.contains("soccer")
        || tag.contains("baseball")
    {
        Category::Sports
    } else if tag.contains("finan") || tag.contains("econom") || tag.contains("rates") {
        Category::Finance
    } else if tag.contains("weather") || tag.contains("temperature") {
        Category::Weather
    } else if tag.contains("science") || tag.contains("tech") || tag.contains("space") {
        Category::Science
    } else if tag.contains("entertain") || tag.contains("culture") || tag.contains("awards") {
        Category::Entertainment
    } else {
        Category::Uncategorized
    }
}

/// Canonicalize a raw venue listing.
///
/// Quotes from non-USD venues are converted into USD with the supplied FX
/// rate. Without a rate the prices stay in the native currency and the market
/// is flagged `fx_missing`, which excludes it from matching and signals
/// downstream rather than comparing prices in different units.
pub fn normalize(raw: &RawMarket, fx: Option<f64>) -> NormalizedMarket {
    let (bid, ask, fx_missing) = convert_quotes(raw.bid, raw.ask, &raw.currency, fx);

    NormalizedMarket {
        venue: raw.venue,
        native_id: raw.native_id.as_str().into(),
        canonical_title: canonical_title(&raw.title),
        tokens: title_tokens(&raw.title),
        numbers: numeric_values(&raw.title),
        category: category_bucket(raw.category.as_deref()),
        bid,
        ask,
        currency: raw.currency.as_str().into(),
        fx_missing,
        volume: raw.volume.max(0),
        updated_at: raw.updated_at,
    }
}

/// USD passes through; non-USD converts when a rate is available
pub(crate) fn convert_quotes(
    bid: f64,
    ask: f64,
    currency: &str,
    fx: Option<f64>,
) -> (f64, f64, bool) {
    if currency.eq_ignore_ascii_case("USD") {
        return (sanitize(bid), sanitize(ask), false);
    }
    match fx {
        Some(rate) if rate > 0.0 => (sanitize(bid) * rate, sanitize(ask) * rate, false),
        _ => (sanitize(bid), sanitize(ask), true),
    }
}

/// Negative or non-finite quotes degrade to the no-price sentinel
#[inline]
fn sanitize(price: f64) -> f64 {
    if price.is_finite() && price > 0.0 {
        price
    } else {
        crate::types::NO_PRICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Venue;

    fn raw(title: &str) -> RawMarket {
        RawMarket {
            venue: Venue::Kalshi,
            native_id: "K1".to_string(),
            title: title.to_string(),
            category: None,
            bid: 0.40,
            ask: 0.42,
            currency: "USD".to_string(),
            volume: 100,
            updated_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_stop_words_sorted() {
        // Binary-search membership relies on this
        assert!(STOP_WORDS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_canonical_title_basic() {
        assert_eq!(
            canonical_title("Will the Fed cut rates by March 2025?"),
            "fed cut rates march 2025"
        );
        assert_eq!(
            canonical_title("Fed cuts rates before March 2025"),
            "fed cuts rates before march 2025"
        );
    }

    #[test]
    fn test_canonical_title_punctuation_and_whitespace() {
        assert_eq!(
            canonical_title("  Bitcoin   above $100,000 --- by  year-end!? "),
            "bitcoin above 100 000 year end"
        );
        assert_eq!(canonical_title(""), "");
        assert_eq!(canonical_title("the a an will"), "");
    }

    #[test]
    fn test_title_tokens_collapse_duplicates() {
        let tokens = title_tokens("rain rain go away, rain!");
        assert_eq!(tokens.len(), 3);
        assert!(tokens.contains("rain"));
        assert!(tokens.contains("go"));
        assert!(tokens.contains("away"));
    }

    #[test]
    fn test_fed_titles_overlap() {
        let a = title_tokens("Will the Fed cut rates by March 2025?");
        let b = title_tokens("Fed cuts rates before March 2025");
        let overlap: Vec<_> = a.intersection(&b).collect();
        // fed, rates, march, 2025
        assert_eq!(overlap.len(), 4);
    }

    #[test]
    fn test_numeric_values_extraction() {
        assert_eq!(numeric_values("Fed cuts rates before March 2025"), vec![2025.0]);
        assert_eq!(numeric_values("Bitcoin above $100,000?"), vec![100_000.0]);
        assert_eq!(numeric_values("BTC above 100k by June"), vec![100_000.0]);
        assert_eq!(numeric_values("Will it rain tomorrow?"), Vec::<f64>::new());
        // Sorted and deduplicated
        assert_eq!(
            numeric_values("From 95000 to 90,000 and back to 95k"),
            vec![90_000.0, 95_000.0]
        );
    }

    #[test]
    fn test_category_bucket_mapping() {
        assert_eq!(category_bucket(Some("Financial")), Category::Finance);
        assert_eq!(category_bucket(Some("Economics")), Category::Finance);
        assert_eq!(category_bucket(Some("US Politics")), Category::Politics);
        assert_eq!(category_bucket(Some("crypto-prices")), Category::Crypto);
        assert_eq!(category_bucket(Some("NBA")), Category::Sports);
        assert_eq!(category_bucket(Some("")), Category::Uncategorized);
        assert_eq!(category_bucket(Some("misc")), Category::Uncategorized);
        assert_eq!(category_bucket(None), Category::Uncategorized);
    }

    #[test]
    fn test_normalize_idempotent_and_deterministic() {
        let r = raw("Will the Fed cut rates by March 2025?");
        let a = normalize(&r, None);
        let b = normalize(&r, None);
        assert_eq!(a, b);

        // Byte-identical serialized form
        let ja = serde_json::to_string(&a).unwrap();
        let jb = serde_json::to_string(&b).unwrap();
        assert_eq!(ja, jb);
    }

    #[test]
    fn test_normalize_usd_passthrough() {
        let r = raw("Fed cuts rates");
        let m = normalize(&r, None);
        assert!((m.bid - 0.40).abs() < 1e-9);
        assert!((m.ask - 0.42).abs() < 1e-9);
        assert!(!m.fx_missing);
        assert!(m.comparable());
    }

    #[test]
    fn test_normalize_fx_conversion() {
        let mut r = raw("Fed cuts rates");
        r.currency = "EUR".to_string();
        let m = normalize(&r, Some(1.10));
        assert!((m.bid - 0.44).abs() < 1e-9);
        assert!((m.ask - 0.462).abs() < 1e-9);
        assert!(!m.fx_missing);
    }

    #[test]
    fn test_normalize_fx_missing_flagged() {
        let mut r = raw("Fed cuts rates");
        r.currency = "EUR".to_string();
        let m = normalize(&r, None);
        // Prices left native, market marked non-comparable
        assert!((m.bid - 0.40).abs() < 1e-9);
        assert!(m.fx_missing);
        assert!(!m.comparable());
    }

    #[test]
    fn test_normalize_degrades_bad_quotes() {
        let mut r = raw("Fed cuts rates");
        r.bid = -1.0;
        r.ask = f64::NAN;
        r.volume = -5;
        let m = normalize(&r, None);
        assert_eq!(m.bid, crate::types::NO_PRICE);
        assert_eq!(m.ask, crate::types::NO_PRICE);
        assert_eq!(m.volume, 0);
        assert!(!m.has_quotes());
    }
}
