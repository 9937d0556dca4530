//! Recall-oriented query expansion.
//!
//! The expanded text is only ever used for index search. Reranking, reading
//! and answer text all see the original query.

use crate::rag::classify::IntentFlags;
use std::collections::BTreeSet;

const RAINFED_TERMS: &[&str] = &["rainfed", "rain-fed", "rain fed"];
const CROP_TERMS: &[&str] = &["rabi", "winter", "wheat", "mustard", "barley", "pea", "lentil"];
const YIELD_TERMS: &[&str] = &["yield", "increase", "q/ha", "t/ha", "%"];
const APPLE_TERMS: &[&str] = &["apple", "temperature", "rainfall", "chill"];

/// Append domain terms for the set flags, plus `region` if the query lacks it.
///
/// Extra terms are deduplicated and sorted, so the result depends only on
/// the query, the flags and the region.
pub fn expand(query: &str, flags: &IntentFlags, region: &str) -> String {
    let mut extras: BTreeSet<&str> = BTreeSet::new();

    for (set, terms) in [
        (flags.mentions_rainfed, RAINFED_TERMS),
        (flags.asks_crops, CROP_TERMS),
        (flags.asks_yield, YIELD_TERMS),
        (flags.asks_apple, APPLE_TERMS),
    ] {
        if set {
            extras.extend(terms.iter().copied());
        }
    }

    let region = region.trim();
    if !region.is_empty() && !query.to_lowercase().contains(&region.to_lowercase()) {
        extras.insert(region);
    }

    if extras.is_empty() {
        return query.to_string();
    }

    let extras: Vec<&str> = extras.into_iter().collect();
    format!("{} {}", query, extras.join(" "))
}
