//! Intent flags for a free-text query.
//!
//! Each flag is an independent pattern match against the lowercased query.
//! Several flags may be set at once; synthesis routes on their conjunctions.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

macro_rules! intent_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

intent_pattern!(RE_CROPS, r"\b(rabi|winter).*(crop|crops)|which.*crop");
intent_pattern!(RE_RAINFED, r"rain[\- ]?fed");
intent_pattern!(RE_YIELD, r"yield|improv|increase|productiv");
intent_pattern!(RE_TREND, r"two decades|20 years|last 20|last two decades|over the last");
intent_pattern!(RE_TEMP, r"temperature|°c|celsius");
intent_pattern!(RE_RAIN, r"rainfall|mm|monthly|annual");
intent_pattern!(RE_SMALLHOLDERS, r"small landholder|smallholder|marginal|small holder");
intent_pattern!(RE_SCHEMES, r"scheme|program|nfs|nabard|pmksy|nfsm|rkv");
intent_pattern!(RE_ROLES, r"what role|role can|uses can");

fn matches(pattern: &LazyLock<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}

/// What kind of question was asked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntentFlags {
    pub asks_crops: bool,
    pub mentions_rainfed: bool,
    pub asks_yield: bool,
    pub asks_apple: bool,
    pub asks_trend: bool,
    pub asks_temp: bool,
    pub asks_rain: bool,
    pub asks_smallholders: bool,
    pub asks_schemes: bool,
    pub asks_roles: bool,
}

impl IntentFlags {
    /// Names of the flags that are set, in declaration order.
    pub fn active(&self) -> Vec<&'static str> {
        [
            ("asks_crops", self.asks_crops),
            ("mentions_rainfed", self.mentions_rainfed),
            ("asks_yield", self.asks_yield),
            ("asks_apple", self.asks_apple),
            ("asks_trend", self.asks_trend),
            ("asks_temp", self.asks_temp),
            ("asks_rain", self.asks_rain),
            ("asks_smallholders", self.asks_smallholders),
            ("asks_schemes", self.asks_schemes),
            ("asks_roles", self.asks_roles),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

/// Derive intent flags from a query. Pure and deterministic.
pub fn classify(query: &str) -> IntentFlags {
    let q = query.to_lowercase();

    IntentFlags {
        asks_crops: matches(&RE_CROPS, &q),
        mentions_rainfed: matches(&RE_RAINFED, &q),
        asks_yield: matches(&RE_YIELD, &q),
        asks_apple: q.contains("apple"),
        asks_trend: matches(&RE_TREND, &q),
        asks_temp: matches(&RE_TEMP, &q),
        asks_rain: matches(&RE_RAIN, &q),
        asks_smallholders: matches(&RE_SMALLHOLDERS, &q),
        asks_schemes: matches(&RE_SCHEMES, &q),
        asks_roles: matches(&RE_ROLES, &q),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        for pattern in [
            &RE_CROPS,
            &RE_RAINFED,
            &RE_YIELD,
            &RE_TREND,
            &RE_TEMP,
            &RE_RAIN,
            &RE_SMALLHOLDERS,
            &RE_SCHEMES,
            &RE_ROLES,
        ] {
            assert!(pattern.is_some());
        }
    }

    #[test]
    fn test_rainfed_crop_yield_query() {
        let flags = classify(
            "Which Rabi crops suit rainfed areas and what yield increase do improved seeds give?",
        );
        assert!(flags.asks_crops);
        assert!(flags.mentions_rainfed);
        assert!(flags.asks_yield);
        assert!(!flags.asks_apple);
        assert!(!flags.asks_roles);
    }

    #[test]
    fn test_apple_climate_query() {
        let flags = classify(
            "How have temperature and rainfall for apple orchards changed over the last two decades?",
        );
        assert!(flags.asks_apple);
        assert!(flags.asks_temp);
        assert!(flags.asks_rain);
        assert!(flags.asks_trend);
        assert!(!flags.asks_crops);
    }

    #[test]
    fn test_spelling_variants() {
        assert!(classify("rain-fed farming").mentions_rainfed);
        assert!(classify("Rain fed farming").mentions_rainfed);
        assert!(classify("Is 12 °C enough?").asks_temp);
        assert!(classify("What role can drones play?").asks_roles);
        assert!(classify("Winter crops for smallholder farms").asks_smallholders);
        assert!(classify("Which NABARD scheme helps?").asks_schemes);
    }

    #[test]
    fn test_no_flags() {
        let flags = classify("Tell me about soil.");
        assert_eq!(flags, IntentFlags::default());
        assert!(flags.active().is_empty());
    }

    #[test]
    fn test_active_names() {
        let flags = classify("What role can drones play in apple orchards?");
        assert_eq!(flags.active(), vec!["asks_apple", "asks_roles"]);
    }
}
