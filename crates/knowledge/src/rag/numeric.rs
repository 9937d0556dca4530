//! Numeric evidence scanning.
//!
//! A registry of independent `(pattern, label rule)` entries is run over one
//! chunk of text. Every hit carries the exact text it matched and the first
//! sentence containing it, so any figure shown to a user can be traced back
//! to a verbatim source sentence.

use crate::rag::types::{NumericEvidence, NumericLabel};
use crate::text::split_sentences;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

macro_rules! numeric_pattern {
    ($name:ident, $regex_str:expr) => {
        pub static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

numeric_pattern!(RE_PERCENT, r"(\d{1,3}(?:\.\d+)?\s*%)");
numeric_pattern!(RE_NPK_COLON, r"\b\d{1,3}\s*:\s*\d{1,3}\s*:\s*\d{1,3}\b");
numeric_pattern!(
    RE_NPK_LETTERS,
    r"(?i)\bN\s*\d{1,3}[^.;!?]*?P[^.;!?]*?\d{1,3}[^.;!?]*?K[^.;!?]*?\d{1,3}"
);
numeric_pattern!(RE_TEMP_RANGE, r"(?i)(-?\d{1,2}\s*(?:to|-|–)\s*-?\d{1,2})\s*°?C");
numeric_pattern!(RE_TEMP_SINGLE, r"(?i)(-?\d{1,2})\s*°?C\b");
numeric_pattern!(RE_RAIN_RANGE, r"(?i)(\d{2,4}\s*(?:to|-|–)\s*\d{2,4})\s*mm");
numeric_pattern!(RE_RAIN_SINGLE, r"(?i)(\d{2,4})\s*mm(?:/yr|/year| per year)?");
numeric_pattern!(
    RE_YIELD_AMOUNT,
    r"(?i)(\d{1,4}(?:\.\d+)?\s*(?:q/ha|t/ha|q per ha|t per ha))"
);
numeric_pattern!(
    RE_YIELD_INCREASE,
    r"(?i)(increase(?:d)?\s*(?:by)?\s*(\d{1,3}(?:\.\d+)?\s*%))"
);

numeric_pattern!(RE_YIELD_TERMS, r"(?i)yield|increase|improv");
numeric_pattern!(RE_AREA_TERMS, r"(?i)area|coverage|percent|% of");

/// How a match is turned into a label.
#[derive(Debug, Clone, Copy)]
pub enum LabelRule {
    /// Always the same label.
    Fixed(NumericLabel),
    /// Percentages are qualified by what their sentence talks about.
    PercentContext,
}

impl LabelRule {
    fn label(&self, sentence: &str) -> NumericLabel {
        match self {
            LabelRule::Fixed(label) => *label,
            LabelRule::PercentContext => {
                if is_match(&RE_YIELD_TERMS, sentence) {
                    NumericLabel::YieldIncrease
                } else if is_match(&RE_AREA_TERMS, sentence) {
                    NumericLabel::Percentage
                } else {
                    NumericLabel::Unqualified
                }
            }
        }
    }
}

/// One scanner in the registry.
pub struct NumericPattern {
    pub name: &'static str,
    pub regex: &'static LazyLock<Option<Regex>>,
    /// Capture group reported as `raw`; 0 is the whole match
    pub raw_group: usize,
    pub rule: LabelRule,
    /// Range pattern whose hits make this one's overlapping hits redundant
    pub superseded_by: Option<&'static str>,
}

/// Scanners in reporting order.
pub static NUMERIC_PATTERNS: &[NumericPattern] = &[
    NumericPattern {
        name: "percent",
        regex: &RE_PERCENT,
        raw_group: 1,
        rule: LabelRule::PercentContext,
        superseded_by: None,
    },
    NumericPattern {
        name: "npk_colon",
        regex: &RE_NPK_COLON,
        raw_group: 0,
        rule: LabelRule::Fixed(NumericLabel::NpkRatio),
        superseded_by: None,
    },
    NumericPattern {
        name: "npk_letters",
        regex: &RE_NPK_LETTERS,
        raw_group: 0,
        rule: LabelRule::Fixed(NumericLabel::NpkRatio),
        superseded_by: None,
    },
    NumericPattern {
        name: "temp_range",
        regex: &RE_TEMP_RANGE,
        raw_group: 0,
        rule: LabelRule::Fixed(NumericLabel::TemperatureC),
        superseded_by: None,
    },
    NumericPattern {
        name: "temp_single",
        regex: &RE_TEMP_SINGLE,
        raw_group: 0,
        rule: LabelRule::Fixed(NumericLabel::TemperatureC),
        superseded_by: Some("temp_range"),
    },
    NumericPattern {
        name: "rain_range",
        regex: &RE_RAIN_RANGE,
        raw_group: 0,
        rule: LabelRule::Fixed(NumericLabel::RainfallMm),
        superseded_by: None,
    },
    NumericPattern {
        name: "rain_single",
        regex: &RE_RAIN_SINGLE,
        raw_group: 0,
        rule: LabelRule::Fixed(NumericLabel::RainfallMm),
        superseded_by: Some("rain_range"),
    },
    NumericPattern {
        name: "yield_amount",
        regex: &RE_YIELD_AMOUNT,
        raw_group: 1,
        rule: LabelRule::Fixed(NumericLabel::YieldAmount),
        superseded_by: None,
    },
    NumericPattern {
        name: "yield_increase",
        regex: &RE_YIELD_INCREASE,
        raw_group: 2,
        rule: LabelRule::Fixed(NumericLabel::YieldIncrease),
        superseded_by: None,
    },
];

fn is_match(pattern: &LazyLock<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}

/// Byte spans of every match of one registry entry.
fn match_spans(pattern: &NumericPattern, text: &str) -> Vec<(usize, usize)> {
    match pattern.regex.as_ref() {
        Some(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
        None => Vec::new(),
    }
}

/// First sentence containing `raw` (case-insensitive), else the first
/// sentence, else the whole text.
pub fn sentence_containing(raw: &str, sentences: &[String], text: &str) -> String {
    let needle = raw.to_lowercase();
    sentences
        .iter()
        .find(|s| s.to_lowercase().contains(&needle))
        .or_else(|| sentences.first())
        .cloned()
        .unwrap_or_else(|| text.trim().to_string())
}

/// Scan one chunk of text for numeric evidence.
///
/// Entries run in registry order. A single-value temperature or rainfall hit
/// inside a range hit is dropped, as is any hit that crosses a sentence
/// boundary. Results are deduplicated by `raw`, first occurrence wins.
pub fn scan(text: &str) -> Vec<NumericEvidence> {
    let sentences = split_sentences(text);
    let mut found = Vec::new();
    let mut seen = HashSet::new();

    for pattern in NUMERIC_PATTERNS {
        let Some(re) = pattern.regex.as_ref() else {
            tracing::warn!("Numeric pattern '{}' failed to compile", pattern.name);
            continue;
        };

        let covered = pattern
            .superseded_by
            .and_then(|name| NUMERIC_PATTERNS.iter().find(|p| p.name == name))
            .map(|range| match_spans(range, text))
            .unwrap_or_default();

        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            if covered
                .iter()
                .any(|&(start, end)| whole.start() < end && start < whole.end())
            {
                continue;
            }

            let Some(raw) = caps.get(pattern.raw_group) else {
                continue;
            };
            let raw = raw.as_str().trim();
            if raw.is_empty() || seen.contains(raw) {
                continue;
            }

            let sentence = sentence_containing(raw, &sentences, text);
            if !sentence.contains(raw) {
                tracing::debug!("Dropping '{}' match spanning sentences: {:?}", pattern.name, raw);
                continue;
            }
            seen.insert(raw.to_string());
            found.push(NumericEvidence {
                raw: raw.to_string(),
                label: pattern.rule.label(&sentence),
                evidence_sentence: sentence,
            });
        }
    }

    found
}
