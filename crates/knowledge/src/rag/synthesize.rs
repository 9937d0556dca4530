//! Answer synthesis.
//!
//! An ordered table of rules is tried against the intent flags; the first
//! one that applies renders the whole answer. Every figure in the output is
//! a verbatim `raw` value shown next to its evidence sentence.

use crate::rag::classify::IntentFlags;
use crate::rag::types::{ExtractedAnswer, NumericEvidence, NumericLabel};
use crate::text::split_sentences;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

pub const NO_EVIDENCE: &str =
    "No reliable answer or supporting evidence found in retrieved documents.";
pub const NO_DIRECT_ANSWER: &str = "No direct answer found.";

macro_rules! synthesis_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

synthesis_pattern!(
    RE_RAINFED_CROPS,
    r"(?i)\b(wheat|barley|mustard|lentil|pea|gram|chickpea|maize|millet)\b"
);
synthesis_pattern!(
    RE_WINTER_CROPS,
    r"(?i)\b(wheat|mustard|barley|pea|lentil|millet|maize|buckwheat|ragi)\b"
);
synthesis_pattern!(RE_TREND, r"(?i)two decades|20 years|last 20|in the last twenty");
synthesis_pattern!(RE_SCHEME_NABARD, r"(?i)\bNABARD\b");
synthesis_pattern!(RE_SCHEME_PMKSY, r"(?i)\bPMKSY\b");
synthesis_pattern!(RE_SCHEME_NFSM, r"(?i)\bNFSM\b");
synthesis_pattern!(RE_SCHEME_RKVY, r"(?i)\bRKVY\b");
synthesis_pattern!(RE_SCHEME_MIDH, r"(?i)\bMIDH\b");
synthesis_pattern!(RE_SCHEME_NHM, r"(?i)\bNational Horticulture Mission\b");
synthesis_pattern!(RE_SCHEME_PRADHAN, r"(?i)\bPradhan\b");
synthesis_pattern!(RE_ROLE_SPRAYING, r"spray|spraying|pesticid");
synthesis_pattern!(RE_ROLE_SEEDING, r"seed|seeding|deposit|drop");
synthesis_pattern!(RE_ROLE_GEOFENCE, r"geo[- ]?fenc|geofence|geofenc");
synthesis_pattern!(
    RE_ROLE_MONITORING,
    r"monitor|ndvi|remote sensing|mapping|survey|detect"
);

static SCHEME_PATTERNS: [&LazyLock<Option<Regex>>; 7] = [
    &RE_SCHEME_NABARD,
    &RE_SCHEME_PMKSY,
    &RE_SCHEME_NFSM,
    &RE_SCHEME_RKVY,
    &RE_SCHEME_MIDH,
    &RE_SCHEME_NHM,
    &RE_SCHEME_PRADHAN,
];

static DRONE_ROLES: [(&LazyLock<Option<Regex>>, &str); 4] = [
    (&RE_ROLE_SPRAYING, "spraying of pesticides and inputs"),
    (&RE_ROLE_SEEDING, "seeding / input delivery"),
    (&RE_ROLE_GEOFENCE, "geo-fenced precision input delivery"),
    (&RE_ROLE_MONITORING, "monitoring / remote sensing for crop health"),
];

/// A numeric item with the source it came from.
struct Cited<'a> {
    number: &'a NumericEvidence,
    source: &'a str,
}

/// Query-scoped view over all extracted answers.
///
/// Numbers are pooled across every answer, not just the best one.
struct Evidence<'a> {
    answers: &'a [ExtractedAnswer],
    numbers: Vec<Cited<'a>>,
}

impl<'a> Evidence<'a> {
    fn new(answers: &'a [ExtractedAnswer]) -> Self {
        let numbers = answers
            .iter()
            .flat_map(|a| {
                a.numbers.iter().map(move |number| Cited {
                    number,
                    source: a.source(),
                })
            })
            .collect();
        Self { answers, numbers }
    }

    fn labeled(&self, label: NumericLabel) -> Vec<&Cited<'a>> {
        self.numbers.iter().filter(|c| c.number.label == label).collect()
    }

    /// Span and chunk text of every answer.
    fn texts(&self) -> impl Iterator<Item = String> + '_ {
        self.answers
            .iter()
            .map(|a| format!("{} {}", a.answer_span, a.context()))
    }
}

/// One routing entry: when it applies and how it renders.
pub struct SynthesisRule {
    pub name: &'static str,
    applies: fn(&IntentFlags) -> bool,
    render: fn(&Evidence<'_>) -> String,
}

/// Rules in priority order. The last one always applies.
pub static SYNTHESIS_RULES: &[SynthesisRule] = &[
    SynthesisRule {
        name: "rainfed_crop_yield",
        applies: |f| f.asks_crops && f.mentions_rainfed && f.asks_yield,
        render: render_rainfed_crop_yield,
    },
    SynthesisRule {
        name: "apple_climate",
        applies: |f| f.asks_apple && (f.asks_temp || f.asks_rain || f.asks_trend),
        render: render_apple_climate,
    },
    SynthesisRule {
        name: "smallholder_crops",
        applies: |f| f.asks_smallholders && f.asks_crops,
        render: render_smallholder_crops,
    },
    SynthesisRule {
        name: "drone_roles",
        applies: |f| f.asks_roles,
        render: render_drone_roles,
    },
    SynthesisRule {
        name: "generic",
        applies: |_| true,
        render: render_generic,
    },
];

/// Pick the rule that will render an answer for these flags and answers.
///
/// Returns `None` when there is nothing to render from.
pub fn route(flags: &IntentFlags, extracted: &[ExtractedAnswer]) -> Option<&'static SynthesisRule> {
    if extracted.is_empty() {
        return None;
    }
    SYNTHESIS_RULES.iter().find(|rule| (rule.applies)(flags))
}

/// Render the answer text. Deterministic in `(flags, extracted)`.
pub fn synthesize(query: &str, flags: &IntentFlags, extracted: &[ExtractedAnswer]) -> String {
    let Some(rule) = route(flags, extracted) else {
        tracing::debug!("No extracted evidence for query: {}", query);
        return NO_EVIDENCE.to_string();
    };

    tracing::debug!("Synthesizing with rule '{}'", rule.name);
    (rule.render)(&Evidence::new(extracted))
}

fn find_all<'t>(pattern: &LazyLock<Option<Regex>>, text: &'t str) -> Vec<&'t str> {
    match pattern.as_ref() {
        Some(re) => re.find_iter(text).map(|m| m.as_str()).collect(),
        None => Vec::new(),
    }
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn crops_in(evidence: &Evidence<'_>, vocabulary: &LazyLock<Option<Regex>>) -> BTreeSet<String> {
    evidence
        .texts()
        .flat_map(|text| {
            find_all(vocabulary, &text)
                .into_iter()
                .map(capitalize)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn cited_line(cited: &Cited<'_>, lead: &str) -> String {
    format!(
        "- {} — {}: \"{}\" (source: {})",
        cited.number.raw, lead, cited.number.evidence_sentence, cited.source
    )
}

fn bullet_list(lines: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    lines.extend(items.into_iter().map(|item| format!("- {}", item)));
}

fn render_rainfed_crop_yield(evidence: &Evidence<'_>) -> String {
    let crops = crops_in(evidence, &RE_RAINFED_CROPS);
    let mut lines = Vec::new();

    if crops.is_empty() {
        lines.push(
            "Sources mention Rabi cropping but do not list rainfed-specific crops clearly."
                .to_string(),
        );
    } else {
        lines.push("Suitable Rabi crops for rainfed regions (from sources):".to_string());
        bullet_list(&mut lines, crops);
    }

    let mut yields = evidence.labeled(NumericLabel::YieldIncrease);
    yields.extend(evidence.labeled(NumericLabel::YieldAmount));

    if !yields.is_empty() {
        lines.push("\nReported yield evidence (verbatim, with qualification):".to_string());
        lines.extend(yields.iter().map(|c| cited_line(c, "described in context")));
    } else {
        let percents = evidence.labeled(NumericLabel::Percentage);
        if percents.is_empty() {
            lines.push(
                "\nNo explicit quantitative yield-improvement figures for improved seed \
                 varieties were found in the retrieved sources. Some sources mention \
                 qualitative 'increased yield' statements without numbers."
                    .to_string(),
            );
        } else {
            lines.push(
                "\nNumeric percentages were found, but the sources did not clearly state \
                 whether these refer to yield improvements. Examples:"
                    .to_string(),
            );
            lines.extend(percents.iter().map(|c| cited_line(c, "context")));
            lines.push(
                "Cannot assert what these percentages refer to without clearer context."
                    .to_string(),
            );
        }
    }

    lines.join("\n")
}

fn render_apple_climate(evidence: &Evidence<'_>) -> String {
    let mut lines = Vec::new();

    let temps = evidence.labeled(NumericLabel::TemperatureC);
    if temps.is_empty() {
        lines.push(
            "No explicit temperature ranges for apple cultivation were found in the \
             retrieved sources."
                .to_string(),
        );
    } else {
        lines.push(
            "Temperature ranges mentioned (verbatim) and their context/evidence:".to_string(),
        );
        lines.extend(temps.iter().map(|c| cited_line(c, "context")));
    }

    let rains = evidence.labeled(NumericLabel::RainfallMm);
    if rains.is_empty() {
        lines.push(
            "\nNo explicit rainfall ranges for apple cultivation were found in the \
             retrieved sources."
                .to_string(),
        );
    } else {
        lines.push("\nRainfall ranges/figures mentioned (verbatim) and evidence:".to_string());
        lines.extend(rains.iter().map(|c| cited_line(c, "context")));
    }

    let trend_sentences: Vec<(String, &str)> = evidence
        .answers
        .iter()
        .flat_map(|a| {
            split_sentences(a.context())
                .into_iter()
                .filter(|s| !find_all(&RE_TREND, s).is_empty())
                .map(move |s| (s, a.source()))
        })
        .collect();

    if trend_sentences.is_empty() {
        lines.push(
            "\nNo explicit two-decade trend statements regarding apple temperature/rainfall \
             were found in the retrieved sources."
                .to_string(),
        );
    } else {
        lines.push("\nStatements about multi-decade changes (verbatim):".to_string());
        lines.extend(
            trend_sentences
                .iter()
                .map(|(sentence, source)| format!("- \"{}\" (source: {})", sentence, source)),
        );
    }

    lines.join("\n")
}

fn render_smallholder_crops(evidence: &Evidence<'_>) -> String {
    let crops = crops_in(evidence, &RE_WINTER_CROPS);
    let schemes: BTreeSet<String> = evidence
        .texts()
        .flat_map(|text| {
            SCHEME_PATTERNS
                .iter()
                .filter_map(|pattern| find_all(pattern, &text).first().map(|m| m.to_string()))
                .collect::<Vec<_>>()
        })
        .collect();

    let mut lines = Vec::new();
    if crops.is_empty() {
        lines.push(
            "Sources did not list specific winter crops clearly for small landholders in \
             hill districts."
                .to_string(),
        );
    } else {
        lines.push(
            "Winter crops mentioned as suitable for small landholders in hill districts \
             (from sources):"
                .to_string(),
        );
        bullet_list(&mut lines, crops);
    }

    if schemes.is_empty() {
        lines.push(
            "\nNo explicit government scheme names supporting these crops were found in the \
             retrieved sources."
                .to_string(),
        );
    } else {
        lines.push("\nGovernment schemes/programs referenced in the sources:".to_string());
        bullet_list(&mut lines, schemes);
    }

    lines.join("\n")
}

fn render_drone_roles(evidence: &Evidence<'_>) -> String {
    let roles: BTreeSet<&str> = evidence
        .answers
        .iter()
        .flat_map(|a| {
            let context = a.context().to_lowercase();
            DRONE_ROLES
                .iter()
                .filter(|(pattern, _)| !find_all(pattern, &context).is_empty())
                .map(|(_, role)| *role)
                .collect::<Vec<_>>()
        })
        .collect();

    if roles.is_empty() {
        return "The sources mention drone usage but do not list multiple clear roles."
            .to_string();
    }

    let mut lines = vec!["Drones roles (from sources):".to_string()];
    bullet_list(&mut lines, roles.into_iter().map(str::to_string));
    lines.join("\n")
}

fn render_generic(evidence: &Evidence<'_>) -> String {
    let Some(best) = evidence.answers.first() else {
        return NO_EVIDENCE.to_string();
    };

    let span = if best.has_span() {
        best.answer_span.clone()
    } else {
        NO_DIRECT_ANSWER.to_string()
    };

    if best.numbers.is_empty() {
        return span;
    }

    let mut lines = vec![span, "\nNumbers found in the evidence (qualified):".to_string()];
    for number in &best.numbers {
        if number.label == NumericLabel::Unqualified {
            lines.push(format!(
                "- {} — context: \"{}\" (unclear what this number refers to)",
                number.raw, number.evidence_sentence
            ));
        } else {
            lines.push(format!(
                "- {} — labeled as {}. Evidence: \"{}\"",
                number.raw, number.label, number.evidence_sentence
            ));
        }
    }
    lines.join("\n")
}
