//! Query pipeline value types.

use crate::types::Chunk;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A chunk that survived retrieval and reranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedCandidate {
    pub chunk: Chunk,

    /// Reranker score against the original query, or 1.0 when unranked
    pub relevance_score: f32,
}

/// What a numeric literal found in source text measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericLabel {
    Percentage,
    YieldIncrease,
    YieldAmount,
    NpkRatio,
    TemperatureC,
    RainfallMm,
    Unqualified,
}

impl NumericLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumericLabel::Percentage => "percentage",
            NumericLabel::YieldIncrease => "yield_increase",
            NumericLabel::YieldAmount => "yield_amount",
            NumericLabel::NpkRatio => "npk_ratio",
            NumericLabel::TemperatureC => "temperature_c",
            NumericLabel::RainfallMm => "rainfall_mm",
            NumericLabel::Unqualified => "unqualified",
        }
    }
}

impl fmt::Display for NumericLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric literal and the sentence it was found in.
///
/// `raw` is the matched text exactly as it appears in `evidence_sentence`,
/// which in turn is a slice of the chunk text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericEvidence {
    pub raw: String,
    pub label: NumericLabel,
    pub evidence_sentence: String,
}

/// Reader output and numeric evidence for one candidate chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedAnswer {
    /// Empty when the reader found no answer
    pub answer_span: String,
    pub confidence: f32,
    pub source_chunk: Chunk,
    pub numbers: Vec<NumericEvidence>,
    pub rerank_score: f32,
}

impl ExtractedAnswer {
    pub fn has_span(&self) -> bool {
        !self.answer_span.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source_chunk.source
    }

    pub fn context(&self) -> &str {
        &self.source_chunk.text
    }
}

/// One cited source in a final answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitedSource {
    pub source: String,

    #[serde(rename = "hasSpan")]
    pub has_span: bool,

    /// Answer span, or the start of the chunk text when there is none
    pub snippet: String,
}

/// Final response to a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedAnswer {
    pub query: String,
    pub answer: String,
    pub sources: Vec<CitedSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_serializes_snake_case() {
        let json = serde_json::to_string(&NumericLabel::TemperatureC).unwrap();
        assert_eq!(json, "\"temperature_c\"");
        assert_eq!(NumericLabel::YieldIncrease.to_string(), "yield_increase");
    }

    #[test]
    fn test_answer_json_shape() {
        let answer = SynthesizedAnswer {
            query: "q".to_string(),
            answer: "a".to_string(),
            sources: vec![CitedSource {
                source: "apple.txt".to_string(),
                has_span: true,
                snippet: "0 to 10 °C".to_string(),
            }],
        };

        let value = serde_json::to_value(&answer).unwrap();
        assert_eq!(value["sources"][0]["hasSpan"], true);
        assert_eq!(value["sources"][0]["source"], "apple.txt");
    }
}
