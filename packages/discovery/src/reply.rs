// ABOUTME: Strict validation of the model's JSON reply contract
// ABOUTME: Locates a JSON object inside free text and accepts it only if every required field is valid

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use vitrine_core::{default_suggestions, MAX_MATCH_SCORE};

/// Number of suggestion chips shown under an assistant turn
pub const SUGGESTION_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRecommendation {
    pub product_id: String,
    pub reason: String,
    pub match_score: u8,
}

/// A reply that satisfied the output schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub message: String,
    pub recommendations: Vec<ModelRecommendation>,
    pub reasoning: String,
    pub suggestions: Vec<String>,
}

impl ModelReply {
    /// The degraded reply used when the raw text is not a valid structured reply
    pub fn fallback(raw: impl Into<String>) -> Self {
        Self {
            message: raw.into(),
            recommendations: Vec::new(),
            reasoning: String::new(),
            suggestions: default_suggestions(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReply {
    message: String,
    recommendations: Vec<RawRecommendation>,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecommendation {
    product_id: String,
    reason: String,
    match_score: i64,
}

/// Find the first JSON object in `raw` that satisfies the reply schema.
/// Handles prose before/after the payload and markdown code fences.
pub fn parse_reply(raw: &str) -> Option<ModelReply> {
    for (start, _) in raw.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
        let Some(Ok(value)) = stream.next() else {
            continue;
        };
        if !value.is_object() {
            continue;
        }
        match validate(value) {
            Some(reply) => return Some(reply),
            None => debug!("JSON object at offset {} does not match the reply schema", start),
        }
    }
    None
}

fn validate(value: Value) -> Option<ModelReply> {
    let raw: RawReply = serde_json::from_value(value).ok()?;

    let mut recommendations = Vec::with_capacity(raw.recommendations.len());
    for rec in raw.recommendations {
        // One bad entry rejects the whole reply
        if !(0..=MAX_MATCH_SCORE).contains(&rec.match_score) || rec.product_id.trim().is_empty() {
            return None;
        }
        recommendations.push(ModelRecommendation {
            product_id: rec.product_id.trim().to_string(),
            reason: rec.reason,
            match_score: u8::try_from(rec.match_score).ok()?,
        });
    }

    Some(ModelReply {
        message: raw.message,
        recommendations,
        reasoning: raw.reasoning,
        suggestions: normalize_suggestions(raw.suggestions),
    })
}

/// Exactly three non-empty, distinct chips; gaps are filled from the defaults
pub fn normalize_suggestions(suggestions: Vec<String>) -> Vec<String> {
    let mut chips: Vec<String> = Vec::with_capacity(SUGGESTION_COUNT);
    let candidates = suggestions
        .into_iter()
        .map(|s| s.trim().to_string())
        .chain(default_suggestions());

    for chip in candidates {
        if chips.len() == SUGGESTION_COUNT {
            break;
        }
        if !chip.is_empty() && !chips.contains(&chip) {
            chips.push(chip);
        }
    }
    chips
}
