use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

use crate::error::AnalysisError;

/// Fields the model must always return
pub const REQUIRED_FIELDS: &[&str] = &[
    "offerSummary",
    "plainEnglishSummary",
    "hiddenRequirements",
    "redFlags",
    "riskScore",
    "clarityScore",
    "cancellationDifficulty",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancellationDifficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for CancellationDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => write!(f, "Easy"),
            Self::Medium => write!(f, "Medium"),
            Self::Hard => write!(f, "Hard"),
        }
    }
}

/// Structured risk analysis of an offer's fine print
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinePrintAnalysis {
    pub offer_summary: String,
    pub plain_english_summary: String,
    pub hidden_requirements: Vec<String>,
    pub red_flags: Vec<String>,
    /// 0-100
    pub risk_score: u8,
    /// 0-100
    pub clarity_score: u8,
    pub cancellation_difficulty: CancellationDifficulty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score_explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarity_score_explanation: Option<String>,
}

/// Validate the model's JSON reply.
///
/// Missing required fields are errors. Out-of-range scores are clamped and
/// an unknown cancellation difficulty becomes `Medium`.
pub fn parse_analysis(raw: &str) -> Result<FinePrintAnalysis, AnalysisError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| AnalysisError::Parse(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| AnalysisError::Parse("expected a JSON object".to_string()))?;

    for &field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(AnalysisError::FieldMissing(field));
        }
    }

    Ok(FinePrintAnalysis {
        offer_summary: string_field(object, "offerSummary")?,
        plain_english_summary: string_field(object, "plainEnglishSummary")?,
        hidden_requirements: list_field(object, "hiddenRequirements")?,
        red_flags: list_field(object, "redFlags")?,
        risk_score: score_field(object, "riskScore")?,
        clarity_score: score_field(object, "clarityScore")?,
        cancellation_difficulty: difficulty_field(object),
        risk_score_explanation: optional_string(object, "riskScoreExplanation"),
        clarity_score_explanation: optional_string(object, "clarityScoreExplanation"),
    })
}

fn wrong_type(field: &str, expected: &str) -> AnalysisError {
    AnalysisError::Parse(format!("field {} is not {}", field, expected))
}

fn string_field(object: &Map<String, Value>, field: &'static str) -> Result<String, AnalysisError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| wrong_type(field, "a string"))
}

fn optional_string(object: &Map<String, Value>, field: &str) -> Option<String> {
    object.get(field).and_then(Value::as_str).map(str::to_string)
}

fn list_field(object: &Map<String, Value>, field: &'static str) -> Result<Vec<String>, AnalysisError> {
    let items = object
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| wrong_type(field, "a list"))?;

    Ok(items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect())
}

fn score_field(object: &Map<String, Value>, field: &'static str) -> Result<u8, AnalysisError> {
    let score = object
        .get(field)
        .and_then(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .ok_or_else(|| wrong_type(field, "a number"))?;

    let clamped = score.clamp(0.0, 100.0);
    if clamped != score {
        warn!("{} {} out of range, clamping to {}", field, score, clamped);
    }
    Ok(clamped.round() as u8)
}

fn difficulty_field(object: &Map<String, Value>) -> CancellationDifficulty {
    match object.get("cancellationDifficulty").and_then(Value::as_str) {
        Some("Easy") => CancellationDifficulty::Easy,
        Some("Medium") => CancellationDifficulty::Medium,
        Some("Hard") => CancellationDifficulty::Hard,
        other => {
            warn!("Invalid cancellation difficulty: {:?}, defaulting to Medium", other);
            CancellationDifficulty::Medium
        }
    }
}

/// Short human-readable digest of an analysis
pub fn summarize(analysis: &FinePrintAnalysis) -> String {
    let offer: String = analysis.offer_summary.chars().take(100).collect();
    format!(
        "Analysis Summary:\n\
         - Offer: {}...\n\
         - Risk Score: {}/100\n\
         - Clarity Score: {}/100\n\
         - Cancellation: {}\n\
         - Hidden Requirements: {}\n\
         - Red Flags: {}",
        offer,
        analysis.risk_score,
        analysis.clarity_score,
        analysis.cancellation_difficulty,
        analysis.hidden_requirements.len(),
        analysis.red_flags.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete() -> Value {
        json!({
            "offerSummary": "50% off three months of streaming.",
            "plainEnglishSummary": "Half price for a while, then full price.",
            "hiddenRequirements": ["Credit card required", "Auto-renews at $14.99"],
            "redFlags": ["Cancel by phone only"],
            "riskScore": 45,
            "clarityScore": 60,
            "cancellationDifficulty": "Hard",
            "riskScoreExplanation": "Auto-renewal without reminder"
        })
    }

    #[test]
    fn test_parses_complete_response() {
        let analysis = parse_analysis(&complete().to_string()).unwrap();
        assert_eq!(analysis.risk_score, 45);
        assert_eq!(analysis.clarity_score, 60);
        assert_eq!(analysis.cancellation_difficulty, CancellationDifficulty::Hard);
        assert_eq!(analysis.hidden_requirements.len(), 2);
        assert_eq!(analysis.risk_score_explanation.as_deref(), Some("Auto-renewal without reminder"));
        assert!(analysis.clarity_score_explanation.is_none());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(parse_analysis("Sure! Here is"), Err(AnalysisError::Parse(_))));
        assert!(matches!(parse_analysis("[1, 2]"), Err(AnalysisError::Parse(_))));
    }

    #[test]
    fn test_missing_field_is_reported_by_name() {
        let mut value = complete();
        value.as_object_mut().unwrap().remove("redFlags");
        match parse_analysis(&value.to_string()) {
            Err(AnalysisError::FieldMissing(field)) => assert_eq!(field, "redFlags"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_scores_are_clamped() {
        let mut value = complete();
        value["riskScore"] = json!(140);
        value["clarityScore"] = json!(-3.5);
        let analysis = parse_analysis(&value.to_string()).unwrap();
        assert_eq!(analysis.risk_score, 100);
        assert_eq!(analysis.clarity_score, 0);
    }

    #[test]
    fn test_unknown_difficulty_becomes_medium() {
        let mut value = complete();
        value["cancellationDifficulty"] = json!("Impossible");
        let analysis = parse_analysis(&value.to_string()).unwrap();
        assert_eq!(analysis.cancellation_difficulty, CancellationDifficulty::Medium);
    }

    #[test]
    fn test_serializes_camel_case() {
        let analysis = parse_analysis(&complete().to_string()).unwrap();
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["cancellationDifficulty"], "Hard");
        assert_eq!(json["riskScore"], 45);
        assert!(json.get("clarityScoreExplanation").is_none());
    }

    #[test]
    fn test_summarize() {
        let analysis = parse_analysis(&complete().to_string()).unwrap();
        let summary = summarize(&analysis);
        assert!(summary.contains("Risk Score: 45/100"));
        assert!(summary.contains("Cancellation: Hard"));
        assert!(summary.contains("Hidden Requirements: 2"));
    }
}
