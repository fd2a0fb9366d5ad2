use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Fallback shown wherever the backend left the pass/fail gate empty.
pub const NOT_AVAILABLE: &str = "N/A";

/// Backend row identifier. Supabase hands these out as integers or UUID
/// strings depending on the table, so both are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => RecordId(text),
            RawId::Number(n) => RecordId(n.to_string()),
        })
    }
}

/// One row of `GET /api/roles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSummary {
    pub id: RecordId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// A job role with its (possibly not yet generated) rubric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub rubric_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Rubric text, treating an empty string the same as a missing rubric.
    pub fn rubric(&self) -> Option<&str> {
        self.rubric_text.as_deref().filter(|r| !r.trim().is_empty())
    }
}

/// What the AI evaluation produced for one resume.
///
/// Every field is optional: when scoring fails server-side the backend stores
/// `{"error": ..., "message": ...}` in place of the evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationDetails {
    pub pass_fail_status: Option<String>,
    pub justification: Option<String>,
    pub cited_evidence: Option<Vec<String>>,
    pub competency_scores: Option<Map<String, Value>>,
    pub error: Option<String>,
    pub message: Option<String>,
}

/// The outcome of screening one resume against one role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub id: RecordId,
    #[serde(default)]
    pub role_id: Option<RecordId>,
    pub file_name: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub score: f64,
    #[serde(default)]
    pub evaluation_details: Option<EvaluationDetails>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ScreeningResult {
    /// Score as the backend sent it: `82`, not `82.0`.
    pub fn score_text(&self) -> String {
        self.score.to_string()
    }

    pub fn pass_fail(&self) -> &str {
        self.evaluation_details
            .as_ref()
            .and_then(|d| d.pass_fail_status.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or(NOT_AVAILABLE)
    }

    pub fn passed(&self) -> bool {
        self.pass_fail().eq_ignore_ascii_case("pass")
    }

    pub fn justification(&self) -> &str {
        self.evaluation_details
            .as_ref()
            .and_then(|d| d.justification.as_deref())
            .unwrap_or("")
    }

    pub fn cited_evidence(&self) -> &[String] {
        self.evaluation_details
            .as_ref()
            .and_then(|d| d.cited_evidence.as_deref())
            .unwrap_or(&[])
    }

    /// `(competency, score)` pairs in the order the backend returned them.
    pub fn competency_scores(&self) -> Vec<(&str, String)> {
        self.evaluation_details
            .as_ref()
            .and_then(|d| d.competency_scores.as_ref())
            .map(|scores| {
                scores
                    .iter()
                    .map(|(name, value)| (name.as_str(), render_value(value)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Set when the backend saved the resume but the AI evaluation failed.
    pub fn evaluation_error(&self) -> Option<&str> {
        let details = self.evaluation_details.as_ref()?;
        details.message.as_deref().or(details.error.as_deref())
    }
}

/// Numbers print like `score_text`, so `4.0` shows as `4`.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n
            .as_f64()
            .map(|f| f.to_string())
            .unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}
