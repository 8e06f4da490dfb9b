//! Design profile produced by the AI collaborator.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::intake::value_text;

/// Recommendation priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = lenient_string(deserializer)?;
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Priority::Low,
            "high" => Priority::High,
            _ => Priority::Medium,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignRecommendation {
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reasoning: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub estimated_cost: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub timeline: Option<String>,
}

/// Client design profile.
///
/// Every field tolerates absence in the AI response; callers fill identity
/// fields from the canonical record afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    #[serde(default, deserialize_with = "lenient_string")]
    pub client_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timeline: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub project_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub project_summary: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub property_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub budget_range: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub style_preference: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub design_style_analysis: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub space_analysis: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub budget_analysis: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timeline_analysis: String,

    #[serde(default)]
    pub recommendations: Vec<DesignRecommendation>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub overall_recommendation: String,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub estimated_project_duration: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub estimated_total_cost: Option<String>,

    /// Questionnaire answers carried over from the client record
    #[serde(default)]
    pub answers: IndexMap<String, String>,
    #[serde(default)]
    pub ai_model_used: String,
    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
}

impl Default for ClientProfile {
    fn default() -> Self {
        Self {
            client_name: String::new(),
            email: String::new(),
            phone: String::new(),
            timeline: String::new(),
            project_type: String::new(),
            project_summary: String::new(),
            property_address: None,
            budget_range: None,
            style_preference: None,
            design_style_analysis: String::new(),
            space_analysis: String::new(),
            budget_analysis: String::new(),
            timeline_analysis: String::new(),
            recommendations: Vec::new(),
            overall_recommendation: String::new(),
            next_steps: Vec::new(),
            estimated_project_duration: None,
            estimated_total_cost: None,
            answers: IndexMap::new(),
            ai_model_used: String::new(),
            generated_at: Utc::now(),
        }
    }
}

/// Accept strings, numbers, booleans or null where text is expected.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = JsonValue::deserialize(deserializer)?;
    Ok(value_text(&value))
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let text = lenient_string(deserializer)?;
    Ok(Some(text).filter(|t| !t.trim().is_empty()))
}
