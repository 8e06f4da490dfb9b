//! Gemini client for design profile generation.
//!
//! Calls the Generative Language `generateContent` REST endpoint with a prompt
//! built from the canonical client record and parses the JSON profile out of
//! the first candidate.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info_span, Instrument};

use crate::error::ProfileError;
use crate::intake::ClientRecord;
use crate::profile::model::ClientProfile;
use crate::profile::ProfileGenerator;

const PROFILE_FORMAT: &str = r#"{
  "client_name": "Client's full name",
  "email": "Client's email address",
  "phone": "Client's phone number (if provided)",
  "timeline": "Project timeline (if provided)",
  "project_type": "Type of interior design project",
  "project_summary": "2-3 sentence summary of the project",
  "property_address": "Property address (if provided)",
  "budget_range": "Budget range (if provided)",
  "style_preference": "Design style preference (if provided)",
  "design_style_analysis": "Analysis of the client's style preferences",
  "space_analysis": "Analysis of the space, its potential and key considerations",
  "budget_analysis": "Budget considerations and recommendations",
  "timeline_analysis": "Timeline and project planning considerations",
  "recommendations": [
    {
      "category": "Color Scheme | Furniture | Layout | Lighting | Materials",
      "title": "Short title",
      "description": "Detailed description",
      "reasoning": "Why this fits the client",
      "priority": "low | medium | high",
      "estimated_cost": "Cost range, e.g. '$500-1500'",
      "timeline": "Implementation time, e.g. '1-2 weeks'"
    }
  ],
  "overall_recommendation": "Overall design recommendation (2-3 paragraphs)",
  "next_steps": ["Specific next step"],
  "estimated_project_duration": "e.g. '8-12 weeks'",
  "estimated_total_cost": "e.g. '$15,000-25,000'"
}"#;

#[derive(Debug, Clone)]
pub struct GenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

/// Profile generator backed by the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiProfileGenerator {
    client: reqwest::Client,
    config: GenAiConfig,
}

impl GeminiProfileGenerator {
    pub fn new(config: GenAiConfig) -> Result<Self, ProfileError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("interior-intake/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate_text(&self, prompt: String) -> Result<String, ProfileError> {
        let api_key = self.config.api_key.as_deref().ok_or(ProfileError::MissingApiKey)?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: json!({
                "temperature": 0.7,
                "topP": 0.8,
                "topK": 40,
                "maxOutputTokens": 8192,
                "responseMimeType": "application/json",
            }),
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProfileError::Status {
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        body.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text.filter(|t| !t.trim().is_empty()))
            .ok_or(ProfileError::EmptyResponse)
    }
}

#[async_trait]
impl ProfileGenerator for GeminiProfileGenerator {
    async fn generate(&self, record: &ClientRecord) -> Result<ClientProfile, ProfileError> {
        let span = info_span!("generate_profile", model = %self.config.model);

        async move {
            let started = std::time::Instant::now();
            let prompt = build_prompt(record);
            let prompt_len = prompt.len();

            let text = self.generate_text(prompt).await?;
            tracing::info!(
                "GenAI responded in {} ms (prompt {} chars, response {} chars)",
                started.elapsed().as_millis(),
                prompt_len,
                text.len()
            );

            parse_profile(&text, record, &self.config.model)
        }
        .instrument(span)
        .await
    }
}

/// Build the profile prompt for a client record.
pub fn build_prompt(record: &ClientRecord) -> String {
    let mut context = Vec::new();
    for (label, value) in [
        ("Client", &record.name),
        ("Email", &record.email),
        ("Phone", &record.phone),
        ("Timeline", &record.timeline),
    ] {
        if !value.is_empty() {
            context.push(format!("{}: {}", label, value));
        }
    }
    for (key, answer) in &record.answers {
        if !answer.is_empty() {
            context.push(format!("{}: {}", key.to_case(Case::Title), answer));
        }
    }

    format!(
        "You are an experienced interior designer. Analyze the client information below \
         and create an interior design profile.\n\n\
         CLIENT INFORMATION:\n{}\n\n\
         Respond with only a JSON object in this format:\n{}\n\n\
         Provide 3-5 practical recommendations that respect the client's budget and timeline. \
         If information is missing, make reasonable assumptions and say so.",
        context.join("\n"),
        PROFILE_FORMAT
    )
}

/// Strip Markdown fences and surrounding prose from a model response.
pub fn clean_response(response: &str) -> &str {
    let mut text = response.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    let text = text.trim();

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Parse a model response into a profile, filling gaps from the record.
pub fn parse_profile(
    response: &str,
    record: &ClientRecord,
    model: &str,
) -> Result<ClientProfile, ProfileError> {
    let mut profile: ClientProfile =
        serde_json::from_str(clean_response(response)).map_err(|source| ProfileError::Parse {
            source,
            preview: truncate(response, 200),
        })?;

    fill_if_empty(&mut profile.client_name, record.display_name());
    fill_if_empty(&mut profile.email, &record.email);
    fill_if_empty(&mut profile.phone, &record.phone);
    fill_if_empty(&mut profile.timeline, &record.timeline);
    fill_if_empty(&mut profile.project_type, "Interior Design");

    profile.answers = record.answers.clone();
    profile.ai_model_used = model.to_string();
    profile.generated_at = Utc::now();
    Ok(profile)
}

fn fill_if_empty(field: &mut String, fallback: &str) {
    if field.trim().is_empty() {
        *field = fallback.to_string();
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
