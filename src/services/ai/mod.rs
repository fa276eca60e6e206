// src/services/ai/mod.rs
//! AI-access layer: formats requests to the configured generative provider and
//! parses what comes back. The provider is chosen per call from site settings.

mod gemini;
mod openai;
pub mod prompts;

use crate::services::settings::{SettingsError, SettingsService, SiteSettings};
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, thiserror::Error)]
pub enum AIError {
    #[error("API key for {0} is not configured")]
    NotConfigured(String),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("AI request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid AI response: {0}")]
    InvalidResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAI,
    Gemini,
}

impl FromStr for AiProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(AiProvider::OpenAI),
            "gemini" => Ok(AiProvider::Gemini),
            other => Err(format!("Unknown AI provider '{}'", other)),
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiProvider::OpenAI => write!(f, "openai"),
            AiProvider::Gemini => write!(f, "gemini"),
        }
    }
}

/// Parsed listing-photo analysis. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AIAnalysisResult {
    #[serde(deserialize_with = "null_is_safe")]
    pub is_safe: bool,
    pub safety_reason: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub brand: String,
    #[serde(deserialize_with = "null_as_default")]
    pub condition: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "lenient_price")]
    pub suggested_price: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

impl Default for AIAnalysisResult {
    // A reply that omits isSafe is treated as safe; only an explicit false rejects
    fn default() -> Self {
        Self {
            is_safe: true,
            safety_reason: None,
            title: String::new(),
            category: String::new(),
            brand: String::new(),
            condition: String::new(),
            description: String::new(),
            suggested_price: 0.0,
            tags: Vec::new(),
        }
    }
}

/// JSON modes emit `null` for fields they could not fill
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_is_safe<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// Models sometimes quote numbers ("45", "45.00 EUR", "1.234,56 €")
fn lenient_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => parse_price_text(&s),
        _ => 0.0,
    })
}

/// Reads a price written with either `.` or `,` as the decimal mark.
///
/// When both marks appear the last one is the decimal mark. A lone mark
/// followed by exactly three digits, or a mark that repeats, groups
/// thousands.
pub(crate) fn parse_price_text(text: &str) -> f64 {
    let numeric: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let decimal_mark = match (numeric.rfind('.'), numeric.rfind(',')) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(_), None) => Some('.'),
        (None, Some(_)) => Some(','),
        (None, None) => None,
    };

    let normalized = match decimal_mark {
        Some(mark) => {
            let group = if mark == '.' { ',' } else { '.' };
            let marks = numeric.matches(mark).count();
            let last = numeric.rfind(mark).unwrap_or(0);
            let digits_after = numeric.len() - last - 1;
            let both_present = numeric.contains(group);
            if !both_present && (marks > 1 || digits_after == 3) {
                numeric.replace(mark, "")
            } else {
                numeric.replace(group, "").replace(mark, ".")
            }
        }
        None => numeric,
    };

    normalized.parse().unwrap_or(0.0)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShopProfileSuggestion {
    #[serde(deserialize_with = "null_as_default")]
    pub shop_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub shop_description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "model")]
    Assistant,
}

/// One entry of the client-held conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Recorded voice input, base64 without a data-URL prefix
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioInput {
    pub data: String,
    pub mime_type: String,
}

/// Content of the final user turn
#[derive(Debug, Clone)]
pub(crate) enum InputPart<'a> {
    Text(String),
    /// data URL or http(s) URL
    Image(&'a str),
    Audio(&'a AudioInput),
}

/// Provider-neutral request
#[derive(Debug)]
pub(crate) struct ProviderRequest<'a> {
    pub system: String,
    pub history: &'a [ChatTurn],
    pub parts: Vec<InputPart<'a>>,
    pub expect_json: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ProviderCredentials {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug)]
pub struct AIService {
    settings_service: Arc<SettingsService>,
    client: Client,
    openai_base_url: String,
    gemini_base_url: String,
}

impl AIService {
    pub fn new(settings_service: Arc<SettingsService>) -> Self {
        let openai_base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());
        let gemini_base_url =
            env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());
        Self::with_base_urls(settings_service, openai_base_url, gemini_base_url)
    }

    pub fn with_base_urls(
        settings_service: Arc<SettingsService>,
        openai_base_url: String,
        gemini_base_url: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            settings_service,
            client,
            openai_base_url: openai_base_url.trim_end_matches('/').to_string(),
            gemini_base_url: gemini_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Analyse a single listing photo for moderation and prefill
    pub async fn analyze_listing_image(
        &self,
        image: &str,
        language: &str,
    ) -> Result<AIAnalysisResult, AIError> {
        if image.trim().is_empty() {
            return Err(AIError::InvalidInput("An image is required".to_string()));
        }

        let request = ProviderRequest {
            system: prompts::listing_analysis_prompt(language),
            history: &[],
            parts: vec![
                InputPart::Text(prompts::LISTING_ANALYSIS_TASK.to_string()),
                InputPart::Image(image),
            ],
            expect_json: true,
        };

        let raw = self.complete(request).await?;
        let result: AIAnalysisResult = parse_json_payload(&raw)?;
        info!(
            is_safe = result.is_safe,
            category = %result.category,
            "Listing image analysed"
        );
        Ok(result)
    }

    /// Suggest a shop name and description from a free-text brief and/or a photo
    pub async fn generate_shop_profile(
        &self,
        prompt: Option<&str>,
        image: Option<&str>,
        language: &str,
    ) -> Result<ShopProfileSuggestion, AIError> {
        let brief = prompt.map(str::trim).filter(|p| !p.is_empty());
        let image = image.map(str::trim).filter(|i| !i.is_empty());
        if brief.is_none() && image.is_none() {
            return Err(AIError::InvalidInput(
                "Provide a description or an image".to_string(),
            ));
        }

        let mut parts = vec![InputPart::Text(prompts::shop_profile_task(brief))];
        if let Some(image) = image {
            parts.push(InputPart::Image(image));
        }

        let request = ProviderRequest {
            system: prompts::shop_profile_prompt(language),
            history: &[],
            parts,
            expect_json: true,
        };

        let raw = self.complete(request).await?;
        let suggestion: ShopProfileSuggestion = parse_json_payload(&raw)?;
        if suggestion.shop_name.trim().is_empty() {
            return Err(AIError::InvalidResponse("Missing shopName".to_string()));
        }
        Ok(suggestion)
    }

    /// Free-form assistant reply; the text is returned untouched
    pub async fn chat(
        &self,
        system: &str,
        history: &[ChatTurn],
        user_text: &str,
        audio: Option<&AudioInput>,
    ) -> Result<String, AIError> {
        let mut parts = Vec::new();
        if !user_text.trim().is_empty() {
            parts.push(InputPart::Text(user_text.to_string()));
        }
        if let Some(audio) = audio {
            parts.push(InputPart::Audio(audio));
        }
        if parts.is_empty() {
            return Err(AIError::InvalidInput("Message or audio is required".to_string()));
        }

        let request = ProviderRequest {
            system: system.to_string(),
            history,
            parts,
            expect_json: false,
        };

        self.complete(request).await
    }

    async fn complete(&self, request: ProviderRequest<'_>) -> Result<String, AIError> {
        let settings = self.settings_service.load_site_settings().await?;
        let (provider, credentials) = self.credentials_for(&settings)?;

        debug!(
            provider = %provider,
            model = %credentials.model,
            history = request.history.len(),
            json = request.expect_json,
            "Sending AI request"
        );

        match provider {
            AiProvider::OpenAI => openai::complete(&self.client, &credentials, &request).await,
            AiProvider::Gemini => gemini::complete(&self.client, &credentials, &request).await,
        }
    }

    fn credentials_for(
        &self,
        settings: &SiteSettings,
    ) -> Result<(AiProvider, ProviderCredentials), AIError> {
        let provider = settings.ai_provider.parse::<AiProvider>().unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to OpenAI");
            AiProvider::OpenAI
        });

        let (api_key, model, base_url) = match provider {
            AiProvider::OpenAI => (
                &settings.openai_api_key,
                &settings.openai_model,
                &self.openai_base_url,
            ),
            AiProvider::Gemini => (
                &settings.gemini_api_key,
                &settings.gemini_model,
                &self.gemini_base_url,
            ),
        };

        if api_key.trim().is_empty() {
            return Err(AIError::NotConfigured(provider.to_string()));
        }

        Ok((
            provider,
            ProviderCredentials {
                api_key: api_key.trim().to_string(),
                model: model.clone(),
                base_url: base_url.clone(),
            },
        ))
    }
}

/// Extract a JSON object from model output
///
/// Accepts bare JSON, JSON inside a Markdown code fence, or JSON surrounded by
/// prose (the outermost `{...}` is taken).
pub fn parse_json_payload<T: DeserializeOwned>(raw: &str) -> Result<T, AIError> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Ok(value);
    }

    if let Ok(fence) = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```") {
        if let Some(inner) = fence.captures(trimmed).and_then(|c| c.get(1)) {
            if let Ok(value) = serde_json::from_str::<T>(inner.as_str()) {
                return Ok(value);
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => serde_json::from_str::<T>(&trimmed[start..=end])
            .map_err(|e| AIError::InvalidResponse(e.to_string())),
        _ => Err(AIError::InvalidResponse(
            "No JSON object in model output".to_string(),
        )),
    }
}
