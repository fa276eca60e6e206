// src/services/ai/gemini.rs
//! Gemini generateContent

use super::{AIError, ChatRole, InputPart, ProviderCredentials, ProviderRequest};
use crate::services::storage::split_data_url;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: u32,
}

fn inline_part(mime_type: &str, data: &str) -> Value {
    json!({ "inline_data": { "mime_type": mime_type, "data": data } })
}

/// Gemini only takes inline bytes, so remote image URLs are downloaded first
async fn user_parts(client: &Client, parts: &[InputPart<'_>]) -> Result<Vec<Value>, AIError> {
    let mut out = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            InputPart::Text(text) => out.push(json!({ "text": text })),
            InputPart::Audio(audio) => out.push(inline_part(&audio.mime_type, &audio.data)),
            InputPart::Image(source) => {
                if let Some((mime, data)) = split_data_url(source) {
                    out.push(inline_part(mime, data));
                } else {
                    out.push(fetch_remote_image(client, source).await?);
                }
            }
        }
    }
    Ok(out)
}

async fn fetch_remote_image(client: &Client, url: &str) -> Result<Value, AIError> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AIError::InvalidInput(
            "Image must be a data URL or an http(s) URL".to_string(),
        ));
    }

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AIError::RequestFailed(format!("Image download failed: {}", e)))?;
    if !response.status().is_success() {
        return Err(AIError::InvalidInput(format!(
            "Image download returned HTTP {}",
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| AIError::RequestFailed(e.to_string()))?;

    let mime = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .filter(|m| m.starts_with("image/"))
        .unwrap_or("image/jpeg");
    Ok(inline_part(mime, &BASE64.encode(&bytes)))
}

pub(super) fn build_body(request: &ProviderRequest<'_>, user_parts: Vec<Value>) -> Value {
    let mut contents: Vec<Value> = request
        .history
        .iter()
        .map(|turn| {
            let role = match turn.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "model",
            };
            json!({ "role": role, "parts": [{ "text": turn.content }] })
        })
        .collect();
    contents.push(json!({ "role": "user", "parts": user_parts }));

    let mut generation_config = json!({ "temperature": 0.4 });
    if request.expect_json {
        generation_config["responseMimeType"] = json!("application/json");
    }

    json!({
        "systemInstruction": { "parts": [{ "text": request.system }] },
        "contents": contents,
        "generationConfig": generation_config,
    })
}

pub(super) async fn complete(
    client: &Client,
    credentials: &ProviderCredentials,
    request: &ProviderRequest<'_>,
) -> Result<String, AIError> {
    let parts = user_parts(client, &request.parts).await?;
    let body = build_body(request, parts);
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        credentials.base_url, credentials.model
    );

    let response = client
        .post(&url)
        .query(&[("key", credentials.api_key.as_str())])
        .json(&body)
        .send()
        .await
        .map_err(|e| AIError::RequestFailed(e.without_url().to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!(status = %status, error = %error_text, "Gemini request failed");
        return Err(AIError::RequestFailed(format!("Gemini HTTP {}", status)));
    }

    let parsed = response
        .json::<GenerateContentResponse>()
        .await
        .map_err(|e| AIError::InvalidResponse(e.without_url().to_string()))?;

    if let Some(usage) = &parsed.usage_metadata {
        info!(model = %credentials.model, tokens_used = usage.total_token_count, "Gemini completion finished");
    }

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AIError::InvalidResponse("No candidates in response".to_string()));
    }
    Ok(text)
}
