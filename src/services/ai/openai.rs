// src/services/ai/openai.rs
//! OpenAI chat completions

use super::{AIError, ChatRole, InputPart, ProviderCredentials, ProviderRequest};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// `input_audio` only knows wav and mp3; other recordings are refused up front
fn audio_format(mime_type: &str) -> Result<&'static str, AIError> {
    let mime = mime_type.to_lowercase();
    if mime.contains("mp3") || mime.contains("mpeg") {
        Ok("mp3")
    } else if mime.contains("wav") {
        Ok("wav")
    } else {
        Err(AIError::InvalidInput(format!(
            "Audio format '{}' is not supported by OpenAI, use wav or mp3",
            mime_type
        )))
    }
}

fn user_content(parts: &[InputPart<'_>]) -> Result<Value, AIError> {
    let content = parts
        .iter()
        .map(|part| -> Result<Value, AIError> {
            Ok(match part {
                InputPart::Text(text) => json!({ "type": "text", "text": text }),
                InputPart::Image(url) => json!({
                    "type": "image_url",
                    "image_url": { "url": url }
                }),
                InputPart::Audio(audio) => {
                    let format = audio_format(&audio.mime_type)?;
                    json!({
                        "type": "input_audio",
                        "input_audio": { "data": audio.data, "format": format }
                    })
                }
            })
        })
        .collect::<Result<Vec<Value>, AIError>>()?;
    Ok(Value::Array(content))
}

pub(super) fn build_body(model: &str, request: &ProviderRequest<'_>) -> Result<Value, AIError> {
    let mut messages = vec![json!({ "role": "system", "content": request.system })];

    for turn in request.history {
        let role = match turn.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };
        messages.push(json!({ "role": role, "content": turn.content }));
    }

    messages.push(json!({ "role": "user", "content": user_content(&request.parts)? }));

    let mut body = json!({
        "model": model,
        "messages": messages,
        "temperature": 0.4,
    });
    if request.expect_json {
        body["response_format"] = json!({ "type": "json_object" });
    }
    Ok(body)
}

pub(super) async fn complete(
    client: &Client,
    credentials: &ProviderCredentials,
    request: &ProviderRequest<'_>,
) -> Result<String, AIError> {
    let url = format!("{}/v1/chat/completions", credentials.base_url);
    let body = build_body(&credentials.model, request)?;

    let response = client
        .post(&url)
        .bearer_auth(&credentials.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| AIError::RequestFailed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!(status = %status, error = %error_text, "OpenAI request failed");
        return Err(AIError::RequestFailed(format!("OpenAI HTTP {}", status)));
    }

    let parsed = response
        .json::<ChatCompletionResponse>()
        .await
        .map_err(|e| AIError::InvalidResponse(e.to_string()))?;

    if let Some(usage) = &parsed.usage {
        info!(model = %credentials.model, tokens_used = usage.total_tokens, "OpenAI completion finished");
    }

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AIError::InvalidResponse("No choices in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai::{AudioInput, ChatTurn};

    #[test]
    fn test_body_carries_history_image_and_json_mode() {
        let history = vec![
            ChatTurn { role: ChatRole::User, content: "hi".to_string() },
            ChatTurn { role: ChatRole::Assistant, content: "hello".to_string() },
        ];
        let request = ProviderRequest {
            system: "sys".to_string(),
            history: &history,
            parts: vec![
                InputPart::Text("what is this".to_string()),
                InputPart::Image("data:image/png;base64,AAAA"),
            ],
            expect_json: true,
        };

        let body = build_body("gpt-4o-mini", &request).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["content"][1]["image_url"]["url"], "data:image/png;base64,AAAA");
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_audio_part_and_plain_text_mode() {
        let audio = AudioInput { data: "UklGRg==".to_string(), mime_type: "audio/mpeg".to_string() };
        let request = ProviderRequest {
            system: "sys".to_string(),
            history: &[],
            parts: vec![InputPart::Audio(&audio)],
            expect_json: false,
        };

        let body = build_body("gpt-4o-mini", &request).unwrap();
        assert!(body.get("response_format").is_none());
        let part = &body["messages"][1]["content"][0];
        assert_eq!(part["type"], "input_audio");
        assert_eq!(part["input_audio"]["format"], "mp3");
        assert_eq!(audio_format("audio/wav").unwrap(), "wav");
        assert_eq!(audio_format("audio/x-wav").unwrap(), "wav");
    }

    #[test]
    fn test_browser_recording_formats_are_refused() {
        for mime in ["audio/webm", "audio/ogg;codecs=opus"] {
            let audio = AudioInput { data: "GkXfow==".to_string(), mime_type: mime.to_string() };
            let request = ProviderRequest {
                system: "sys".to_string(),
                history: &[],
                parts: vec![InputPart::Audio(&audio)],
                expect_json: false,
            };
            assert!(matches!(
                build_body("gpt-4o-mini", &request),
                Err(AIError::InvalidInput(_))
            ));
        }
    }
}
