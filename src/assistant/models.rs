// src/assistant/models.rs

use serde::{Deserialize, Serialize};

use crate::services::ai::{AudioInput, ChatTurn};

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatRequest {
    /// Client-held scroll-back, oldest first
    pub history: Vec<ChatTurn>,
    pub message: String,
    pub audio: Option<AudioInput>,
    pub language: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct AnalyzeListingRequest {
    /// data URLs or public URLs; only the first is analysed
    pub images: Vec<String>,
    pub language: Option<String>,
}
