use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::analysis::prompt::{analysis_prompt, SYSTEM_PROMPT};
use crate::analysis::report::{parse_analysis, FinePrintAnalysis};
use crate::cli::config::AnalysisSettings;
use crate::error::AnalysisError;

pub const INPUT_TRUNCATION_MARKER: &str = "\n\n[... content truncated due to length ...]";

/// Turns normalized fine-print text into a structured analysis
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<FinePrintAnalysis, AnalysisError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Cap `text` at `max_chars` characters, marking the cut
pub fn prepare_input(text: &str, max_chars: usize) -> String {
    let length = text.chars().count();
    if length <= max_chars {
        return text.to_string();
    }

    warn!("Text too long ({} chars), truncating to {}", length, max_chars);
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str(INPUT_TRUNCATION_MARKER);
    truncated
}

/// Chat-completions client for OpenAI-compatible endpoints
pub struct OpenAiClient {
    client: Client,
    settings: AnalysisSettings,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(settings: AnalysisSettings) -> Result<Self, AnalysisError> {
        let api_key = settings.resolve_api_key().ok_or(AnalysisError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            settings,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl AnalysisClient for OpenAiClient {
    async fn analyze(&self, text: &str) -> Result<FinePrintAnalysis, AnalysisError> {
        let input = prepare_input(text, self.settings.max_input_chars);
        let prompt = analysis_prompt(&input);

        info!("Sending {} characters for analysis...", input.chars().count());

        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.settings.temperature,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Analysis API returned {}: {}", status, message);
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AnalysisError::EmptyResponse)?;

        debug!("Received {} characters from the model", content.len());

        let analysis = parse_analysis(&content)?;
        info!(
            "Analysis complete: Risk={}, Clarity={}",
            analysis.risk_score, analysis.clarity_score
        );

        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_input_truncates_with_marker() {
        let text = "é".repeat(12);
        let prepared = prepare_input(&text, 10);
        assert_eq!(prepared, format!("{}{}", "é".repeat(10), INPUT_TRUNCATION_MARKER));
        assert_eq!(prepare_input("short", 10), "short");
    }

    #[test]
    fn test_configured_key_and_endpoint() {
        let settings = AnalysisSettings {
            api_key: Some("sk-test".to_string()),
            api_base: "http://localhost:8080/v1/".to_string(),
            ..AnalysisSettings::default()
        };
        let client = OpenAiClient::new(settings).unwrap();
        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "gpt-4o",
            messages: vec![ChatMessage { role: "user", content: "hi" }],
            temperature: 0.3,
            response_format: ResponseFormat { kind: "json_object" },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
