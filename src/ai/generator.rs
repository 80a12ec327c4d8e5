use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::GeneratedIdea;

/// Turns one article excerpt into product ideas.
#[async_trait]
pub trait IdeaGenerator: Send + Sync {
    /// Fails with [`AppError::Generation`] when the model reply does not match
    /// the expected shape.
    async fn generate(&self, text: &str, allowed_tags: &[String]) -> Result<Vec<GeneratedIdea>>;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdeasEnvelope {
    ideas: Vec<GeneratedIdea>,
}

const FORMAT_INSTRUCTIONS: &str = r#"Answer with a single JSON object and nothing else, shaped like:
{"ideas": [{"title": string, "description": string, "tags": [string]}]}
- "title": short name of the business/product idea.
- "description": what the MVP (minimum viable product) does.
- "tags": keys picked from TAGS that categorise the idea; snake_case for any new key."#;

pub struct OpenAiIdeaGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    ideas_per_inspiration: u32,
}

impl OpenAiIdeaGenerator {
    pub fn new(config: &Config) -> Result<Self> {
        // large batches of ideas take minutes to come back
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
            temperature: config.temperature,
            ideas_per_inspiration: config.ideas_per_inspiration,
        })
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn model_version(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl IdeaGenerator for OpenAiIdeaGenerator {
    async fn generate(&self, text: &str, allowed_tags: &[String]) -> Result<Vec<GeneratedIdea>> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(text, allowed_tags, self.ideas_per_inspiration),
            }],
        };

        let response = self
            .client
            .post(self.chat_completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(AppError::OpenAiApi(format!("{}: {}", status, error_text)));
        }

        let chat: ChatResponse = response.json().await?;
        let completion = chat
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| AppError::Generation("empty completion".into()))?;

        parse_ideas(&completion)
    }
}

pub fn build_prompt(article: &str, allowed_tags: &[String], count: u32) -> String {
    format!(
        "You come up with new business and product ideas for an entrepreneur able to build anything.\n\
         Each idea has to grow out of the article below: no generic ideas and no copies of the \
         product the article talks about. Aim for ideas that are fresh and inventive.\n\
         TAGS: [{tags}]\n\n\
         {format}\n\n\
         Article:\n{article}\n\n\
         Give {count} ideas.",
        tags = allowed_tags.join(","),
        format = FORMAT_INSTRUCTIONS,
    )
}

fn fenced_json() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").ok())
        .as_ref()
}

/// Validate a model reply against the ideas schema.
/// A reply wrapped in a ```json fence is accepted.
pub fn parse_ideas(raw: &str) -> Result<Vec<GeneratedIdea>> {
    let payload = fenced_json()
        .and_then(|re| re.captures(raw))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw)
        .trim();

    let envelope: IdeasEnvelope = serde_json::from_str(payload)
        .map_err(|e| AppError::Generation(format!("reply does not match schema: {}", e)))?;

    Ok(envelope.ideas)
}
