//! HTTP narrator against an OpenAI-compatible chat-completion endpoint.
//!
//! Model-agnostic: anything speaking the `/chat/completions` shape works.
//! World payloads come back as JSON text which is parsed into [`WorldData`];
//! a model that wraps the object in code fences is tolerated.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{NarrativeError, Narrator, prompts};
use crate::world::WorldData;

pub struct LlmNarrator {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    character: String,
    depth: u32,
}

impl LlmNarrator {
    pub fn new(api_key: String, api_url: String, model: String, character: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            character,
            depth: 0,
        }
    }

    /// Configuration from the environment.
    ///
    /// Required: `LLM_API_KEY`
    /// Optional: `LLM_API_URL`, `LLM_MODEL`
    pub fn from_env(character: String) -> Result<Self, NarrativeError> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| NarrativeError::Config("LLM_API_KEY not set".into()))?;
        let api_url = std::env::var("LLM_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".into());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Ok(Self::new(api_key, api_url, model, character))
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, NarrativeError> {
        let request = ChatRequest {
            model: self.model.clone(),
            max_tokens: 4096,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| NarrativeError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Transport(format!("API error: {error_text}")));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| NarrativeError::Transport(e.to_string()))?;

        completion
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or(NarrativeError::Empty)
    }
}

impl Narrator for LlmNarrator {
    async fn generate_world(&mut self, prompt: &str) -> Result<WorldData, NarrativeError> {
        let text = self
            .complete("You are a dungeon world generator.", prompt)
            .await?;
        let world = WorldData::from_json(strip_fences(&text))?;
        self.depth += 1;
        Ok(world)
    }

    async fn send_turn(&mut self, message: &str) -> Result<String, NarrativeError> {
        let context = format!(
            "{message}\n(Character: {}. Dungeon depth: {}.)",
            self.character, self.depth
        );
        self.complete(prompts::DM_INSTRUCTION, &context).await
    }

    async fn send_telemetry(&mut self, line: &str) -> Result<String, NarrativeError> {
        self.complete(prompts::TELEMETRY_INSTRUCTION, line).await
    }
}

/// Models love wrapping JSON in markdown fences; peel them off.
fn strip_fences(text: &str) -> &str {
    let t = text.trim();
    let t = t
        .strip_prefix("```json")
        .or_else(|| t.strip_prefix("```"))
        .unwrap_or(t);
    t.strip_suffix("```").unwrap_or(t).trim()
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn from_env_requires_a_key() {
        if std::env::var("LLM_API_KEY").is_err() {
            assert!(LlmNarrator::from_env("a hero".into()).is_err());
        }
    }

    #[test]
    fn fenced_world_payload_parses() {
        let text = "```json\n{\"map\": [[1,1],[1,1]], \"playerStart\": {\"x\":0.5,\"y\":0.5}}\n```";
        let world = WorldData::from_json(strip_fences(text)).unwrap();
        assert_eq!(world.map.width(), 2);
    }
}
