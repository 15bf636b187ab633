//! Model gateway: one call interface over the groq, openai and google hosted
//! chat APIs. A single call either returns text or fails; there is no retry,
//! caching or rate-limit handling at this layer.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;
use thiserror::Error;
use tokio::runtime::Runtime;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("{var} is not set ({provider} requests require it)")]
    MissingApiKey {
        var: &'static str,
        provider: &'static str,
    },
    #[error("{provider} request failed: {message}")]
    Invocation {
        provider: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Groq,
    OpenAi,
    Google,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "groq",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Google => "google",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "groq" => Some(LlmProvider::Groq),
            "openai" => Some(LlmProvider::OpenAi),
            "google" => Some(LlmProvider::Google),
            _ => None,
        }
    }

    /// Closed-set parse for provider names coming from user input.
    pub fn parse(value: &str) -> Result<Self, GatewayError> {
        Self::from_str(value).ok_or_else(|| GatewayError::UnknownProvider(value.to_string()))
    }

    fn key_var(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "GROQ_API_KEY",
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::Google => "GOOGLE_API_KEY",
        }
    }
}

pub fn default_model(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Groq => "llama3-8b-8192",
        LlmProvider::OpenAi => "gpt-3.5-turbo",
        LlmProvider::Google => "gemini-pro",
    }
}

#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    pub system: Option<String>,
    pub user: String,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl LlmResponse {
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// Thin handle bound to one provider, one model and a temperature. Stateless
/// beyond its configuration; build one per request.
#[derive(Clone, Debug)]
pub struct LlmClient {
    http: Client,
    provider: LlmProvider,
    model: String,
    temperature: f32,
    api_key: String,
}

impl LlmClient {
    /// Fails fast with an actionable message when the provider's key is
    /// absent from the environment.
    pub fn new(
        provider: LlmProvider,
        model: impl Into<String>,
        temperature: f32,
    ) -> Result<Self, GatewayError> {
        let var = provider.key_var();
        let api_key = env::var(var).map_err(|_| GatewayError::MissingApiKey {
            var,
            provider: provider.as_str(),
        })?;
        Ok(Self {
            http: Client::new(),
            provider,
            model: model.into(),
            temperature,
            api_key,
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub async fn chat(&self, req: &LlmRequest) -> Result<LlmResponse, GatewayError> {
        match self.provider {
            LlmProvider::Groq => {
                self.chat_openai_compatible("https://api.groq.com/openai/v1/chat/completions", req)
                    .await
            }
            LlmProvider::OpenAi => {
                let base = env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
                let url = format!("{}/chat/completions", base.trim_end_matches('/'));
                self.chat_openai_compatible(&url, req).await
            }
            LlmProvider::Google => self.chat_google(req).await,
        }
    }

    /// Blocking wrapper for synchronous call sites.
    pub fn chat_blocking(&self, req: &LlmRequest) -> Result<LlmResponse, GatewayError> {
        let rt = Runtime::new().map_err(|err| self.invocation(err.to_string()))?;
        rt.block_on(self.chat(req))
    }

    /// Groq exposes the same chat-completions wire shape as OpenAI.
    async fn chat_openai_compatible(
        &self,
        url: &str,
        req: &LlmRequest,
    ) -> Result<LlmResponse, GatewayError> {
        let mut messages = Vec::new();
        if let Some(system) = &req.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": req.user }));
        let payload = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": messages,
        });
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| self.invocation(err.to_string()))?;
        let value = self.decode_body(response).await?;
        let parsed: ChatResponse = serde_json::from_value(value)
            .map_err(|err| self.invocation(format!("malformed response: {err}")))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| self.invocation("missing text in response".to_string()))?;
        let usage = parsed.usage.unwrap_or_default();
        Ok(LlmResponse {
            content: text,
            prompt_tokens: usage.prompt_tokens.unwrap_or(0),
            completion_tokens: usage.completion_tokens.unwrap_or(0),
        })
    }

    async fn chat_google(&self, req: &LlmRequest) -> Result<LlmResponse, GatewayError> {
        let mut prompt = String::new();
        if let Some(system) = &req.system {
            prompt.push_str("[SYSTEM]\n");
            prompt.push_str(system.trim());
            prompt.push_str("\n\n");
        }
        prompt.push_str(&req.user);
        let payload = json!({
            "contents": [ { "parts": [ { "text": prompt } ] } ],
            "generationConfig": { "temperature": self.temperature },
        });
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| self.invocation(err.to_string()))?;
        let value = self.decode_body(response).await?;
        let parsed: GoogleResponse = serde_json::from_value(value)
            .map_err(|err| self.invocation(format!("malformed response: {err}")))?;
        let text = parsed
            .candidates
            .and_then(|mut candidates| candidates.pop())
            .and_then(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .find_map(|part| part.text)
            })
            .ok_or_else(|| self.invocation("missing text in response".to_string()))?;
        let usage = parsed.usage.unwrap_or_default();
        Ok(LlmResponse {
            content: text,
            prompt_tokens: usage.prompt_tokens.unwrap_or(0),
            completion_tokens: usage.completion_tokens.unwrap_or(0),
        })
    }

    async fn decode_body(&self, response: reqwest::Response) -> Result<Value, GatewayError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(self.invocation(format!("status {status}: {body}")));
        }
        serde_json::from_str(&body)
            .map_err(|err| self.invocation(format!("malformed response: {err}")))
    }

    fn invocation(&self, message: String) -> GatewayError {
        GatewayError::Invocation {
            provider: self.provider.as_str(),
            message,
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Default, Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct GoogleResponse {
    candidates: Option<Vec<GoogleCandidate>>,
    #[serde(rename = "usageMetadata")]
    usage: Option<GoogleUsage>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: GoogleContent,
}

#[derive(Deserialize)]
struct GoogleContent {
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    text: Option<String>,
}

#[derive(Default, Deserialize)]
struct GoogleUsage {
    #[serde(rename = "promptTokenCount")]
    prompt_tokens: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    completion_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_round_trip() {
        for provider in [LlmProvider::Groq, LlmProvider::OpenAi, LlmProvider::Google] {
            assert_eq!(LlmProvider::from_str(provider.as_str()), Some(provider));
        }
        assert_eq!(LlmProvider::from_str("GROQ"), Some(LlmProvider::Groq));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = LlmProvider::parse("bogus").unwrap_err();
        assert!(matches!(err, GatewayError::UnknownProvider(name) if name == "bogus"));
    }

    #[test]
    fn missing_key_error_names_the_variable() {
        env::remove_var("GOOGLE_API_KEY");
        let err = LlmClient::new(LlmProvider::Google, default_model(LlmProvider::Google), 0.3)
            .unwrap_err();
        match err {
            GatewayError::MissingApiKey { var, provider } => {
                assert_eq!(var, "GOOGLE_API_KEY");
                assert_eq!(provider, "google");
            }
            other => panic!("expected MissingApiKey, got {other:?}"),
        }
    }

    #[test]
    fn configured_client_exposes_its_handle_shape() {
        env::set_var("GROQ_API_KEY", "gsk-test");
        let client = LlmClient::new(LlmProvider::Groq, default_model(LlmProvider::Groq), 0.3)
            .unwrap();
        assert_eq!(client.provider(), LlmProvider::Groq);
        assert_eq!(client.model(), "llama3-8b-8192");
        assert_eq!(client.temperature(), 0.3);
    }

    #[test]
    fn default_models_match_providers() {
        assert_eq!(default_model(LlmProvider::Groq), "llama3-8b-8192");
        assert_eq!(default_model(LlmProvider::OpenAi), "gpt-3.5-turbo");
        assert_eq!(default_model(LlmProvider::Google), "gemini-pro");
    }
}
