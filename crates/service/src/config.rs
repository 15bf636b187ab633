use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use finsight_llm::{default_model, LlmProvider};

/// Service defaults, overridable per request. Environment wins over the
/// optional `finsight.toml` file.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: LlmProvider,
    pub model: Option<String>,
    pub temperature: f32,
    pub bind_addr: String,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    provider: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    bind_addr: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let file = load_file_config();
        let provider_name = env::var("FINSIGHT_PROVIDER")
            .ok()
            .or(file.provider)
            .unwrap_or_else(|| "groq".to_string());
        let provider = LlmProvider::from_str(&provider_name)
            .ok_or_else(|| anyhow!("unknown provider {provider_name}"))?;
        let temperature = env::var("FINSIGHT_TEMPERATURE")
            .ok()
            .and_then(|value| value.parse().ok())
            .or(file.temperature)
            .unwrap_or(0.3)
            .clamp(0.0, 1.0);
        let model = env::var("FINSIGHT_MODEL").ok().or(file.model);
        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .or(file.bind_addr)
            .unwrap_or_else(|| "0.0.0.0:8000".to_string());
        Ok(Self {
            provider,
            model,
            temperature,
            bind_addr,
        })
    }

    /// The configured model override, or the provider's default.
    pub fn model_for(&self, provider: LlmProvider) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| default_model(provider).to_string())
    }
}

fn load_file_config() -> FileConfig {
    let config_path = env::var("FINSIGHT_CONFIG").unwrap_or_else(|_| "finsight.toml".to_string());
    let path = Path::new(&config_path);
    if !path.exists() {
        return FileConfig::default();
    }
    match fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => FileConfig::default(),
    }
}
