use serde::{Deserialize, Serialize};

use crate::solver::SolverSettings;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Only set through the environment, never through the config file.
    #[serde(skip)]
    pub api_key: Option<Secret>,
    /// Presence of a base URL selects the OpenAI-compatible backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_primary_model")]
    pub primary_model: String,
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            primary_model: default_primary_model(),
            fallback_model: default_fallback_model(),
            temperature: default_temperature(),
            thinking_budget: default_thinking_budget(),
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub fn solver_settings(&self) -> SolverSettings {
        SolverSettings {
            primary_model: self.primary_model.clone(),
            fallback_model: self.fallback_model.clone(),
            temperature: self.temperature,
            thinking_budget: self.thinking_budget,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bearer token required on API routes when set. Environment only.
    #[serde(skip)]
    pub access_code: Option<String>,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            access_code: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_primary_model() -> String {
    "gemini-3-pro-preview".into()
}

fn default_fallback_model() -> String {
    "gemini-3-flash-preview".into()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_thinking_budget() -> Option<u32> {
    Some(2048)
}

fn default_bind() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    8 * 1024 * 1024
}

/// Wrapper that keeps secret values out of logs and debug output.
#[derive(Clone, Deserialize, Serialize)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub fn new(value: String) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}
