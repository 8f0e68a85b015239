//! Primary/fallback solve orchestration.

use tracing::{debug, warn};
use tutorlens_llm::any::AnyProvider;
use tutorlens_llm::compatible::CompatibleProvider;
use tutorlens_llm::gemini::GeminiProvider;
use tutorlens_llm::{LlmError, VisionProvider, VisionRequest};

use crate::config::Config;
use crate::normalize::{self, Analysis, NormalizeError};
use crate::prompt::{self, Language};

/// Model selection and sampling knobs for a solve run.
#[derive(Debug, Clone)]
pub struct SolverSettings {
    pub primary_model: String,
    pub fallback_model: String,
    pub temperature: f32,
    /// Reasoning token budget for the primary call. Never sent to the
    /// fallback model, which is tuned for latency.
    pub thinking_budget: Option<u32>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            primary_model: "gemini-3-pro-preview".into(),
            fallback_model: "gemini-3-flash-preview".into(),
            temperature: 0.2,
            thinking_budget: Some(2048),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Sends a photographed question to the configured backend and validates
/// the result. A failed primary call is retried at most once on the
/// fallback model, and only for failures a different model could survive.
#[derive(Debug, Clone)]
pub struct Solver {
    provider: AnyProvider,
    settings: SolverSettings,
}

impl Solver {
    #[must_use]
    pub fn new(provider: AnyProvider, settings: SolverSettings) -> Self {
        Self { provider, settings }
    }

    /// Builds a solver from loaded configuration. Backend selection happens
    /// here, exactly once: a configured base URL means an OpenAI-compatible
    /// proxy, otherwise the native Gemini endpoint is used.
    pub fn from_config(config: &Config) -> Result<Self, SolveError> {
        let api_key = config
            .llm
            .api_key
            .as_ref()
            .map(|k| k.expose().to_owned())
            .filter(|k| !k.trim().is_empty())
            .ok_or(SolveError::MissingApiKey)?;

        let provider = match config.llm.base_url.as_deref() {
            Some(base_url) if !base_url.trim().is_empty() => {
                AnyProvider::Compatible(CompatibleProvider::new(api_key, base_url.to_owned()))
            }
            _ => AnyProvider::Gemini(GeminiProvider::new(api_key)),
        };

        Ok(Self::new(provider, config.llm.solver_settings()))
    }

    #[must_use]
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Full pipeline: generate, then normalize. Normalization failures are
    /// terminal; re-asking a model that already answered wastes quota.
    pub async fn solve(
        &self,
        image: &[u8],
        image_mime: &str,
        lang: Language,
    ) -> Result<Analysis, SolveError> {
        let raw = self.generate_with_fallback(image, image_mime, lang).await?;
        Ok(normalize::normalize(&raw, lang)?)
    }

    async fn generate_with_fallback(
        &self,
        image: &[u8],
        image_mime: &str,
        lang: Language,
    ) -> Result<String, LlmError> {
        let system_instruction = prompt::system_instruction(lang);
        let user_prompt = prompt::user_prompt(lang);

        let primary = VisionRequest {
            model: &self.settings.primary_model,
            system_instruction,
            user_prompt,
            image,
            image_mime,
            temperature: self.settings.temperature,
            thinking_budget: self.settings.thinking_budget,
        };

        debug!(
            provider = self.provider.name(),
            model = %self.settings.primary_model,
            "sending vision request"
        );
        match self.provider.generate(&primary).await {
            Ok(raw) => Ok(raw),
            Err(e) if e.allows_fallback() => {
                warn!(
                    model = %self.settings.primary_model,
                    fallback = %self.settings.fallback_model,
                    error = %e,
                    "primary model failed, retrying on fallback"
                );
                let fallback = VisionRequest {
                    model: &self.settings.fallback_model,
                    thinking_budget: None,
                    ..primary
                };
                self.provider.generate(&fallback).await
            }
            Err(e) => Err(e),
        }
    }
}
