//! Test-only mock vision provider.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::error::LlmError;
use crate::provider::{VisionProvider, VisionRequest};

/// Scripted provider for orchestration tests.
///
/// Results are consumed in order; once the script is exhausted the default
/// response is returned. Every call records the requested model id and
/// thinking budget so tests can assert fallback behavior. Gates let a test
/// hold a call open until it is released or aborted.
#[derive(Debug, Clone)]
pub struct MockProvider {
    script: Arc<Mutex<Vec<Result<String, LlmError>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    gates: Arc<Mutex<Vec<Arc<Notify>>>>,
    pub default_response: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub model: String,
    pub thinking_budget: Option<u32>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            script: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            gates: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_script(script: Vec<Result<String, LlmError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            ..Self::default()
        }
    }

    /// Gates consumed in call order: each gated call blocks until its
    /// `Notify` fires (or the call is cancelled). Calls beyond the gate
    /// list resolve immediately.
    #[must_use]
    pub fn with_gates(self, gates: Vec<Arc<Notify>>) -> Self {
        Self {
            gates: Arc::new(Mutex::new(gates)),
            ..self
        }
    }

    /// Calls observed so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl VisionProvider for MockProvider {
    async fn generate(&self, request: &VisionRequest<'_>) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: request.model.to_owned(),
            thinking_budget: request.thinking_budget,
        });
        let gate = {
            let mut gates = self.gates.lock().unwrap();
            if gates.is_empty() {
                None
            } else {
                Some(gates.remove(0))
            }
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            Ok(self.default_response.clone())
        } else {
            script.remove(0)
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}
