use crate::error::LlmError;

/// One outbound analysis call: instruction text plus a single image.
///
/// Built fresh per user action and discarded once the call completes;
/// a fallback retry builds a new request rather than mutating this one.
#[derive(Clone, Debug)]
pub struct VisionRequest<'a> {
    pub model: &'a str,
    pub system_instruction: &'a str,
    pub user_prompt: &'a str,
    pub image: &'a [u8],
    pub image_mime: &'a str,
    pub temperature: f32,
    /// Reasoning-token budget for models that support it. Backends that
    /// cannot guarantee support ignore it.
    pub thinking_budget: Option<u32>,
}

pub trait VisionProvider: Send + Sync {
    /// Send the request and return the raw response text.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails or the backend rejects the call.
    fn generate(
        &self,
        request: &VisionRequest<'_>,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    fn name(&self) -> &str;
}
