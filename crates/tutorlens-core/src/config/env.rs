use super::{Config, Secret};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("API_KEY")
            && !v.trim().is_empty()
        {
            self.llm.api_key = Some(Secret::new(v));
        }
        // An empty API_BASE_URL means "no proxy", same as unset.
        if let Ok(v) = std::env::var("API_BASE_URL") {
            self.llm.base_url = if v.trim().is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = std::env::var("ACCESS_CODE")
            && !v.trim().is_empty()
        {
            self.gateway.access_code = Some(v);
        }
        if let Ok(v) = std::env::var("TUTORLENS_PRIMARY_MODEL") {
            self.llm.primary_model = v;
        }
        if let Ok(v) = std::env::var("TUTORLENS_FALLBACK_MODEL") {
            self.llm.fallback_model = v;
        }
        if let Ok(v) = std::env::var("TUTORLENS_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Ok(v) = std::env::var("TUTORLENS_GATEWAY_PORT")
            && let Ok(port) = v.parse::<u16>()
        {
            self.gateway.port = port;
        }
    }
}
