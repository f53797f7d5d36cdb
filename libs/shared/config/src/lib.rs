use std::env;
use tracing::warn;

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama3-8b-8192";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub groq_api_key: String,
    pub groq_base_url: String,
    pub groq_model: String,
    pub server_port: u16,
    pub http_timeout_seconds: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .or_else(|_| env::var("SUPABASE_ANON_PUBLIC_KEY"))
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            groq_api_key: env::var("GROQ_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("GROQ_API_KEY not set, chat completions are disabled");
                    String::new()
                }),
            groq_base_url: env::var("GROQ_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GROQ_BASE_URL.to_string()),
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| DEFAULT_GROQ_MODEL.to_string()),
            server_port: parse_or_default("SERVER_PORT", 3000),
            http_timeout_seconds: parse_or_default("HTTP_TIMEOUT_SECONDS", 10),
        };

        if !config.is_configured() {
            warn!("Supabase not configured - falling back to in-memory stores");
        }

        config
    }

    /// True when a PostgREST backend is available.
    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }

    pub fn is_llm_configured(&self) -> bool {
        !self.groq_api_key.is_empty() && !self.groq_base_url.is_empty()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            groq_api_key: String::new(),
            groq_base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            groq_model: DEFAULT_GROQ_MODEL.to_string(),
            server_port: 3000,
            http_timeout_seconds: 10,
        }
    }
}

fn parse_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_not_configured() {
        let config = AppConfig::default();
        assert!(!config.is_configured());
        assert!(!config.is_llm_configured());
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn configured_when_url_and_key_present() {
        let config = AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "service-key".to_string(),
            ..AppConfig::default()
        };
        assert!(config.is_configured());
    }
}
