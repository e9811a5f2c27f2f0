use std::env;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub api_base: String,
    pub text_model: String,
    pub image_model: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Sessions untouched for this long are evicted.
    pub session_ttl: chrono::Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            port: 8080,
            max_upload_bytes: 12 * 1024 * 1024,
            session_ttl: chrono::Duration::minutes(60),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str, fallback: String| {
            lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).unwrap_or(fallback)
        };
        Self {
            api_key: lookup("GEMINI_API_KEY").map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
            api_base: text("GEMINI_API_BASE", defaults.api_base).trim_end_matches('/').to_string(),
            text_model: text("GEMINI_TEXT_MODEL", defaults.text_model),
            image_model: text("GEMINI_IMAGE_MODEL", defaults.image_model),
            port: lookup("PORT").and_then(|v| v.trim().parse().ok()).unwrap_or(defaults.port),
            max_upload_bytes: lookup("MAX_UPLOAD_MB")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .and_then(|mb| mb.checked_mul(1024 * 1024))
                .unwrap_or(defaults.max_upload_bytes),
            session_ttl: lookup("SESSION_TTL_MINUTES")
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|minutes| *minutes > 0)
                .and_then(chrono::Duration::try_minutes)
                .unwrap_or(defaults.session_ttl),
        }
    }
}
