use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Tesseract CLI used by the OCR extractor.
    pub tesseract_bin: String,
    pub tesseract_lang: String,
    pub max_upload_bytes: usize,
    /// Text printed at the bottom of every rendered page. Empty means no footer text.
    pub print_footer: String,
    /// Delay between opening the print context and invoking the print action.
    pub print_settle_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
            tesseract_bin: optional_env("TESSERACT_BIN", "tesseract"),
            tesseract_lang: optional_env("TESSERACT_LANG", "eng"),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            print_footer: optional_env("PRINT_FOOTER", ""),
            print_settle_ms: parse_env("PRINT_SETTLE_MS", 500)
                .context("PRINT_SETTLE_MS must be a number of milliseconds")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}
