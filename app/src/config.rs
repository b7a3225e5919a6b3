//! Configuration loaded from environment variables with defaults.

use std::env;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// The demo user's id
    pub demo_user: String,
    /// The demo user's display name
    pub demo_user_name: String,
    /// Whether to seed demo events at startup
    pub seed_demo_data: bool,
}

impl Config {
    /// Load configuration from the environment, reading `.env` first if
    /// present.
    #[must_use]
    pub fn from_env() -> Self {
        // Missing .env is fine; real env vars still apply.
        let _ = dotenvy::dotenv();

        Self {
            log_filter: env::var("MONOS_LOG").unwrap_or_else(|_| "monos=info".to_string()),
            demo_user: env::var("MONOS_DEMO_USER").unwrap_or_else(|_| "demo_user".to_string()),
            demo_user_name: env::var("MONOS_DEMO_USER_NAME")
                .unwrap_or_else(|_| "デモユーザー".to_string()),
            seed_demo_data: env::var("MONOS_SEED")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_env() {
        let config = Config::from_env();
        assert!(!config.log_filter.is_empty());
        assert!(!config.demo_user.is_empty());
    }
}
