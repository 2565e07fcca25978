//! Process configuration.
//!
//! Resolved once at startup from the environment (`UROK_*` variables), with
//! an optional local `settings.toml` underneath for development. A missing
//! bot token fails the start immediately.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use engine::OperatorId;

fn default_store_path() -> String {
    "config".to_string()
}

fn default_store_name() -> String {
    "urok".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Telegram bot credential; the only mandatory value.
    pub bot_token: String,
    /// Directory holding the store document.
    #[serde(default = "default_store_path")]
    pub store_path: String,
    /// Name of the store document (without extension).
    #[serde(default = "default_store_name")]
    pub store_name: String,
    /// Comma-separated admin Telegram ids.
    #[serde(default)]
    pub admin_ids: String,
    /// Comma-separated allowed-operator Telegram ids.
    #[serde(default)]
    pub allowed_ids: String,
    #[serde(default = "default_level")]
    pub log_level: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("UROK"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn admin_operators(&self) -> Vec<OperatorId> {
        parse_id_list(&self.admin_ids)
    }

    pub fn allowed_operators(&self) -> Vec<OperatorId> {
        parse_id_list(&self.allowed_ids)
    }
}

fn parse_id_list(raw: &str) -> Vec<OperatorId> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<u64>() {
                Ok(id) => Some(OperatorId::new(id)),
                Err(_) => {
                    tracing::warn!(value = trimmed, "skipping malformed operator id");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_list_parses_and_skips_garbage() {
        assert_eq!(
            parse_id_list("100, 200,,abc, 300"),
            vec![
                OperatorId::new(100),
                OperatorId::new(200),
                OperatorId::new(300)
            ]
        );
        assert!(parse_id_list("").is_empty());
    }
}
