//! Adapter config: bot credentials, API base, logging. Loaded from env.

use std::env;

use serde::Deserialize;

use crate::error::{AdapterError, Result};

/// Open-platform API base used when DODO_API_BASE is not set.
pub const DEFAULT_API_BASE: &str = "https://botopen.imdodo.com/api/v2";

/// One bot credential: client id plus secret token.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub client_id: String,
    pub token: String,
}

/// Adapter-level config: the set of bots plus API base and log file.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub bots: Vec<BotConfig>,
    /// DODO_API_BASE
    pub api_base: String,
    /// LOG_FILE
    pub log_file: String,
}

impl AdapterConfig {
    /// Load from environment variables. Bots come from either `DODO_BOTS`
    /// (a JSON list of `{"client_id": "...", "token": "..."}`) or the single
    /// `DODO_CLIENT_ID` / `DODO_TOKEN` pair.
    pub fn load() -> Result<Self> {
        let mut bots: Vec<BotConfig> = match env::var("DODO_BOTS") {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| AdapterError::Config(format!("DODO_BOTS is not valid JSON: {e}")))?,
            Err(_) => Vec::new(),
        };
        if let (Ok(client_id), Ok(token)) = (env::var("DODO_CLIENT_ID"), env::var("DODO_TOKEN")) {
            bots.push(BotConfig { client_id, token });
        }

        let api_base = env::var("DODO_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/dodo-bot.log".to_string());

        Ok(Self {
            bots,
            api_base,
            log_file,
        })
    }

    /// Validate config: at least one bot, non-empty credentials, parseable API base.
    pub fn validate(&self) -> Result<()> {
        if self.bots.is_empty() {
            return Err(AdapterError::Config(
                "no bots configured (set DODO_CLIENT_ID/DODO_TOKEN or DODO_BOTS)".to_string(),
            ));
        }
        for bot in &self.bots {
            if bot.client_id.is_empty() || bot.token.is_empty() {
                return Err(AdapterError::Config(format!(
                    "bot {:?} has an empty client_id or token",
                    bot.client_id
                )));
            }
        }
        if reqwest::Url::parse(&self.api_base).is_err() {
            return Err(AdapterError::Config(format!(
                "DODO_API_BASE is not a valid URL: {}",
                self.api_base
            )));
        }
        Ok(())
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            bots: Vec::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            log_file: "logs/dodo-bot.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(bots: Vec<BotConfig>) -> AdapterConfig {
        AdapterConfig {
            bots,
            ..AdapterConfig::default()
        }
    }

    #[test]
    fn test_validate_empty_bots() {
        assert!(config_with(vec![]).validate().is_err());
    }

    #[test]
    fn test_validate_empty_token() {
        let cfg = config_with(vec![BotConfig {
            client_id: "123".to_string(),
            token: String::new(),
        }]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_ok() {
        let cfg = config_with(vec![BotConfig {
            client_id: "123".to_string(),
            token: "secret".to_string(),
        }]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_bots_json_parses() {
        let bots: Vec<BotConfig> =
            serde_json::from_str(r#"[{"client_id": "1", "token": "a"}, {"client_id": "2", "token": "b"}]"#)
                .unwrap();
        assert_eq!(bots.len(), 2);
        assert_eq!(bots[1].client_id, "2");
    }
}
