use std::path::Path;

use anyhow::{Context, Result};
use base64::prelude::*;
use chrono_tz::Tz;

use crate::models::{Config, Session};

pub fn load_config(path: &Path) -> Result<Config> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content)?;
    config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
    config.timezone()?;
    Ok(config)
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        self.api
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", self.api.timezone, e))
    }

    /// Apply CLI overrides on top of the file values.
    pub fn with_overrides(
        mut self,
        base_url: Option<&str>,
        token: Option<&str>,
        user_id: Option<&str>,
    ) -> Self {
        if let Some(url) = base_url {
            self.api.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(t) = token {
            self.session.token = Some(t.to_string());
        }
        if let Some(u) = user_id {
            self.session.user_id = Some(u.to_string());
        }
        self
    }
}

impl Session {
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user_id.is_none()
    }

    /// The configured user id, or the one carried in the token's JWT payload.
    pub fn resolved_user_id(&self) -> Option<String> {
        self.user_id
            .clone()
            .filter(|u| !u.is_empty())
            .or_else(|| self.token.as_deref().and_then(user_id_from_token))
    }
}

fn user_id_from_token(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = BASE64_URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    ["userId", "id", "sub"]
        .iter()
        .find_map(|k| claims.get(*k))
        .map(|v| v.to_string().trim_matches('"').to_string())
}
