use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::domains::chatrooms::broker::DEFAULT_CHAT_SUBJECT;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// When unset, chat fan-out stays in-process (single instance).
    pub nats_url: Option<String>,
    pub chat_subject: String,
    pub purge_abandoned_rooms: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "dealroom".to_string()),
            nats_url: env::var("NATS_URL").ok().filter(|url| !url.trim().is_empty()),
            chat_subject: env::var("CHAT_SUBJECT")
                .unwrap_or_else(|_| DEFAULT_CHAT_SUBJECT.to_string()),
            purge_abandoned_rooms: parse_flag(
                "PURGE_ABANDONED_ROOMS",
                env::var("PURGE_ABANDONED_ROOMS").ok(),
                true,
            )?,
        })
    }
}

fn parse_flag(name: &str, raw: Option<String>, default: bool) -> Result<bool> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("no") => Ok(false),
        Some(other) => anyhow::bail!("{} must be true or false, got {:?}", name, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("X", None, true).unwrap());
        assert!(!parse_flag("X", Some("false".to_string()), true).unwrap());
        assert!(parse_flag("X", Some(" 1 ".to_string()), false).unwrap());
        assert!(parse_flag("X", Some("maybe".to_string()), true).is_err());
    }
}
