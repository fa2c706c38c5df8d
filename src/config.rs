//! Environment configuration.

use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub nats_url: Option<String>,
    pub stripe_secret_key: String,
    pub stripe_api_base: String,
    pub currency: String,
    pub low_stock_threshold: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            database_url: var("DATABASE_URL").context("DATABASE_URL is not set")?,
            port: match var("PORT") {
                Some(raw) => raw.parse().context("PORT is not a valid port number")?,
                None => 8084,
            },
            nats_url: var("NATS_URL"),
            stripe_secret_key: var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_api_base: var("STRIPE_API_BASE")
                .unwrap_or_else(|| "https://api.stripe.com".to_string()),
            currency: var("CURRENCY").unwrap_or_else(|| "usd".to_string()),
            low_stock_threshold: match var("LOW_STOCK_THRESHOLD") {
                Some(raw) => raw.parse().context("LOW_STOCK_THRESHOLD is not a number")?,
                None => 10,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let env = vars(&[("DATABASE_URL", "postgres://localhost/store")]);
        let config = Config::from_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.port, 8084);
        assert_eq!(config.currency, "usd");
        assert_eq!(config.low_stock_threshold, 10);
        assert_eq!(config.stripe_api_base, "https://api.stripe.com");
        assert!(config.nats_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let env = vars(&[
            ("DATABASE_URL", "postgres://localhost/store"),
            ("PORT", "9000"),
            ("NATS_URL", "nats://localhost:4222"),
            ("LOW_STOCK_THRESHOLD", "5"),
        ]);
        let config = Config::from_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.nats_url.as_deref(), Some("nats://localhost:4222"));
        assert_eq!(config.low_stock_threshold, 5);
    }

    #[test]
    fn test_database_url_required() {
        let env = vars(&[]);
        assert!(Config::from_vars(|k| env.get(k).cloned()).is_err());
    }
}
