use std::env;
use std::time::Duration;
use anyhow::{Context, Result};
use crate::models::session::MAX_LIFESPAN;

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The port the HTTP server listens on.
    pub port: u16,
    /// Maximum number of pooled database connections.
    pub db_pool_max_size: usize,
    /// How often the reaper sweeps expired sessions.
    pub sweep_interval: Duration,
    /// Initial distance from login to `expires_at`.
    pub session_idle_timeout: Duration,
    /// Distance from login to the fixed `end_of_life`.
    pub session_max_lifetime: Duration,
    /// How far a refresh pushes `expires_at`.
    pub session_extension: Duration,
    /// Origins allowed by the CORS layer.
    pub cors_allowed_origins: Vec<String>,
    /// Whether cookies are marked `Secure`.
    pub secure_cookies: bool,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Creates a new `Config` from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |key: &str, default: u64| -> Result<Duration> {
            let value = match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("Invalid {key}"))?,
                None => default,
            };
            if value == 0 {
                anyhow::bail!("{key} must be greater than zero");
            }
            let value = Duration::from_secs(value);
            if value > MAX_LIFESPAN {
                anyhow::bail!("{key} must be at most {} seconds", MAX_LIFESPAN.as_secs());
            }
            Ok(value)
        };

        let idle = secs("SESSION_IDLE_TIMEOUT_SECS", 3600)?;
        let lifetime = secs("SESSION_MAX_LIFETIME_SECS", 86_400)?;
        if lifetime < idle {
            anyhow::bail!("SESSION_MAX_LIFETIME_SECS must not be shorter than SESSION_IDLE_TIMEOUT_SECS");
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: lookup("PORT")
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("Invalid PORT")?,
            db_pool_max_size: lookup("DB_POOL_MAX_SIZE")
                .unwrap_or_else(|| "16".to_string())
                .parse()
                .context("Invalid DB_POOL_MAX_SIZE")?,
            sweep_interval: secs("SWEEP_INTERVAL_SECS", 600)?,
            session_idle_timeout: idle,
            session_max_lifetime: lifetime,
            session_extension: secs("SESSION_EXTENSION_SECS", 1800)?,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            secure_cookies: lookup("APP_ENV").as_deref() == Some("production"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/app")]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.sweep_interval, Duration::from_secs(600));
        assert_eq!(cfg.session_idle_timeout, Duration::from_secs(3600));
        assert_eq!(cfg.session_max_lifetime, Duration::from_secs(86_400));
        assert_eq!(cfg.session_extension, Duration::from_secs(1800));
        assert_eq!(cfg.cors_allowed_origins, vec!["http://localhost:3000"]);
        assert!(!cfg.secure_cookies);
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://localhost/app"),
            ("PORT", "9000"),
            ("SWEEP_INTERVAL_SECS", "30"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            ("APP_ENV", "production"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.sweep_interval, Duration::from_secs(30));
        assert_eq!(
            cfg.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(cfg.secure_cookies);
    }

    #[test]
    fn database_url_is_required() {
        assert!(config(&[]).is_err());
    }

    #[test]
    fn rejects_durations_beyond_the_lifespan_cap() {
        let too_long = (MAX_LIFESPAN.as_secs() + 1).to_string();
        assert!(config(&[("DATABASE_URL", "x"), ("SESSION_EXTENSION_SECS", &too_long)]).is_err());
        assert!(config(&[("DATABASE_URL", "x"), ("SESSION_MAX_LIFETIME_SECS", &too_long)]).is_err());

        let at_cap = MAX_LIFESPAN.as_secs().to_string();
        let cfg = config(&[("DATABASE_URL", "x"), ("SESSION_EXTENSION_SECS", &at_cap)]).unwrap();
        assert_eq!(cfg.session_extension, MAX_LIFESPAN);
    }

    #[test]
    fn rejects_zero_interval_and_short_lifetime() {
        assert!(config(&[("DATABASE_URL", "x"), ("SWEEP_INTERVAL_SECS", "0")]).is_err());
        assert!(
            config(&[
                ("DATABASE_URL", "x"),
                ("SESSION_IDLE_TIMEOUT_SECS", "7200"),
                ("SESSION_MAX_LIFETIME_SECS", "3600"),
            ])
            .is_err()
        );
    }
}
