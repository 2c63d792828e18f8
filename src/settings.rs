//! Runtime settings from environment (and `.env` when present).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8081;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is not valid: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        PoolSettings {
            max_connections: 5,
            min_connections: 0,
            idle_timeout: Duration::from_millis(10_000),
        }
    }
}

/// Where the database lives: one connection string, or a structured local setup.
#[derive(Clone, Debug, PartialEq)]
pub enum DatabaseTarget {
    Url(String),
    Local {
        host: String,
        port: u16,
        database: String,
        username: String,
        password: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct DatabaseSettings {
    pub target: DatabaseTarget,
    pub pool: PoolSettings,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SmsSettings {
    pub api_key: String,
    pub api_secret: String,
    pub from_number: String,
    pub base_url: String,
}

impl SmsSettings {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty() && !self.from_number.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AuthSettings {
    pub issuer: String,
    pub client_id: String,
    pub jwks_uri: String,
    pub audience: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub bind_addr: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub database: DatabaseSettings,
    pub sms: SmsSettings,
    pub auth: AuthSettings,
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let target = match get("DATABASE_URL") {
            Some(url) => DatabaseTarget::Url(url),
            None => DatabaseTarget::Local {
                host: get("DB_HOST").unwrap_or_else(|| "localhost".into()),
                port: parse_or(get("DB_PORT"), "DB_PORT", 5432)?,
                database: get("DB_NAME").unwrap_or_else(|| "postgres".into()),
                username: get("DB_USER").unwrap_or_else(|| "postgres".into()),
                password: get("DB_PASSWORD"),
            },
        };
        let defaults = PoolSettings::default();
        let pool = PoolSettings {
            max_connections: parse_or(get("DB_POOL_MAX"), "DB_POOL_MAX", defaults.max_connections)?,
            min_connections: parse_or(get("DB_POOL_MIN"), "DB_POOL_MIN", defaults.min_connections)?,
            idle_timeout: Duration::from_millis(parse_or(
                get("DB_POOL_IDLE_MS"),
                "DB_POOL_IDLE_MS",
                defaults.idle_timeout.as_millis() as u64,
            )?),
        };

        let issuer = get("OKTA_ISSUER")
            .ok_or(SettingsError::Missing("OKTA_ISSUER"))?
            .trim_end_matches('/')
            .to_string();
        let client_id = get("OKTA_CLIENT_ID").ok_or(SettingsError::Missing("OKTA_CLIENT_ID"))?;
        let jwks_uri = get("OKTA_JWKS_URI").unwrap_or_else(|| format!("{}/v1/keys", issuer));

        Ok(Settings {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(get("PORT"), "PORT", DEFAULT_PORT)?,
            static_dir: PathBuf::from(get("STATIC_DIR").unwrap_or_else(|| "dist".into())),
            database: DatabaseSettings { target, pool },
            sms: SmsSettings {
                api_key: get("NEXMO_API_KEY").unwrap_or_default(),
                api_secret: get("NEXMO_API_SECRET").unwrap_or_default(),
                from_number: get("NEXMO_NUMBER").unwrap_or_default(),
                base_url: get("NEXMO_BASE_URL")
                    .unwrap_or_else(|| "https://rest.nexmo.com".into())
                    .trim_end_matches('/')
                    .to_string(),
            },
            auth: AuthSettings {
                issuer,
                client_id,
                jwks_uri,
                audience: get("OKTA_AUDIENCE"),
            },
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &'static str, default: T) -> Result<T, SettingsError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| SettingsError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| env.get(k).cloned())
    }

    const AUTH: [(&str, &str); 2] = [
        ("OKTA_ISSUER", "https://idp.example.com/oauth2/default/"),
        ("OKTA_CLIENT_ID", "client-123"),
    ];

    #[test]
    fn defaults_apply() {
        let s = settings(&AUTH).unwrap();
        assert_eq!(s.port, 8081);
        assert_eq!(s.bind_addr, "0.0.0.0");
        assert_eq!(s.static_dir, PathBuf::from("dist"));
        assert_eq!(s.database.pool, PoolSettings::default());
        assert!(matches!(
            s.database.target,
            DatabaseTarget::Local { ref host, port: 5432, .. } if host == "localhost"
        ));
        assert_eq!(s.auth.issuer, "https://idp.example.com/oauth2/default");
        assert_eq!(s.auth.jwks_uri, "https://idp.example.com/oauth2/default/v1/keys");
        assert_eq!(s.sms.base_url, "https://rest.nexmo.com");
        assert!(!s.sms.is_configured());
    }

    #[test]
    fn database_url_wins_over_structured_config() {
        let mut env = AUTH.to_vec();
        env.push(("DATABASE_URL", "postgres://u:p@db:5432/bikes"));
        env.push(("DB_HOST", "ignored"));
        let s = settings(&env).unwrap();
        assert_eq!(
            s.database.target,
            DatabaseTarget::Url("postgres://u:p@db:5432/bikes".into())
        );
    }

    #[test]
    fn port_and_pool_are_parsed() {
        let mut env = AUTH.to_vec();
        env.extend([("PORT", "9000"), ("DB_POOL_MAX", "12"), ("DB_POOL_IDLE_MS", "500")]);
        let s = settings(&env).unwrap();
        assert_eq!(s.port, 9000);
        assert_eq!(s.database.pool.max_connections, 12);
        assert_eq!(s.database.pool.idle_timeout, Duration::from_millis(500));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut env = AUTH.to_vec();
        env.push(("PORT", "eighty"));
        assert!(matches!(
            settings(&env),
            Err(SettingsError::Invalid { name: "PORT", .. })
        ));
    }

    #[test]
    fn identity_provider_is_required() {
        assert!(matches!(
            settings(&[("OKTA_CLIENT_ID", "x")]),
            Err(SettingsError::Missing("OKTA_ISSUER"))
        ));
        assert!(matches!(
            settings(&[("OKTA_ISSUER", "https://idp")]),
            Err(SettingsError::Missing("OKTA_CLIENT_ID"))
        ));
    }

    #[test]
    fn sms_credentials_are_read() {
        let mut env = AUTH.to_vec();
        env.extend([
            ("NEXMO_API_KEY", "key"),
            ("NEXMO_API_SECRET", "secret"),
            ("NEXMO_NUMBER", "15550001111"),
        ]);
        let s = settings(&env).unwrap();
        assert!(s.sms.is_configured());
        assert_eq!(s.sms.from_number, "15550001111");
    }
}
