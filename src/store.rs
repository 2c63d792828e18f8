//! Connection pool construction and startup connectivity check.

use crate::settings::{DatabaseSettings, DatabaseTarget};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;

/// Connect options for either a connection string or the structured local config.
pub fn connect_options(settings: &DatabaseSettings) -> Result<PgConnectOptions, sqlx::Error> {
    match &settings.target {
        DatabaseTarget::Url(url) => PgConnectOptions::from_str(url),
        DatabaseTarget::Local {
            host,
            port,
            database,
            username,
            password,
        } => {
            let opts = PgConnectOptions::new()
                .host(host)
                .port(*port)
                .database(database)
                .username(username);
            Ok(match password {
                Some(p) => opts.password(p),
                None => opts,
            })
        }
    }
}

/// Build the pool without connecting; the first query opens a connection.
/// Keeps the server able to start while the database is down.
pub fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let opts = connect_options(settings)?;
    Ok(PgPoolOptions::new()
        .max_connections(settings.pool.max_connections)
        .min_connections(settings.pool.min_connections)
        .idle_timeout(settings.pool.idle_timeout)
        .connect_lazy_with(opts))
}

/// Round-trip `SELECT 1`.
pub async fn check_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PoolSettings;

    #[test]
    fn structured_config_builds_options() {
        let settings = DatabaseSettings {
            target: DatabaseTarget::Local {
                host: "db.internal".into(),
                port: 6543,
                database: "bikeshare".into(),
                username: "app".into(),
                password: None,
            },
            pool: PoolSettings::default(),
        };
        let opts = connect_options(&settings).unwrap();
        assert_eq!(opts.get_host(), "db.internal");
        assert_eq!(opts.get_port(), 6543);
        assert_eq!(opts.get_database(), Some("bikeshare"));
        assert_eq!(opts.get_username(), "app");
    }

    #[test]
    fn malformed_url_is_an_error() {
        let settings = DatabaseSettings {
            target: DatabaseTarget::Url("not a url".into()),
            pool: PoolSettings::default(),
        };
        assert!(connect_options(&settings).is_err());
    }

    #[tokio::test]
    async fn pool_is_lazy() {
        let settings = DatabaseSettings {
            target: DatabaseTarget::Url("postgres://nobody@127.0.0.1:1/none".into()),
            pool: PoolSettings::default(),
        };
        let pool = create_pool(&settings).unwrap();
        assert_eq!(pool.size(), 0);
    }
}
