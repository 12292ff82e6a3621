//! PostgreSQL pool construction.

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use recipes_core::config::DatabaseConfig;
use recipes_core::error::AppError;
use recipes_core::result::AppResult;

/// Open a pool sized and timed by `config`.
///
/// The returned pool is cheap to clone and is the only shared resource the
/// credential store touches.
pub async fn connect(config: &DatabaseConfig) -> AppResult<PgPool> {
    config.validate()?;
    info!(
        url = %redact_url(&config.url),
        max_connections = config.max_connections,
        "Connecting to PostgreSQL"
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout())
        .idle_timeout(config.idle_timeout())
        .connect(&config.url)
        .await
        .map_err(|e| AppError::query("Failed to connect to database", e))
}

/// Replace the password in a connection URL with `****`.
fn redact_url(url: &str) -> String {
    let (scheme, rest) = url.split_once("://").unwrap_or(("", url));
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    let Some((user, _password)) = userinfo.split_once(':') else {
        return url.to_string();
    };

    let prefix = if scheme.is_empty() {
        String::new()
    } else {
        format!("{scheme}://")
    };
    format!("{prefix}{user}:****@{host}")
}
