use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use pressroom_events::WebhookConfig;

/// Everything the API binary reads from its environment.
///
/// HTTP settings sit at the top level. Pool sizing and webhook delivery are
/// grouped so `main.rs` wires them without touching the environment again.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API from a browser.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Bound on how long shutdown waits for event services to drain.
    pub shutdown_timeout_secs: u64,
    pub database_max_connections: u32,
    pub webhooks: WebhookConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `3000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `5`                     |
    /// | `DATABASE_MAX_CONNECTIONS` | `20`                    |
    /// | `WEBHOOK_URLS`             | none                    |
    /// | `WEBHOOK_SECRET`           | none                    |
    ///
    /// Panics on values that do not parse, so misconfiguration fails at
    /// startup.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.into());

        let cors_origins = var("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let webhooks = WebhookConfig::parse(
            &var("WEBHOOK_URLS", ""),
            lookup("WEBHOOK_SECRET").filter(|s| !s.is_empty()),
        );

        Self {
            host: var("HOST", "0.0.0.0"),
            port: parse_var("PORT", var("PORT", "3000")),
            cors_origins,
            request_timeout_secs: parse_var(
                "REQUEST_TIMEOUT_SECS",
                var("REQUEST_TIMEOUT_SECS", "30"),
            ),
            shutdown_timeout_secs: parse_var(
                "SHUTDOWN_TIMEOUT_SECS",
                var("SHUTDOWN_TIMEOUT_SECS", "5"),
            ),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .map(|v| parse_var("DATABASE_MAX_CONNECTIONS", v))
                .unwrap_or(pressroom_db::DEFAULT_MAX_CONNECTIONS),
            webhooks,
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        Ok(SocketAddr::new(IpAddr::from_str(&self.host)?, self.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn parse_var<T: FromStr>(name: &str, value: String) -> T {
    value
        .trim()
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid {}", std::any::type_name::<T>()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]);
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
        assert_eq!(
            config.database_max_connections,
            pressroom_db::DEFAULT_MAX_CONNECTIONS
        );
        assert!(!config.webhooks.is_enabled());
    }

    #[test]
    fn webhook_and_pool_settings_are_read() {
        let config = load(&[
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("WEBHOOK_URLS", "https://a.test/hook, https://b.test/hook"),
            ("WEBHOOK_SECRET", ""),
            ("CORS_ORIGINS", "https://admin.test,,"),
        ]);
        assert_eq!(config.database_max_connections, 25);
        assert_eq!(config.webhooks.urls.len(), 2);
        assert_eq!(config.webhooks.secret, None);
        assert_eq!(config.cors_origins, vec!["https://admin.test"]);
    }

    #[test]
    fn invalid_host_is_an_error() {
        assert!(load(&[("HOST", "localhost")]).socket_addr().is_err());
    }

    #[test]
    #[should_panic(expected = "PORT must be a valid u16")]
    fn invalid_port_panics() {
        load(&[("PORT", "70000")]);
    }
}
