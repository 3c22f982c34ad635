//! Server configuration, from command-line flags or `MARKET_*` environment
//! variables.

use clap::{ArgAction, Parser};

/// Runtime configuration for market-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any flags or environment variables set.
#[derive(Debug, Clone, Parser)]
#[command(name = "market-server", version, about = "App marketplace service")]
pub struct Config {
    /// TCP address to bind.
    #[arg(long, env = "MARKET_BIND", default_value = "0.0.0.0:3000")]
    pub bind_address: String,

    /// sqlx-compatible database URL. `mode=rwc` creates the SQLite file on
    /// first start.
    #[arg(long, env = "MARKET_DATABASE_URL", default_value = "sqlite://market.db?mode=rwc")]
    pub database_url: String,

    /// Upper bound on pooled database connections.
    #[arg(long, env = "MARKET_DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub database_max_connections: u32,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    /// `RUST_LOG` takes precedence when set.
    #[arg(long, env = "MARKET_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit log records as newline-delimited JSON.
    #[arg(long, env = "MARKET_LOG_JSON", default_value_t = false, action = ArgAction::Set)]
    pub log_json: bool,

    /// Write logs to a daily-rotated file in this directory instead of stdout.
    #[arg(long, env = "MARKET_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Serve Swagger UI and the OpenAPI document.
    #[arg(long, env = "MARKET_ENABLE_SWAGGER", default_value_t = true, action = ArgAction::Set)]
    pub enable_swagger: bool,

    /// Comma-separated CORS origin allow-list; any origin when unset.
    #[arg(long, env = "MARKET_CORS_ORIGINS")]
    pub cors_allowed_origins: Option<String>,

    /// When set, console requests must carry `Authorization: Bearer <token>`
    /// issued to the fronting gateway.
    #[arg(long, env = "MARKET_GATEWAY_TOKEN", hide_env_values = true)]
    pub gateway_token: Option<String>,

    /// Capacity of the in-process event channel.
    #[arg(long, env = "MARKET_EVENT_CAPACITY", default_value_t = 64)]
    pub event_capacity: usize,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_apply_without_arguments() {
        let cfg = Config::try_parse_from(["market-server"]).unwrap();
        assert_eq!(cfg.database_max_connections, 5);
        assert!(cfg.enable_swagger);
        assert!(cfg.gateway_token.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = Config::try_parse_from([
            "market-server",
            "--bind-address",
            "127.0.0.1:8080",
            "--enable-swagger",
            "false",
            "--log-json",
            "true",
        ])
        .unwrap();
        assert_eq!(cfg.bind_address, "127.0.0.1:8080");
        assert!(!cfg.enable_swagger);
        assert!(cfg.log_json);
    }
}
