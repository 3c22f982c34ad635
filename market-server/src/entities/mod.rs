//! Database abstraction layer.
//!
//! Row types live in [`dao`]. Single-statement reads and updates that handlers
//! call directly are exposed through store traits implemented for
//! [`AnyStore`] (see [`MarketAppStore`]). Statements that must share one
//! transaction with others, such as every step of an app clone, are associated
//! functions on a per-table type (`Apps`, `Workflows`, ...) that take an
//! [`AnyConnection`], so callers can run them against a [`Tx`].
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` crate is required.

pub mod app;
pub mod dao;
pub mod installed_app;
pub mod market_app;
pub mod model_config;
pub mod organization;
pub mod site;
pub mod workflow;

pub use dao::{
    AppMode, AppRecord, InstalledAppRecord, MarketAppRecord, ModelConfigRecord, ModelSettings,
    SiteRecord, WorkflowRecord,
};

pub use app::Apps;
pub use installed_app::InstalledApps;
pub use market_app::{ListingFilter, ListingPage, MarketAppPatch, MarketAppStore, MarketApps};
pub use model_config::ModelConfigs;
pub use organization::Organizations;
pub use site::Sites;
pub use workflow::Workflows;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::any::{AnyConnectOptions, AnyPoolOptions};

pub use sqlx::AnyConnection;

/// A transaction over the store's pool.
pub type Tx = sqlx::Transaction<'static, sqlx::Any>;

#[derive(Clone, Debug)]
pub struct AnyStore {
    pool: sqlx::Pool<sqlx::Any>,
}

impl AnyStore {
    /// Open (or create) the database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible URL, e.g. `"sqlite://market.db?mode=rwc"`
    /// or `"sqlite::memory:"` for tests.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        sqlx::any::install_default_drivers();
        let options = AnyConnectOptions::from_str(url)?;
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn begin(&self) -> Result<Tx, sqlx::Error> {
        self.pool.begin().await
    }

    /// Round-trip a trivial statement to prove the database answers.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[cfg(test)]
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Fixed-width RFC 3339 in UTC, so stored timestamps compare lexically.
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(raw: String, field: &'static str) -> DateTime<Utc> {
    raw.parse().unwrap_or_else(|e: chrono::ParseError| {
        tracing::warn!(raw = %raw, error = %e, field, "failed to parse timestamp; using now");
        Utc::now()
    })
}

pub(crate) fn parse_mode(raw: &str) -> Result<AppMode, sqlx::Error> {
    AppMode::from_str(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}


#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formatted_timestamps_sort_chronologically() {
        let early = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let late = early + chrono::Duration::microseconds(1_500_000);
        let (a, b) = (format_ts(early), format_ts(late));
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(a, "2024-01-02T03:04:05.000000Z");
    }

    #[test]
    fn timestamps_round_trip_through_text() {
        let ts = Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_ts(format_ts(ts), "test"), ts);
    }

    #[test]
    fn unknown_mode_is_a_decode_error() {
        assert!(matches!(parse_mode("voice"), Err(sqlx::Error::Decode(_))));
        assert_eq!(parse_mode("advanced-chat").unwrap(), AppMode::AdvancedChat);
    }
}
