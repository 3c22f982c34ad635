use chrono::{DateTime, TimeZone, Utc};

use super::AppMode;

/// A row in the `market_apps` table together with its tags.
///
/// Exactly one of `workflow_id` / `app_model_config_id` is set, chosen by
/// `mode` when the listing was cloned in.
#[derive(Debug, Clone)]
pub struct MarketAppRecord {
    pub id: String,
    /// The studio app this listing was cloned from.
    pub source_app_id: String,
    pub name: String,
    pub description: String,
    /// Search tags, in insertion order.
    pub hashcode: Vec<String>,
    pub mode: AppMode,
    pub effective_start: DateTime<Utc>,
    pub effective_end: DateTime<Utc>,
    /// Listing weight; higher sorts first.
    pub important: i64,
    pub creator: String,
    pub creator_organization_id: String,
    pub workflow_id: Option<String>,
    pub app_model_config_id: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl MarketAppRecord {
    /// Effective-end assigned to new listings: open-ended until soft-deleted.
    pub fn open_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// `effective_start <= now < effective_end`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.effective_start <= now && now < self.effective_end
    }
}
