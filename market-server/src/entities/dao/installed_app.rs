use chrono::{DateTime, Utc};

/// A row in the `installed_apps` table.
#[derive(Debug, Clone)]
pub struct InstalledAppRecord {
    pub id: String,
    pub tenant_id: String,
    pub app_id: String,
    pub app_owner_tenant_id: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}
