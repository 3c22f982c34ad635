use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Behavioural flavour of an app, stored and serialised in kebab-case.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AppMode {
    Chat,
    Completion,
    AgentChat,
    Workflow,
    AdvancedChat,
    Channel,
    AnalyticsChat,
    MultiAgentChat,
}

impl AppMode {
    /// Modes that may be published to the marketplace.
    pub fn is_creatable(self) -> bool {
        !matches!(self, AppMode::Channel)
    }

    /// `true` when the app's behaviour lives in a draft workflow graph rather
    /// than in a model configuration.
    pub fn clones_workflow(self) -> bool {
        matches!(self, AppMode::AdvancedChat)
    }
}

/// A row in the `apps` table (a studio app owned by one tenant).
#[derive(Debug, Clone)]
pub struct AppRecord {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub mode: AppMode,
    pub description: String,
    pub enable_site: bool,
    pub enable_api: bool,
    pub app_model_config_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
