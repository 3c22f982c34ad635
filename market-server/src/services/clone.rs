//! Copying an app's behaviour and presentation onto another app id.
//!
//! Every statement runs on the borrowed connection, which callers pass as an
//! open transaction so a failed step leaves nothing behind.

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entities::{
    AnyConnection, InstalledAppRecord, InstalledApps, ModelConfigRecord, ModelConfigs, SiteRecord,
    Sites, WorkflowRecord, Workflows,
};
use crate::error::ServerError;

const SITE_CODE_ATTEMPTS: usize = 8;

/// What to do with a draft workflow that contains an app-caller node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCallerPolicy {
    /// Refuse the clone with [`ServerError::WorkflowContainsAppCaller`].
    Reject,
    Allow,
}

pub struct AppCloner<'c> {
    conn: &'c mut AnyConnection,
    /// Account recorded as the author of cloned rows.
    actor: &'c str,
}

impl<'c> AppCloner<'c> {
    pub fn new(conn: &'c mut AnyConnection, actor: &'c str) -> Self {
        Self { conn, actor }
    }

    /// Copy the draft workflow of `source_app_id` as the draft of
    /// `target_app_id`, owned by `tenant_id`. Returns the new workflow id.
    pub async fn clone_draft_workflow(
        &mut self,
        source_app_id: &str,
        target_app_id: &str,
        tenant_id: &str,
        policy: AppCallerPolicy,
    ) -> Result<String, ServerError> {
        let source = Workflows::find_draft(&mut *self.conn, source_app_id)
            .await?
            .ok_or_else(|| {
                ServerError::NotFound(format!("app {source_app_id} has no draft workflow"))
            })?;

        if policy == AppCallerPolicy::Reject {
            if source.references_app_caller() {
                warn!(workflow_id = %source.id, app_id = %source_app_id, "refusing to clone workflow with app-caller node");
                return Err(ServerError::WorkflowContainsAppCaller);
            }
        }

        let clone = WorkflowRecord {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_owned(),
            app_id: target_app_id.to_owned(),
            kind: source.kind,
            version: WorkflowRecord::DRAFT_VERSION.to_owned(),
            graph: source.graph,
            features: source.features,
            app_caller_nodes: source.app_caller_nodes,
            created_by: self.actor.to_owned(),
            created_at: Utc::now(),
        };
        Workflows::insert(&mut *self.conn, &clone).await?;
        debug!(from = %source.id, to = %clone.id, "workflow cloned");
        Ok(clone.id)
    }

    /// Copy the newest model configuration of `source_app_id` onto
    /// `target_app_id`. Returns the new configuration id.
    pub async fn clone_latest_model_config(
        &mut self,
        source_app_id: &str,
        target_app_id: &str,
    ) -> Result<String, ServerError> {
        let source = ModelConfigs::find_latest(&mut *self.conn, source_app_id)
            .await?
            .ok_or_else(|| {
                ServerError::NotFound(format!("app {source_app_id} has no model configuration"))
            })?;

        let clone = ModelConfigRecord {
            id: Uuid::new_v4().to_string(),
            app_id: target_app_id.to_owned(),
            settings: source.settings,
            created_at: Utc::now(),
        };
        ModelConfigs::insert(&mut *self.conn, &clone).await?;
        debug!(from = %source.id, to = %clone.id, "model config cloned");
        Ok(clone.id)
    }

    /// Copy the site and installation of the source app, when it has them.
    /// The site gets a fresh access code; the installation stays with
    /// `source_tenant_id`.
    pub async fn clone_site_and_installation(
        &mut self,
        source_app_id: &str,
        source_tenant_id: &str,
        target_app_id: &str,
    ) -> Result<(), ServerError> {
        let now = Utc::now();

        if let Some(site) = Sites::find_by_app(&mut *self.conn, source_app_id).await? {
            let code = self.unused_site_code().await?;
            let clone = SiteRecord {
                id: Uuid::new_v4().to_string(),
                app_id: target_app_id.to_owned(),
                code,
                created_at: now,
                ..site
            };
            Sites::insert(&mut *self.conn, &clone).await?;
            debug!(site_id = %clone.id, app_id = %target_app_id, "site cloned");
        }

        if let Some(installed) = InstalledApps::find_by_app(&mut *self.conn, source_app_id).await? {
            let clone = InstalledAppRecord {
                id: Uuid::new_v4().to_string(),
                tenant_id: source_tenant_id.to_owned(),
                app_id: target_app_id.to_owned(),
                created_at: now,
                ..installed
            };
            InstalledApps::insert(&mut *self.conn, &clone).await?;
            debug!(installed_app_id = %clone.id, app_id = %target_app_id, "installation cloned");
        }

        Ok(())
    }

    async fn unused_site_code(&mut self) -> Result<String, ServerError> {
        for _ in 0..SITE_CODE_ATTEMPTS {
            let code = SiteRecord::generate_code();
            if !Sites::code_exists(&mut *self.conn, &code).await? {
                return Ok(code);
            }
        }
        Err(ServerError::Internal(format!(
            "no unused site code after {SITE_CODE_ATTEMPTS} attempts"
        )))
    }
}
