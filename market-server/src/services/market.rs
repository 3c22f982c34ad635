//! Marketplace operations: listing, publishing an app, editing and retiring
//! a listing, and installing a listing into a studio.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::entities::market_app::normalize_tags;
use crate::entities::{
    AnyStore, AppMode, AppRecord, Apps, ListingFilter, ListingPage, MarketAppPatch, MarketAppRecord,
    MarketAppStore, MarketApps, Organizations,
};
use crate::error::ServerError;
use crate::events::{EventBus, MarketEvent};
use crate::identity::{Caller, PUBLISHER_ROLES};
use crate::services::clone::{AppCallerPolicy, AppCloner};

/// Input for publishing a studio app to the marketplace.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub app_id: String,
    pub name: String,
    pub description: String,
    pub hashcode: Vec<String>,
    pub important: i64,
    /// Mode the publisher expects; must be a creatable mode when given.
    pub mode: Option<AppMode>,
}

pub struct MarketAppService<'a> {
    store: &'a AnyStore,
    events: &'a EventBus,
}

impl<'a> MarketAppService<'a> {
    pub fn new(store: &'a AnyStore, events: &'a EventBus) -> Self {
        Self { store, events }
    }

    pub async fn list(
        &self,
        filter: &ListingFilter,
        page: u32,
        limit: u32,
    ) -> Result<ListingPage, ServerError> {
        let listings = self.store.list_active(filter, page, limit, Utc::now()).await?;
        debug!(
            page,
            limit,
            total = listings.total,
            returned = listings.items.len(),
            "market listings queried"
        );
        Ok(listings)
    }

    /// Clone a studio app into a new marketplace listing.
    ///
    /// Advanced-chat apps carry their draft workflow over, which must not
    /// contain an app-caller node; every other mode carries its newest model
    /// configuration. The app's site and installation follow along. Nothing
    /// is persisted unless every step succeeds.
    pub async fn create(
        &self,
        caller: &Caller,
        new: NewListing,
    ) -> Result<MarketAppRecord, ServerError> {
        caller.require_any_role(&PUBLISHER_ROLES)?;
        if let Some(mode) = new.mode {
            if !mode.is_creatable() {
                return Err(ServerError::BadRequest(format!(
                    "mode '{mode}' cannot be published"
                )));
            }
        }

        let mut tx = self.store.begin().await?;

        let source = Apps::find(&mut tx, &new.app_id)
            .await?
            .ok_or_else(|| ServerError::NotFound(format!("app {} not found", new.app_id)))?;
        if !source.mode.is_creatable() {
            return Err(ServerError::BadRequest(format!(
                "apps in mode '{}' cannot be published",
                source.mode
            )));
        }
        let organization_id = Organizations::organization_of(&mut tx, &caller.account_id)
            .await?
            .ok_or_else(|| {
                ServerError::Forbidden(format!(
                    "account {} belongs to no organization",
                    caller.account_id
                ))
            })?;

        let now = Utc::now();
        let mut listing = MarketAppRecord {
            id: Uuid::new_v4().to_string(),
            source_app_id: source.id.clone(),
            name: new.name,
            description: new.description,
            hashcode: normalize_tags(&new.hashcode),
            mode: source.mode,
            effective_start: now,
            effective_end: MarketAppRecord::open_end(),
            important: new.important,
            creator: caller.account_id.clone(),
            creator_organization_id: organization_id,
            workflow_id: None,
            app_model_config_id: None,
            created_by: caller.account_id.clone(),
            created_at: now,
            updated_by: None,
            updated_at: now,
        };

        let mut cloner = AppCloner::new(&mut tx, &caller.account_id);
        if source.mode.clones_workflow() {
            let workflow_id = cloner
                .clone_draft_workflow(&source.id, &listing.id, &source.tenant_id, AppCallerPolicy::Reject)
                .await?;
            listing.workflow_id = Some(workflow_id);
        } else {
            let config_id = cloner.clone_latest_model_config(&source.id, &listing.id).await?;
            listing.app_model_config_id = Some(config_id);
        }
        cloner
            .clone_site_and_installation(&source.id, &source.tenant_id, &listing.id)
            .await?;

        MarketApps::insert(&mut tx, &listing).await?;
        tx.commit().await?;

        info!(
            listing_id = %listing.id,
            source_app_id = %listing.source_app_id,
            mode = %listing.mode,
            creator = %listing.creator,
            "market listing created"
        );
        Ok(listing)
    }

    /// Apply `patch` to a listing the caller administers or created.
    pub async fn patch(
        &self,
        caller: &Caller,
        id: &str,
        patch: MarketAppPatch,
    ) -> Result<(), ServerError> {
        let listing = self.owned_listing(caller, id).await?;
        let patched = self
            .store
            .patch_listing(&listing.id, &patch, &caller.account_id, Utc::now())
            .await?;
        if !patched {
            return Err(ServerError::NotFound(format!("market app {id} not found")));
        }
        info!(listing_id = %id, updated_by = %caller.account_id, "market listing patched");
        Ok(())
    }

    /// End a listing's effective window now. The row is kept.
    pub async fn delete(&self, caller: &Caller, id: &str) -> Result<(), ServerError> {
        let listing = self.owned_listing(caller, id).await?;
        let deleted = self
            .store
            .soft_delete_listing(&listing.id, &caller.account_id, Utc::now())
            .await?;
        if !deleted {
            return Err(ServerError::NotFound(format!("market app {id} not found")));
        }
        info!(listing_id = %id, updated_by = %caller.account_id, "market listing retired");
        Ok(())
    }

    /// Create a studio app in the caller's tenant from an active listing and
    /// announce it with [`MarketEvent::AppCreated`].
    ///
    /// Listings were checked for app-caller nodes when published, so the
    /// workflow is copied as-is.
    pub async fn transfer_to_studio(
        &self,
        caller: &Caller,
        listing_id: &str,
    ) -> Result<AppRecord, ServerError> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;

        let listing = MarketApps::find(&mut tx, listing_id)
            .await?
            .filter(|l| l.is_active_at(now))
            .ok_or_else(|| ServerError::NotFound(format!("market app {listing_id} not found")))?;

        let mut app = AppRecord {
            id: Uuid::new_v4().to_string(),
            tenant_id: caller.tenant_id.clone(),
            name: listing.name.clone(),
            mode: listing.mode,
            description: listing.description.clone(),
            enable_site: true,
            enable_api: true,
            app_model_config_id: None,
            created_at: now,
            updated_at: now,
        };

        let mut cloner = AppCloner::new(&mut tx, &caller.account_id);
        if listing.mode.clones_workflow() {
            cloner
                .clone_draft_workflow(&listing.id, &app.id, &caller.tenant_id, AppCallerPolicy::Allow)
                .await?;
        } else {
            let config_id = cloner.clone_latest_model_config(&listing.id, &app.id).await?;
            app.app_model_config_id = Some(config_id);
        }

        Apps::insert(&mut tx, &app).await?;
        tx.commit().await?;

        info!(
            listing_id = %listing.id,
            app_id = %app.id,
            tenant_id = %app.tenant_id,
            "market listing transferred to studio"
        );
        self.events.publish(MarketEvent::AppCreated {
            app_id: app.id.clone(),
            tenant_id: app.tenant_id.clone(),
            account_id: caller.account_id.clone(),
            mode: app.mode,
        });
        Ok(app)
    }

    async fn owned_listing(&self, caller: &Caller, id: &str) -> Result<MarketAppRecord, ServerError> {
        let listing = self
            .store
            .get_listing(id)
            .await?
            .ok_or_else(|| ServerError::NotFound(format!("market app {id} not found")))?;
        caller.require_admin_or_owner(&listing.creator)?;
        Ok(listing)
    }
}
