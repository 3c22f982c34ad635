use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entities::{AppMode, ListingFilter, ListingPage, MarketAppPatch, MarketAppRecord};
use crate::error::ServerError;
use crate::services::NewListing;

/// Query value of `mode` that disables the mode filter.
pub const ALL_MODES: &str = "all";

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListMarketAppsQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, max = 99999))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
    /// `all` or an app mode such as `chat` or `advanced-chat`.
    pub mode: Option<String>,
    /// Matched against listing names and tags; only the first 30 characters count.
    pub search: Option<String>,
}

impl ListMarketAppsQuery {
    pub fn filter(&self) -> Result<ListingFilter, ServerError> {
        // Mode names are exact, `all` included.
        let mode = match self.mode.as_deref() {
            None | Some("") | Some(ALL_MODES) => None,
            Some(m) => Some(
                AppMode::from_str(m)
                    .map_err(|_| ServerError::BadRequest(format!("unknown app mode '{m}'")))?,
            ),
        };
        let search = self.search.as_deref().filter(|s| !s.is_empty());
        Ok(ListingFilter::new(mode, search))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMarketAppRequest {
    /// Studio app to publish.
    #[validate(length(min = 1))]
    pub app_id: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub mode: Option<AppMode>,
    /// Search tags.
    pub hashcode: Option<Vec<String>>,
    pub important: Option<i64>,
}

impl From<CreateMarketAppRequest> for NewListing {
    fn from(req: CreateMarketAppRequest) -> Self {
        Self {
            app_id: req.app_id,
            name: req.name,
            description: req.description,
            hashcode: req.hashcode.unwrap_or_default(),
            important: req.important.unwrap_or_default(),
            mode: req.mode,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct PatchMarketAppRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub hashcode: Option<Vec<String>>,
    pub important: Option<i64>,
}

impl From<PatchMarketAppRequest> for MarketAppPatch {
    fn from(req: PatchMarketAppRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            hashcode: req.hashcode,
            important: req.important,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MarketAppResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub hashcode: Vec<String>,
    pub mode: AppMode,
    pub efct_st_dt: String,
    pub efct_fns_dt: String,
    pub important: i64,
    pub creator: String,
    pub creator_organization_id: String,
    pub workflow_id: Option<String>,
    pub app_model_config_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MarketAppPaginationResponse {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub has_more: bool,
    pub data: Vec<MarketAppResponse>,
}

/// `{"result": ...}` acknowledgement, with the id of whatever was created.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResultResponse {
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

impl ResultResponse {
    pub fn success() -> Self {
        Self {
            result: "success".into(),
            id: None,
            app_id: None,
        }
    }

    pub fn app_caller_error() -> Self {
        Self {
            result: "app_caller_error".into(),
            id: None,
            app_id: None,
        }
    }
}

impl MarketAppRecord {
    pub fn to_response(&self) -> MarketAppResponse {
        MarketAppResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            hashcode: self.hashcode.clone(),
            mode: self.mode,
            efct_st_dt: self.effective_start.to_rfc3339(),
            efct_fns_dt: self.effective_end.to_rfc3339(),
            important: self.important,
            creator: self.creator.clone(),
            creator_organization_id: self.creator_organization_id.clone(),
            workflow_id: self.workflow_id.clone(),
            app_model_config_id: self.app_model_config_id.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

impl ListingPage {
    pub fn to_response(&self) -> MarketAppPaginationResponse {
        MarketAppPaginationResponse {
            page: self.page,
            limit: self.limit,
            total: self.total,
            has_more: self.has_more(),
            data: self.items.iter().map(MarketAppRecord::to_response).collect(),
        }
    }
}
