pub mod app;
pub mod installed_app;
pub mod market_app;
pub mod model_config;
pub mod site;
pub mod workflow;

pub use app::{AppMode, AppRecord};
pub use installed_app::InstalledAppRecord;
pub use market_app::MarketAppRecord;
pub use model_config::{ModelConfigRecord, ModelSettings};
pub use site::SiteRecord;
pub use workflow::WorkflowRecord;
