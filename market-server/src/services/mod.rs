//! Operations that span several tables or need a caller's authority.

pub mod clone;
pub mod market;

pub use market::{MarketAppService, NewListing};
