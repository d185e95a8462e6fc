mod cost_breakdown;
mod cost_item;
mod document;
mod seed_item;
mod tax;

pub use cost_breakdown::{
    CostBreakdown, DEFAULT_WASTE_PERCENT, NewSavedBreakdown, ResolveContext, SavedBreakdown,
};
pub use cost_item::{CostItem, CostSection, SQ_FT, is_area_unit};
pub use document::EstimateDocument;
pub use seed_item::{SeedItem, SeedSource};
pub use tax::{TaxBreakdown, TaxComponent, TaxJurisdiction, TaxLine};
