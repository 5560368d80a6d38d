// Filter & derivation engine
// Pure functions over the cached lead snapshot; recomputed on every change

pub mod counts;
pub mod filter;
pub mod quick_range;
pub mod selection;

pub use counts::{compute_status_counts, StatusCounts};
pub use filter::{compute_visible_leads, visible_leads_in, LeadFilters};
pub use quick_range::{DateRange, QuickRange};
pub use selection::BulkSelection;
