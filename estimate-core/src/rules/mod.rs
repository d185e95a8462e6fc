//! Static lookup tables used by the calculations.

pub mod coverage;
pub mod jurisdiction;

pub use coverage::{COVERAGE_RULES, CoverageRule, find_coverage};
pub use jurisdiction::{ADDRESS_RULES, AddressRule, DEFAULT_JURISDICTION, MatchKind, match_address};
