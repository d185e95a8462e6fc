//! Upstream seed data for cost breakdowns: CSV item lists and built-in
//! templates.

pub mod loader;
pub mod templates;

pub use loader::{SeedItemLoader, SeedItemLoaderError, SeedItemRecord};
pub use templates::{Template, TEMPLATES, names, preset};
