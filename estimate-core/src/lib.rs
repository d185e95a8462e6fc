pub mod autosave;
pub mod calculations;
pub mod db;
pub mod editor;
pub mod models;
pub mod rules;

pub use autosave::{AutoSaveError, AutoSaver, SaveStatus};
pub use db::repository::{EstimateRepository, RepositoryError};
pub use editor::{BreakdownEditor, ItemEdit};
pub use models::*;
