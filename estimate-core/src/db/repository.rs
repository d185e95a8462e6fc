use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewSavedBreakdown, SavedBreakdown};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Persistence collaborator for cost breakdowns.
///
/// Implementations must store line totals as `quantity × unit_price`
/// regardless of the `total_price` they are handed.
#[async_trait]
pub trait EstimateRepository: Send + Sync {
    async fn create_breakdown(
        &self,
        breakdown: NewSavedBreakdown,
    ) -> Result<SavedBreakdown, RepositoryError>;

    async fn get_breakdown(&self, id: i64) -> Result<SavedBreakdown, RepositoryError>;

    /// Replaces the stored breakdown `id` with `breakdown`.
    async fn update_breakdown(
        &self,
        id: i64,
        breakdown: &NewSavedBreakdown,
    ) -> Result<SavedBreakdown, RepositoryError>;

    async fn delete_breakdown(&self, id: i64) -> Result<(), RepositoryError>;

    /// Most recently updated first, optionally filtered by exact project name.
    async fn list_breakdowns(
        &self,
        project_name: Option<&str>,
    ) -> Result<Vec<SavedBreakdown>, RepositoryError>;
}
