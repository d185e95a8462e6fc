//! Process-local [`EstimateRepository`], used by tests and by the `memory`
//! backend for throwaway sessions.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{EstimateRepository, RepositoryError};
use crate::models::{NewSavedBreakdown, SavedBreakdown};

#[derive(Debug, Default)]
struct Store {
    next_id: i64,
    rows: BTreeMap<i64, SavedBreakdown>,
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    store: Mutex<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Store>, RepositoryError> {
        self.store
            .lock()
            .map_err(|e| RepositoryError::Database(format!("store lock poisoned: {e}")))
    }
}

/// Copies `new` into a stored row, recomputing line totals on the way in.
fn to_saved(
    id: i64,
    new: &NewSavedBreakdown,
    created_at: chrono::DateTime<Utc>,
) -> SavedBreakdown {
    let mut breakdown = new.breakdown.clone();
    breakdown.recompute_totals();
    SavedBreakdown {
        id,
        project_name: new.project_name.clone(),
        address: new.address.clone(),
        base_area: new.base_area,
        waste_percent: new.waste_percent,
        breakdown,
        subtotal: new.subtotal,
        total_tax: new.total_tax,
        grand_total: new.grand_total,
        created_at,
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl EstimateRepository for MemoryRepository {
    async fn create_breakdown(
        &self,
        breakdown: NewSavedBreakdown,
    ) -> Result<SavedBreakdown, RepositoryError> {
        let mut store = self.lock()?;
        store.next_id += 1;
        let id = store.next_id;
        let saved = to_saved(id, &breakdown, Utc::now());
        store.rows.insert(id, saved.clone());
        Ok(saved)
    }

    async fn get_breakdown(
        &self,
        id: i64,
    ) -> Result<SavedBreakdown, RepositoryError> {
        self.lock()?
            .rows
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn update_breakdown(
        &self,
        id: i64,
        breakdown: &NewSavedBreakdown,
    ) -> Result<SavedBreakdown, RepositoryError> {
        let mut store = self.lock()?;
        let existing = store.rows.get(&id).ok_or(RepositoryError::NotFound)?;
        let saved = to_saved(id, breakdown, existing.created_at);
        store.rows.insert(id, saved.clone());
        Ok(saved)
    }

    async fn delete_breakdown(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.lock()?
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_breakdowns(
        &self,
        project_name: Option<&str>,
    ) -> Result<Vec<SavedBreakdown>, RepositoryError> {
        let store = self.lock()?;
        let mut rows: Vec<SavedBreakdown> = store
            .rows
            .values()
            .filter(|row| project_name.is_none_or(|name| row.project_name == name))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}

/// [`RepositoryFactory`] for the `"memory"` backend. Every call to `create`
/// returns a fresh, empty store.
pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Box<dyn EstimateRepository>, RepositoryError> {
        Ok(Box::new(MemoryRepository::new()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{CostBreakdown, CostItem};

    fn payload(project: &str) -> NewSavedBreakdown {
        let mut item = CostItem::new("m1", "Drywall", dec!(18), "sheets", dec!(15));
        item.total_price = dec!(0);
        NewSavedBreakdown {
            project_name: project.to_string(),
            address: "Toronto".to_string(),
            base_area: Some(dec!(500)),
            waste_percent: dec!(10),
            breakdown: CostBreakdown {
                materials: vec![item],
                ..Default::default()
            },
            subtotal: dec!(270),
            total_tax: dec!(35.10),
            grand_total: dec!(305.10),
        }
    }

    #[tokio::test]
    async fn create_assigns_ids_and_fixes_totals() {
        let repo = MemoryRepository::new();

        let first = repo.create_breakdown(payload("Kitchen")).await.unwrap();
        let second = repo.create_breakdown(payload("Basement")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.breakdown.materials[0].total_price, dec!(270));
    }

    #[tokio::test]
    async fn update_keeps_created_at() {
        let repo = MemoryRepository::new();
        let created = repo.create_breakdown(payload("Kitchen")).await.unwrap();

        let mut changed = payload("Kitchen");
        changed.grand_total = dec!(1);
        let updated = repo.update_breakdown(created.id, &changed).await.unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(repo.get_breakdown(created.id).await.unwrap().grand_total, dec!(1));
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let repo = MemoryRepository::new();

        assert!(matches!(repo.get_breakdown(9).await, Err(RepositoryError::NotFound)));
        assert!(matches!(
            repo.update_breakdown(9, &payload("x")).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(repo.delete_breakdown(9).await, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn list_filters_by_project() {
        let repo = MemoryRepository::new();
        repo.create_breakdown(payload("Kitchen")).await.unwrap();
        repo.create_breakdown(payload("Basement")).await.unwrap();
        repo.create_breakdown(payload("Kitchen")).await.unwrap();

        assert_eq!(repo.list_breakdowns(None).await.unwrap().len(), 3);
        let kitchens = repo.list_breakdowns(Some("Kitchen")).await.unwrap();
        assert_eq!(kitchens.len(), 2);
        assert_eq!(kitchens[0].id, 3);
    }
}
