use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use estimate_core::{
    CostBreakdown, CostItem, CostSection, EstimateRepository, NewSavedBreakdown, RepositoryError,
    SavedBreakdown,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

const BREAKDOWN_COLUMNS: &str = "id, project_name, address, base_area, waste_percent, subtotal,
     total_tax, grand_total, created_at, updated_at";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, which may be a `sqlite:` URL, `:memory:`, or a
    /// bare file path. File databases are created when missing.
    pub async fn new(database_url: &str) -> Result<Self> {
        let in_memory = matches!(database_url, ":memory:" | "sqlite::memory:" | "sqlite://:memory:");
        let options = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else if database_url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(database_url)
                .with_context(|| format!("Invalid database URL: {}", database_url))?
                .create_if_missing(true)
        } else {
            SqliteConnectOptions::new()
                .filename(database_url)
                .create_if_missing(true)
        };

        // Every connection to an in-memory database sees its own empty
        // database, so the pool must hold exactly one that never expires.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn load_items(
        &self,
        breakdown_id: i64,
    ) -> Result<CostBreakdown, RepositoryError> {
        let rows = sqlx::query(
            "SELECT section, item_id, item, quantity, base_quantity, unit, unit_price,
                    total_price, is_essential
             FROM cost_item WHERE breakdown_id = ? ORDER BY section, position",
        )
        .bind(breakdown_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut breakdown = CostBreakdown::default();
        for row in &rows {
            let section: String = row.try_get("section").map_err(db_error)?;
            let section = CostSection::parse(&section).ok_or_else(|| {
                RepositoryError::Database(format!("Invalid cost section: {}", section))
            })?;
            breakdown.section_mut(section).push(row_to_cost_item(row)?);
        }
        Ok(breakdown)
    }

    async fn load(
        &self,
        row: &SqliteRow,
    ) -> Result<SavedBreakdown, RepositoryError> {
        let id: i64 = row.try_get("id").map_err(db_error)?;
        let breakdown = self.load_items(id).await?;
        row_to_saved(row, breakdown)
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_cost_item(row: &SqliteRow) -> Result<CostItem, RepositoryError> {
    Ok(CostItem {
        id: row.try_get("item_id").map_err(db_error)?,
        item: row.try_get("item").map_err(db_error)?,
        quantity: get_decimal(row, "quantity")?,
        base_quantity: get_optional_decimal(row, "base_quantity")?,
        unit: row.try_get("unit").map_err(db_error)?,
        unit_price: get_decimal(row, "unit_price")?,
        total_price: get_decimal(row, "total_price")?,
        is_essential: row.try_get("is_essential").map_err(db_error)?,
    })
}

fn row_to_saved(
    row: &SqliteRow,
    breakdown: CostBreakdown,
) -> Result<SavedBreakdown, RepositoryError> {
    Ok(SavedBreakdown {
        id: row.try_get("id").map_err(db_error)?,
        project_name: row.try_get("project_name").map_err(db_error)?,
        address: row.try_get("address").map_err(db_error)?,
        base_area: get_optional_decimal(row, "base_area")?,
        waste_percent: get_decimal(row, "waste_percent")?,
        breakdown,
        subtotal: get_decimal(row, "subtotal")?,
        total_tax: get_decimal(row, "total_tax")?,
        grand_total: get_decimal(row, "grand_total")?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get updated_at: {}", e)))?,
    })
}

/// Writes every line of `breakdown`. Totals are recomputed from quantity and
/// unit price rather than taken from the payload.
async fn insert_items(
    tx: &mut Transaction<'_, Sqlite>,
    breakdown_id: i64,
    breakdown: &CostBreakdown,
) -> Result<(), RepositoryError> {
    for section in CostSection::ALL {
        for (position, item) in breakdown.section(section).iter().enumerate() {
            sqlx::query(
                "INSERT INTO cost_item (
                    breakdown_id, section, position, item_id, item, quantity, base_quantity,
                    unit, unit_price, total_price, is_essential
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(breakdown_id)
            .bind(section.as_str())
            .bind(position as i64)
            .bind(&item.id)
            .bind(&item.item)
            .bind(decimal_to_text(item.quantity))
            .bind(item.base_quantity.map(decimal_to_text))
            .bind(&item.unit)
            .bind(decimal_to_text(item.unit_price))
            .bind(decimal_to_text(item.quantity * item.unit_price))
            .bind(item.is_essential)
            .execute(&mut **tx)
            .await
            .map_err(db_error)?;
        }
    }
    Ok(())
}

#[async_trait]
impl EstimateRepository for SqliteRepository {
    async fn create_breakdown(
        &self,
        breakdown: NewSavedBreakdown,
    ) -> Result<SavedBreakdown, RepositoryError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let result = sqlx::query(
            "INSERT INTO cost_breakdown (
                project_name, address, base_area, waste_percent, subtotal, total_tax,
                grand_total, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&breakdown.project_name)
        .bind(&breakdown.address)
        .bind(breakdown.base_area.map(decimal_to_text))
        .bind(decimal_to_text(breakdown.waste_percent))
        .bind(decimal_to_text(breakdown.subtotal))
        .bind(decimal_to_text(breakdown.total_tax))
        .bind(decimal_to_text(breakdown.grand_total))
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        let id = result.last_insert_rowid();
        insert_items(&mut tx, id, &breakdown.breakdown).await?;
        tx.commit().await.map_err(db_error)?;

        debug!(id, lines = breakdown.breakdown.len(), "created breakdown");
        self.get_breakdown(id).await
    }

    async fn get_breakdown(
        &self,
        id: i64,
    ) -> Result<SavedBreakdown, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {BREAKDOWN_COLUMNS} FROM cost_breakdown WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        self.load(&row).await
    }

    async fn update_breakdown(
        &self,
        id: i64,
        breakdown: &NewSavedBreakdown,
    ) -> Result<SavedBreakdown, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let result = sqlx::query(
            "UPDATE cost_breakdown SET
                project_name = ?, address = ?, base_area = ?, waste_percent = ?,
                subtotal = ?, total_tax = ?, grand_total = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&breakdown.project_name)
        .bind(&breakdown.address)
        .bind(breakdown.base_area.map(decimal_to_text))
        .bind(decimal_to_text(breakdown.waste_percent))
        .bind(decimal_to_text(breakdown.subtotal))
        .bind(decimal_to_text(breakdown.total_tax))
        .bind(decimal_to_text(breakdown.grand_total))
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM cost_item WHERE breakdown_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        insert_items(&mut tx, id, &breakdown.breakdown).await?;
        tx.commit().await.map_err(db_error)?;

        debug!(id, lines = breakdown.breakdown.len(), "updated breakdown");
        self.get_breakdown(id).await
    }

    async fn delete_breakdown(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("DELETE FROM cost_item WHERE breakdown_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        let result = sqlx::query("DELETE FROM cost_breakdown WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn list_breakdowns(
        &self,
        project_name: Option<&str>,
    ) -> Result<Vec<SavedBreakdown>, RepositoryError> {
        let rows = match project_name {
            Some(name) => {
                sqlx::query(&format!(
                    "SELECT {BREAKDOWN_COLUMNS} FROM cost_breakdown
                     WHERE project_name = ? ORDER BY updated_at DESC, id DESC"
                ))
                .bind(name)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {BREAKDOWN_COLUMNS} FROM cost_breakdown
                     ORDER BY updated_at DESC, id DESC"
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_error)?;

        let mut breakdowns = Vec::with_capacity(rows.len());
        for row in &rows {
            breakdowns.push(self.load(row).await?);
        }
        Ok(breakdowns)
    }
}
