use std::io::Read;

use estimate_core::calculations::parse_decimal;
use estimate_core::{
    BreakdownEditor, CostSection, EstimateRepository, RepositoryError, ResolveContext,
    SavedBreakdown, SeedItem, SeedSource,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading seed items.
#[derive(Debug, Error)]
pub enum SeedItemLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Row {0}: item name is empty")]
    EmptyItemName(usize),

    #[error("Unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for SeedItemLoaderError {
    fn from(err: csv::Error) -> Self {
        SeedItemLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from a seed item CSV file.
///
/// - `item`: line description, also used to classify it
/// - `quantity`: amount in `unit`; blank reads as 0
/// - `unit`: unit label, e.g. `sq ft`, `boxes`, `each`
/// - `unit_price`: optional price per unit
/// - `section`: optional `materials`, `labor` or `other`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SeedItemRecord {
    pub item: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub quantity: Decimal,
    pub unit: String,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub unit_price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_section")]
    pub section: Option<CostSection>,
}

impl From<SeedItemRecord> for SeedItem {
    fn from(record: SeedItemRecord) -> Self {
        SeedItem {
            item: record.item,
            quantity: record.quantity,
            unit: record.unit,
            unit_price: record.unit_price,
            section: record.section,
        }
    }
}

fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_decimal(&s).map_err(serde::de::Error::custom)
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_decimal(&s).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn deserialize_optional_section<'de, D>(deserializer: D) -> Result<Option<CostSection>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => CostSection::parse(&s).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid section '{}', expected materials, labor or other",
                s.trim()
            ))
        }),
        None => Ok(None),
    }
}

/// Loader for seed item lists from CSV files.
///
/// Parsed items go through [`BreakdownEditor::seed`], so they are classified
/// and resolved exactly like items produced by any other upstream source.
pub struct SeedItemLoader;

impl SeedItemLoader {
    /// Parse seed records from a CSV reader with a header row.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SeedItemRecord>, SeedItemLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for (index, result) in csv_reader.deserialize().enumerate() {
            let record: SeedItemRecord = result?;
            if record.item.trim().is_empty() {
                // Header is line 1.
                return Err(SeedItemLoaderError::EmptyItemName(index + 2));
            }
            records.push(record);
        }

        Ok(records)
    }

    /// Parse a CSV reader straight into seed items.
    pub fn parse_items<R: Read>(reader: R) -> Result<Vec<SeedItem>, SeedItemLoaderError> {
        Ok(Self::parse(reader)?.into_iter().map(SeedItem::from).collect())
    }

    /// Build a breakdown from `records` and store it as a new record.
    pub async fn load<R: EstimateRepository + ?Sized>(
        repo: &R,
        editor: &mut BreakdownEditor,
        records: Vec<SeedItemRecord>,
        source: SeedSource,
    ) -> Result<SavedBreakdown, SeedItemLoaderError> {
        editor.seed(records.into_iter().map(SeedItem::from), source);
        let saved = repo.create_breakdown(editor.save_payload()).await?;
        editor.mark_saved();
        info!(id = saved.id, lines = saved.breakdown.len(), "imported breakdown");
        Ok(saved)
    }

    /// Convenience for a fresh project: seed an empty editor and store it.
    pub async fn load_new<R: EstimateRepository + ?Sized>(
        repo: &R,
        project_name: &str,
        ctx: ResolveContext,
        address: &str,
        records: Vec<SeedItemRecord>,
    ) -> Result<SavedBreakdown, SeedItemLoaderError> {
        let mut editor = BreakdownEditor::new(project_name, ctx);
        editor.set_address(address);
        Self::load(repo, &mut editor, records, SeedSource::Manual).await
    }
}
