//! Command handlers behind `cost-estimator`.
//!
//! Each handler returns the text to print so the binary stays a thin clap
//! shell and the handlers can be exercised against the memory backend.

use std::fmt::Write as _;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use estimate_core::calculations::{compute_tax, parse_decimal, resolve_jurisdiction, resolve_quantity};
use estimate_core::db::{MemoryRepositoryFactory, RepositoryRegistry};
use estimate_core::{
    AutoSaver, BreakdownEditor, EstimateRepository, ResolveContext, SeedSource, TaxBreakdown,
};
use estimate_data::{SeedItemLoader, TEMPLATES, preset};
use estimate_db_sqlite::SqliteRepositoryFactory;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Every storage backend the binary can open.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(MemoryRepositoryFactory));
    registry
}

/// clap value parser that accepts the same input as the editor,
/// e.g. `1,350` or `$45.99`.
pub fn decimal_arg(s: &str) -> Result<Decimal, String> {
    parse_decimal(s).map_err(|e| e.to_string())
}

pub fn resolve_report(
    material: &str,
    net_area: Decimal,
    waste_percent: Decimal,
) -> String {
    let Some(resolved) = resolve_quantity(material, net_area, waste_percent) else {
        return format!("{material}: net area must be greater than zero");
    };

    let mut out = format!(
        "{material}: {} sq ft + {}% waste = {} sq ft\n",
        resolved.net_quantity.normalize(),
        waste_percent.normalize(),
        resolved.gross_area,
    );
    match resolved.rule {
        Some(rule) if rule.divides() => {
            let _ = write!(
                out,
                "Order {} {} ({} sq ft per unit)",
                resolved.gross_quantity,
                resolved.unit,
                rule.coverage_per_unit,
            );
        }
        Some(_) => {
            let _ = write!(out, "Order {} {}", resolved.gross_quantity, resolved.unit);
        }
        None => {
            let _ = write!(
                out,
                "No coverage rule matched; order {} {}",
                resolved.gross_quantity, resolved.unit
            );
        }
    }
    out
}

fn write_tax(
    out: &mut String,
    tax: &TaxBreakdown,
) {
    let _ = writeln!(out, "Subtotal: {:.2}", tax.subtotal);
    for line in &tax.lines {
        let _ = writeln!(
            out,
            "{} ({}%): {:.2}",
            line.name,
            (line.rate * Decimal::ONE_HUNDRED).normalize(),
            line.amount
        );
    }
    let _ = writeln!(out, "Total tax: {:.2}", tax.total_tax);
    let _ = write!(out, "Grand total: {:.2}", tax.grand_total);
}

pub fn tax_report(
    subtotal: Decimal,
    address: &str,
) -> String {
    let jurisdiction = resolve_jurisdiction(address);
    let tax = compute_tax(address, subtotal);

    let mut out = format!(
        "{} ({}): {}\n",
        jurisdiction.name,
        jurisdiction.code,
        jurisdiction.describe()
    );
    write_tax(&mut out, &tax);
    out
}

/// Everything `estimate` needs to build a breakdown.
#[derive(Debug, Clone, Default)]
pub struct EstimateRequest {
    pub project: String,
    pub address: String,
    pub area: Option<Decimal>,
    pub waste_percent: Decimal,
    /// CSV of seed items, see [`SeedItemLoader`].
    pub items: Option<PathBuf>,
    pub templates: Vec<String>,
}

/// Seeds a fresh editor from the requested templates, then the CSV.
pub fn build_estimate(request: &EstimateRequest) -> Result<BreakdownEditor> {
    let mut editor = BreakdownEditor::new(
        request.project.as_str(),
        ResolveContext::new(request.area, request.waste_percent),
    );
    editor.set_address(request.address.as_str());

    for name in &request.templates {
        let items = preset(name).with_context(|| format!("Failed to load template '{name}'"))?;
        editor.seed(items, SeedSource::Template);
    }

    if let Some(path) = &request.items {
        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let items = SeedItemLoader::parse_items(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        editor.seed(items, SeedSource::Manual);
    }

    if editor.breakdown().is_empty() {
        bail!("nothing to estimate; pass --items or --template");
    }

    debug!(lines = editor.breakdown().len(), "estimate built");
    Ok(editor)
}

/// Stores `editor` through the auto-saver and waits for the write.
pub async fn save_estimate(
    repo: Arc<dyn EstimateRepository>,
    editor: &mut BreakdownEditor,
    idle: Duration,
) -> Result<i64> {
    let saver = AutoSaver::spawn(repo, idle, None);
    saver.schedule(editor.save_payload());
    let id = saver.flush().await.context("Failed to save estimate")?;
    saver.shutdown().await;
    editor.mark_saved();

    info!(id, project = editor.project_name(), "estimate saved");
    Ok(id)
}

pub async fn list_report(
    repo: &dyn EstimateRepository,
    project: Option<&str>,
) -> Result<String> {
    let rows = repo
        .list_breakdowns(project)
        .await
        .context("Failed to list estimates")?;
    if rows.is_empty() {
        return Ok("No saved estimates.".to_string());
    }

    let mut out = format!(
        "{:>5}  {:<24} {:<28} {:>12}  {}\n",
        "id", "project", "address", "grand total", "updated"
    );
    for row in &rows {
        let _ = writeln!(
            out,
            "{:>5}  {:<24} {:<28} {:>12.2}  {}",
            row.id,
            row.project_name,
            row.address,
            row.grand_total,
            row.updated_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(out.trim_end().to_string())
}

/// Reopens a saved estimate and renders it with freshly computed totals.
pub async fn show_report(
    repo: &dyn EstimateRepository,
    id: i64,
) -> Result<String> {
    let saved = repo
        .get_breakdown(id)
        .await
        .with_context(|| format!("Failed to load estimate {id}"))?;
    let editor = BreakdownEditor::from_saved(&saved);

    Ok(format!("Estimate #{id}\n{}", editor.document()))
}

pub async fn delete_estimate(
    repo: &dyn EstimateRepository,
    id: i64,
) -> Result<()> {
    repo.delete_breakdown(id)
        .await
        .with_context(|| format!("Failed to delete estimate {id}"))?;
    info!(id, "estimate deleted");
    Ok(())
}

pub fn templates_report() -> String {
    TEMPLATES
        .iter()
        .map(|t| format!("{:<10} {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n")
}
