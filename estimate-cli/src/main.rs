use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::debug;

use estimate_cli::app::{self, EstimateRequest};
use estimate_cli::config::Config;
use estimate_cli::logging;
use estimate_core::EstimateRepository;
use estimate_core::db::DbConfig;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Construction cost estimator with Canadian sales tax.
///
/// Resolves material quantities from a net area, prices a breakdown of
/// materials, labor and other costs, and stores estimates in the configured
/// database.
#[derive(Debug, Parser)]
#[command(name = "cost-estimator", version)]
struct Cli {
    /// Settings file. Defaults to `cost-estimator.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use (`sqlite` or `memory`).
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `estimates.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log level or EnvFilter directive. `RUST_LOG` takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Hide log output on stderr.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Purchase quantity for one material.
    Resolve {
        /// Material name, e.g. "Laminate flooring".
        #[arg(long)]
        material: String,

        /// Net area in square feet.
        #[arg(long, value_parser = app::decimal_arg)]
        area: Decimal,

        /// Waste buffer percentage.
        #[arg(long, value_parser = app::decimal_arg)]
        waste: Option<Decimal>,
    },

    /// Sales tax on a subtotal for the province an address is in.
    Tax {
        #[arg(long, value_parser = app::decimal_arg)]
        subtotal: Decimal,

        #[arg(long)]
        address: Option<String>,
    },

    /// Build an estimate from templates and/or a seed item CSV.
    Estimate {
        /// CSV with columns item, quantity, unit, unit_price, section.
        #[arg(long)]
        items: Option<PathBuf>,

        /// Built-in template to seed from. Repeatable.
        #[arg(long = "template")]
        templates: Vec<String>,

        /// Net project area in square feet.
        #[arg(long, value_parser = app::decimal_arg)]
        area: Option<Decimal>,

        #[arg(long, value_parser = app::decimal_arg)]
        waste: Option<Decimal>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long, default_value = "Untitled")]
        project: String,

        /// Store the estimate after printing it.
        #[arg(long)]
        save: bool,
    },

    /// Saved estimates, most recently updated first.
    List {
        #[arg(long)]
        project: Option<String>,
    },

    /// Print a saved estimate.
    Show {
        #[arg(long)]
        id: i64,
    },

    /// Delete a saved estimate.
    Delete {
        #[arg(long)]
        id: i64,
    },

    /// List the built-in templates.
    Templates,
}

// ─── entry point ─────────────────────────────────────────────────────────────

async fn open_repository(db_config: &DbConfig) -> Result<Arc<dyn EstimateRepository>> {
    debug!("connecting to {} backend", db_config.backend);
    let registry = app::build_registry();
    let repo = registry
        .create(db_config)
        .await
        .with_context(|| format!("Failed to open {} database", db_config.backend))?;
    Ok(Arc::from(repo))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    logging::init_logging(cli.log_level.as_deref().or(config.logging.level.as_deref()));
    if cli.quiet {
        logging::set_console_enabled(false)?;
    }
    if let Some(path) = &config.logging.file {
        logging::enable_file_logging(path)?;
    }

    let mut db_config = config.database.to_db_config();
    if let Some(backend) = cli.backend {
        db_config.backend = backend;
    }
    if let Some(db) = cli.db {
        db_config.connection_string = db;
    }
    let default_waste = config.estimate.default_waste_percent;
    let default_address = config.estimate.default_address.clone();

    match cli.command {
        Command::Resolve {
            material,
            area,
            waste,
        } => {
            println!("{}", app::resolve_report(&material, area, waste.unwrap_or(default_waste)));
        }
        Command::Tax { subtotal, address } => {
            let address = address.unwrap_or(default_address);
            println!("{}", app::tax_report(subtotal, &address));
        }
        Command::Estimate {
            items,
            templates,
            area,
            waste,
            address,
            project,
            save,
        } => {
            let request = EstimateRequest {
                project,
                address: address.unwrap_or(default_address),
                area,
                waste_percent: waste.unwrap_or(default_waste),
                items,
                templates,
            };
            let mut editor = app::build_estimate(&request)?;
            println!("{}", editor.document());

            if save {
                let repo = open_repository(&db_config).await?;
                let id = app::save_estimate(repo, &mut editor, config.autosave.idle()).await?;
                println!("Saved as estimate #{id}");
            }
        }
        Command::List { project } => {
            let repo = open_repository(&db_config).await?;
            println!("{}", app::list_report(repo.as_ref(), project.as_deref()).await?);
        }
        Command::Show { id } => {
            let repo = open_repository(&db_config).await?;
            println!("{}", app::show_report(repo.as_ref(), id).await?);
        }
        Command::Delete { id } => {
            let repo = open_repository(&db_config).await?;
            app::delete_estimate(repo.as_ref(), id).await?;
            println!("Deleted estimate #{id}");
        }
        Command::Templates => {
            println!("{}", app::templates_report());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn estimate_accepts_repeated_templates() {
        let cli = Cli::try_parse_from([
            "cost-estimator",
            "estimate",
            "--template",
            "flooring",
            "--template",
            "tile",
            "--area",
            "1,350",
            "--save",
            "--backend",
            "memory",
        ])
        .expect("valid arguments");

        assert_eq!(cli.backend.as_deref(), Some("memory"));
        match cli.command {
            Command::Estimate {
                templates,
                area,
                save,
                ..
            } => {
                assert_eq!(templates, vec!["flooring", "tile"]);
                assert_eq!(area, Some(dec!(1350)));
                assert!(save);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn malformed_area_is_rejected() {
        let result = Cli::try_parse_from([
            "cost-estimator",
            "resolve",
            "--material",
            "Drywall",
            "--area",
            "lots",
        ]);

        assert!(result.is_err());
    }
}
