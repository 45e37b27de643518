//! # pricewatch CLI
//!
//! The `pricewatch` binary reprices a product catalog from a products CSV
//! and a sales CSV.
//!
//! ## Usage
//!
//! ```bash
//! pricewatch --config ./config/pricewatch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pricewatch init` | Write an example configuration file |
//! | `pricewatch rules` | List the rule chain in evaluation order |
//! | `pricewatch run` | Run one pricing pass and write the price list |
//! | `pricewatch watch` | Run a pass, then re-run whenever an input changes |
//!
//! ## Examples
//!
//! ```bash
//! # One pass with the default file names in the current directory
//! pricewatch run
//!
//! # Explicit inputs, summary as JSON
//! pricewatch --products data/products.csv --sales data/sales.csv run --json
//!
//! # Keep the price list current while the inputs are edited
//! pricewatch watch --config ./config/pricewatch.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use pricewatch::{config, logging, monitor, pass, rules_cmd};

const DEFAULT_CONFIG: &str = "./config/pricewatch.toml";

/// pricewatch: rule-based product repricing from inventory and sales data.
///
/// Settings come from a TOML file (`--config`); the path flags override
/// the file. Without a config file, `products.csv` and `sales.csv` in the
/// current directory are priced into `updated_prices.csv`.
#[derive(Parser)]
#[command(
    name = "pricewatch",
    about = "Rule-based product repricing from inventory and sales data",
    version,
    long_about = "pricewatch reads a products CSV and a sales CSV, applies an ordered chain of \
    pricing rules (at most one adjustment rule per product, then a minimum-profit floor), and \
    writes an updated price list. It can run once or watch the inputs and reprice on every change."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/pricewatch.toml`, which may be absent.
    /// A path given explicitly must exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Products CSV (overrides `inputs.products`).
    #[arg(long, global = true)]
    products: Option<PathBuf>,

    /// Sales CSV (overrides `inputs.sales`).
    #[arg(long, global = true)]
    sales: Option<PathBuf>,

    /// Output price list (overrides `output.path`).
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Write an example configuration file.
    ///
    /// Creates the file at `--config` (or the default path). Refuses to
    /// overwrite an existing file.
    Init,

    /// List the rule chain in evaluation order.
    ///
    /// Shows the adjustment rules by priority, then the floor rule, as
    /// configured (disabled rules are left out).
    Rules,

    /// Run one pricing pass.
    ///
    /// Reads both inputs, prices every product, and atomically replaces
    /// the output file. Any input or output error exits non-zero and
    /// leaves the previous output untouched.
    Run {
        /// Price everything but do not write the output file.
        #[arg(long)]
        dry_run: bool,

        /// Print the pass summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Watch the inputs and re-run on every content change.
    ///
    /// Runs one pass immediately, then watches the inputs' directories.
    /// Notifications whose file content is unchanged are ignored. A failed
    /// pass is logged and retried on the next change. Stop with Ctrl+C.
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    // Commands that don't require config
    if let Commands::Init = cli.command {
        config::scaffold_config(&config_path)?;
        return Ok(());
    }

    let cfg = config::load_or_default(&config_path, cli.config.is_some())?
        .with_overrides(cli.products, cli.sales, cli.output);
    cfg.validate()?;
    logging::init(&cfg.log);

    match cli.command {
        Commands::Init => unreachable!(),
        Commands::Rules => {
            rules_cmd::list_rules(&cfg)?;
        }
        Commands::Run { dry_run, json } => {
            let summary = pass::run_pass(&cfg, &cfg.engine(), dry_run)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                summary.print();
            }
        }
        Commands::Watch => {
            monitor::run_monitor(cfg).await?;
        }
    }

    Ok(())
}
