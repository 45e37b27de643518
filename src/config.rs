//! TOML configuration.
//!
//! ```toml
//! [inputs]
//! products = "products.csv"
//! sales = "sales.csv"
//!
//! [output]
//! path = "updated_prices.csv"
//! price_prefix = ""
//!
//! [pricing]
//! floor_margin = "0.20"
//! disabled_rules = []
//!
//! [watch]
//! settle_ms = 200
//!
//! [log]
//! filter = "pricewatch=info"
//! ```
//!
//! Every section is optional; missing keys fall back to the defaults above.

use anyhow::{bail, Context, Result};
use pricewatch_core::rule;
use pricewatch_core::{PricingEngine, RuleChain};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub inputs: InputsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputsConfig {
    #[serde(default = "default_products")]
    pub products: PathBuf,
    #[serde(default = "default_sales")]
    pub sales: PathBuf,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            products: default_products(),
            sales: default_sales(),
        }
    }
}

fn default_products() -> PathBuf {
    PathBuf::from("products.csv")
}
fn default_sales() -> PathBuf {
    PathBuf::from("sales.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output")]
    pub path: PathBuf,
    /// Written before every price in the output, e.g. `"$"`.
    #[serde(default)]
    pub price_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output(),
            price_prefix: String::new(),
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("updated_prices.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    /// Minimum margin over cost enforced by the floor rule.
    #[serde(default = "rule::default_floor_margin")]
    pub floor_margin: Decimal,
    /// Names of default rules to leave out of the chain.
    #[serde(default)]
    pub disabled_rules: Vec<String>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            floor_margin: rule::default_floor_margin(),
            disabled_rules: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WatchConfig {
    /// How long to wait after a notification for the rest of its burst.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
        }
    }
}

fn default_settle_ms() -> u64 {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "pricewatch=info".to_string()
}

impl Config {
    /// Defaults only: `products.csv` + `sales.csv` in, `updated_prices.csv` out.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Apply command-line path overrides on top of the file.
    pub fn with_overrides(
        mut self,
        products: Option<PathBuf>,
        sales: Option<PathBuf>,
        output: Option<PathBuf>,
    ) -> Self {
        if let Some(p) = products {
            self.inputs.products = p;
        }
        if let Some(s) = sales {
            self.inputs.sales = s;
        }
        if let Some(o) = output {
            self.output.path = o;
        }
        self
    }

    /// Build the rule chain this config describes.
    pub fn rule_chain(&self) -> RuleChain {
        let mut chain = RuleChain::new(rule::minimum_profit(self.pricing.floor_margin));
        for r in rule::default_rules() {
            if !self.pricing.disabled_rules.iter().any(|d| d == r.name()) {
                chain.add_rule(r);
            }
        }
        chain
    }

    /// A pricing engine over [`Config::rule_chain`].
    pub fn engine(&self) -> PricingEngine {
        PricingEngine::new(self.rule_chain())
    }

    pub fn validate(&self) -> Result<()> {
        if self.pricing.floor_margin.is_sign_negative() {
            bail!("pricing.floor_margin must be >= 0");
        }

        let known: Vec<String> = rule::default_rules()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        for name in &self.pricing.disabled_rules {
            if !known.contains(name) {
                bail!(
                    "Unknown rule in pricing.disabled_rules: '{}'. Known rules: {}",
                    name,
                    known.join(", ")
                );
            }
        }

        if let Err(e) = EnvFilter::try_new(&self.log.filter) {
            bail!("Invalid log.filter '{}': {}", self.log.filter, e);
        }

        if self.inputs.products == self.inputs.sales {
            bail!("inputs.products and inputs.sales must be different files");
        }
        for input in [&self.inputs.products, &self.inputs.sales] {
            if *input == self.output.path {
                bail!(
                    "output.path must not overwrite an input file: {}",
                    input.display()
                );
            }
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    Ok(config)
}

/// Load `path` if it exists; otherwise fall back to [`Config::minimal`]
/// unless the caller insisted on that file.
pub fn load_or_default(path: &Path, required: bool) -> Result<Config> {
    if !required && !path.exists() {
        return Ok(Config::minimal());
    }
    load_config(path)
}

const EXAMPLE_CONFIG: &str = r#"# pricewatch configuration

[inputs]
products = "products.csv"
sales = "sales.csv"

[output]
path = "updated_prices.csv"
# price_prefix = "$"

[pricing]
# Minimum margin over cost_price enforced on every product.
floor_margin = "0.20"
# Default rules to switch off, by name:
#   "Low Stock, High Demand", "Dead Stock", "Overstocked Inventory"
disabled_rules = []

[watch]
settle_ms = 200

[log]
# Overridden by RUST_LOG when set.
filter = "pricewatch=info"
"#;

/// Write a commented example config to `path`. Refuses to overwrite.
pub fn scaffold_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.inputs.products, PathBuf::from("products.csv"));
        assert_eq!(config.output.path, PathBuf::from("updated_prices.csv"));
        assert_eq!(config.pricing.floor_margin, Decimal::new(20, 2));
        assert_eq!(config.watch.settle_ms, 200);
        config.validate().unwrap();
    }

    #[test]
    fn example_config_parses() {
        let config: Config = toml::from_str(EXAMPLE_CONFIG).unwrap();
        config.validate().unwrap();
        assert_eq!(config.rule_chain().rules().len(), 3);
    }

    #[test]
    fn disabled_rules_are_left_out() {
        let config: Config = toml::from_str(
            r#"
            [pricing]
            disabled_rules = ["Dead Stock"]
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        let chain = config.rule_chain();
        assert!(!chain.contains(rule::DEAD_STOCK));
        assert_eq!(chain.rules().len(), 2);
    }

    #[test]
    fn unknown_disabled_rule_rejected() {
        let config: Config = toml::from_str(
            r#"
            [pricing]
            disabled_rules = ["Half Price Tuesdays"]
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("Half Price Tuesdays"));
    }

    #[test]
    fn negative_margin_rejected() {
        let config: Config = toml::from_str(
            r#"
            [pricing]
            floor_margin = "-0.1"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_log_filter_rejected() {
        let config: Config = toml::from_str(
            r#"
            [log]
            filter = "pricewatch=loud"
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("log.filter"));
    }

    #[test]
    fn output_cannot_clobber_input() {
        let config = Config::minimal().with_overrides(None, None, Some("sales.csv".into()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn scaffold_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config/pricewatch.toml");
        scaffold_config(&path).unwrap();
        assert!(load_config(&path).is_ok());
        assert!(scaffold_config(&path).is_err());
    }
}
