//! Pricing pass orchestration.
//!
//! One pass reads both inputs, streams every product through the pricing
//! engine, and writes the price list: loader → engine → sink. Errors stop
//! the pass at the first bad row and are returned to the caller, which
//! decides whether they are fatal (one-shot) or logged (monitor).

use chrono::{DateTime, Utc};
use pricewatch_core::PricingEngine;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::PassResult;
use crate::loader;
use crate::sink;

/// What a pass did.
#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub products: u64,
    /// Fire count per exclusivity rule name.
    pub rules_fired: BTreeMap<String, u64>,
    pub floor_raised: u64,
    /// Products with no sales rows, priced as zero sold.
    pub missing_sales: u64,
    pub sales_skus: usize,
    /// `None` for a dry run.
    pub output: Option<PathBuf>,
    pub finished_at: DateTime<Utc>,
}

impl PassSummary {
    fn new() -> Self {
        Self {
            products: 0,
            rules_fired: BTreeMap::new(),
            floor_raised: 0,
            missing_sales: 0,
            sales_skus: 0,
            output: None,
            finished_at: Utc::now(),
        }
    }

    /// Human-readable report on stdout.
    pub fn print(&self) {
        match &self.output {
            Some(path) => println!("price pass -> {}", path.display()),
            None => println!("price pass (dry-run)"),
        }
        println!("  products priced: {}", self.products);
        println!("  skus with sales: {}", self.sales_skus);
        for (rule, count) in &self.rules_fired {
            println!("  {}: {}", rule, count);
        }
        println!("  raised to floor: {}", self.floor_raised);
        println!("  without sales data: {}", self.missing_sales);
        println!("ok");
    }
}

/// Run one full pass. With `dry_run`, everything is priced but nothing is written.
pub fn run_pass(config: &Config, engine: &PricingEngine, dry_run: bool) -> PassResult<PassSummary> {
    let inputs = &config.inputs;
    tracing::debug!(
        products = %inputs.products.display(),
        sales = %inputs.sales.display(),
        "starting pass"
    );

    let sales = loader::open_sales(&inputs.sales)?;
    let products = loader::open_products(&inputs.products)?;
    let mut stream = engine.run(products, sales)?;

    let mut summary = PassSummary::new();
    summary.sales_skus = stream.sales().len();

    let records = std::iter::from_fn(|| {
        let item = stream.next()?;
        if let Ok(r) = &item {
            summary.products += 1;
            if let Some(rule) = &r.applied_rule {
                *summary.rules_fired.entry(rule.clone()).or_insert(0) += 1;
            }
            if r.floor_raised {
                summary.floor_raised += 1;
            }
            if !stream.sales().contains(&r.sku) {
                summary.missing_sales += 1;
                tracing::debug!(sku = %r.sku, "no sales data, pricing as zero sold");
            }
        }
        Some(item)
    });

    let output = &config.output;
    let rows = if dry_run {
        sink::write_records(io::sink(), &output.path, &output.price_prefix, records)?
    } else {
        sink::write_atomic(&output.path, &output.price_prefix, records)?
    };

    if !dry_run {
        summary.output = Some(output.path.clone());
    }
    summary.finished_at = Utc::now();

    tracing::info!(
        rows,
        floor_raised = summary.floor_raised,
        missing_sales = summary.missing_sales,
        dry_run,
        "pass complete"
    );
    Ok(summary)
}
