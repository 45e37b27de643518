//! Core data models used throughout pricewatch.
//!
//! These types represent the product, sales, and priced records that flow
//! through the pricing pipeline. They are plain values: parsing them from
//! files is the loader's job and writing them out is the sink's.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::HashMap;

/// Number of decimal places every price is rounded to.
pub const PRICE_SCALE: u32 = 2;

/// Round a price to [`PRICE_SCALE`] places, midpoint away from zero.
pub fn round_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Smallest [`PRICE_SCALE`]-place price that is not below `price`.
pub fn round_price_up(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::AwayFromZero)
}

/// One row of the product catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub sku: String,
    pub name: String,
    pub current_price: Decimal,
    pub cost_price: Decimal,
    pub stock: u64,
}

/// One row of the sales log. A SKU may appear on many rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRow {
    pub sku: String,
    pub quantity_sold: u64,
}

/// Total quantity sold per SKU, summed over every sales row.
///
/// A SKU that never appeared in the sales data reports zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesAggregate {
    totals: HashMap<String, u64>,
}

impl SalesAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sales row to the running total for its SKU.
    pub fn record(&mut self, row: SaleRow) {
        let total = self.totals.entry(row.sku).or_insert(0);
        *total = total.saturating_add(row.quantity_sold);
    }

    /// Quantity sold for `sku`, or zero when the SKU has no sales rows.
    pub fn quantity_sold(&self, sku: &str) -> u64 {
        self.totals.get(sku).copied().unwrap_or(0)
    }

    /// Whether any sales row mentioned `sku`.
    pub fn contains(&self, sku: &str) -> bool {
        self.totals.contains_key(sku)
    }

    /// Number of distinct SKUs seen.
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

impl FromIterator<SaleRow> for SalesAggregate {
    fn from_iter<T: IntoIterator<Item = SaleRow>>(iter: T) -> Self {
        let mut aggregate = SalesAggregate::new();
        for row in iter {
            aggregate.record(row);
        }
        aggregate
    }
}

/// A product after the rule chain has run over it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedRecord {
    pub sku: String,
    pub name: String,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub stock: u64,
    pub quantity_sold: u64,
    /// Name of the exclusivity rule that fired, if any.
    pub applied_rule: Option<String>,
    /// True when the floor rule raised the price above the candidate.
    pub floor_raised: bool,
}
