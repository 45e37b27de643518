//! Pricing engine.
//!
//! Drives a [`RuleChain`] over a stream of products. Sales rows are consumed
//! up front into a [`SalesAggregate`]; products are pulled one at a time by
//! the returned iterator and never buffered, so callers can stream the
//! results straight into a sink.
//!
//! Sources are iterators of `Result` so that the loader's row errors pass
//! through untouched: a bad sales row fails [`PricingEngine::run`] before any
//! product is read, and a bad product row is yielded in its position in the
//! output stream.
//!
//! # Example
//!
//! ```rust
//! use std::convert::Infallible;
//! use pricewatch_core::engine::PricingEngine;
//! use pricewatch_core::models::{ProductRecord, SaleRow};
//!
//! let engine = PricingEngine::default();
//! let products = vec![Ok::<_, Infallible>(ProductRecord {
//!     sku: "A1".into(),
//!     name: "Widget".into(),
//!     current_price: "100".parse().unwrap(),
//!     cost_price: "50".parse().unwrap(),
//!     stock: 10,
//! })];
//! let sales = vec![Ok(SaleRow { sku: "A1".into(), quantity_sold: 40 })];
//!
//! let priced: Vec<_> = engine.run(products, sales).unwrap().collect::<Result<_, _>>().unwrap();
//! assert_eq!(priced[0].new_price.to_string(), "115.00");
//! ```

use crate::chain::RuleChain;
use crate::models::{PricedRecord, ProductRecord, SaleRow, SalesAggregate};

#[derive(Debug, Default)]
pub struct PricingEngine {
    chain: RuleChain,
}

impl PricingEngine {
    pub fn new(chain: RuleChain) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &RuleChain {
        &self.chain
    }

    /// Sum every sales row per SKU. Stops at the first row error.
    pub fn aggregate_sales<S, E>(sales: S) -> Result<SalesAggregate, E>
    where
        S: IntoIterator<Item = Result<SaleRow, E>>,
    {
        let mut aggregate = SalesAggregate::new();
        for row in sales {
            aggregate.record(row?);
        }
        Ok(aggregate)
    }

    /// Price a single product against already-aggregated sales.
    pub fn price_product(&self, product: ProductRecord, sales: &SalesAggregate) -> PricedRecord {
        let quantity_sold = sales.quantity_sold(&product.sku);
        let eval = self.chain.evaluate(&product, quantity_sold);
        let floor_raised = eval.floor_raised();
        PricedRecord {
            sku: product.sku,
            name: product.name,
            old_price: product.current_price,
            new_price: eval.new_price,
            stock: product.stock,
            quantity_sold,
            applied_rule: eval.applied_rule,
            floor_raised,
        }
    }

    /// Aggregate `sales`, then return a lazy stream pricing each product.
    pub fn run<P, S, E>(&self, products: P, sales: S) -> Result<PricedStream<'_, P::IntoIter>, E>
    where
        P: IntoIterator<Item = Result<ProductRecord, E>>,
        S: IntoIterator<Item = Result<SaleRow, E>>,
    {
        let sales = Self::aggregate_sales(sales)?;
        Ok(PricedStream {
            engine: self,
            sales,
            products: products.into_iter(),
        })
    }
}

/// Lazy sequence of [`PricedRecord`]s produced by [`PricingEngine::run`].
pub struct PricedStream<'a, I> {
    engine: &'a PricingEngine,
    sales: SalesAggregate,
    products: I,
}

impl<I> PricedStream<'_, I> {
    /// The sales totals this stream prices against.
    pub fn sales(&self) -> &SalesAggregate {
        &self.sales
    }
}

impl<I, E> Iterator for PricedStream<'_, I>
where
    I: Iterator<Item = Result<ProductRecord, E>>,
{
    type Item = Result<PricedRecord, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let product = self.products.next()?;
        Some(product.map(|p| self.engine.price_product(p, &self.sales)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.products.size_hint()
    }
}
