//! # pricewatch Core
//!
//! Pure pricing logic for pricewatch: record models, the ordered rule
//! chain, the streaming pricing engine, and content fingerprints used for
//! change detection.
//!
//! This crate does no filesystem, network, or async I/O. Loading CSVs,
//! writing output, and watching files live in the `pricewatch` crate.

pub mod chain;
pub mod engine;
pub mod models;
pub mod rule;
pub mod watch;

pub use chain::{Evaluation, RuleChain};
pub use engine::{PricedStream, PricingEngine};
pub use models::{PricedRecord, ProductRecord, SaleRow, SalesAggregate};
pub use rule::Rule;
pub use watch::{Fingerprint, WatchState};
