//! # pricewatch
//!
//! Rule-based repricing of a product catalog from inventory and sales data.
//!
//! pricewatch reads a products CSV and a sales CSV, runs every product
//! through an ordered chain of pricing rules, and writes an updated price
//! list. It can run once, or keep watching both inputs and reprice whenever
//! their content really changes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────┐   ┌──────────┐
//! │  Loader  │──▶│  Pricing Engine  │──▶│   Sink   │
//! │   CSV    │   │  + Rule Chain    │   │ CSV, tmp │
//! └──────────┘   └──────────────────┘   │ + rename │
//!       ▲                               └──────────┘
//!       │
//! ┌─────┴──────────┐
//! │ Change Monitor │  notify + SHA-256 fingerprints
//! └────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pricewatch init                 # write config/pricewatch.toml
//! pricewatch rules                # show the rule chain
//! pricewatch run                  # one pass
//! pricewatch watch                # reprice on every change, Ctrl+C to stop
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Pass error taxonomy |
//! | [`loader`] | Products and sales CSV readers |
//! | [`sink`] | Atomic price list writer |
//! | [`pass`] | One loader → engine → sink run |
//! | [`monitor`] | Change detection and re-triggering |
//! | [`rules_cmd`] | Rule chain listing |
//! | [`logging`] | Tracing subscriber setup |

pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod monitor;
pub mod pass;
pub mod rules_cmd;
pub mod sink;
