//! CSV record loader.
//!
//! Opens the products and sales tables, checks their headers, and yields
//! typed records one row at a time. Nothing is buffered here: the pricing
//! engine decides what to materialize.
//!
//! Headers are matched by name, so column order is free and extra columns
//! are ignored. Cells are trimmed before conversion.

use csv::StringRecord;
use pricewatch_core::models::{ProductRecord, SaleRow};
use rust_decimal::Decimal;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{PassError, PassResult};

pub const PRODUCT_COLUMNS: [&str; 5] = ["sku", "name", "current_price", "cost_price", "stock"];
pub const SALES_COLUMNS: [&str; 2] = ["sku", "quantity_sold"];

/// A header-checked CSV table with its required columns resolved to indices.
struct Table<const N: usize> {
    path: PathBuf,
    reader: csv::Reader<File>,
    columns: [usize; N],
    record: StringRecord,
}

impl<const N: usize> Table<N> {
    fn open(path: &Path, required: [&'static str; N]) -> PassResult<Self> {
        let file = File::open(path)
            .map_err(|e| PassError::input_format(path, format!("cannot open: {e}")))?;

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| PassError::input_format(path, format!("malformed header: {e}")))?
            .clone();

        let mut columns = [0usize; N];
        let mut missing = Vec::new();
        for (slot, name) in columns.iter_mut().zip(required) {
            match headers.iter().position(|h| h == name) {
                Some(idx) => *slot = idx,
                None => missing.push(name),
            }
        }
        if !missing.is_empty() {
            return Err(PassError::input_format(
                path,
                format!("missing required column(s): {}", missing.join(", ")),
            ));
        }

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            columns,
            record: StringRecord::new(),
        })
    }

    /// Advance to the next data row. Returns its line number.
    fn advance(&mut self) -> Option<PassResult<u64>> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(Ok(self
                .record
                .position()
                .map(|p| p.line())
                .unwrap_or_default())),
            Ok(false) => None,
            Err(e) => Some(Err(PassError::input_format(
                &self.path,
                format!("unreadable row: {e}"),
            ))),
        }
    }

    /// Cell for the `i`th required column of the current row.
    fn cell(&self, i: usize) -> &str {
        self.record.get(self.columns[i]).unwrap_or("")
    }

    fn decimal(&self, i: usize, line: u64, column: &'static str) -> PassResult<Decimal> {
        let raw = self.cell(i);
        match raw.parse::<Decimal>() {
            Ok(v) if !v.is_sign_negative() || v.is_zero() => Ok(v),
            _ => Err(self.conversion(raw, line, column, "non-negative decimal")),
        }
    }

    fn count(&self, i: usize, line: u64, column: &'static str) -> PassResult<u64> {
        let raw = self.cell(i);
        raw.parse::<u64>()
            .map_err(|_| self.conversion(raw, line, column, "non-negative integer"))
    }

    fn conversion(&self, raw: &str, line: u64, column: &'static str, expected: &'static str) -> PassError {
        PassError::ValueConversion {
            path: self.path.clone(),
            line,
            column,
            value: raw.to_string(),
            expected,
        }
    }
}

/// Streaming reader over the product table.
pub struct ProductRows {
    table: Table<5>,
}

impl Iterator for ProductRows {
    type Item = PassResult<ProductRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.table.advance()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e)),
        };
        Some(self.read_product(line))
    }
}

impl ProductRows {
    fn read_product(&self, line: u64) -> PassResult<ProductRecord> {
        let t = &self.table;
        Ok(ProductRecord {
            sku: t.cell(0).to_string(),
            name: t.cell(1).to_string(),
            current_price: t.decimal(2, line, "current_price")?,
            cost_price: t.decimal(3, line, "cost_price")?,
            stock: t.count(4, line, "stock")?,
        })
    }
}

/// Streaming reader over the sales table.
pub struct SaleRows {
    table: Table<2>,
}

impl Iterator for SaleRows {
    type Item = PassResult<SaleRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.table.advance()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e)),
        };
        let t = &self.table;
        Some(t.count(1, line, "quantity_sold").map(|quantity_sold| SaleRow {
            sku: t.cell(0).to_string(),
            quantity_sold,
        }))
    }
}

/// Open the product table and check its header.
pub fn open_products(path: &Path) -> PassResult<ProductRows> {
    Ok(ProductRows {
        table: Table::open(path, PRODUCT_COLUMNS)?,
    })
}

/// Open the sales table and check its header.
pub fn open_sales(path: &Path) -> PassResult<SaleRows> {
    Ok(SaleRows {
        table: Table::open(path, SALES_COLUMNS)?,
    })
}
