//! Price list writer.
//!
//! Output is written to a temporary file next to the destination and renamed
//! over it only once every record has been written. A pass that fails part
//! way through leaves the previous price list untouched.

use pricewatch_core::models::PricedRecord;
use rust_decimal::Decimal;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{PassError, PassResult};

pub const OUTPUT_COLUMNS: [&str; 6] = [
    "sku",
    "name",
    "old_price",
    "new_price",
    "stock",
    "quantity_sold",
];

fn format_price(prefix: &str, price: Decimal) -> String {
    format!("{}{:.2}", prefix, price)
}

/// Write a header plus one row per record to `writer`. Returns the row count.
///
/// Stops at the first upstream error and returns it unchanged; write
/// failures are reported against `path`.
pub fn write_records<W, I>(writer: W, path: &Path, prefix: &str, records: I) -> PassResult<u64>
where
    W: Write,
    I: IntoIterator<Item = PassResult<PricedRecord>>,
{
    let sink_err = |e: csv::Error| PassError::sink_write(path, io::Error::other(e));

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(OUTPUT_COLUMNS).map_err(sink_err)?;

    let mut rows = 0u64;
    for record in records {
        let r = record?;
        let old_price = format_price(prefix, r.old_price);
        let new_price = format_price(prefix, r.new_price);
        let stock = r.stock.to_string();
        let quantity_sold = r.quantity_sold.to_string();
        out.write_record([
            r.sku.as_str(),
            r.name.as_str(),
            old_price.as_str(),
            new_price.as_str(),
            stock.as_str(),
            quantity_sold.as_str(),
        ])
        .map_err(sink_err)?;
        rows += 1;
    }

    out.flush().map_err(|e| PassError::sink_write(path, e))?;
    Ok(rows)
}

/// Write every record to `path`, replacing it atomically on success.
pub fn write_atomic<I>(path: &Path, prefix: &str, records: I) -> PassResult<u64>
where
    I: IntoIterator<Item = PassResult<PricedRecord>>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir).map_err(|e| PassError::sink_write(path, e))?;
    let rows = write_records(tmp.as_file(), path, prefix, records)?;

    tmp.as_file()
        .sync_all()
        .map_err(|e| PassError::sink_write(path, e))?;
    tmp.persist(path)
        .map_err(|e| PassError::sink_write(path, e.error))?;

    Ok(rows)
}
