//! CSV loader for index constituents.
//!
//! Expected header:
//!
//! ```text
//! symbol,name,market_index,sector,country,currency,price,high_52w,low_52w,market_cap,pe_ratio,dividend_yield
//! ```
//!
//! The last four columns may be empty.

use super::{storage, MarketIndex, Stock};
use serde::Deserialize;
use sqlx::AnyPool;
use std::{fs, path::Path};
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("line {line}: {source}")]
    Csv { line: u64, source: csv::Error },
    #[error("line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },
    #[error("failed to store stocks: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
struct CsvStock {
    symbol: String,
    name: String,
    market_index: String,
    sector: String,
    country: String,
    currency: String,
    price: f64,
    high_52w: f64,
    low_52w: Option<f64>,
    market_cap: Option<f64>,
    pe_ratio: Option<f64>,
    dividend_yield: Option<f64>,
}

impl CsvStock {
    fn into_stock(self) -> Result<Stock, String> {
        let symbol = self.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err("empty symbol".to_string());
        }

        let market_index = self.market_index.parse::<MarketIndex>()?;

        for (field, value) in [("price", self.price), ("high_52w", self.high_52w)] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{symbol}: {field} must be a non-negative number"));
            }
        }

        let optional = [
            ("low_52w", self.low_52w),
            ("market_cap", self.market_cap),
            ("pe_ratio", self.pe_ratio),
            ("dividend_yield", self.dividend_yield),
        ];
        for (field, value) in optional {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(format!("{symbol}: {field} must be a number"));
            }
        }

        Ok(Stock {
            name: self.name.trim().to_string(),
            market_index,
            sector: self.sector.trim().to_string(),
            country: self.country.trim().to_string(),
            currency: self.currency.trim().to_uppercase(),
            price: self.price,
            high_52w: self.high_52w,
            low_52w: self.low_52w,
            market_cap: self.market_cap,
            pe_ratio: self.pe_ratio,
            dividend_yield: self.dividend_yield,
            symbol,
        })
    }
}

/// Parse and validate every row; the first bad row aborts.
///
/// # Errors
/// Returns an error naming the line of the first unreadable or invalid row.
pub fn read_csv(data: &[u8]) -> Result<Vec<Stock>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = csv_reader
        .headers()
        .map_err(|source| ImportError::Csv { line: 1, source })?
        .clone();

    let mut stocks = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|source| {
            let line = source.position().map_or(0, csv::Position::line);
            ImportError::Csv { line, source }
        })?;
        let line = record
            .position()
            .map_or(0, |position| record_line(data, position));
        let row: CsvStock = record
            .deserialize(Some(&headers))
            .map_err(|source| ImportError::Csv { line, source })?;
        let stock = row
            .into_stock()
            .map_err(|reason| ImportError::InvalidRow { line, reason })?;
        stocks.push(stock);
    }

    Ok(stocks)
}

// The reader may report the position before skipped blank lines.
fn record_line(data: &[u8], position: &csv::Position) -> u64 {
    let start = usize::try_from(position.byte()).unwrap_or(usize::MAX);
    let skipped = data
        .get(start..)
        .unwrap_or_default()
        .iter()
        .take_while(|byte| matches!(byte, b'\r' | b'\n'))
        .filter(|byte| **byte == b'\n')
        .count();
    position.line() + u64::try_from(skipped).unwrap_or(0)
}

/// Import a CSV file into the `stocks` table, returning the number of rows read.
///
/// # Errors
/// Returns an error if the file cannot be read, a row is invalid or the upsert fails.
#[instrument(skip(pool))]
pub async fn import_file(pool: &AnyPool, path: &Path) -> Result<usize, ImportError> {
    let data = fs::read(path).map_err(|source| ImportError::Open {
        path: path.display().to_string(),
        source,
    })?;

    let stocks = read_csv(&data)?;
    storage::upsert_stocks(pool, &stocks).await?;

    info!("Imported {} stocks from {}", stocks.len(), path.display());

    Ok(stocks.len())
}
