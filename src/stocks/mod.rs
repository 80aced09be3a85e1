//! Stock universe and screening.
//!
//! A [`Stock`] is one constituent of a supported index with its last price
//! and 52-week range. Screening loads the candidates of the requested index
//! from storage and applies [`SearchFilters`] in memory.

pub mod filters;
pub mod import;
pub mod storage;

pub use filters::{screen, FilterError, IndexScope, SearchFilters, SortField, SortOrder};

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MarketIndex {
    Stoxx600,
    Sp500,
}

impl MarketIndex {
    pub const ALL: [Self; 2] = [Self::Stoxx600, Self::Sp500];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stoxx600 => "stoxx600",
            Self::Sp500 => "sp500",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Stoxx600 => "Eurostoxx 600",
            Self::Sp500 => "S&P 500",
        }
    }
}

impl fmt::Display for MarketIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketIndex {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '&' && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "stoxx600" | "eurostoxx600" | "sxxp" => Ok(Self::Stoxx600),
            "sp500" | "spx" => Ok(Self::Sp500),
            _ => Err(format!("unknown index: {value}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    pub market_index: MarketIndex,
    pub sector: String,
    pub country: String,
    pub currency: String,
    pub price: f64,
    pub high_52w: f64,
    pub low_52w: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl Stock {
    /// Decline of the last price from the 52-week high, in percent.
    #[must_use]
    pub fn drop_pct(&self) -> f64 {
        if self.high_52w <= 0.0 {
            return 0.0;
        }
        (self.high_52w - self.price) / self.high_52w * 100.0
    }
}

/// A stock as returned by the screening endpoints.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StockResult {
    pub symbol: String,
    pub name: String,
    pub index: MarketIndex,
    pub sector: String,
    pub country: String,
    pub currency: String,
    pub price: f64,
    pub high_52w: f64,
    pub low_52w: Option<f64>,
    /// Percent below the 52-week high, rounded to two decimals.
    pub drop_pct: f64,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl From<&Stock> for StockResult {
    fn from(stock: &Stock) -> Self {
        Self {
            symbol: stock.symbol.clone(),
            name: stock.name.clone(),
            index: stock.market_index,
            sector: stock.sector.clone(),
            country: stock.country.clone(),
            currency: stock.currency.clone(),
            price: stock.price,
            high_52w: stock.high_52w,
            low_52w: stock.low_52w,
            drop_pct: (stock.drop_pct() * 100.0).round() / 100.0,
            market_cap: stock.market_cap,
            pe_ratio: stock.pe_ratio,
            dividend_yield: stock.dividend_yield,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_stock(symbol: &str, index: MarketIndex, price: f64, high: f64) -> Stock {
    Stock {
        symbol: symbol.to_string(),
        name: format!("{symbol} Corp"),
        market_index: index,
        sector: "Technology".to_string(),
        country: "US".to_string(),
        currency: "USD".to_string(),
        price,
        high_52w: high,
        low_52w: None,
        market_cap: None,
        pe_ratio: None,
        dividend_yield: None,
    }
}
