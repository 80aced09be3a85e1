//! In-memory screening over a candidate list.

use super::{MarketIndex, Stock, StockResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;
use utoipa::ToSchema;

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 500;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexScope {
    #[default]
    All,
    Stoxx600,
    Sp500,
}

impl IndexScope {
    #[must_use]
    pub const fn market_index(self) -> Option<MarketIndex> {
        match self {
            Self::All => None,
            Self::Stoxx600 => Some(MarketIndex::Stoxx600),
            Self::Sp500 => Some(MarketIndex::Sp500),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Drop,
    MarketCap,
    PeRatio,
    DividendYield,
    Symbol,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Screening criteria sent by the search form and stored with saved searches.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SearchFilters {
    pub index: IndexScope,
    /// Minimum percent below the 52-week high.
    pub min_drop: Option<f64>,
    /// Maximum percent below the 52-week high.
    pub max_drop: Option<f64>,
    pub sectors: Vec<String>,
    pub countries: Vec<String>,
    pub min_market_cap: Option<f64>,
    pub max_market_cap: Option<f64>,
    pub max_pe: Option<f64>,
    pub min_dividend_yield: Option<f64>,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub limit: Option<i64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Valeur invalide pour {0}")]
    NotFinite(&'static str),
    #[error("Plage invalide : {0} dépasse {1}")]
    InvalidRange(&'static str, &'static str),
}

impl SearchFilters {
    /// Check numeric bounds before screening.
    ///
    /// # Errors
    /// Returns an error on NaN/infinite values or when a minimum exceeds its maximum.
    pub fn validate(&self) -> Result<(), FilterError> {
        let numbers = [
            ("min_drop", self.min_drop),
            ("max_drop", self.max_drop),
            ("min_market_cap", self.min_market_cap),
            ("max_market_cap", self.max_market_cap),
            ("max_pe", self.max_pe),
            ("min_dividend_yield", self.min_dividend_yield),
        ];
        for (name, value) in numbers {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(FilterError::NotFinite(name));
            }
        }

        if let (Some(min), Some(max)) = (self.min_drop, self.max_drop) {
            if min > max {
                return Err(FilterError::InvalidRange("min_drop", "max_drop"));
            }
        }
        if let (Some(min), Some(max)) = (self.min_market_cap, self.max_market_cap) {
            if min > max {
                return Err(FilterError::InvalidRange("min_market_cap", "max_market_cap"));
            }
        }

        Ok(())
    }

    /// Result cap after clamping to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn effective_limit(&self) -> usize {
        self.limit.map_or(DEFAULT_LIMIT, |limit| {
            usize::try_from(limit.max(1)).map_or(MAX_LIMIT, |limit| limit.min(MAX_LIMIT))
        })
    }

    #[must_use]
    pub fn matches(&self, stock: &Stock) -> bool {
        if let Some(index) = self.index.market_index() {
            if stock.market_index != index {
                return false;
            }
        }

        let drop = stock.drop_pct();
        if self.min_drop.is_some_and(|min| drop < min) {
            return false;
        }
        if self.max_drop.is_some_and(|max| drop > max) {
            return false;
        }

        if !matches_any(&self.sectors, &stock.sector) {
            return false;
        }
        if !matches_any(&self.countries, &stock.country) {
            return false;
        }

        if let Some(min) = self.min_market_cap {
            if !stock.market_cap.is_some_and(|cap| cap >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_market_cap {
            if !stock.market_cap.is_some_and(|cap| cap <= max) {
                return false;
            }
        }

        // Loss-making companies have no meaningful P/E.
        if let Some(max) = self.max_pe {
            if !stock.pe_ratio.is_some_and(|pe| pe > 0.0 && pe <= max) {
                return false;
            }
        }

        if let Some(min) = self.min_dividend_yield {
            if !stock.dividend_yield.is_some_and(|dy| dy >= min) {
                return false;
            }
        }

        true
    }

    fn compare(&self, a: &Stock, b: &Stock) -> Ordering {
        let primary = match self.sort_by {
            SortField::Symbol => {
                let ordering = a.symbol.cmp(&b.symbol);
                return match self.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                };
            }
            SortField::Drop => compare_present(Some(a.drop_pct()), Some(b.drop_pct()), self.order),
            SortField::MarketCap => compare_present(a.market_cap, b.market_cap, self.order),
            SortField::PeRatio => compare_present(a.pe_ratio, b.pe_ratio, self.order),
            SortField::DividendYield => {
                compare_present(a.dividend_yield, b.dividend_yield, self.order)
            }
        };

        primary.then_with(|| a.symbol.cmp(&b.symbol))
    }
}

fn matches_any(wanted: &[String], value: &str) -> bool {
    let wanted: Vec<String> = wanted
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    if wanted.is_empty() {
        return true;
    }
    let value = value.trim().to_lowercase();
    wanted.iter().any(|w| *w == value)
}

/// Missing values sort last in both directions.
fn compare_present(a: Option<f64>, b: Option<f64>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match order {
            SortOrder::Asc => a.total_cmp(&b),
            SortOrder::Desc => b.total_cmp(&a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Apply `filters` to `candidates`, sort and truncate.
///
/// # Errors
/// Returns an error if the filters are invalid.
pub fn screen(
    candidates: Vec<Stock>,
    filters: &SearchFilters,
) -> Result<Vec<StockResult>, FilterError> {
    filters.validate()?;

    let mut selected: Vec<Stock> = candidates
        .into_iter()
        .filter(|stock| filters.matches(stock))
        .collect();
    selected.sort_by(|a, b| filters.compare(a, b));
    selected.truncate(filters.effective_limit());

    Ok(selected.iter().map(StockResult::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stocks::sample_stock;

    fn universe() -> Vec<Stock> {
        let mut aapl = sample_stock("AAPL", MarketIndex::Sp500, 150.0, 200.0);
        aapl.market_cap = Some(2_500.0);
        aapl.pe_ratio = Some(28.0);
        aapl.dividend_yield = Some(0.5);

        let mut xom = sample_stock("XOM", MarketIndex::Sp500, 90.0, 100.0);
        xom.sector = "Energy".to_string();
        xom.market_cap = Some(400.0);
        xom.pe_ratio = Some(9.0);
        xom.dividend_yield = Some(3.4);

        let mut sap = sample_stock("SAP", MarketIndex::Stoxx600, 60.0, 120.0);
        sap.country = "DE".to_string();
        sap.currency = "EUR".to_string();
        sap.pe_ratio = Some(-4.0);

        let mut bp = sample_stock("BP", MarketIndex::Stoxx600, 4.0, 5.0);
        bp.sector = "energy".to_string();
        bp.country = "GB".to_string();
        bp.market_cap = Some(80.0);

        vec![aapl, xom, sap, bp]
    }

    fn symbols(results: &[StockResult]) -> Vec<&str> {
        results.iter().map(|r| r.symbol.as_str()).collect()
    }

    #[test]
    fn default_sorts_by_drop_desc() {
        let results = screen(universe(), &SearchFilters::default()).unwrap_or_default();
        // SAP 50%, AAPL 25%, BP 20%, XOM 10%
        assert_eq!(symbols(&results), vec!["SAP", "AAPL", "BP", "XOM"]);
    }

    #[test]
    fn index_scope_restricts_universe() {
        let filters = SearchFilters {
            index: IndexScope::Stoxx600,
            ..SearchFilters::default()
        };
        let results = screen(universe(), &filters).unwrap_or_default();
        assert_eq!(symbols(&results), vec!["SAP", "BP"]);
    }

    #[test]
    fn drop_range_is_inclusive() {
        let filters = SearchFilters {
            min_drop: Some(20.0),
            max_drop: Some(25.0),
            ..SearchFilters::default()
        };
        let results = screen(universe(), &filters).unwrap_or_default();
        assert_eq!(symbols(&results), vec!["AAPL", "BP"]);
    }

    #[test]
    fn sectors_are_case_insensitive() {
        let filters = SearchFilters {
            sectors: vec![" ENERGY ".to_string()],
            ..SearchFilters::default()
        };
        let results = screen(universe(), &filters).unwrap_or_default();
        assert_eq!(symbols(&results), vec!["BP", "XOM"]);
    }

    #[test]
    fn blank_sector_entries_are_ignored() {
        let filters = SearchFilters {
            sectors: vec![String::new()],
            ..SearchFilters::default()
        };
        let results = screen(universe(), &filters).unwrap_or_default();
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn max_pe_excludes_missing_and_negative() {
        let filters = SearchFilters {
            max_pe: Some(30.0),
            ..SearchFilters::default()
        };
        let results = screen(universe(), &filters).unwrap_or_default();
        assert_eq!(symbols(&results), vec!["AAPL", "XOM"]);
    }

    #[test]
    fn market_cap_filter_requires_value() {
        let filters = SearchFilters {
            min_market_cap: Some(100.0),
            ..SearchFilters::default()
        };
        let results = screen(universe(), &filters).unwrap_or_default();
        assert_eq!(symbols(&results), vec!["AAPL", "XOM"]);
    }

    #[test]
    fn missing_values_sort_last_both_ways() {
        for order in [SortOrder::Asc, SortOrder::Desc] {
            let filters = SearchFilters {
                sort_by: SortField::MarketCap,
                order,
                ..SearchFilters::default()
            };
            let results = screen(universe(), &filters).unwrap_or_default();
            assert_eq!(results.last().map(|r| r.symbol.as_str()), Some("SAP"));
        }
    }

    #[test]
    fn dividend_yield_ascending() {
        let filters = SearchFilters {
            min_dividend_yield: Some(0.0),
            sort_by: SortField::DividendYield,
            order: SortOrder::Asc,
            ..SearchFilters::default()
        };
        let results = screen(universe(), &filters).unwrap_or_default();
        assert_eq!(symbols(&results), vec!["AAPL", "XOM"]);
    }

    #[test]
    fn ties_break_by_symbol() {
        let candidates = vec![
            sample_stock("MSFT", MarketIndex::Sp500, 90.0, 100.0),
            sample_stock("AMZN", MarketIndex::Sp500, 90.0, 100.0),
        ];
        let results = screen(candidates, &SearchFilters::default()).unwrap_or_default();
        assert_eq!(symbols(&results), vec!["AMZN", "MSFT"]);
    }

    #[test]
    fn limit_is_clamped() {
        let zero = SearchFilters {
            limit: Some(0),
            ..SearchFilters::default()
        };
        assert_eq!(zero.effective_limit(), 1);
        let huge = SearchFilters {
            limit: Some(10_000),
            ..SearchFilters::default()
        };
        assert_eq!(huge.effective_limit(), MAX_LIMIT);
        assert_eq!(SearchFilters::default().effective_limit(), DEFAULT_LIMIT);
        let negative = SearchFilters {
            limit: Some(-5),
            ..SearchFilters::default()
        };
        assert_eq!(negative.effective_limit(), 1);

        let results = screen(universe(), &zero).unwrap_or_default();
        assert_eq!(symbols(&results), vec!["SAP"]);
    }

    #[test]
    fn rejects_inverted_ranges() {
        let filters = SearchFilters {
            min_drop: Some(30.0),
            max_drop: Some(10.0),
            ..SearchFilters::default()
        };
        assert_eq!(
            screen(universe(), &filters),
            Err(FilterError::InvalidRange("min_drop", "max_drop"))
        );
    }

    #[test]
    fn rejects_non_finite() {
        let filters = SearchFilters {
            max_pe: Some(f64::NAN),
            ..SearchFilters::default()
        };
        assert_eq!(filters.validate(), Err(FilterError::NotFinite("max_pe")));
    }

    #[test]
    fn deserializes_partial_json() -> Result<(), serde_json::Error> {
        let filters: SearchFilters =
            serde_json::from_str(r#"{"index":"sp500","min_drop":15,"sort_by":"pe_ratio"}"#)?;
        assert_eq!(filters.index, IndexScope::Sp500);
        assert_eq!(filters.min_drop, Some(15.0));
        assert_eq!(filters.sort_by, SortField::PeRatio);
        assert_eq!(filters.order, SortOrder::Desc);
        assert!(filters.sectors.is_empty());
        Ok(())
    }
}
