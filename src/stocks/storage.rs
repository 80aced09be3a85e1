//! Queries against the `stocks` table.

use super::{MarketIndex, Stock};
use sqlx::{any::AnyRow, AnyPool, Row};
use std::collections::HashMap;
use tracing::{info_span, warn, Instrument};

const STOCK_COLUMNS: &str = "symbol, name, market_index, sector, country, currency, price, \
     high_52w, low_52w, market_cap, pe_ratio, dividend_yield";

fn stock_from_row(row: &AnyRow) -> Result<Option<Stock>, sqlx::Error> {
    let symbol: String = row.try_get("symbol")?;
    let raw_index: String = row.try_get("market_index")?;
    let Ok(market_index) = raw_index.parse::<MarketIndex>() else {
        warn!("Skipping {symbol}: unknown index {raw_index}");
        return Ok(None);
    };

    Ok(Some(Stock {
        symbol,
        name: row.try_get("name")?,
        market_index,
        sector: row.try_get("sector")?,
        country: row.try_get("country")?,
        currency: row.try_get("currency")?,
        price: row.try_get("price")?,
        high_52w: row.try_get("high_52w")?,
        low_52w: row.try_get("low_52w")?,
        market_cap: row.try_get("market_cap")?,
        pe_ratio: row.try_get("pe_ratio")?,
        dividend_yield: row.try_get("dividend_yield")?,
    }))
}

/// Load every stock of `index`, or the whole universe when `None`.
pub async fn load_stocks(
    pool: &AnyPool,
    index: Option<MarketIndex>,
) -> Result<Vec<Stock>, sqlx::Error> {
    let rows = if let Some(index) = index {
        let query = format!("SELECT {STOCK_COLUMNS} FROM stocks WHERE market_index = $1");
        let span = info_span!("db.query", db.operation = "SELECT", db.statement = %query);
        sqlx::query(&query)
            .bind(index.as_str())
            .fetch_all(pool)
            .instrument(span)
            .await?
    } else {
        let query = format!("SELECT {STOCK_COLUMNS} FROM stocks");
        let span = info_span!("db.query", db.operation = "SELECT", db.statement = %query);
        sqlx::query(&query).fetch_all(pool).instrument(span).await?
    };

    let mut stocks = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(stock) = stock_from_row(row)? {
            stocks.push(stock);
        }
    }
    Ok(stocks)
}

pub async fn find_stock(pool: &AnyPool, symbol: &str) -> Result<Option<Stock>, sqlx::Error> {
    let query = format!("SELECT {STOCK_COLUMNS} FROM stocks WHERE symbol = $1");
    let span = info_span!("db.query", db.operation = "SELECT", db.statement = %query);
    let row = sqlx::query(&query)
        .bind(symbol.trim().to_uppercase())
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    match row {
        Some(row) => stock_from_row(&row),
        None => Ok(None),
    }
}

/// Number of stocks stored per index; indexes without rows report zero.
pub async fn count_by_index(pool: &AnyPool) -> Result<HashMap<MarketIndex, i64>, sqlx::Error> {
    let query = "SELECT market_index, COUNT(*) AS total FROM stocks GROUP BY market_index";
    let span = info_span!("db.query", db.operation = "SELECT", db.statement = query);
    let rows = sqlx::query(query).fetch_all(pool).instrument(span).await?;

    let mut counts: HashMap<MarketIndex, i64> =
        MarketIndex::ALL.iter().map(|index| (*index, 0)).collect();
    for row in rows {
        let raw_index: String = row.try_get("market_index")?;
        let total: i64 = row.try_get("total")?;
        if let Ok(index) = raw_index.parse::<MarketIndex>() {
            counts.insert(index, total);
        }
    }
    Ok(counts)
}

/// Insert or update stocks by symbol in a single transaction.
pub async fn upsert_stocks(pool: &AnyPool, stocks: &[Stock]) -> Result<u64, sqlx::Error> {
    let query = format!(
        "INSERT INTO stocks ({STOCK_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (symbol) DO UPDATE SET \
         name = excluded.name, market_index = excluded.market_index, \
         sector = excluded.sector, country = excluded.country, \
         currency = excluded.currency, price = excluded.price, \
         high_52w = excluded.high_52w, low_52w = excluded.low_52w, \
         market_cap = excluded.market_cap, pe_ratio = excluded.pe_ratio, \
         dividend_yield = excluded.dividend_yield"
    );

    let span = info_span!(
        "db.query",
        db.operation = "UPSERT",
        db.statement = %query,
        rows = stocks.len()
    );

    async {
        let mut tx = pool.begin().await?;
        let mut affected = 0;
        for stock in stocks {
            let result = sqlx::query(&query)
                .bind(&stock.symbol)
                .bind(&stock.name)
                .bind(stock.market_index.as_str())
                .bind(&stock.sector)
                .bind(&stock.country)
                .bind(&stock.currency)
                .bind(stock.price)
                .bind(stock.high_52w)
                .bind(stock.low_52w)
                .bind(stock.market_cap)
                .bind(stock.pe_ratio)
                .bind(stock.dividend_yield)
                .execute(&mut *tx)
                .await?;
            affected += result.rows_affected();
        }
        tx.commit().await?;
        Ok::<u64, sqlx::Error>(affected)
    }
    .instrument(span)
    .await
}
