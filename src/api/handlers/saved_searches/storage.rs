use super::SavedSearch;
use crate::{db::now_unix, stocks::SearchFilters};
use sqlx::{AnyPool, Row};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

pub(super) async fn list_for_user(
    pool: &AnyPool,
    user_id: &str,
) -> Result<Vec<SavedSearch>, sqlx::Error> {
    let query = "SELECT id, name, filters, created_at FROM saved_searches \
                 WHERE user_id = $1 ORDER BY created_at DESC, id";
    let span = info_span!("db.query", db.operation = "SELECT", db.statement = query);
    let rows = sqlx::query(query)
        .bind(user_id)
        .fetch_all(pool)
        .instrument(span)
        .await?;

    let mut searches = Vec::with_capacity(rows.len());
    for row in rows {
        let id: String = row.try_get("id")?;
        let raw_filters: String = row.try_get("filters")?;
        let filters = match serde_json::from_str::<SearchFilters>(&raw_filters) {
            Ok(filters) => filters,
            Err(err) => {
                warn!("Skipping saved search {id}: invalid filters: {err}");
                continue;
            }
        };
        searches.push(SavedSearch {
            id,
            name: row.try_get("name")?,
            filters,
            created_at: row.try_get("created_at")?,
        });
    }
    Ok(searches)
}

pub(super) async fn insert(
    pool: &AnyPool,
    user_id: &str,
    name: &str,
    filters: SearchFilters,
    filters_json: &str,
) -> Result<SavedSearch, sqlx::Error> {
    let search = SavedSearch {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        filters,
        created_at: now_unix(),
    };

    let query = "INSERT INTO saved_searches (id, user_id, name, filters, created_at) \
                 VALUES ($1, $2, $3, $4, $5)";
    let span = info_span!("db.query", db.operation = "INSERT", db.statement = query);
    sqlx::query(query)
        .bind(&search.id)
        .bind(user_id)
        .bind(&search.name)
        .bind(filters_json)
        .bind(search.created_at)
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(search)
}

/// Returns `false` when nothing matched the id for this owner.
pub(super) async fn delete_for_user(
    pool: &AnyPool,
    user_id: &str,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let query = "DELETE FROM saved_searches WHERE id = $1 AND user_id = $2";
    let span = info_span!("db.query", db.operation = "DELETE", db.statement = query);
    let result = sqlx::query(query)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(result.rows_affected() > 0)
}
