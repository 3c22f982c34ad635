use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::{Any, QueryBuilder, Row};

use crate::entities::{format_ts, parse_mode, parse_ts, AnyConnection, AnyStore, AppMode, MarketAppRecord};

/// Longest search string, in characters, that takes part in matching.
pub const SEARCH_MAX_CHARS: usize = 30;

const LISTING_COLUMNS: &str = "m.id, m.app_id, m.name, m.description, m.mode, m.efct_st_dt, \
     m.efct_fns_dt, m.important, m.creator, m.creator_organization_id, m.workflow_id, \
     m.app_model_config_id, m.created_by, m.created_at, m.updated_by, m.updated_at";

/// Narrowing applied on top of the active-window filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub mode: Option<AppMode>,
    /// Already truncated to [`SEARCH_MAX_CHARS`].
    pub search: Option<String>,
}

impl ListingFilter {
    pub fn new(mode: Option<AppMode>, search: Option<&str>) -> Self {
        Self {
            mode,
            search: search.map(|s| s.chars().take(SEARCH_MAX_CHARS).collect()),
        }
    }
}

/// One page of active listings.
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub page: u32,
    pub limit: u32,
    /// Active listings matching the filter across all pages.
    pub total: i64,
    pub items: Vec<MarketAppRecord>,
}

impl ListingPage {
    pub fn has_more(&self) -> bool {
        i64::from(self.page) * i64::from(self.limit) < self.total
    }
}

/// Partial update of a listing; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct MarketAppPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub hashcode: Option<Vec<String>>,
    pub important: Option<i64>,
}

pub trait MarketAppStore: Send + Sync + 'static {
    /// Listings active at `now` that match `filter`, ordered by importance then
    /// effective-start (both descending). `page` is 1-based; a page past the
    /// end is empty.
    fn list_active(
        &self,
        filter: &ListingFilter,
        page: u32,
        limit: u32,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<ListingPage, sqlx::Error>> + Send;

    fn get_listing(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<MarketAppRecord>, sqlx::Error>> + Send;

    /// Returns `false` when no listing has this id.
    fn patch_listing(
        &self,
        id: &str,
        patch: &MarketAppPatch,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;

    /// Ends the listing's effective window at `now`. Returns `false` when no
    /// listing has this id.
    fn soft_delete_listing(
        &self,
        id: &str,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
}

/// Trimmed, non-empty, first occurrence wins.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !out.iter().any(|seen| seen == tag) {
            out.push(tag.to_owned());
        }
    }
    out
}

/// Unicode lowercase form stored in `name_folded`. SQLite's `LOWER` and
/// `LIKE` only fold ASCII, so names are folded here before they are stored.
fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Substring pattern over `name_folded` with LIKE wildcards escaped by `\`.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in fold_case(search).chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_active_filters(qb: &mut QueryBuilder<'_, Any>, filter: &ListingFilter, now: &str) {
    qb.push(" WHERE m.efct_st_dt <= ")
        .push_bind(now.to_owned())
        .push(" AND m.efct_fns_dt > ")
        .push_bind(now.to_owned());

    if let Some(mode) = filter.mode {
        qb.push(" AND m.mode = ").push_bind(mode.as_ref().to_owned());
    }

    if let Some(search) = &filter.search {
        qb.push(" AND (m.name_folded LIKE ")
            .push_bind(like_pattern(search))
            .push(" ESCAPE '\\' OR EXISTS (SELECT 1 FROM market_app_tags t WHERE t.market_app_id = m.id AND t.tag = ")
            .push_bind(search.clone())
            .push("))");
    }
}

fn listing_from_row(row: &AnyRow) -> Result<MarketAppRecord, sqlx::Error> {
    let mode: String = row.try_get("mode")?;
    Ok(MarketAppRecord {
        id: row.try_get("id")?,
        source_app_id: row.try_get("app_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        hashcode: Vec::new(),
        mode: parse_mode(&mode)?,
        effective_start: parse_ts(row.try_get("efct_st_dt")?, "market_apps.efct_st_dt"),
        effective_end: parse_ts(row.try_get("efct_fns_dt")?, "market_apps.efct_fns_dt"),
        important: row.try_get("important")?,
        creator: row.try_get("creator")?,
        creator_organization_id: row.try_get("creator_organization_id")?,
        workflow_id: row.try_get("workflow_id")?,
        app_model_config_id: row.try_get("app_model_config_id")?,
        created_by: row.try_get("created_by")?,
        created_at: parse_ts(row.try_get("created_at")?, "market_apps.created_at"),
        updated_by: row.try_get("updated_by")?,
        updated_at: parse_ts(row.try_get("updated_at")?, "market_apps.updated_at"),
    })
}

/// Statements over `market_apps` and `market_app_tags`.
pub struct MarketApps;

impl MarketApps {
    pub async fn find(
        conn: &mut AnyConnection,
        id: &str,
    ) -> Result<Option<MarketAppRecord>, sqlx::Error> {
        let row = sqlx::query(&format!("SELECT {LISTING_COLUMNS} FROM market_apps m WHERE m.id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut listing = [listing_from_row(&row)?];
        Self::attach_tags(conn, &mut listing).await?;
        let [listing] = listing;
        Ok(Some(listing))
    }

    pub async fn insert(conn: &mut AnyConnection, listing: &MarketAppRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO market_apps (id, app_id, name, name_folded, description, mode, efct_st_dt, \
             efct_fns_dt, important, creator, creator_organization_id, workflow_id, \
             app_model_config_id, created_by, created_at, updated_by, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        )
        .bind(&listing.id)
        .bind(&listing.source_app_id)
        .bind(&listing.name)
        .bind(fold_case(&listing.name))
        .bind(&listing.description)
        .bind(listing.mode.as_ref())
        .bind(format_ts(listing.effective_start))
        .bind(format_ts(listing.effective_end))
        .bind(listing.important)
        .bind(&listing.creator)
        .bind(&listing.creator_organization_id)
        .bind(&listing.workflow_id)
        .bind(&listing.app_model_config_id)
        .bind(&listing.created_by)
        .bind(format_ts(listing.created_at))
        .bind(&listing.updated_by)
        .bind(format_ts(listing.updated_at))
        .execute(&mut *conn)
        .await?;

        Self::replace_tags(conn, &listing.id, &listing.hashcode).await
    }

    pub async fn replace_tags(
        conn: &mut AnyConnection,
        id: &str,
        tags: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM market_app_tags WHERE market_app_id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        for (position, tag) in normalize_tags(tags).into_iter().enumerate() {
            sqlx::query("INSERT INTO market_app_tags (market_app_id, position, tag) VALUES (?1, ?2, ?3)")
                .bind(id)
                .bind(position as i64)
                .bind(tag)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    async fn attach_tags(
        conn: &mut AnyConnection,
        items: &mut [MarketAppRecord],
    ) -> Result<(), sqlx::Error> {
        if items.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::<Any>::new(
            "SELECT market_app_id, tag FROM market_app_tags WHERE market_app_id IN (",
        );
        let mut ids = qb.separated(", ");
        for item in items.iter() {
            ids.push_bind(item.id.clone());
        }
        ids.push_unseparated(") ORDER BY market_app_id, position");

        let rows: Vec<(String, String)> = qb.build_query_as().fetch_all(&mut *conn).await?;
        let mut by_listing: HashMap<String, Vec<String>> = HashMap::new();
        for (id, tag) in rows {
            by_listing.entry(id).or_default().push(tag);
        }
        for item in items.iter_mut() {
            item.hashcode = by_listing.remove(&item.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn page(
        conn: &mut AnyConnection,
        filter: &ListingFilter,
        page: u32,
        limit: u32,
        now: &str,
    ) -> Result<ListingPage, sqlx::Error> {
        let mut count = QueryBuilder::<Any>::new("SELECT COUNT(*) FROM market_apps m");
        push_active_filters(&mut count, filter, now);
        let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

        let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);
        let mut select = QueryBuilder::<Any>::new(format!("SELECT {LISTING_COLUMNS} FROM market_apps m"));
        push_active_filters(&mut select, filter, now);
        select
            .push(" ORDER BY m.important DESC, m.efct_st_dt DESC, m.id ASC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = select.build().fetch_all(&mut *conn).await?;
        let mut items = rows.iter().map(listing_from_row).collect::<Result<Vec<_>, _>>()?;
        Self::attach_tags(conn, &mut items).await?;

        Ok(ListingPage { page, limit, total, items })
    }
}

impl MarketAppStore for AnyStore {
    async fn list_active(
        &self,
        filter: &ListingFilter,
        page: u32,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<ListingPage, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        MarketApps::page(&mut conn, filter, page, limit, &format_ts(now)).await
    }

    async fn get_listing(&self, id: &str) -> Result<Option<MarketAppRecord>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        MarketApps::find(&mut conn, id).await
    }

    async fn patch_listing(
        &self,
        id: &str,
        patch: &MarketAppPatch,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE market_apps SET name = COALESCE(?1, name), \
             name_folded = COALESCE(?7, name_folded), \
             description = COALESCE(?2, description), \
             important = COALESCE(?3, important), \
             updated_by = ?4, updated_at = ?5 \
             WHERE id = ?6",
        )
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.important)
        .bind(updated_by)
        .bind(format_ts(now))
        .bind(id)
        .bind(patch.name.as_deref().map(fold_case))
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        if let Some(tags) = &patch.hashcode {
            MarketApps::replace_tags(&mut tx, id, tags).await?;
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn soft_delete_listing(
        &self,
        id: &str,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let now = format_ts(now);
        let result = sqlx::query(
            "UPDATE market_apps SET efct_fns_dt = ?1, updated_by = ?2, updated_at = ?1 WHERE id = ?3",
        )
        .bind(&now)
        .bind(updated_by)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
