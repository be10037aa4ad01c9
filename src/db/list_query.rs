//! Shared query-shaping contract for every index-style endpoint: free-text
//! search over a whitelisted column set, whitelisted sorting with a default,
//! validated relation includes, clamped page sizes and soft-delete
//! visibility.
//!
//! Invalid sort/include/page-size inputs degrade to the documented defaults
//! instead of erroring.

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, IdenStatic, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Select,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

pub const DEFAULT_PER_PAGE: u64 = 25;
pub const MIN_PER_PAGE: u64 = 1;
pub const MAX_PER_PAGE: u64 = 100;

/// Query-string parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListParams {
    /// Free-text search term, matched against the endpoint's column whitelist
    pub search: Option<String>,
    /// Sort token: a whitelisted column name, `-` prefix for descending
    pub sort: Option<String>,
    /// 1-based page number
    pub page: Option<u64>,
    /// Page size, clamped to `[1, 100]`
    pub per_page: Option<u64>,
    /// Comma-separated relation names to eager-load
    pub include: Option<String>,
    /// Include soft-deleted records
    #[serde(default)]
    pub with_deleted: bool,
}

impl ListParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Requested page size clamped to the safe range.
    pub fn per_page(&self) -> u64 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(MIN_PER_PAGE, MAX_PER_PAGE)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn includes(&self, allowed: &[&str], defaults: &[&str]) -> Vec<String> {
        resolve_includes(self.include.as_deref(), allowed, defaults)
    }
}

/// OR-match `term` with `LIKE %term%` across the whitelisted columns.
/// No-op for an absent or blank term.
pub fn apply_search<E: EntityTrait>(
    query: Select<E>,
    term: Option<&str>,
    columns: &[E::Column],
) -> Select<E> {
    let term = match term.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return query,
    };

    let mut condition = Condition::any();
    for column in columns {
        condition = condition.add(column.contains(term));
    }
    query.filter(condition)
}

/// Order by the column named in `token` (leading `-` for descending) when it
/// is part of the whitelist; otherwise fall back to the default ordering.
pub fn apply_sort<E: EntityTrait>(
    query: Select<E>,
    token: Option<&str>,
    allowed: &[E::Column],
    default_column: E::Column,
    default_order: Order,
) -> Select<E> {
    let (name, order) = match token.map(str::trim) {
        Some(t) if !t.is_empty() => parse_sort_token(t),
        _ => return query.order_by(default_column, default_order),
    };

    match allowed.iter().find(|column| column.as_str() == name) {
        Some(column) => query.order_by(*column, order),
        None => query.order_by(default_column, default_order),
    }
}

pub(crate) fn parse_sort_token(token: &str) -> (&str, Order) {
    match token.strip_prefix('-') {
        Some(rest) => (rest, Order::Desc),
        None => (token, Order::Asc),
    }
}

/// Intersect the client-supplied include list with the whitelist. The default
/// set applies only when the client names none at all; unknown names are
/// dropped silently.
pub fn resolve_includes(requested: Option<&str>, allowed: &[&str], defaults: &[&str]) -> Vec<String> {
    let raw = requested.map(str::trim).filter(|s| !s.is_empty());
    let Some(raw) = raw else {
        return defaults.iter().map(|s| s.to_string()).collect();
    };

    let mut resolved = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if !part.is_empty() && allowed.contains(&part) && !resolved.iter().any(|p| p == part) {
            resolved.push(part.to_string());
        }
    }
    resolved
}

/// Hide soft-deleted rows unless the caller asked for them.
pub fn visible<E: EntityTrait>(
    query: Select<E>,
    deleted_at: E::Column,
    with_deleted: bool,
) -> Select<E> {
    if with_deleted {
        query
    } else {
        query.filter(deleted_at.is_null())
    }
}

/// Pagination metadata returned alongside list data.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PageMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// One page of results plus its metadata.
#[derive(Debug)]
pub struct Page<M> {
    pub items: Vec<M>,
    pub meta: PageMeta,
}

impl<M> Page<M> {
    pub fn map<T>(self, f: impl FnMut(M) -> T) -> Page<T> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

/// Execute a shaped query as one page of results.
pub async fn paginate<E: EntityTrait>(
    db: &DatabaseConnection,
    query: Select<E>,
    page: u64,
    per_page: u64,
) -> Result<Page<E::Model>, sea_orm::DbErr>
where
    E::Model: Send + Sync,
{
    let page = page.max(1);
    let paginator = query.paginate(db, per_page);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(Page {
        items,
        meta: PageMeta::new(page, per_page, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_page_clamps_to_bounds() {
        let huge = ListParams {
            per_page: Some(10_000),
            ..Default::default()
        };
        assert_eq!(huge.per_page(), MAX_PER_PAGE);

        let zero = ListParams {
            per_page: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.per_page(), MIN_PER_PAGE);

        let absent = ListParams::default();
        assert_eq!(absent.per_page(), DEFAULT_PER_PAGE);
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(ListParams::default().page(), 1);
        let explicit_zero = ListParams {
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(explicit_zero.page(), 1);
    }

    #[test]
    fn sort_token_parsing() {
        assert!(matches!(parse_sort_token("name"), ("name", Order::Asc)));
        assert!(matches!(
            parse_sort_token("-created_at"),
            ("created_at", Order::Desc)
        ));
    }

    #[test]
    fn blank_search_is_ignored() {
        let params = ListParams {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(params.search(), None);
    }

    #[test]
    fn includes_intersect_with_whitelist() {
        let resolved = resolve_includes(Some("items,client,bogus"), &["items", "client"], &[]);
        assert_eq!(resolved, vec!["items".to_string(), "client".to_string()]);
    }

    #[test]
    fn includes_fall_back_to_defaults_when_absent() {
        let resolved = resolve_includes(None, &["items", "client"], &["client"]);
        assert_eq!(resolved, vec!["client".to_string()]);
    }

    #[test]
    fn explicit_invalid_includes_do_not_restore_defaults() {
        let resolved = resolve_includes(Some("bogus"), &["items"], &["items"]);
        assert!(resolved.is_empty());
    }

    #[test]
    fn duplicate_includes_are_collapsed() {
        let resolved = resolve_includes(Some("items, items"), &["items"], &[]);
        assert_eq!(resolved, vec!["items".to_string()]);
    }

    #[test]
    fn page_meta_rounds_total_pages_up() {
        let meta = PageMeta::new(1, 25, 26);
        assert_eq!(meta.total_pages, 2);
        assert_eq!(PageMeta::new(1, 25, 0).total_pages, 0);
    }
}
