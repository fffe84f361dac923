//! The submissions list table: query parameters, column layout and paging.

pub mod store;

pub use store::SubmissionStore;

use serde::Serialize;

use crate::config::DEFAULT_PER_PAGE;
use crate::db::models::{Submission, SubmissionStatus};
use crate::params::RequestParams;

pub const MAX_PER_PAGE: u32 = 999;

/// Parameters that describe the list state and survive across redirects.
pub const LIST_STATE_KEYS: &[&str] = &["status", "s", "orderby", "order", "paged"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Id,
    Name,
    DateSubmitted,
}

impl SortColumn {
    /// Unrecognized columns yield `None` and the default order applies.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "date_submitted" | "date" => Some(Self::DateSubmitted),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::DateSubmitted => "date_submitted",
        }
    }

    /// Fixed SQL expression for ORDER BY.
    pub fn sql_expr(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name COLLATE NOCASE",
            Self::DateSubmitted => "date_submitted",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn sql_keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based.
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
    pub orderby: Option<SortColumn>,
    pub order: SortOrder,
    pub status: Option<SubmissionStatus>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            search: None,
            orderby: None,
            order: SortOrder::Asc,
            status: None,
        }
    }
}

impl ListQuery {
    /// Build a query from request parameters. Malformed values fall back to
    /// their defaults rather than reaching the store.
    pub fn from_params(params: &RequestParams, per_page: u32) -> Self {
        Self {
            page: params.get_u32("paged").filter(|p| *p >= 1).unwrap_or(1),
            per_page: clamp_per_page(per_page),
            search: params.get("s").map(str::to_string),
            orderby: params.get("orderby").and_then(SortColumn::parse),
            order: params.get("order").map(SortOrder::parse).unwrap_or_default(),
            status: params.get("status").and_then(|s| s.parse().ok()),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    /// Query-string form of this list state, for links and redirects.
    pub fn to_params(&self) -> RequestParams {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("s", search.clone()));
        }
        if let Some(orderby) = self.orderby {
            pairs.push(("orderby", orderby.key().to_string()));
            pairs.push(("order", self.order.key().to_string()));
        }
        if self.page > 1 {
            pairs.push(("paged", self.page.to_string()));
        }
        RequestParams::from_pairs(pairs)
    }
}

pub fn clamp_per_page(per_page: u32) -> u32 {
    per_page.clamp(1, MAX_PER_PAGE)
}

#[derive(Debug, Clone, Serialize)]
pub struct ListPage {
    pub items: Vec<Submission>,
    pub total_items: u64,
    pub total_pages: u64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Cb,
    Id,
    Name,
    Email,
    Status,
    DateSubmitted,
    Actions,
}

impl Column {
    pub const ALL: [Self; 7] = [
        Self::Cb,
        Self::Id,
        Self::Name,
        Self::Email,
        Self::Status,
        Self::DateSubmitted,
        Self::Actions,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Cb => "cb",
            Self::Id => "id",
            Self::Name => "name",
            Self::Email => "email",
            Self::Status => "status",
            Self::DateSubmitted => "date_submitted",
            Self::Actions => "actions",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cb => "",
            Self::Id => "ID",
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Status => "Status",
            Self::DateSubmitted => "Date Submitted",
            Self::Actions => "Actions",
        }
    }

    /// The sort column behind a header, if the header is sortable.
    pub fn sortable(self) -> Option<SortColumn> {
        match self {
            Self::Id => Some(SortColumn::Id),
            Self::Name => Some(SortColumn::Name),
            Self::DateSubmitted => Some(SortColumn::DateSubmitted),
            _ => None,
        }
    }

    /// Plain-text cell value; `None` for columns rendered as controls.
    pub fn value(self, item: &Submission) -> Option<String> {
        match self {
            Self::Id => Some(item.id.to_string()),
            Self::Name => Some(item.name.clone()),
            Self::Email => Some(item.email.clone()),
            Self::Status => Some(item.status.to_string()),
            Self::DateSubmitted => Some(item.date_submitted.clone()),
            Self::Cb | Self::Actions => None,
        }
    }
}

pub const BULK_ACTIONS: &[(&str, &str)] = &[("bulk-delete", "Delete")];

/// One request's view of the submissions table.
pub struct ListTable<'a> {
    store: &'a dyn SubmissionStore,
    query: ListQuery,
}

impl<'a> ListTable<'a> {
    pub fn new(store: &'a dyn SubmissionStore, query: ListQuery) -> Self {
        Self { store, query }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Count, then fetch the requested page. A page past the end (the last
    /// row of the last page was just deleted, say) is pulled back to the last
    /// page, and the table's query follows so links render from it.
    pub fn prepare_items(&mut self) -> anyhow::Result<ListPage> {
        let total_items = self.store.count(&self.query)?;
        let per_page = u64::from(self.query.per_page.max(1));
        let total_pages = total_items.div_ceil(per_page);

        let last_page = u32::try_from(total_pages.max(1)).unwrap_or(u32::MAX);
        if self.query.page > last_page {
            tracing::debug!(
                "Page {} is past the last page, showing page {last_page}",
                self.query.page
            );
            self.query.page = last_page;
        }

        let items = self.store.fetch_page(&self.query)?;
        tracing::debug!(
            "Prepared page {} ({} of {} submissions)",
            self.query.page,
            items.len(),
            total_items
        );

        Ok(ListPage {
            items,
            total_items,
            total_pages,
            page: self.query.page,
            per_page: self.query.per_page,
        })
    }

    /// Order a header link should request: clicking the active column flips
    /// its direction, any other column starts ascending.
    pub fn header_order(&self, column: SortColumn) -> SortOrder {
        if self.query.orderby == Some(column) {
            self.query.order.flipped()
        } else {
            SortOrder::Asc
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::db::models::NewSubmission;

    fn seeded(n: usize) -> Database {
        let db = Database::open_in_memory().unwrap();
        for i in 1..=n {
            db.insert_submission(&NewSubmission::new(
                format!("Person {i:02}"),
                format!("person{i}@example.com"),
            ))
            .unwrap();
        }
        db
    }

    fn query(page: u32, per_page: u32) -> ListQuery {
        ListQuery {
            page,
            per_page,
            orderby: Some(SortColumn::Id),
            ..ListQuery::default()
        }
    }

    #[test]
    fn test_second_page_of_twelve() {
        let db = seeded(12);
        let page = ListTable::new(&db, query(2, 5)).prepare_items().unwrap();
        let ids: Vec<i64> = page.items.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![6, 7, 8, 9, 10]);
        assert_eq!(page.total_items, 12);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_pages_concatenate_to_full_result() {
        let db = seeded(23);
        let full: Vec<i64> = ListTable::new(&db, query(1, MAX_PER_PAGE))
            .prepare_items()
            .unwrap()
            .items
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(full.len(), 23);

        for per_page in [1, 4, 5, 7, 23, 50] {
            let first = ListTable::new(&db, query(1, per_page)).prepare_items().unwrap();
            let mut collected = Vec::new();
            for page in 1..=first.total_pages as u32 {
                let slice = ListTable::new(&db, query(page, per_page))
                    .prepare_items()
                    .unwrap();
                assert!(slice.items.len() <= per_page as usize);
                collected.extend(slice.items.iter().map(|s| s.id));
            }
            assert_eq!(collected, full, "per_page={per_page}");
        }
    }

    #[test]
    fn test_pages_with_duplicate_sort_keys_are_stable() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..9 {
            let name = if i % 2 == 0 { "Same" } else { "Other" };
            db.insert_submission(&NewSubmission::new(name, format!("{i}@example.com")))
                .unwrap();
        }
        let by_name = |page| ListQuery {
            page,
            per_page: 2,
            orderby: Some(SortColumn::Name),
            ..ListQuery::default()
        };
        let mut seen = Vec::new();
        for page in 1..=5 {
            let rows = ListTable::new(&db, by_name(page)).prepare_items().unwrap().items;
            seen.extend(rows.into_iter().map(|s| s.id));
        }
        let mut unique = seen.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(seen.len(), 9);
        assert_eq!(unique.len(), 9);
    }

    #[test]
    fn test_search_matches_name_or_email_ignoring_case() {
        let db = Database::open_in_memory().unwrap();
        db.insert_submission(&NewSubmission::new("John Roe", "jane.doe@example.com"))
            .unwrap();
        db.insert_submission(&NewSubmission::new("Jane Smith", "smith@example.com"))
            .unwrap();
        db.insert_submission(&NewSubmission::new("Bob", "bob@example.com"))
            .unwrap();

        let search = |s: Option<&str>| {
            ListTable::new(
                &db,
                ListQuery {
                    search: s.map(str::to_string),
                    ..query(1, 10)
                },
            )
            .prepare_items()
            .unwrap()
        };

        let jane = search(Some("jane"));
        assert_eq!(jane.total_items, 2);
        let names: Vec<_> = jane.items.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["John Roe", "Jane Smith"]);

        assert_eq!(search(Some("JANE")).total_items, 2);
        assert_eq!(search(Some("nobody")).total_items, 0);
        assert_eq!(search(Some("nobody")).total_pages, 0);
        assert_eq!(search(None).total_items, 3);
    }

    #[test]
    fn test_from_params_defaults_malformed_input() {
        let params = RequestParams::parse(
            "paged=0&orderby=name;DROP TABLE submissions&order=sideways&status=archived&s=%20%20",
        );
        let query = ListQuery::from_params(&params, 0);
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 1);
        assert_eq!(query.orderby, None);
        assert_eq!(query.order, SortOrder::Asc);
        assert_eq!(query.status, None);
        assert_eq!(query.search, None);

        let params = RequestParams::parse("paged=3&orderby=date&order=DESC&status=unread&s=jane");
        let query = ListQuery::from_params(&params, 10);
        assert_eq!(query.page, 3);
        assert_eq!(query.offset(), 20);
        assert_eq!(query.orderby, Some(SortColumn::DateSubmitted));
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.status, Some(SubmissionStatus::Unread));
        assert_eq!(query.search.as_deref(), Some("jane"));
    }

    #[test]
    fn test_to_params_preserves_list_state() {
        let query = ListQuery {
            page: 2,
            per_page: 5,
            search: Some("jane doe".into()),
            orderby: Some(SortColumn::Name),
            order: SortOrder::Desc,
            status: Some(SubmissionStatus::Read),
        };
        let params = query.to_params();
        assert_eq!(
            params.to_query(LIST_STATE_KEYS),
            "status=read&s=jane+doe&orderby=name&order=desc&paged=2"
        );
        assert_eq!(ListQuery::from_params(&params, 5), query);
    }

    #[test]
    fn test_page_past_the_end_falls_back_to_last_page() {
        let db = seeded(11);
        assert!(db.delete_submission(11).unwrap());

        let mut table = ListTable::new(&db, query(3, 5));
        let page = table.prepare_items().unwrap();
        assert_eq!(page.total_items, 10);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page, 2);
        let ids: Vec<i64> = page.items.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![6, 7, 8, 9, 10]);
        assert_eq!(table.query().page, 2);

        // An empty table stays on page 1
        let empty = seeded(0);
        let page = ListTable::new(&empty, query(4, 5)).prepare_items().unwrap();
        assert_eq!((page.page, page.total_pages), (1, 0));
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_header_order_flips_active_column() {
        let db = seeded(0);
        let table = ListTable::new(
            &db,
            ListQuery {
                orderby: Some(SortColumn::Name),
                order: SortOrder::Asc,
                ..ListQuery::default()
            },
        );
        assert_eq!(table.header_order(SortColumn::Name), SortOrder::Desc);
        assert_eq!(table.header_order(SortColumn::Id), SortOrder::Asc);
    }

    #[test]
    fn test_column_layout() {
        let keys: Vec<_> = Column::ALL.iter().map(|c| c.key()).collect();
        assert_eq!(
            keys,
            vec!["cb", "id", "name", "email", "status", "date_submitted", "actions"]
        );
        let sortable: Vec<_> = Column::ALL.iter().filter_map(|c| c.sortable()).collect();
        assert_eq!(
            sortable,
            vec![SortColumn::Id, SortColumn::Name, SortColumn::DateSubmitted]
        );
        assert_eq!(BULK_ACTIONS, &[("bulk-delete", "Delete")]);
    }
}
