use crate::actions::{ID_PARAM, TOKEN_PARAM};
use crate::db::models::{Submission, SubmissionStatus};
use crate::listing::{BULK_ACTIONS, Column, LIST_STATE_KEYS, ListPage, ListQuery, ListTable};
use crate::notice::Notice;

pub const LIST_PATH: &str = "/submissions";

/// Everything the list screen needs for one render.
pub struct ListView<'a> {
    pub operator: &'a str,
    pub table: &'a ListTable<'a>,
    pub page: &'a ListPage,
    pub notices: &'a [Notice],
    /// Present only when the operator may delete.
    pub tokens: Option<ActionTokens>,
}

pub struct ActionTokens {
    pub delete: String,
    pub bulk_delete: String,
}

pub fn list_url(query: &ListQuery) -> String {
    let qs = query.to_params().to_query(LIST_STATE_KEYS);
    if qs.is_empty() {
        LIST_PATH.to_string()
    } else {
        format!("{LIST_PATH}?{qs}")
    }
}

pub fn list_page(view: &ListView) -> String {
    let query = view.table.query();
    let mut html = String::new();

    html.push_str("<div class=\"wrap\">\n");
    html.push_str(&format!(
        "<h1>Form Submissions</h1>\n<div class=\"operator\">Signed in as {} \
         <form class=\"inline\" method=\"post\" action=\"/logout\"><button type=\"submit\">Sign out</button></form></div>\n",
        escape_html(view.operator)
    ));

    write_notices(&mut html, view.notices);
    write_views(&mut html, query);
    write_search_box(&mut html, query);
    if view.tokens.is_some() {
        write_screen_options(&mut html, query, view.page.per_page);
    }

    html.push_str(&format!(
        "<form id=\"submissions-form\" method=\"post\" action=\"{LIST_PATH}\">\n"
    ));
    write_state_fields(&mut html, query);
    if let Some(tokens) = &view.tokens {
        write_hidden(&mut html, TOKEN_PARAM, &tokens.bulk_delete);
        write_bulk_actions(&mut html, "action");
    }
    write_pagination(&mut html, query, view.page);
    write_table(&mut html, view);
    if view.tokens.is_some() {
        write_bulk_actions(&mut html, "action2");
    }
    html.push_str("</form>\n");

    // Row delete buttons point at these through their `form` attribute,
    // since forms cannot nest inside the bulk form.
    if let Some(tokens) = &view.tokens {
        for item in &view.page.items {
            html.push_str(&format!(
                "<form id=\"delete-{}\" method=\"post\" action=\"{LIST_PATH}\">\n",
                item.id
            ));
            write_state_fields(&mut html, query);
            write_hidden(&mut html, "action", "delete");
            write_hidden(&mut html, ID_PARAM, &item.id.to_string());
            write_hidden(&mut html, TOKEN_PARAM, &tokens.delete);
            html.push_str("</form>\n");
        }
    }

    html.push_str("</div>\n");
    layout("Form Submissions", &html)
}

fn write_notices(html: &mut String, notices: &[Notice]) {
    for notice in notices {
        html.push_str(&format!(
            "<div class=\"notice notice-{}\"><p>{}</p></div>\n",
            notice.kind,
            escape_html(&notice.message)
        ));
    }
}

fn write_views(html: &mut String, query: &ListQuery) {
    let views: [(Option<SubmissionStatus>, &str); 3] = [
        (None, "All"),
        (Some(SubmissionStatus::Unread), "Unread"),
        (Some(SubmissionStatus::Read), "Read"),
    ];

    html.push_str("<ul class=\"subsubsub\">\n");
    for (status, label) in views {
        let target = ListQuery {
            status,
            page: 1,
            ..query.clone()
        };
        let current = if query.status == status {
            " class=\"current\""
        } else {
            ""
        };
        html.push_str(&format!(
            "<li><a href=\"{}\"{current}>{label}</a></li>\n",
            escape_html(&list_url(&target))
        ));
    }
    html.push_str("</ul>\n");
}

fn write_search_box(html: &mut String, query: &ListQuery) {
    html.push_str(&format!(
        "<form class=\"search-box\" method=\"get\" action=\"{LIST_PATH}\">\n"
    ));
    if let Some(status) = query.status {
        write_hidden(html, "status", status.as_str());
    }
    if let Some(orderby) = query.orderby {
        write_hidden(html, "orderby", orderby.key());
        write_hidden(html, "order", query.order.key());
    }
    html.push_str(&format!(
        "<label class=\"screen-reader-text\" for=\"submissions-search-input\">Search Submissions:</label>\n\
         <input type=\"search\" id=\"submissions-search-input\" name=\"s\" value=\"{}\" />\n\
         <button type=\"submit\" id=\"search-submit\">Search Submissions</button>\n</form>\n",
        escape_html(query.search.as_deref().unwrap_or(""))
    ));

    if let Some(search) = &query.search {
        let cleared = ListQuery {
            search: None,
            page: 1,
            ..query.clone()
        };
        html.push_str(&format!(
            "<div class=\"search-results\">Search results for: <strong>{}</strong> \
             <a class=\"button\" href=\"{}\">Clear Search</a></div>\n",
            escape_html(search),
            escape_html(&list_url(&cleared))
        ));
    }
}

fn write_screen_options(html: &mut String, query: &ListQuery, per_page: u32) {
    html.push_str(&format!(
        "<form class=\"screen-options\" method=\"post\" action=\"{LIST_PATH}/screen-options\">\n"
    ));
    write_state_fields(html, query);
    html.push_str(&format!(
        "<label for=\"per_page\">Submissions per page:</label>\n\
         <input type=\"number\" id=\"per_page\" name=\"per_page\" min=\"1\" max=\"{}\" value=\"{per_page}\" />\n\
         <button type=\"submit\">Apply</button>\n</form>\n",
        crate::listing::MAX_PER_PAGE
    ));
}

fn write_bulk_actions(html: &mut String, name: &str) {
    html.push_str(&format!(
        "<div class=\"bulkactions\"><select name=\"{name}\">\n<option value=\"-1\">Bulk actions</option>\n"
    ));
    for (key, label) in BULK_ACTIONS {
        html.push_str(&format!("<option value=\"{key}\">{label}</option>\n"));
    }
    html.push_str("</select> <button type=\"submit\">Apply</button></div>\n");
}

fn write_pagination(html: &mut String, query: &ListQuery, page: &ListPage) {
    let noun = if page.total_items == 1 { "item" } else { "items" };
    html.push_str(&format!(
        "<div class=\"tablenav-pages\"><span class=\"displaying-num\">{} {noun}</span>",
        page.total_items
    ));

    if page.total_pages > 1 {
        let current = u64::from(page.page);
        let link = |target: u64, label: &str| {
            let to = ListQuery {
                page: u32::try_from(target).unwrap_or(u32::MAX),
                ..query.clone()
            };
            format!(
                " <a class=\"page-link\" href=\"{}\">{label}</a>",
                escape_html(&list_url(&to))
            )
        };

        if current > 1 {
            html.push_str(&link(1, "&laquo;"));
            html.push_str(&link(current - 1, "&lsaquo;"));
        }
        html.push_str(&format!(
            " <span class=\"paging-input\">{current} of {}</span>",
            page.total_pages
        ));
        if current < page.total_pages {
            html.push_str(&link(current + 1, "&rsaquo;"));
            html.push_str(&link(page.total_pages, "&raquo;"));
        }
    }
    html.push_str("</div>\n");
}

fn write_table(html: &mut String, view: &ListView) {
    let query = view.table.query();
    let columns: Vec<Column> = Column::ALL
        .into_iter()
        .filter(|c| view.tokens.is_some() || !matches!(c, Column::Cb))
        .collect();

    html.push_str("<table class=\"widefat fixed striped submissions\">\n<thead><tr>");
    for column in &columns {
        match (column, column.sortable()) {
            (Column::Cb, _) => html.push_str("<td class=\"check-column\"></td>"),
            (_, Some(sort)) => {
                let target = ListQuery {
                    orderby: Some(sort),
                    order: view.table.header_order(sort),
                    page: 1,
                    ..query.clone()
                };
                let indicator = if query.orderby == Some(sort) {
                    format!(" sorted {}", query.order.key())
                } else {
                    " sortable".to_string()
                };
                html.push_str(&format!(
                    "<th class=\"column-{}{indicator}\"><a href=\"{}\">{}</a></th>",
                    column.key(),
                    escape_html(&list_url(&target)),
                    column.label()
                ));
            }
            (_, None) => html.push_str(&format!(
                "<th class=\"column-{}\">{}</th>",
                column.key(),
                column.label()
            )),
        }
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    if view.page.items.is_empty() {
        html.push_str(&format!(
            "<tr class=\"no-items\"><td colspan=\"{}\">No submissions found.</td></tr>\n",
            columns.len()
        ));
    }

    for item in &view.page.items {
        html.push_str(&format!("<tr class=\"status-{}\">", item.status));
        for column in &columns {
            html.push_str(&format!("<td class=\"column-{}\">", column.key()));
            match column {
                Column::Cb => html.push_str(&format!(
                    "<input type=\"checkbox\" name=\"{ID_PARAM}[]\" value=\"{}\" />",
                    item.id
                )),
                Column::Actions => write_row_actions(html, item, view.tokens.is_some()),
                other => {
                    if let Some(value) = other.value(item) {
                        html.push_str(&escape_html(&value));
                    }
                }
            }
            html.push_str("</td>");
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody></table>\n");
}

fn write_row_actions(html: &mut String, item: &Submission, can_delete: bool) {
    html.push_str(&format!(
        "<a href=\"{LIST_PATH}/{}\" title=\"View\">View</a>",
        item.id
    ));
    if can_delete {
        html.push_str(&format!(
            " <button type=\"submit\" form=\"delete-{}\" title=\"Delete\">Delete</button>",
            item.id
        ));
    }
}

fn write_state_fields(html: &mut String, query: &ListQuery) {
    let params = query.to_params();
    for key in LIST_STATE_KEYS {
        if let Some(value) = params.get(key) {
            write_hidden(html, key, value);
        }
    }
}

fn write_hidden(html: &mut String, name: &str, value: &str) {
    html.push_str(&format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\" />\n",
        escape_html(name),
        escape_html(value)
    ));
}

pub fn detail_page(item: &Submission, back: &str) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        "<div class=\"wrap\">\n<h1>Submission #{}</h1>\n<table class=\"widefat\">\n<tbody>\n",
        item.id
    ));

    let rows: [(&str, Option<&str>); 8] = [
        ("Name", Some(item.name.as_str())),
        ("Email", Some(item.email.as_str())),
        ("Phone", item.phone.as_deref()),
        ("Company", item.company.as_deref()),
        ("Country", item.country.as_deref()),
        ("Status", Some(item.status.as_str())),
        ("Date Submitted", Some(item.date_submitted.as_str())),
        ("Message", item.message.as_deref()),
    ];
    for (label, value) in rows {
        html.push_str(&format!(
            "<tr><th>{label}</th><td>{}</td></tr>\n",
            escape_html(value.unwrap_or("-"))
        ));
    }

    html.push_str(&format!(
        "</tbody></table>\n<p><a class=\"button\" href=\"{}\">Back to submissions</a></p>\n</div>\n",
        escape_html(back)
    ));
    layout(&format!("Submission #{}", item.id), &html)
}

pub fn login_page(error: Option<&str>) -> String {
    let mut html = String::from("<div class=\"wrap login\">\n<h1>Sign in</h1>\n");
    if let Some(error) = error {
        write_notices(&mut html, &[Notice::error(error)]);
    }
    html.push_str(
        "<form method=\"post\" action=\"/login\">\n\
         <label for=\"key\">Access key</label>\n\
         <input type=\"password\" id=\"key\" name=\"key\" autocomplete=\"current-password\" />\n\
         <button type=\"submit\">Sign in</button>\n</form>\n</div>\n",
    );
    layout("Sign in", &html)
}

pub fn error_page(title: &str, message: &str) -> String {
    let html = format!(
        "<div class=\"wrap\">\n<h1>{}</h1>\n<div class=\"notice notice-error\"><p>{}</p></div>\n\
         <p><a href=\"{LIST_PATH}\">Back to submissions</a></p>\n</div>\n",
        escape_html(title),
        escape_html(message)
    );
    layout(title, &html)
}

fn layout(title: &str, body: &str) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str("<style>\n");
    html.push_str("  body { font-family: system-ui, sans-serif; max-width: 1100px; margin: 2rem auto; padding: 0 1rem; color: #1a1a1a; }\n");
    html.push_str("  table { border-collapse: collapse; width: 100%; margin: 1rem 0; }\n");
    html.push_str("  th, td { border: 1px solid #ddd; padding: 0.5rem; text-align: left; }\n");
    html.push_str("  th { background: #f5f5f5; font-weight: 600; }\n");
    html.push_str("  tr:nth-child(even) { background: #fafafa; }\n");
    html.push_str("  tr.status-unread td { font-weight: 600; }\n");
    html.push_str("  .notice { border-left: 4px solid #72aee6; background: #fff; padding: 0.25rem 0.75rem; margin: 0.5rem 0; }\n");
    html.push_str("  .notice-success { border-left-color: #00a32a; }\n");
    html.push_str("  .notice-error { border-left-color: #d63638; }\n");
    html.push_str("  .subsubsub { list-style: none; padding: 0; display: flex; gap: 1rem; }\n");
    html.push_str("  .subsubsub .current { font-weight: 700; color: #000; }\n");
    html.push_str("  .inline { display: inline; }\n");
    html.push_str("  .tablenav-pages { margin: 0.5rem 0; }\n");
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
    html.push_str(body);
    html.push_str("</body>\n</html>\n");

    html
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::db::models::NewSubmission;
    use crate::listing::{SortColumn, SortOrder};

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">Tom & 'Jerry'</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_list_url_keeps_state() {
        assert_eq!(list_url(&ListQuery::default()), "/submissions");
        let query = ListQuery {
            search: Some("a&b".into()),
            orderby: Some(SortColumn::DateSubmitted),
            order: SortOrder::Desc,
            page: 3,
            ..ListQuery::default()
        };
        assert_eq!(
            list_url(&query),
            "/submissions?s=a%26b&orderby=date_submitted&order=desc&paged=3"
        );
    }

    #[test]
    fn test_list_page_escapes_and_preserves_search() {
        let db = Database::open_in_memory().unwrap();
        db.insert_submission(&NewSubmission::new("<script>x</script>", "x@example.com"))
            .unwrap();
        let mut table = ListTable::new(
            &db,
            ListQuery {
                search: Some("script".into()),
                ..ListQuery::default()
            },
        );
        let page = table.prepare_items().unwrap();
        let html = list_page(&ListView {
            operator: "admin",
            table: &table,
            page: &page,
            notices: &[Notice::success("Done.")],
            tokens: Some(ActionTokens {
                delete: "tok-d".into(),
                bulk_delete: "tok-b".into(),
            }),
        });

        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("<script>x"));
        assert!(html.contains("notice-success"));
        assert!(html.contains("Search results for: <strong>script</strong>"));
        // Sort headers keep the search
        assert!(html.contains("href=\"/submissions?s=script&amp;orderby=name&amp;order=asc\""));
        assert!(html.contains("name=\"_token\" value=\"tok-b\""));
        assert!(html.contains("form=\"delete-1\""));
        assert!(html.contains("1 item"));
    }

    #[test]
    fn test_read_only_view_has_no_delete_controls() {
        let db = Database::open_in_memory().unwrap();
        db.insert_submission(&NewSubmission::new("A", "a@example.com"))
            .unwrap();
        let mut table = ListTable::new(&db, ListQuery::default());
        let page = table.prepare_items().unwrap();
        let html = list_page(&ListView {
            operator: "viewer",
            table: &table,
            page: &page,
            notices: &[],
            tokens: None,
        });
        assert!(!html.contains("_token"));
        assert!(!html.contains("type=\"checkbox\""));
        assert!(html.contains("href=\"/submissions/1\""));
    }

    #[test]
    fn test_empty_table_message_and_pagination() {
        let db = Database::open_in_memory().unwrap();
        let mut table = ListTable::new(&db, ListQuery::default());
        let page = table.prepare_items().unwrap();
        let html = list_page(&ListView {
            operator: "admin",
            table: &table,
            page: &page,
            notices: &[],
            tokens: None,
        });
        assert!(html.contains("No submissions found."));
        assert!(html.contains("0 items"));
        assert!(!html.contains("page-link"));

        for i in 0..12 {
            db.insert_submission(&NewSubmission::new(format!("P{i}"), "p@example.com"))
                .unwrap();
        }
        let mut table = ListTable::new(
            &db,
            ListQuery {
                page: 2,
                ..ListQuery::default()
            },
        );
        let page = table.prepare_items().unwrap();
        let html = list_page(&ListView {
            operator: "admin",
            table: &table,
            page: &page,
            notices: &[],
            tokens: None,
        });
        assert!(html.contains("2 of 3"));
        assert!(html.contains("href=\"/submissions?paged=3\""));
        assert!(html.contains("href=\"/submissions\">&laquo;"));
    }
}
