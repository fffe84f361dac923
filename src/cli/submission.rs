use comfy_table::{Cell, Table};

use crate::db::Database;
use crate::listing::{Column, ListPage, ListQuery, ListTable};

pub fn list_submissions(db: &Database, query: ListQuery, json: bool) -> anyhow::Result<()> {
    let mut table = ListTable::new(db, query);
    let page = table.prepare_items()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if let Some(search) = &table.query().search {
        println!("Search results for \"{search}\"");
    }
    print!("{}", render_page(&page));
    Ok(())
}

fn render_page(page: &ListPage) -> String {
    if page.items.is_empty() {
        return "No submissions found.\n".to_string();
    }

    let columns: Vec<Column> = Column::ALL
        .into_iter()
        .filter(|c| !matches!(c, Column::Cb | Column::Actions))
        .collect();

    let mut table = Table::new();
    table.set_header(columns.iter().map(|c| c.label()).collect::<Vec<_>>());
    for item in &page.items {
        table.add_row(
            columns
                .iter()
                .map(|c| Cell::new(c.value(item).unwrap_or_default()))
                .collect::<Vec<_>>(),
        );
    }

    format!(
        "{table}\n{} item(s), page {} of {}\n",
        page.total_items,
        page.page,
        page.total_pages.max(1)
    )
}

pub fn show_submission(db: &Database, id: i64) -> anyhow::Result<()> {
    let Some(s) = db.get_submission(id)? else {
        anyhow::bail!("Submission {id} not found");
    };

    println!("ID:        {}", s.id);
    println!("Name:      {}", s.name);
    println!("Email:     {}", s.email);
    if let Some(phone) = &s.phone {
        println!("Phone:     {phone}");
    }
    if let Some(company) = &s.company {
        println!("Company:   {company}");
    }
    if let Some(country) = &s.country {
        println!("Country:   {country}");
    }
    println!("Status:    {}", s.status);
    println!("Submitted: {}", s.date_submitted);
    if let Some(message) = &s.message {
        println!("\n{message}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewSubmission;

    #[test]
    fn test_render_page() {
        let db = Database::open_in_memory().unwrap();
        for name in ["Jane Smith", "John Roe", "Jane Doe"] {
            db.insert_submission(&NewSubmission::new(name, "someone@example.com"))
                .unwrap();
        }

        let query = ListQuery {
            per_page: 2,
            search: Some("jane".into()),
            ..ListQuery::default()
        };
        let page = ListTable::new(&db, query).prepare_items().unwrap();
        let out = render_page(&page);
        assert!(out.contains("Date Submitted"));
        assert!(out.contains("Jane Smith"));
        assert!(out.contains("Jane Doe"));
        assert!(!out.contains("John Roe"));
        assert!(out.contains("2 item(s), page 1 of 1"));

        let empty = ListQuery {
            search: Some("nobody".into()),
            ..ListQuery::default()
        };
        let page = ListTable::new(&db, empty).prepare_items().unwrap();
        assert_eq!(render_page(&page), "No submissions found.\n");
    }
}
