use comfy_table::{Cell, Table};

use crate::actions::{self, ActionKind, DeleteResult};
use crate::db::Database;
use crate::operator::{Capability, Operator};

pub fn delete(db: &Database, operator: &Operator, raw_ids: &[String]) -> anyhow::Result<()> {
    operator.require(Capability::ManageOptions, "delete submissions")?;

    let (ids, invalid_ids) = actions::parse_ids(raw_ids.iter().map(String::as_str));
    let outcome = actions::execute(db, ActionKind::BulkDelete, ids, invalid_ids);

    if !outcome.results.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["ID", "Result"]);
        for item in &outcome.results {
            let result = match &item.result {
                DeleteResult::Deleted => "deleted".to_string(),
                DeleteResult::NotFound => "not found".to_string(),
                DeleteResult::Failed(reason) => format!("failed: {reason}"),
            };
            table.add_row(vec![Cell::new(item.id), Cell::new(result)]);
        }
        println!("{table}");
    }

    for notice in outcome.notices() {
        println!("{}", notice.message);
    }

    if outcome.deleted_count() == 0 {
        anyhow::bail!("No submissions were deleted");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewSubmission;
    use crate::error::AppError;

    #[test]
    fn test_delete_reports_partial_success() {
        let db = Database::open_in_memory().unwrap();
        for i in 1..=3 {
            db.insert_submission(&NewSubmission::new(format!("P{i}"), "p@example.com"))
                .unwrap();
        }

        let ids: Vec<String> = ["1", "3", "3", "42", "abc"].map(String::from).to_vec();
        delete(&db, &Operator::local(), &ids).unwrap();
        assert!(db.get_submission(1).unwrap().is_none());
        assert!(db.get_submission(2).unwrap().is_some());
        assert!(db.get_submission(3).unwrap().is_none());

        assert!(delete(&db, &Operator::local(), &["1".to_string()]).is_err());
    }

    #[test]
    fn test_delete_requires_manage_options() {
        let db = Database::open_in_memory().unwrap();
        db.insert_submission(&NewSubmission::new("Kept", "k@example.com"))
            .unwrap();

        let viewer = Operator::new("viewer", vec![Capability::Read]);
        let err = delete(&db, &viewer, &["1".to_string()]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::Forbidden(_))
        ));
        assert!(db.get_submission(1).unwrap().is_some());
    }
}
