use std::path::Path;

use chrono::NaiveDateTime;

use crate::db::Database;
use crate::db::models::NewSubmission;
use crate::error::AppError;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn import(db: &Database, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let count = import_json(db, &raw)?;
    println!("Imported {count} submission(s) from {}.", file.display());
    Ok(())
}

/// Insert every record from a JSON array. The whole file is checked before
/// anything is written.
pub fn import_json(db: &Database, raw: &str) -> anyhow::Result<usize> {
    let records: Vec<NewSubmission> = serde_json::from_str(raw).map_err(AppError::from)?;

    for (i, record) in records.iter().enumerate() {
        validate(record).map_err(|e| anyhow::anyhow!("Record {}: {e}", i + 1))?;
    }

    for record in &records {
        let id = db.insert_submission(record)?;
        tracing::debug!("Imported submission {id}");
    }
    tracing::info!("Imported {} submissions", records.len());
    Ok(records.len())
}

fn validate(record: &NewSubmission) -> Result<(), AppError> {
    if record.name.trim().is_empty() {
        return Err(AppError::InvalidInput("name is empty".into()));
    }
    if !record.email.contains('@') {
        return Err(AppError::InvalidInput(format!(
            "'{}' is not an email address",
            record.email
        )));
    }
    if let Some(date) = &record.date_submitted {
        NaiveDateTime::parse_from_str(date, DATE_FORMAT).map_err(|_| {
            AppError::InvalidInput(format!("date_submitted '{date}' is not {DATE_FORMAT}"))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::SubmissionStatus;
    use crate::listing::ListQuery;

    #[test]
    fn test_import_json() {
        let db = Database::open_in_memory().unwrap();
        let raw = r#"[
            {"name": "Jane Smith", "email": "jane@example.com", "company": "Acme"},
            {"name": "Bob", "email": "bob@example.com", "status": "read",
             "date_submitted": "2024-03-01 09:30:00"}
        ]"#;
        assert_eq!(import_json(&db, raw).unwrap(), 2);

        let bob = db.get_submission(2).unwrap().unwrap();
        assert_eq!(bob.status, SubmissionStatus::Read);
        assert_eq!(bob.date_submitted, "2024-03-01 09:30:00");
        let jane = db.get_submission(1).unwrap().unwrap();
        assert_eq!(jane.company.as_deref(), Some("Acme"));
        assert_eq!(jane.status, SubmissionStatus::Unread);
    }

    #[test]
    fn test_import_rejects_whole_file() {
        let db = Database::open_in_memory().unwrap();
        let raw = r#"[
            {"name": "Fine", "email": "fine@example.com"},
            {"name": "Broken", "email": "broken@example.com", "date_submitted": "yesterday"}
        ]"#;
        let err = import_json(&db, raw).unwrap_err();
        assert!(err.to_string().contains("Record 2"));
        assert_eq!(db.count_submissions(&ListQuery::default()).unwrap(), 0);

        assert!(import_json(&db, r#"[{"name": "", "email": "x@y.z"}]"#).is_err());
        assert!(import_json(&db, r#"[{"name": "A", "email": "nope"}]"#).is_err());
        assert!(import_json(&db, r#"[{"name": "A", "email": "a@b.c", "id": 9}]"#).is_err());
        assert!(import_json(&db, "{}").is_err());
    }
}
