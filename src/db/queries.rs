use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter};

use super::{Database, casefold};
use super::models::{NewSubmission, Submission, SubmissionStatus};
use crate::listing::ListQuery;
use crate::notice::{Notice, NoticeKind};

const SUBMISSION_COLUMNS: &str =
    "id, name, email, phone, company, country, message, status, date_submitted";

impl Database {
    // --- Submissions ---

    pub fn insert_submission(&self, new: &NewSubmission) -> anyhow::Result<i64> {
        let conn = self.conn();
        let status = new.status.unwrap_or(SubmissionStatus::Unread);
        conn.execute(
            "INSERT INTO submissions (name, email, phone, company, country, message, status, date_submitted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, COALESCE(?8, strftime('%Y-%m-%d %H:%M:%S', 'now')))",
            params![
                new.name,
                new.email,
                new.phone,
                new.company,
                new.country,
                new.message,
                status.as_str(),
                new.date_submitted,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_submission(&self, id: i64) -> anyhow::Result<Option<Submission>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![id], Self::map_submission_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Number of submissions matching the search and status filter of `query`.
    pub fn count_submissions(&self, query: &ListQuery) -> anyhow::Result<u64> {
        let conn = self.conn();
        let mut values = Vec::new();
        let where_clause = filter_clause(query, &mut values);
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM submissions{where_clause}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// One page of submissions matching `query`, in the requested order.
    pub fn list_submissions(&self, query: &ListQuery) -> anyhow::Result<Vec<Submission>> {
        let conn = self.conn();
        let mut values = Vec::new();
        let where_clause = filter_clause(query, &mut values);

        // Sort column and direction come from closed enums, never from raw input.
        let order_clause = match query.orderby {
            Some(column) => format!(
                " ORDER BY {} {}, id ASC",
                column.sql_expr(),
                query.order.sql_keyword()
            ),
            None => " ORDER BY id ASC".to_string(),
        };

        values.push(Value::Integer(i64::from(query.per_page)));
        let limit_idx = values.len();
        values.push(Value::Integer(query.offset() as i64));
        let offset_idx = values.len();

        let mut stmt = conn.prepare(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions{where_clause}{order_clause} LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
        ))?;
        let rows = stmt.query_map(params_from_iter(values.iter()), Self::map_submission_row)?;

        let mut submissions = Vec::new();
        for row in rows {
            submissions.push(row?);
        }
        Ok(submissions)
    }

    /// Returns `true` when a row was removed.
    pub fn delete_submission(&self, id: i64) -> anyhow::Result<bool> {
        let conn = self.conn();
        let changed = conn.execute("DELETE FROM submissions WHERE id = ?1", params![id])?;
        Ok(changed == 1)
    }

    fn map_submission_row(row: &rusqlite::Row) -> rusqlite::Result<Submission> {
        let status: String = row.get(7)?;
        let status = status
            .parse::<SubmissionStatus>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, e.into()))?;
        Ok(Submission {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            company: row.get(4)?,
            country: row.get(5)?,
            message: row.get(6)?,
            status,
            date_submitted: row.get(8)?,
        })
    }

    // --- Options ---

    pub fn set_option(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO options (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_option(&self, key: &str) -> anyhow::Result<Option<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT value FROM options WHERE key = ?1")?;
        let mut rows = stmt.query_map(params![key], |row| row.get(0))?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    // --- Notices ---

    pub fn push_notice(&self, session: &str, notice: &Notice) -> anyhow::Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO notices (session, kind, message) VALUES (?1, ?2, ?3)",
            params![session, notice.kind.as_str(), notice.message],
        )?;
        Ok(())
    }

    /// Remove and return every notice queued for `session`, oldest first.
    pub fn take_notices(&self, session: &str) -> anyhow::Result<Vec<Notice>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut notices = Vec::new();
        {
            let mut stmt =
                tx.prepare("SELECT kind, message FROM notices WHERE session = ?1 ORDER BY id")?;
            let rows = stmt.query_map(params![session], |row| {
                let kind: String = row.get(0)?;
                Ok(Notice {
                    kind: kind.parse().unwrap_or(NoticeKind::Info),
                    message: row.get(1)?,
                })
            })?;
            for row in rows {
                notices.push(row?);
            }
        }
        tx.execute("DELETE FROM notices WHERE session = ?1", params![session])?;
        tx.commit()?;

        Ok(notices)
    }
}

/// Build the WHERE clause for the search and status filters, appending bound
/// values to `values`. Returns an empty string when nothing filters.
fn filter_clause(query: &ListQuery, values: &mut Vec<Value>) -> String {
    let mut conditions = Vec::new();

    if let Some(search) = query.search.as_deref() {
        values.push(Value::Text(casefold(search)));
        let idx = values.len();
        conditions.push(format!(
            "(instr(casefold(name), ?{idx}) > 0 OR instr(casefold(email), ?{idx}) > 0)"
        ));
    }

    if let Some(status) = query.status {
        values.push(Value::Text(status.as_str().to_string()));
        conditions.push(format!("status = ?{}", values.len()));
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}
