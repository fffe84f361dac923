use super::ListQuery;
use crate::db::Database;
use crate::db::models::Submission;

/// Read and delete access to persisted submissions.
pub trait SubmissionStore {
    /// Rows matching the search and status filter of `query`, ignoring paging.
    fn count(&self, query: &ListQuery) -> anyhow::Result<u64>;
    /// The page of rows described by `query`.
    fn fetch_page(&self, query: &ListQuery) -> anyhow::Result<Vec<Submission>>;
    fn get(&self, id: i64) -> anyhow::Result<Option<Submission>>;
    /// Returns `false` when no row had that id.
    fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

impl SubmissionStore for Database {
    fn count(&self, query: &ListQuery) -> anyhow::Result<u64> {
        self.count_submissions(query)
    }

    fn fetch_page(&self, query: &ListQuery) -> anyhow::Result<Vec<Submission>> {
        self.list_submissions(query)
    }

    fn get(&self, id: i64) -> anyhow::Result<Option<Submission>> {
        self.get_submission(id)
    }

    fn delete(&self, id: i64) -> anyhow::Result<bool> {
        self.delete_submission(id)
    }
}
