//! Operator notices that survive the redirect after an action.
//!
//! Notices are queued per session and drained on the next render, so a
//! refreshed page never shows a stale message.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::db::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoticeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            "info" => Ok(Self::Info),
            other => Err(format!("unknown notice kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }
}

/// Queue of notices for one operator session.
pub struct NoticeQueue<'a> {
    db: &'a Database,
    session: &'a str,
}

impl<'a> NoticeQueue<'a> {
    pub fn new(db: &'a Database, session: &'a str) -> Self {
        Self { db, session }
    }

    pub fn push(&self, notice: &Notice) -> anyhow::Result<()> {
        tracing::debug!("Queueing {} notice for '{}'", notice.kind, self.session);
        self.db.push_notice(self.session, notice)
    }

    pub fn push_all(&self, notices: &[Notice]) -> anyhow::Result<()> {
        for notice in notices {
            self.push(notice)?;
        }
        Ok(())
    }

    /// Drain the queue. Each notice is returned exactly once.
    pub fn flush(&self) -> anyhow::Result<Vec<Notice>> {
        self.db.take_notices(self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_flushes_once_per_session() {
        let db = Database::open_in_memory().unwrap();
        let admin = NoticeQueue::new(&db, "admin");
        let other = NoticeQueue::new(&db, "other");

        admin
            .push_all(&[Notice::success("3 submissions deleted."), Notice::info("hi")])
            .unwrap();

        assert!(other.flush().unwrap().is_empty());

        let first = admin.flush().unwrap();
        assert_eq!(
            first,
            vec![Notice::success("3 submissions deleted."), Notice::info("hi")]
        );
        // A refresh sees nothing
        assert!(admin.flush().unwrap().is_empty());
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [NoticeKind::Success, NoticeKind::Error, NoticeKind::Info] {
            assert_eq!(kind.as_str().parse::<NoticeKind>().unwrap(), kind);
        }
        assert!("warning".parse::<NoticeKind>().is_err());
    }
}
