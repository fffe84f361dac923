use rusqlite::Connection;

const MIGRATIONS: &[&str] = &[
    // Migration 1: submissions and per-screen options
    "CREATE TABLE IF NOT EXISTS submissions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        date_submitted TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%S', 'now'))
    );

    CREATE TABLE IF NOT EXISTS options (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );",
    // Migration 2: contact details, read status and the notice queue
    "ALTER TABLE submissions ADD COLUMN phone TEXT;
    ALTER TABLE submissions ADD COLUMN company TEXT;
    ALTER TABLE submissions ADD COLUMN country TEXT;
    ALTER TABLE submissions ADD COLUMN message TEXT;
    ALTER TABLE submissions ADD COLUMN status TEXT NOT NULL DEFAULT 'unread'
        CHECK (status IN ('read', 'unread'));

    CREATE INDEX IF NOT EXISTS idx_submissions_date ON submissions(date_submitted);

    CREATE TABLE IF NOT EXISTS notices (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session TEXT NOT NULL,
        kind TEXT NOT NULL,
        message TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    );

    CREATE INDEX IF NOT EXISTS idx_notices_session ON notices(session);",
];

pub fn latest_version() -> i64 {
    MIGRATIONS.len() as i64
}

pub fn current_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |row| row.get(0),
    )
}

pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS _migrations (version INTEGER PRIMARY KEY)")?;

    let current_version = current_version(conn)?;

    for (i, sql) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i64;
        if version > current_version {
            conn.execute_batch(sql)?;
            conn.execute("INSERT INTO _migrations (version) VALUES (?1)", [version])?;
            tracing::info!("Applied migration {version}");
        }
    }

    Ok(())
}
