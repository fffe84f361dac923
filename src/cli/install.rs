use crate::db::{Database, migrations};

pub fn install(db: &Database) -> anyhow::Result<()> {
    let version = db.schema_version()?;
    println!("Database ready (schema version {version}).");
    if version < migrations::latest_version() {
        anyhow::bail!(
            "Schema is at version {version} but {} is expected",
            migrations::latest_version()
        );
    }
    Ok(())
}
