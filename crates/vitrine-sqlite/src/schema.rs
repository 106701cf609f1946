//! Schema management and migrations

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{SqliteError, SqliteResult};

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations
pub fn apply_migrations(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = get_current_version(conn)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "Checking migrations");

    if current_version < SCHEMA_VERSION {
        info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Applying schema migrations"
        );
        apply_migration_v1(conn)?;
    }

    Ok(())
}

fn get_current_version(conn: &Connection) -> SqliteResult<i32> {
    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(None);

    Ok(version.unwrap_or(0))
}

fn record_migration(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: images and case_studies tables
fn apply_migration_v1(conn: &Connection) -> SqliteResult<()> {
    debug!("Applying migration v1: initial case-study schema");

    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| SqliteError::Schema(format!("Failed to apply v1 schema: {}", e)))?;

    record_migration(conn, 1)?;
    info!("Migration v1 applied successfully");
    Ok(())
}

/// Initial schema SQL
const SCHEMA_V1: &str = r#"
-- ============================================================================
-- TABLE: images
-- ============================================================================
-- Binary blobs embedded in case-study rich text or used as client logos.
-- Each blob is owned by exactly one referencing slot; lifecycle is managed
-- by the synchronization engine, never by ad-hoc writes.

CREATE TABLE IF NOT EXISTS images (
    image_id INTEGER PRIMARY KEY AUTOINCREMENT,
    data BLOB NOT NULL,
    image_type TEXT NOT NULL CHECK (image_type IN ('jpeg', 'png'))
);

-- ============================================================================
-- TABLE: case_studies
-- ============================================================================
-- Rich-text fields hold sanitized markup; embedded images are referenced by
-- bare image_id in their img src attributes (canonical stored form).

CREATE TABLE IF NOT EXISTS case_studies (
    case_study_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL DEFAULT '',
    client_name TEXT,
    client_link TEXT,
    client_logo_id INTEGER REFERENCES images(image_id),
    industry TEXT,
    summary TEXT,
    start_date TEXT,
    end_date TEXT,
    problem_description TEXT,
    solution_description TEXT,
    outcomes TEXT,
    tools_used TEXT,
    project_learnings TEXT
);

CREATE INDEX IF NOT EXISTS idx_case_studies_title ON case_studies(title);
CREATE INDEX IF NOT EXISTS idx_case_studies_industry ON case_studies(industry);
"#;
