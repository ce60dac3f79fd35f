use rusqlite::{Connection, Result};
use std::collections::HashMap;

/// Current database schema version
const CURRENT_VERSION: u32 = 2;

/// Migration system for managing database schema versions
pub struct MigrationManager;

impl MigrationManager {
    /// Initialize the database with the current schema
    /// This creates the schema_version table and applies all migrations
    pub fn initialize(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        let current_version: u32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        for version in (current_version + 1)..=CURRENT_VERSION {
            log::info!("Applying schema migration v{}", version);
            Self::apply_migration(conn, version)?;
        }

        Ok(())
    }

    /// Apply a specific migration by version number
    fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
        let migrations = get_migrations();
        if let Some(migration) = migrations.get(&version) {
            let tx = conn.unchecked_transaction()?;
            migration(&tx)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [version],
            )?;
            tx.commit()?;
            Ok(())
        } else {
            Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
                Some(format!("No migration found for version {}", version)),
            ))
        }
    }

    /// Get the current schema version
    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
    }
}

/// Get all migrations indexed by version
fn get_migrations() -> HashMap<u32, fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>> {
    let mut migrations: HashMap<u32, fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>> = HashMap::new();
    migrations.insert(1, migration_v1);
    migrations.insert(2, migration_v2);
    migrations
}

/// Migration v1: requirement records and the persisted sequencer session
fn migration_v1(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE TABLE requirements (
            id INTEGER PRIMARY KEY,
            project_id TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            department TEXT NOT NULL,
            category TEXT NOT NULL,
            priority TEXT NOT NULL CHECK(priority IN ('low','medium','high','critical')),
            estimated_amount REAL NOT NULL,
            business_justification TEXT NOT NULL,
            submitted_by TEXT NOT NULL,
            technical_specification TEXT NULL,
            email TEXT NULL,
            phone_number TEXT NULL,
            stage INTEGER NOT NULL DEFAULT 1 CHECK(stage BETWEEN 0 AND 10),
            status TEXT NOT NULL CHECK(status IN ('in_progress','approved','rejected','completed')),
            workflow_json TEXT NULL,
            created_ts INTEGER NOT NULL,
            modified_ts INTEGER NOT NULL
        )",
        [],
    )?;
    // Note: workflow_json mirrors the accumulated workflow data of the last run that touched the record
    tx.execute(
        "CREATE INDEX idx_requirements_created_ts ON requirements(created_ts)",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_requirements_status ON requirements(status)",
        [],
    )?;

    // Single-row table: there is at most one active workflow per ledger
    tx.execute(
        "CREATE TABLE workflow_session (
            id INTEGER PRIMARY KEY CHECK(id = 1),
            current_stage INTEGER NOT NULL CHECK(current_stage BETWEEN 0 AND 10),
            is_approved INTEGER NULL CHECK(is_approved IN (0, 1)),
            workflow_json TEXT NOT NULL,
            active_project_id TEXT NULL,
            modified_ts INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Migration v2: local mirrors of the backend's progress and navigation trackers
fn migration_v2(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE TABLE progress_snapshots (
            project_id TEXT PRIMARY KEY,
            current_page INTEGER NOT NULL,
            overall_progress REAL NOT NULL CHECK(overall_progress BETWEEN 0 AND 100),
            status TEXT NOT NULL,
            recorded_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE TABLE navigation_snapshots (
            project_id TEXT PRIMARY KEY,
            current_stage INTEGER NOT NULL,
            current_page_component TEXT NULL,
            recorded_ts INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}
