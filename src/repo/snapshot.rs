use rusqlite::{Connection, OptionalExtension};
use crate::models::{NavigationSnapshot, ProgressSnapshot, ProgressStatus};
use anyhow::{Context, Result};

/// Local mirror of the backend's two progress trackers.
///
/// Offline mode reads these tables in place of the REST endpoints; the
/// `snapshot` commands record them.
pub struct SnapshotRepo;

impl SnapshotRepo {
    /// Record (replace) the progress snapshot for a project
    pub fn record_progress(conn: &Connection, snapshot: &ProgressSnapshot) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT OR REPLACE INTO progress_snapshots (project_id, current_page, overall_progress, status, recorded_ts)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                snapshot.project_id,
                snapshot.current_page,
                snapshot.overall_progress,
                snapshot.status.as_str(),
                now,
            ],
        )
        .with_context(|| format!("Failed to record progress for {}", snapshot.project_id))?;
        Ok(())
    }

    /// Get the progress snapshot for a project
    pub fn get_progress(conn: &Connection, project_id: &str) -> Result<Option<ProgressSnapshot>> {
        let snapshot = conn.query_row(
            "SELECT project_id, current_page, overall_progress, status
             FROM progress_snapshots WHERE project_id = ?1",
            [project_id],
            |row| {
                Ok(ProgressSnapshot {
                    project_id: row.get(0)?,
                    current_page: row.get(1)?,
                    overall_progress: row.get(2)?,
                    status: ProgressStatus::parse(&row.get::<_, String>(3)?),
                })
            },
        ).optional()?;
        Ok(snapshot)
    }

    /// List all progress snapshots ordered by project id
    pub fn list_progress(conn: &Connection) -> Result<Vec<ProgressSnapshot>> {
        let mut stmt = conn.prepare(
            "SELECT project_id, current_page, overall_progress, status
             FROM progress_snapshots ORDER BY project_id"
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProgressSnapshot {
                project_id: row.get(0)?,
                current_page: row.get(1)?,
                overall_progress: row.get(2)?,
                status: ProgressStatus::parse(&row.get::<_, String>(3)?),
            })
        })?;

        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(row?);
        }
        Ok(snapshots)
    }

    /// Record (replace) the navigation pointer for a project
    pub fn record_navigation(conn: &Connection, snapshot: &NavigationSnapshot) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT OR REPLACE INTO navigation_snapshots (project_id, current_stage, current_page_component, recorded_ts)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                snapshot.project_id,
                snapshot.current_stage,
                snapshot.current_page_component,
                now,
            ],
        )
        .with_context(|| format!("Failed to record navigation for {}", snapshot.project_id))?;
        Ok(())
    }

    /// Get the navigation pointer for a project
    pub fn get_navigation(conn: &Connection, project_id: &str) -> Result<Option<NavigationSnapshot>> {
        let snapshot = conn.query_row(
            "SELECT project_id, current_stage, current_page_component
             FROM navigation_snapshots WHERE project_id = ?1",
            [project_id],
            |row| {
                Ok(NavigationSnapshot {
                    project_id: row.get(0)?,
                    current_stage: row.get(1)?,
                    current_page_component: row.get(2)?,
                })
            },
        ).optional()?;
        Ok(snapshot)
    }

    /// Remove the navigation pointer for a project; returns whether one existed
    pub fn clear_navigation(conn: &Connection, project_id: &str) -> Result<bool> {
        let rows = conn.execute(
            "DELETE FROM navigation_snapshots WHERE project_id = ?1",
            [project_id],
        )?;
        Ok(rows > 0)
    }
}
