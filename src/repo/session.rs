use rusqlite::{Connection, OptionalExtension};
use crate::models::{SequencerState, WorkflowData, WorkflowSession};
use anyhow::{Context, Result};

/// Repository for the single-row `workflow_session` table
pub struct SessionRepo;

impl SessionRepo {
    /// Load the active session, or a fresh one when nothing has been saved
    pub fn load(conn: &Connection) -> Result<WorkflowSession> {
        let row = conn.query_row(
            "SELECT current_stage, is_approved, workflow_json, active_project_id
             FROM workflow_session WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, u8>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        ).optional()
        .context("Failed to load workflow session")?;

        let Some((current_stage, is_approved, workflow_json, active_project_id)) = row else {
            return Ok(WorkflowSession::fresh());
        };

        let workflow_data = WorkflowData::from_json(&workflow_json)
            .context("Corrupt workflow data in session")?;

        Ok(WorkflowSession {
            state: SequencerState {
                current_stage,
                is_approved: is_approved.map(|v| v != 0),
                workflow_data,
            },
            active_project_id,
        })
    }

    /// Save (insert or replace) the active session
    pub fn save(conn: &Connection, session: &WorkflowSession) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let workflow_json = session.state.workflow_data.to_json()?;
        conn.execute(
            "INSERT INTO workflow_session (id, current_stage, is_approved, workflow_json, active_project_id, modified_ts)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                current_stage = excluded.current_stage,
                is_approved = excluded.is_approved,
                workflow_json = excluded.workflow_json,
                active_project_id = excluded.active_project_id,
                modified_ts = excluded.modified_ts",
            rusqlite::params![
                session.state.current_stage,
                session.state.is_approved.map(|v| if v { 1 } else { 0 }),
                workflow_json,
                session.active_project_id,
                now,
            ],
        )
        .context("Failed to save workflow session")?;
        log::debug!(
            "Saved session at stage {} (project {:?})",
            session.state.current_stage, session.active_project_id
        );
        Ok(())
    }

    /// Drop the active session
    pub fn clear(conn: &Connection) -> Result<()> {
        conn.execute("DELETE FROM workflow_session", [])
            .context("Failed to clear workflow session")?;
        Ok(())
    }
}
