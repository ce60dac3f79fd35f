use rusqlite::{Connection, OptionalExtension, Row};
use rusqlite::types::Type;
use chrono::{DateTime, Datelike, Local, TimeZone};
use crate::models::{Priority, ProjectDetail, Requirement, RequirementStatus, WorkflowData};
use anyhow::{Context, Result};

const SELECT_COLUMNS: &str =
    "SELECT id, project_id, title, department, category, priority, estimated_amount,
            business_justification, submitted_by, technical_specification, email, phone_number,
            stage, status, workflow_json, created_ts, modified_ts
     FROM requirements";

/// Requirement repository for database operations
///
/// Requirement records are created on intake, updated in place on every stage
/// completion or dashboard resume, and never deleted.
///
/// # Example
///
/// ```no_run
/// use procflow::db::DbConnection;
/// use procflow::repo::RequirementRepo;
///
/// let conn = DbConnection::connect().unwrap();
/// let all = RequirementRepo::list(&conn).unwrap();
/// ```
pub struct RequirementRepo;

fn row_to_requirement(row: &Row) -> rusqlite::Result<Requirement> {
    let priority: String = row.get(5)?;
    let status: String = row.get(13)?;
    let workflow_json: Option<String> = row.get(14)?;

    let workflow_data = match workflow_json {
        Some(json) => WorkflowData::from_json(&json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(14, Type::Text, Box::new(e)))?,
        None => WorkflowData::new(),
    };

    Ok(Requirement {
        id: Some(row.get(0)?),
        project_id: row.get(1)?,
        title: row.get(2)?,
        department: row.get(3)?,
        category: row.get(4)?,
        priority: Priority::from_str(&priority)
            .ok_or_else(|| rusqlite::Error::InvalidColumnType(5, "priority".to_string(), Type::Text))?,
        estimated_amount: row.get(6)?,
        business_justification: row.get(7)?,
        submitted_by: row.get(8)?,
        technical_specification: row.get(9)?,
        email: row.get(10)?,
        phone_number: row.get(11)?,
        stage: row.get(12)?,
        status: RequirementStatus::from_str(&status)
            .ok_or_else(|| rusqlite::Error::InvalidColumnType(13, "status".to_string(), Type::Text))?,
        workflow_data,
        created_ts: row.get(15)?,
        modified_ts: row.get(16)?,
    })
}

impl RequirementRepo {
    /// Insert a new requirement record
    pub fn create(conn: &Connection, requirement: &Requirement) -> Result<Requirement> {
        let workflow_json = requirement.workflow_data.to_json()?;

        conn.execute(
            "INSERT INTO requirements (project_id, title, department, category, priority,
                estimated_amount, business_justification, submitted_by, technical_specification,
                email, phone_number, stage, status, workflow_json, created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            rusqlite::params![
                requirement.project_id,
                requirement.title,
                requirement.department,
                requirement.category,
                requirement.priority.as_str(),
                requirement.estimated_amount,
                requirement.business_justification,
                requirement.submitted_by,
                requirement.technical_specification,
                requirement.email,
                requirement.phone_number,
                requirement.stage,
                requirement.status.as_str(),
                workflow_json,
                requirement.created_ts,
                requirement.modified_ts,
            ],
        )
        .with_context(|| format!("Failed to create requirement: {}", requirement.project_id))?;

        let id = conn.last_insert_rowid();
        log::info!("Registered requirement {} (row {})", requirement.project_id, id);
        Ok(Requirement {
            id: Some(id),
            ..requirement.clone()
        })
    }

    /// Get requirement by business project id
    pub fn get(conn: &Connection, project_id: &str) -> Result<Option<Requirement>> {
        let sql = format!("{} WHERE project_id = ?1", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let requirement = stmt.query_row([project_id], row_to_requirement).optional()?;
        Ok(requirement)
    }

    /// List all requirements, newest first
    pub fn list(conn: &Connection) -> Result<Vec<Requirement>> {
        let sql = format!("{} ORDER BY created_ts DESC, id DESC", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_requirement)?;

        let mut requirements = Vec::new();
        for row in rows {
            requirements.push(row?);
        }
        Ok(requirements)
    }

    /// List all project ids (used for "did you mean" suggestions)
    pub fn list_ids(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare("SELECT project_id FROM requirements ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    /// Mirror stage and workflow data onto the record, optionally changing status
    pub fn update_progress(
        conn: &Connection,
        project_id: &str,
        stage: u8,
        workflow_data: &WorkflowData,
        status: Option<RequirementStatus>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let workflow_json = workflow_data.to_json()?;

        let rows_affected = match status {
            Some(status) => conn.execute(
                "UPDATE requirements SET stage = ?1, workflow_json = ?2, status = ?3, modified_ts = ?4
                 WHERE project_id = ?5",
                rusqlite::params![stage, workflow_json, status.as_str(), now, project_id],
            ),
            None => conn.execute(
                "UPDATE requirements SET stage = ?1, workflow_json = ?2, modified_ts = ?3
                 WHERE project_id = ?4",
                rusqlite::params![stage, workflow_json, now, project_id],
            ),
        }
        .with_context(|| format!("Failed to update requirement {}", project_id))?;

        if rows_affected == 0 {
            anyhow::bail!("Requirement '{}' not found", project_id);
        }
        log::debug!("Requirement {} now at stage {}", project_id, stage);
        Ok(())
    }

    /// Set the record's status
    pub fn set_status(conn: &Connection, project_id: &str, status: RequirementStatus) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let rows_affected = conn.execute(
            "UPDATE requirements SET status = ?1, modified_ts = ?2 WHERE project_id = ?3",
            rusqlite::params![status.as_str(), now, project_id],
        )?;

        if rows_affected == 0 {
            anyhow::bail!("Requirement '{}' not found", project_id);
        }
        Ok(())
    }

    /// Update an existing record in place from backend detail, or create one.
    /// Never produces a duplicate record for the same project id.
    pub fn upsert_from_detail(
        conn: &Connection,
        detail: &ProjectDetail,
        stage: u8,
        status: RequirementStatus,
        workflow_data: &WorkflowData,
    ) -> Result<Requirement> {
        let priority = Priority::from_str(&detail.priority).unwrap_or_else(|| {
            log::warn!(
                "Unknown priority '{}' for {}; recording as medium",
                detail.priority, detail.project_id
            );
            Priority::Medium
        });
        let now = chrono::Utc::now().timestamp();
        let workflow_json = workflow_data.to_json()?;

        conn.execute(
            "INSERT INTO requirements (project_id, title, department, category, priority,
                estimated_amount, business_justification, submitted_by, technical_specification,
                email, phone_number, stage, status, workflow_json, created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
             ON CONFLICT(project_id) DO UPDATE SET
                title = excluded.title,
                department = excluded.department,
                category = excluded.category,
                priority = excluded.priority,
                estimated_amount = excluded.estimated_amount,
                business_justification = excluded.business_justification,
                submitted_by = excluded.submitted_by,
                technical_specification = excluded.technical_specification,
                email = excluded.email,
                phone_number = excluded.phone_number,
                stage = excluded.stage,
                status = excluded.status,
                workflow_json = excluded.workflow_json,
                modified_ts = excluded.modified_ts",
            rusqlite::params![
                detail.project_id,
                detail.title,
                detail.department,
                detail.category,
                priority.as_str(),
                detail.estimated_amount,
                detail.business_justification,
                detail.submitted_by,
                detail.technical_specification,
                detail.email,
                detail.phone_number,
                stage,
                status.as_str(),
                workflow_json,
                now,
            ],
        )
        .with_context(|| format!("Failed to sync requirement {}", detail.project_id))?;
        log::debug!("Synced requirement {} at stage {}", detail.project_id, stage);

        Self::get(conn, &detail.project_id)?
            .ok_or_else(|| anyhow::anyhow!("Requirement '{}' vanished after upsert", detail.project_id))
    }

    /// Count records created within `[start_ts, end_ts)`
    pub fn count_created_between(conn: &Connection, start_ts: i64, end_ts: i64) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM requirements WHERE created_ts >= ?1 AND created_ts < ?2",
            [start_ts, end_ts],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Generate the next business id for `date`: `PSB/PROC/{year}/{month}/{day}/{serial}`
    pub fn next_project_id(conn: &Connection, date: DateTime<Local>) -> Result<String> {
        let day_start = Local
            .with_ymd_and_hms(date.year(), date.month(), date.day(), 0, 0, 0)
            .earliest()
            .map(|dt| dt.timestamp())
            .ok_or_else(|| anyhow::anyhow!("Invalid local date {}", date))?;
        let day_end = day_start + 86_400;

        let mut serial = Self::count_created_between(conn, day_start, day_end)? + 1;
        loop {
            let candidate = format!(
                "PSB/PROC/{}/{}/{}/{}",
                date.year(), date.month(), date.day(), serial
            );
            if Self::get(conn, &candidate)?.is_none() {
                return Ok(candidate);
            }
            serial += 1;
        }
    }
}
