use anyhow::Result;
use rusqlite::Connection;
use std::collections::BTreeMap;
use crate::backend::{AuthorityDecision, ProjectSource};
use crate::models::{
    NavigationLookup, ProgressSnapshot, ProgressStatus, ProjectDetail, Requirement,
    RequirementStatus, FINAL_STAGE,
};
use crate::repo::{RequirementRepo, SnapshotRepo};

/// Offline source: requirement records plus the local snapshot mirror
pub struct LocalSource<'c> {
    conn: &'c Connection,
}

impl<'c> LocalSource<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

/// Progress implied by a record when no snapshot has been mirrored for it.
/// Page numbering is 1-indexed, so stage `s` sits on page `s + 1`.
pub fn derived_progress(requirement: &Requirement) -> ProgressSnapshot {
    let status = match requirement.status {
        RequirementStatus::Rejected => ProgressStatus::Rejected,
        RequirementStatus::Completed => ProgressStatus::Completed,
        RequirementStatus::InProgress | RequirementStatus::Approved => ProgressStatus::InProgress,
    };
    ProgressSnapshot {
        project_id: requirement.project_id.clone(),
        current_page: i64::from(requirement.stage) + 1,
        overall_progress: f64::from(requirement.stage) * 100.0 / f64::from(FINAL_STAGE),
        status,
    }
}

impl ProjectSource for LocalSource<'_> {
    fn project_detail(&self, project_id: &str) -> Result<ProjectDetail> {
        match RequirementRepo::get(self.conn, project_id)? {
            Some(requirement) => Ok(ProjectDetail::from(&requirement)),
            None => anyhow::bail!("Project '{}' not found", project_id),
        }
    }

    fn navigation(&self, project_id: &str) -> Result<NavigationLookup> {
        let lookup = match SnapshotRepo::get_navigation(self.conn, project_id)? {
            Some(snapshot) => NavigationLookup {
                found: true,
                current_stage: Some(snapshot.current_stage),
                current_page_component: snapshot.current_page_component,
            },
            None => NavigationLookup::not_found(),
        };
        Ok(lookup)
    }

    fn progress(&self, project_id: &str) -> Result<Option<ProgressSnapshot>> {
        if let Some(snapshot) = SnapshotRepo::get_progress(self.conn, project_id)? {
            return Ok(Some(snapshot));
        }
        Ok(RequirementRepo::get(self.conn, project_id)?.map(|r| derived_progress(&r)))
    }

    /// Mirrored snapshots win over progress derived from the record
    fn progress_list(&self) -> Result<Vec<ProgressSnapshot>> {
        let mut by_project: BTreeMap<String, ProgressSnapshot> = BTreeMap::new();
        for requirement in RequirementRepo::list(self.conn)? {
            by_project.insert(requirement.project_id.clone(), derived_progress(&requirement));
        }
        for snapshot in SnapshotRepo::list_progress(self.conn)? {
            by_project.insert(snapshot.project_id.clone(), snapshot);
        }
        Ok(by_project.into_values().collect())
    }

    fn submit_decision(&self, decision: &AuthorityDecision) -> Result<()> {
        log::debug!(
            "Offline mode: decision for {} recorded locally only",
            decision.project_id
        );
        Ok(())
    }
}
