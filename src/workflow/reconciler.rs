use serde::Serialize;
use crate::backend::ProjectSource;
use crate::models::{
    NavigationSnapshot, ProgressSnapshot, ProgressStatus, ProjectDetail, RequirementStatus, WorkflowSession,
    FINAL_STAGE, GATE_STAGE, INITIAL_STAGE,
};
use crate::workflow::error::{WorkflowError, WorkflowResult};
use crate::workflow::screen::{resolve_screen_or_initial, ScreenId};
use crate::workflow::sequencer::{RequirementStore, Sequencer};

/// Pick the stage to resume at from the two server-side trackers.
///
/// The navigation pointer wins when present; otherwise the 1-indexed progress
/// page is converted to a stage. Anything past the final stage collapses to
/// it and anything below the intake screen clamps to it. `None` when neither
/// tracker has anything to say.
pub fn resume_stage(
    navigation: Option<&NavigationSnapshot>,
    progress: Option<&ProgressSnapshot>,
) -> Option<u8> {
    let raw = match (navigation, progress) {
        (Some(nav), _) => nav.current_stage,
        (None, Some(progress)) => progress.current_page - 1,
        (None, None) => return None,
    };
    // Note: overall_progress is not consulted, so 100% at page 9 still resumes at stage 8
    let clamped = raw.clamp(i64::from(INITIAL_STAGE), i64::from(FINAL_STAGE));
    Some(clamped as u8)
}

/// Where a project would resume, and why
#[derive(Debug, Clone, Serialize)]
pub struct ResumePoint {
    pub project_id: String,
    pub stage: u8,
    pub is_approved: Option<bool>,
    pub screen: ScreenId,
    /// Whether the navigation pointer decided the stage (vs the progress page)
    pub from_navigation: bool,
    pub progress: Option<ProgressSnapshot>,
    /// Rejected at the gate, per the local record or the progress tracker
    pub rejected: bool,
    #[serde(skip)]
    pub detail: ProjectDetail,
}

impl ResumePoint {
    /// Status mirrored onto the record when resuming here
    pub fn record_status(&self) -> RequirementStatus {
        if self.rejected {
            RequirementStatus::Rejected
        } else if self.stage >= FINAL_STAGE {
            RequirementStatus::Completed
        } else if self.stage >= GATE_STAGE {
            RequirementStatus::Approved
        } else {
            RequirementStatus::InProgress
        }
    }
}

/// Re-enters the workflow from the dashboard
pub struct Reconciler<'a, S: RequirementStore + ?Sized> {
    source: &'a dyn ProjectSource,
    store: &'a S,
}

impl<'a, S: RequirementStore + ?Sized> Reconciler<'a, S> {
    pub fn new(source: &'a dyn ProjectSource, store: &'a S) -> Self {
        Self { source, store }
    }

    /// Fetch both trackers and compute the resume point. Mutates nothing.
    pub fn reconcile(&self, project_id: &str) -> WorkflowResult<ResumePoint> {
        let load_error = |reason: String| WorkflowError::ProjectLoad {
            project_id: project_id.to_string(),
            reason,
        };

        let detail = self.source
            .project_detail(project_id)
            .map_err(|e| load_error(format!("{:#}", e)))?;

        let navigation = match self.source.navigation(project_id) {
            Ok(lookup) => lookup.into_snapshot(project_id),
            Err(e) => {
                log::warn!("Navigation lookup for {} failed, ignoring it: {:#}", project_id, e);
                None
            }
        };

        let progress = match self.source.progress(project_id) {
            Ok(progress) => progress,
            Err(e) if navigation.is_some() => {
                log::warn!("Progress lookup for {} failed: {:#}", project_id, e);
                None
            }
            Err(e) => return Err(load_error(format!("{:#}", e))),
        };

        let stage = resume_stage(navigation.as_ref(), progress.as_ref())
            .ok_or_else(|| load_error("no navigation or progress state is recorded".to_string()))?;

        // A rejection is terminal: it pins the workflow to the gate whatever the trackers say
        let recorded_rejected = self.store.existing_status(project_id)? == Some(RequirementStatus::Rejected);
        let tracker_rejected = progress
            .as_ref()
            .is_some_and(|p| p.status == ProgressStatus::Rejected);
        let rejected = recorded_rejected || tracker_rejected;
        let (stage, is_approved) = if rejected {
            (GATE_STAGE, Some(false))
        } else {
            (stage, (stage >= GATE_STAGE).then_some(true))
        };

        log::debug!(
            "Reconciled {}: navigation={:?} page={:?} rejected={} -> stage {}",
            project_id,
            navigation.as_ref().map(|n| n.current_stage),
            progress.as_ref().map(|p| p.current_page),
            rejected,
            stage
        );

        Ok(ResumePoint {
            project_id: project_id.to_string(),
            stage,
            is_approved,
            screen: resolve_screen_or_initial(i64::from(stage)),
            from_navigation: navigation.is_some(),
            progress,
            rejected,
            detail,
        })
    }

    /// Reconcile, sync the local record in place, and jump the session there
    pub fn resume(&self, session: &mut WorkflowSession, project_id: &str) -> WorkflowResult<ResumePoint> {
        let point = self.reconcile(project_id)?;

        let mut seed = self.store.existing_data(project_id)?.unwrap_or_default();
        seed.merge(point.detail.to_workflow_data());

        self.store.sync_from_detail(&point.detail, point.stage, point.record_status(), &seed)?;
        Sequencer::new(self.store).jump_to(
            session,
            i64::from(point.stage),
            point.is_approved,
            project_id.to_string(),
            seed,
        )?;

        log::info!("Resumed {} at stage {} ({})", project_id, point.stage, point.screen.as_str());
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AuthorityDecision;
    use crate::db::DbConnection;
    use crate::models::{NavigationLookup, ProgressStatus, WorkflowData};
    use crate::repo::RequirementRepo;
    use crate::workflow::sequencer::SqliteStore;
    use anyhow::Result;

    #[derive(Default)]
    struct FakeSource {
        detail_fails: bool,
        nav_stage: Option<i64>,
        nav_fails: bool,
        page: Option<i64>,
        progress_fails: bool,
        tracker_rejected: bool,
    }

    impl ProjectSource for FakeSource {
        fn project_detail(&self, project_id: &str) -> Result<ProjectDetail> {
            if self.detail_fails {
                anyhow::bail!("connection refused");
            }
            Ok(ProjectDetail {
                project_id: project_id.to_string(),
                title: "Data centre UPS".to_string(),
                department: "IT".to_string(),
                category: "Infrastructure".to_string(),
                priority: "High".to_string(),
                estimated_amount: 1_200_000.0,
                business_justification: "Battery end of life".to_string(),
                submitted_by: "A. Nair".to_string(),
                technical_specification: None,
                email: None,
                phone_number: None,
            })
        }

        fn navigation(&self, _: &str) -> Result<NavigationLookup> {
            if self.nav_fails {
                anyhow::bail!("timed out");
            }
            Ok(NavigationLookup {
                found: self.nav_stage.is_some(),
                current_stage: self.nav_stage,
                current_page_component: None,
            })
        }

        fn progress(&self, project_id: &str) -> Result<Option<ProgressSnapshot>> {
            if self.progress_fails {
                anyhow::bail!("502 Bad Gateway");
            }
            Ok(self.page.map(|page| ProgressSnapshot {
                project_id: project_id.to_string(),
                current_page: page,
                overall_progress: 0.0,
                status: if self.tracker_rejected { ProgressStatus::Rejected } else { ProgressStatus::InProgress },
            }))
        }

        fn progress_list(&self) -> Result<Vec<ProgressSnapshot>> {
            Ok(Vec::new())
        }

        fn submit_decision(&self, _: &AuthorityDecision) -> Result<()> {
            Ok(())
        }
    }

    fn nav(stage: i64) -> NavigationSnapshot {
        NavigationSnapshot {
            project_id: "P".to_string(),
            current_stage: stage,
            current_page_component: None,
        }
    }

    fn page(page: i64) -> ProgressSnapshot {
        ProgressSnapshot {
            project_id: "P".to_string(),
            current_page: page,
            overall_progress: 50.0,
            status: ProgressStatus::InProgress,
        }
    }

    #[test]
    fn test_navigation_wins_over_progress() {
        assert_eq!(resume_stage(Some(&nav(7)), Some(&page(3))), Some(7));
    }

    #[test]
    fn test_progress_page_converts_to_stage() {
        assert_eq!(resume_stage(None, Some(&page(4))), Some(3));
        assert_eq!(resume_stage(None, Some(&page(1))), Some(0));
    }

    #[test]
    fn test_collapse_past_final_stage() {
        assert_eq!(resume_stage(None, Some(&page(12))), Some(10));
        assert_eq!(resume_stage(None, Some(&page(11))), Some(10));
        assert_eq!(resume_stage(Some(&nav(14)), None), Some(10));
    }

    #[test]
    fn test_negative_clamps_to_intake() {
        assert_eq!(resume_stage(None, Some(&page(0))), Some(0));
        assert_eq!(resume_stage(Some(&nav(-3)), None), Some(0));
    }

    #[test]
    fn test_nothing_to_resume_from() {
        assert_eq!(resume_stage(None, None), None);
    }

    #[test]
    fn test_idempotent() {
        let n = nav(6);
        let p = page(2);
        assert_eq!(resume_stage(Some(&n), Some(&p)), resume_stage(Some(&n), Some(&p)));
        assert_eq!(resume_stage(None, Some(&p)), resume_stage(None, Some(&p)));
    }

    #[test]
    fn test_reconcile_prefers_navigation() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let store = SqliteStore::new(&conn);
        let source = FakeSource { nav_stage: Some(7), page: Some(3), ..Default::default() };

        let reconciler = Reconciler::new(&source, &store);
        let first = reconciler.reconcile("P-7").unwrap();
        let second = reconciler.reconcile("P-7").unwrap();
        assert_eq!(first.stage, 7);
        assert_eq!(second.stage, 7);
        assert!(first.from_navigation);
        assert_eq!(first.is_approved, Some(true));
        assert_eq!(first.screen, ScreenId::VendorEvaluation);
    }

    #[test]
    fn test_resume_creates_then_updates_in_place() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let store = SqliteStore::new(&conn);
        let mut session = WorkflowSession::fresh();

        let source = FakeSource { page: Some(4), ..Default::default() };
        let point = Reconciler::new(&source, &store).resume(&mut session, "P-3").unwrap();
        assert_eq!(point.stage, 3);
        assert_eq!(session.state.current_stage, 3);
        assert_eq!(session.state.is_approved, None);
        assert_eq!(session.active_project_id.as_deref(), Some("P-3"));
        assert_eq!(session.state.workflow_data.project_id(), Some("P-3"));

        let mut data = WorkflowData::new();
        data.insert("rfpId", "RFP-9");
        RequirementRepo::update_progress(&conn, "P-3", 3, &data, None).unwrap();

        let source = FakeSource { nav_stage: Some(12), ..Default::default() };
        Reconciler::new(&source, &store).resume(&mut session, "P-3").unwrap();
        assert_eq!(session.state.current_stage, 10);
        assert_eq!(session.state.is_approved, Some(true));
        assert_eq!(session.state.workflow_data.get("rfpId"), Some(&serde_json::json!("RFP-9")));

        let all = RequirementRepo::list(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].stage, 10);
        assert_eq!(all[0].status, RequirementStatus::Completed);
    }

    #[test]
    fn test_resumed_at_gate_can_advance() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let store = SqliteStore::new(&conn);
        let mut session = WorkflowSession::fresh();

        let source = FakeSource { nav_stage: Some(5), ..Default::default() };
        Reconciler::new(&source, &store).resume(&mut session, "P-5").unwrap();
        assert_eq!(session.state.is_approved, Some(true));

        Sequencer::new(&store).advance(&mut session, WorkflowData::new()).unwrap();
        assert_eq!(session.state.current_stage, 6);
    }

    #[test]
    fn test_detail_failure_is_project_load_and_mutates_nothing() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let store = SqliteStore::new(&conn);
        let mut session = WorkflowSession::fresh();
        session.state.current_stage = 2;
        let before = session.clone();

        let source = FakeSource { detail_fails: true, nav_stage: Some(4), ..Default::default() };
        let err = Reconciler::new(&source, &store).resume(&mut session, "P-1").unwrap_err();
        assert!(matches!(err, WorkflowError::ProjectLoad { .. }));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(session, before);
        assert!(RequirementRepo::list(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_navigation_failure_falls_back_to_progress() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let store = SqliteStore::new(&conn);
        let source = FakeSource { nav_fails: true, nav_stage: Some(9), page: Some(3), ..Default::default() };
        let point = Reconciler::new(&source, &store).reconcile("P-1").unwrap();
        assert_eq!(point.stage, 2);
        assert!(!point.from_navigation);
    }

    #[test]
    fn test_progress_failure_policy() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let store = SqliteStore::new(&conn);

        let source = FakeSource { nav_stage: Some(6), progress_fails: true, ..Default::default() };
        assert_eq!(Reconciler::new(&source, &store).reconcile("P-1").unwrap().stage, 6);

        let source = FakeSource { progress_fails: true, ..Default::default() };
        assert!(matches!(
            Reconciler::new(&source, &store).reconcile("P-1"),
            Err(WorkflowError::ProjectLoad { .. })
        ));

        let source = FakeSource::default();
        assert!(matches!(
            Reconciler::new(&source, &store).reconcile("P-1"),
            Err(WorkflowError::ProjectLoad { .. })
        ));
    }

    #[test]
    fn test_recorded_rejection_survives_resume() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let store = SqliteStore::new(&conn);
        let mut session = WorkflowSession::fresh();

        let source = FakeSource { page: Some(6), ..Default::default() };
        Reconciler::new(&source, &store).resume(&mut session, "P-5").unwrap();
        RequirementRepo::set_status(&conn, "P-5", RequirementStatus::Rejected).unwrap();

        let source = FakeSource { nav_stage: Some(7), ..Default::default() };
        let point = Reconciler::new(&source, &store).resume(&mut session, "P-5").unwrap();
        assert!(point.rejected);
        assert_eq!(point.stage, 5);
        assert_eq!(session.state.current_stage, 5);
        assert_eq!(session.state.is_approved, Some(false));
        assert!(session.state.is_rejected());

        let record = RequirementRepo::get(&conn, "P-5").unwrap().unwrap();
        assert_eq!(record.status, RequirementStatus::Rejected);

        let err = Sequencer::new(&store).advance(&mut session, WorkflowData::new()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        assert_eq!(session.state.current_stage, 5);
    }

    #[test]
    fn test_tracker_rejection_pins_to_gate() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let store = SqliteStore::new(&conn);
        let mut session = WorkflowSession::fresh();

        let source = FakeSource { page: Some(9), tracker_rejected: true, ..Default::default() };
        let point = Reconciler::new(&source, &store).resume(&mut session, "P-8").unwrap();
        assert_eq!(point.stage, 5);
        assert_eq!(point.is_approved, Some(false));
        assert_eq!(point.record_status(), RequirementStatus::Rejected);
        assert_eq!(
            RequirementRepo::get(&conn, "P-8").unwrap().unwrap().status,
            RequirementStatus::Rejected
        );
    }
}
