use rusqlite::Connection;
use crate::models::{
    gate, NewRequirement, ProjectDetail, Requirement, RequirementStatus, WorkflowData, WorkflowSession,
    FINAL_STAGE, GATE_STAGE, INITIAL_STAGE,
};
use crate::repo::RequirementRepo;
use crate::workflow::error::{WorkflowError, WorkflowResult};

/// Side effects the sequencer and reconciler perform on requirement records
pub trait RequirementStore {
    /// Register a just-submitted requirement
    fn register(&self, requirement: &Requirement) -> anyhow::Result<()>;

    /// Workflow data already accumulated on a record, if the record exists
    fn existing_data(&self, project_id: &str) -> anyhow::Result<Option<WorkflowData>>;

    /// Status currently on the record, if the record exists
    fn existing_status(&self, project_id: &str) -> anyhow::Result<Option<RequirementStatus>>;

    /// Mirror stage and workflow data onto a record, optionally changing status
    fn mirror_progress(
        &self,
        project_id: &str,
        stage: u8,
        workflow_data: &WorkflowData,
        status: Option<RequirementStatus>,
    ) -> anyhow::Result<()>;

    fn set_status(&self, project_id: &str, status: RequirementStatus) -> anyhow::Result<()>;

    /// Update the record for `detail.project_id` in place, creating it if missing
    fn sync_from_detail(
        &self,
        detail: &ProjectDetail,
        stage: u8,
        status: RequirementStatus,
        workflow_data: &WorkflowData,
    ) -> anyhow::Result<()>;
}

/// `RequirementStore` backed by the SQLite ledger
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl RequirementStore for SqliteStore<'_> {
    fn register(&self, requirement: &Requirement) -> anyhow::Result<()> {
        RequirementRepo::create(self.conn, requirement).map(|_| ())
    }

    fn existing_data(&self, project_id: &str) -> anyhow::Result<Option<WorkflowData>> {
        Ok(RequirementRepo::get(self.conn, project_id)?.map(|r| r.workflow_data))
    }

    fn existing_status(&self, project_id: &str) -> anyhow::Result<Option<RequirementStatus>> {
        Ok(RequirementRepo::get(self.conn, project_id)?.map(|r| r.status))
    }

    fn mirror_progress(
        &self,
        project_id: &str,
        stage: u8,
        workflow_data: &WorkflowData,
        status: Option<RequirementStatus>,
    ) -> anyhow::Result<()> {
        RequirementRepo::update_progress(self.conn, project_id, stage, workflow_data, status)
    }

    fn set_status(&self, project_id: &str, status: RequirementStatus) -> anyhow::Result<()> {
        RequirementRepo::set_status(self.conn, project_id, status)
    }

    fn sync_from_detail(
        &self,
        detail: &ProjectDetail,
        stage: u8,
        status: RequirementStatus,
        workflow_data: &WorkflowData,
    ) -> anyhow::Result<()> {
        RequirementRepo::upsert_from_detail(self.conn, detail, stage, status, workflow_data).map(|_| ())
    }
}

/// Stage sequencer: the transition operations of the workflow.
///
/// The sequencer owns no state of its own. Each operation checks its
/// precondition against the session passed in, performs the record side
/// effect, and only then writes the new state back. A failed precondition or
/// a failed side effect leaves the session exactly as it was.
pub struct Sequencer<'s, S: RequirementStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: RequirementStore + ?Sized> Sequencer<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Stage 0 -> 1: register the requirement and seed workflow data
    pub fn submit_initial_requirement(
        &self,
        session: &mut WorkflowSession,
        project_id: String,
        form: NewRequirement,
    ) -> WorkflowResult<()> {
        let stage = session.state.current_stage;
        if stage != INITIAL_STAGE {
            return Err(WorkflowError::transition(
                "submit a requirement",
                stage,
                "a workflow is already in progress; reset it first",
            ));
        }

        let requirement = Requirement::new(project_id, form);
        self.store.register(&requirement)?;

        log::info!("Requirement {} submitted; entering stage 1", requirement.project_id);
        session.state.current_stage = 1;
        session.state.is_approved = None;
        session.state.workflow_data = requirement.workflow_data;
        session.active_project_id = Some(requirement.project_id);
        Ok(())
    }

    /// Stage s -> s+1 for s in 1..=9, merging `data` (last write wins)
    pub fn advance(&self, session: &mut WorkflowSession, data: WorkflowData) -> WorkflowResult<()> {
        let state = &session.state;
        let stage = state.current_stage;

        if state.is_rejected() {
            return Err(WorkflowError::transition(
                "advance",
                stage,
                "the requirement was rejected at the approval gate; reset to start over",
            ));
        }
        if stage == INITIAL_STAGE {
            return Err(WorkflowError::transition("advance", stage, "submit the requirement first"));
        }
        if stage >= FINAL_STAGE {
            return Err(WorkflowError::transition("advance", stage, "the workflow is already complete"));
        }
        if stage == GATE_STAGE && state.is_approved != Some(true) {
            return Err(WorkflowError::transition(
                "advance",
                stage,
                "approval decision pending; use decide",
            ));
        }

        let mut merged = state.workflow_data.clone();
        merged.merge(data);
        let next = stage + 1;

        if let Some(project_id) = session.active_project_id.as_deref() {
            let status = (next == FINAL_STAGE).then_some(RequirementStatus::Completed);
            self.store.mirror_progress(project_id, next, &merged, status)?;
        }

        log::info!("Advanced from stage {} to {}", stage, next);
        session.state.current_stage = next;
        session.state.workflow_data = merged;
        Ok(())
    }

    /// Check that a gate decision may be taken now, without taking it
    pub fn ensure_decidable(&self, session: &WorkflowSession) -> WorkflowResult<()> {
        let stage = session.state.current_stage;
        if stage != GATE_STAGE {
            return Err(WorkflowError::transition(
                "decide",
                stage,
                format!("decisions are only taken at {} (stage {})", gate().name, GATE_STAGE),
            ));
        }
        if session.state.is_approved.is_some() {
            return Err(WorkflowError::transition(
                "decide",
                stage,
                format!("a decision was already recorded ({})", session.state.approval_label()),
            ));
        }
        Ok(())
    }

    /// Gate decision: approve moves to stage 6, reject is terminal at stage 5
    pub fn decide(&self, session: &mut WorkflowSession, approved: bool) -> WorkflowResult<()> {
        self.ensure_decidable(session)?;

        let next = if approved { GATE_STAGE + 1 } else { GATE_STAGE };
        if let Some(project_id) = session.active_project_id.as_deref() {
            if approved {
                self.store.mirror_progress(
                    project_id,
                    next,
                    &session.state.workflow_data,
                    Some(RequirementStatus::Approved),
                )?;
            } else {
                self.store.set_status(project_id, RequirementStatus::Rejected)?;
            }
        }

        log::info!("Gate decision: {}", if approved { "approved" } else { "rejected" });
        session.state.is_approved = Some(approved);
        session.state.current_stage = next;
        Ok(())
    }

    /// Back to the dashboard: clear state and detach from the record
    pub fn reset(&self, session: &mut WorkflowSession) {
        log::debug!("Resetting workflow (was at stage {})", session.state.current_stage);
        *session = WorkflowSession::fresh();
    }

    /// Overwrite the session to resume `project_id` at `stage`
    pub fn jump_to(
        &self,
        session: &mut WorkflowSession,
        stage: i64,
        is_approved: Option<bool>,
        project_id: String,
        seed: WorkflowData,
    ) -> WorkflowResult<()> {
        let stage = u8::try_from(stage)
            .ok()
            .filter(|s| *s <= FINAL_STAGE)
            .ok_or(WorkflowError::InvalidStage(stage))?;

        log::info!("Jumping to stage {} for {}", stage, project_id);
        session.state.current_stage = stage;
        session.state.is_approved = is_approved;
        session.state.workflow_data = seed;
        session.active_project_id = Some(project_id);
        Ok(())
    }
}
