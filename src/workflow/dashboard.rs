use serde::Serialize;
use std::collections::HashSet;
use crate::backend::ProjectSource;
use crate::models::{ProgressSnapshot, ProgressStatus};

/// Counts shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub rejected: usize,
    /// Subset of `in_progress` that has not moved off 0%
    pub not_started: usize,
}

/// Bucket each snapshot: rejected first, then completed, else in progress
pub fn summarize(snapshots: &[ProgressSnapshot], rejected: &HashSet<String>) -> DashboardSummary {
    let mut summary = DashboardSummary {
        total: snapshots.len(),
        ..Default::default()
    };
    for snapshot in snapshots {
        if rejected.contains(&snapshot.project_id) {
            summary.rejected += 1;
        } else if snapshot.is_complete() {
            summary.completed += 1;
        } else {
            summary.in_progress += 1;
            if snapshot.overall_progress <= 0.0 {
                summary.not_started += 1;
            }
        }
    }
    summary
}

/// Project ids a source reports as rejected, added to `rejected`
pub fn rejected_ids<'a>(
    snapshots: impl IntoIterator<Item = &'a ProgressSnapshot>,
    mut rejected: HashSet<String>,
) -> HashSet<String> {
    rejected.extend(
        snapshots
            .into_iter()
            .filter(|s| s.status == ProgressStatus::Rejected)
            .map(|s| s.project_id.clone()),
    );
    rejected
}

/// Summarize everything a source knows about. A failing source counts as empty.
pub fn summarize_from(source: &dyn ProjectSource, rejected: HashSet<String>) -> DashboardSummary {
    match source.progress_list() {
        Ok(snapshots) => {
            let rejected = rejected_ids(&snapshots, rejected);
            summarize(&snapshots, &rejected)
        }
        Err(e) => {
            log::warn!("Could not load progress list, showing an empty dashboard: {:#}", e);
            DashboardSummary::default()
        }
    }
}
