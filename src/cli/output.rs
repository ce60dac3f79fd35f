// Output formatting utilities

use crate::models::{
    stage, stage_label, NavigationSnapshot, ProgressSnapshot, Requirement, StageDefinition,
    WorkflowSession, FINAL_STAGE,
};
use crate::utils::{format_date, format_timestamp};
use crate::workflow::{DashboardSummary, ResumePoint, ScreenId};
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";
const ANSI_FG_GREEN: &str = "\x1b[32m";
const ANSI_FG_RED: &str = "\x1b[31m";
const ANSI_FG_YELLOW: &str = "\x1b[33m";

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

/// Apply bold formatting if in TTY mode
fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

fn color_if_tty(text: &str, color: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", color, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Truncate to `width` characters, marking the cut with "..."
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width <= 3 {
        return text.chars().take(width).collect();
    }
    let kept: String = text.chars().take(width - 3).collect();
    format!("{}...", kept)
}

/// Stage registry table
pub fn format_stages_table(stages: &[StageDefinition]) -> String {
    let tty = is_tty();
    let name_width = stages.iter().map(|s| s.name.len()).max().unwrap_or(4).max(4);
    let dept_width = stages.iter().map(|s| s.department.len()).max().unwrap_or(10).max(10);

    let mut output = String::new();
    let header = format!("{:<3} {:<name_width$} {:<dept_width$} Gate", "ID", "Name", "Department");
    output.push_str(&bold_if_tty(&header, tty));
    output.push('\n');
    output.push_str(&"-".repeat(header.len()));
    output.push('\n');
    for s in stages {
        output.push_str(&format!(
            "{:<3} {:<name_width$} {:<dept_width$} {}\n",
            s.id,
            s.name,
            s.department,
            if s.is_gate { "yes" } else { "" }
        ));
    }
    output
}

/// `show` output for the active workflow
pub fn format_session(session: &WorkflowSession, screen: ScreenId) -> String {
    let tty = is_tty();
    let state = &session.state;
    let mut output = String::new();

    let header = format!("Stage {}/{}: {}", state.current_stage, FINAL_STAGE, stage_label(state.current_stage));
    output.push_str(&bold_if_tty(&header, tty));
    output.push('\n');
    output.push_str(&"=".repeat(header.len().max(40)));
    output.push_str("\n\n");

    if let Some(def) = stage(state.current_stage) {
        output.push_str(&format!("Department:  {}\n", def.department));
    }
    output.push_str(&format!("Screen:      {}\n", screen.as_str()));
    output.push_str(&format!(
        "Project:     {}\n",
        session.active_project_id.as_deref().unwrap_or("(none)")
    ));

    let approval = match state.is_approved {
        Some(true) => color_if_tty("approved", ANSI_FG_GREEN, tty),
        Some(false) => color_if_tty("rejected", ANSI_FG_RED, tty),
        None => state.approval_label().to_string(),
    };
    output.push_str(&format!("Approval:    {}\n", approval));

    if state.is_rejected() {
        output.push_str("\nThe requirement was rejected at the approval gate. Run `procflow reset` to start over.\n");
    } else if state.is_complete() {
        output.push_str("\nProcurement complete.\n");
    }

    output.push_str("\nWorkflow data:\n");
    if state.workflow_data.is_empty() {
        output.push_str("  (none)\n");
    } else {
        let key_width = state.workflow_data.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in state.workflow_data.iter() {
            let rendered = match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
            output.push_str(&format!("  {:<key_width$}  {}\n", key, rendered));
        }
    }
    output
}

/// Requirements table, newest first
pub fn format_requirement_list_table(requirements: &[Requirement]) -> String {
    if requirements.is_empty() {
        return "No requirements found.\n".to_string();
    }

    let tty = is_tty();
    let id_width = requirements.iter().map(|r| r.project_id.len()).max().unwrap_or(2).max(10);
    let dept_width = requirements.iter().map(|r| r.department.len()).max().unwrap_or(4).clamp(10, 24);
    // ID, Dept, Priority(8), Amount(14), Stage(5), Status(11), Created(10), separators(7)
    let fixed = id_width + dept_width + 8 + 14 + 5 + 11 + 10 + 7;
    let title_width = get_terminal_width().saturating_sub(fixed).clamp(12, 60);

    let mut output = String::new();
    let header = format!(
        "{:<id_width$} {:<title_width$} {:<dept_width$} {:<8} {:>14} {:>5} {:<11} {:<10}",
        "Project ID", "Title", "Department", "Priority", "Amount", "Stage", "Status", "Created"
    );
    output.push_str(&bold_if_tty(&header, tty));
    output.push('\n');
    output.push_str(&"-".repeat(header.len()));
    output.push('\n');

    for r in requirements {
        let status = format!("{:<11}", r.status.label());
        let status = match r.status {
            crate::models::RequirementStatus::Rejected => color_if_tty(&status, ANSI_FG_RED, tty),
            crate::models::RequirementStatus::Completed => color_if_tty(&status, ANSI_FG_GREEN, tty),
            crate::models::RequirementStatus::Approved => color_if_tty(&status, ANSI_FG_YELLOW, tty),
            crate::models::RequirementStatus::InProgress => status,
        };
        output.push_str(&format!(
            "{:<id_width$} {:<title_width$} {:<dept_width$} {:<8} {:>14.2} {:>5} {} {:<10}\n",
            r.project_id,
            truncate(&r.title, title_width),
            truncate(&r.department, dept_width),
            r.priority.as_str(),
            r.estimated_amount,
            r.stage,
            status,
            format_date(r.created_ts),
        ));
    }
    output
}

/// `requirements show` output
pub fn format_requirement_detail(
    requirement: &Requirement,
    progress: Option<&ProgressSnapshot>,
    navigation: Option<&NavigationSnapshot>,
) -> String {
    let tty = is_tty();
    let mut output = String::new();

    let header = format!("Requirement {}: {}", requirement.project_id, requirement.title);
    output.push_str(&bold_if_tty(&header, tty));
    output.push('\n');
    output.push_str(&"=".repeat(header.len().max(60)));
    output.push_str("\n\n");

    output.push_str(&format!("Status:      {}\n", requirement.status.label()));
    output.push_str(&format!(
        "Stage:       {} ({})\n",
        requirement.stage,
        stage_label(requirement.stage)
    ));
    output.push_str(&format!("Created:     {}\n", format_timestamp(requirement.created_ts)));
    output.push_str(&format!("Modified:    {}\n\n", format_timestamp(requirement.modified_ts)));

    output.push_str("Details:\n");
    output.push_str(&format!("  Department:     {}\n", requirement.department));
    output.push_str(&format!("  Category:       {}\n", requirement.category));
    output.push_str(&format!("  Priority:       {}\n", requirement.priority.as_str()));
    output.push_str(&format!("  Amount:         {:.2}\n", requirement.estimated_amount));
    output.push_str(&format!("  Submitted by:   {}\n", requirement.submitted_by));
    output.push_str(&format!("  Justification:  {}\n", requirement.business_justification));
    let optional = [
        ("Specification", &requirement.technical_specification),
        ("Email", &requirement.email),
        ("Phone", &requirement.phone_number),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            output.push_str(&format!("  {:<15} {}\n", format!("{}:", label), value));
        }
    }

    output.push_str("\nTrackers:\n");
    match progress {
        Some(p) => output.push_str(&format!(
            "  Progress:       page {} ({:.0}%, {})\n",
            p.current_page, p.overall_progress, p.status.as_str()
        )),
        None => output.push_str("  Progress:       (none)\n"),
    }
    match navigation {
        Some(n) => output.push_str(&format!(
            "  Navigation:     stage {}{}\n",
            n.current_stage,
            n.current_page_component.as_deref().map(|c| format!(" ({})", c)).unwrap_or_default()
        )),
        None => output.push_str("  Navigation:     (none)\n"),
    }
    output
}

/// `resume` output
pub fn format_resume(point: &ResumePoint) -> String {
    let source = if point.from_navigation {
        "navigation pointer".to_string()
    } else {
        match &point.progress {
            Some(p) => format!("progress page {}", p.current_page),
            None => "progress page".to_string(),
        }
    };
    let mut output = format!(
        "Resumed {} at stage {} ({}) from {}.\nScreen: {}\n",
        point.project_id,
        point.stage,
        stage_label(point.stage),
        source,
        point.screen.as_str(),
    );
    if point.rejected {
        output.push_str("The requirement was rejected at the approval gate. Run `procflow reset` to return to the dashboard.\n");
    }
    output
}

/// `dashboard` output
pub fn format_dashboard(summary: &DashboardSummary) -> String {
    let tty = is_tty();
    let mut output = String::new();
    output.push_str(&bold_if_tty("=== Procurement Dashboard ===", tty));
    output.push('\n');
    output.push_str(&format!("Total:        {}\n", summary.total));
    output.push_str(&format!(
        "In progress:  {} ({} not started)\n",
        summary.in_progress, summary.not_started
    ));
    output.push_str(&format!("Completed:    {}\n", summary.completed));
    output.push_str(&format!("Rejected:     {}\n", summary.rejected));
    output
}
