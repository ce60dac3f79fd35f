use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::collections::HashSet;
use crate::backend::{open_source, AuthorityDecision, LocalSource, ProjectSource};
use crate::cli::abbrev;
use crate::cli::error::{user_error, validate_non_empty, validate_page, validate_percent, validate_project_id};
use crate::cli::output::{
    format_dashboard, format_requirement_detail, format_requirement_list_table, format_resume,
    format_session, format_stages_table,
};
use crate::cli::parser::{parse_decision, parse_workflow_fields};
use crate::config::Config;
use crate::db::DbConnection;
use crate::models::{
    stage_label, stages, NavigationSnapshot, NewRequirement, Priority, ProgressSnapshot,
    ProgressStatus, RequirementStatus,
};
use crate::repo::{RequirementRepo, SessionRepo, SnapshotRepo};
use crate::utils::fuzzy;
use crate::workflow::{
    resolve_screen, resolve_screen_or_initial, summarize_from, Reconciler, Sequencer, SqliteStore,
    WorkflowError,
};
use anyhow::{Context, Result};

#[derive(Parser)]
#[command(name = "procflow")]
#[command(about = "Procurement workflow ledger - walks requirements through the 10-stage approval pipeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the workflow stages
    Stages {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Submit a new requirement and start its workflow (stage 0 -> 1)
    Submit {
        /// Requirement title
        #[arg(long)]
        title: String,
        /// Requesting department
        #[arg(long)]
        department: String,
        /// Procurement category (e.g., Hardware, Services)
        #[arg(long)]
        category: String,
        /// Priority: low, medium, high or critical
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Estimated amount
        #[arg(long)]
        amount: f64,
        /// Business justification
        #[arg(long)]
        justification: String,
        /// Name of the submitter
        #[arg(long = "submitted-by")]
        submitted_by: String,
        /// Technical specification
        #[arg(long = "tech-spec")]
        technical_specification: Option<String>,
        /// Contact email
        #[arg(long)]
        email: Option<String>,
        /// Contact phone number
        #[arg(long)]
        phone: Option<String>,
        /// Use this project id instead of generating one
        #[arg(long = "project-id")]
        project_id: Option<String>,
    },
    /// Complete the current stage and move to the next one
    Advance {
        /// Stage completion data as key=value pairs (values may be JSON)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        fields: Vec<String>,
    },
    /// Record the approval-gate decision (approve or reject)
    Decide {
        /// approve | reject
        decision: String,
    },
    /// Leave the active workflow and return to the dashboard
    Reset,
    /// Show the active workflow
    Show {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show which screen a stage renders
    Screen {
        /// Stage number
        #[arg(allow_negative_numbers = true)]
        stage: i64,
    },
    /// Re-enter the workflow for an existing project
    Resume {
        /// Project id
        project_id: String,
        /// Report where the project would resume without changing anything
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Requirement record commands
    Requirements {
        #[command(subcommand)]
        subcommand: RequirementCommands,
    },
    /// Record or clear local tracker snapshots
    Snapshot {
        #[command(subcommand)]
        subcommand: SnapshotCommands,
    },
    /// Summarize all projects by status
    Dashboard {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum RequirementCommands {
    /// List requirements, newest first
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show one requirement with its tracker state
    Show {
        /// Project id
        project_id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum SnapshotCommands {
    /// Record the page-based progress tracker for a project
    Progress {
        /// Project id
        project_id: String,
        /// Current page (1-indexed; page 1 is the intake screen)
        page: i64,
        /// Overall progress percentage (0-100)
        percent: f64,
        /// Tracker status (e.g., in_progress, completed, rejected)
        #[arg(long, default_value = "in_progress")]
        status: String,
    },
    /// Record the navigation pointer for a project
    Nav {
        /// Project id
        project_id: String,
        /// Stage the server believes is next
        #[arg(allow_negative_numbers = true)]
        stage: i64,
        /// Screen component name
        #[arg(long)]
        component: Option<String>,
    },
    /// Remove the navigation pointer for a project
    ClearNav {
        /// Project id
        project_id: String,
    },
}

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let args = match abbrev::expand_command_abbreviations(args) {
        Ok(expanded) => expanded,
        Err(e) => user_error(&e),
    };

    let clap_args = std::iter::once("procflow".to_string())
        .chain(args)
        .collect::<Vec<_>>();
    let cli = match Cli::try_parse_from(clap_args) {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            if e.use_stderr() {
                std::process::exit(1);
            }
            return Ok(());
        }
    };

    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Stages { json } => handle_stages(json),
        Commands::Submit {
            title, department, category, priority, amount, justification, submitted_by,
            technical_specification, email, phone, project_id,
        } => {
            let priority = Priority::from_str(&priority).unwrap_or_else(|| {
                user_error(&format!(
                    "Invalid priority: '{}'. Use low, medium, high or critical.",
                    priority
                ))
            });
            let form = NewRequirement {
                title,
                department,
                category,
                priority,
                estimated_amount: amount,
                business_justification: justification,
                submitted_by,
                technical_specification,
                email,
                phone_number: phone,
            };
            handle_submit(form, project_id)
        }
        Commands::Advance { fields } => handle_advance(fields),
        Commands::Decide { decision } => handle_decide(decision),
        Commands::Reset => handle_reset(),
        Commands::Show { json } => handle_show(json),
        Commands::Screen { stage } => handle_screen(stage),
        Commands::Resume { project_id, dry_run } => handle_resume(project_id, dry_run),
        Commands::Requirements { subcommand } => match subcommand {
            RequirementCommands::List { json } => handle_requirements_list(json),
            RequirementCommands::Show { project_id, json } => handle_requirements_show(project_id, json),
        },
        Commands::Snapshot { subcommand } => handle_snapshot(subcommand),
        Commands::Dashboard { json } => handle_dashboard(json),
    }
}

/// Load configuration and open the ledger it names
fn open_ledger() -> Result<(Config, Connection)> {
    let config = Config::load().context("Failed to load configuration")?;
    let conn = DbConnection::connect_at(&config.data_location)
        .context("Failed to connect to database")?;
    Ok((config, conn))
}

/// Exit with a user error for an unknown project, suggesting close ids
fn unknown_project(conn: &Connection, project_id: &str) -> ! {
    let mut message = format!("Requirement '{}' not found", project_id);
    if let Ok(ids) = RequirementRepo::list_ids(conn) {
        if let Some(hint) = fuzzy::suggestion_hint(project_id, &ids) {
            message.push_str("\n  ");
            message.push_str(&hint);
        }
    }
    user_error(&message);
}

fn handle_stages(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stages())?);
    } else {
        print!("{}", format_stages_table(stages()));
    }
    Ok(())
}

fn handle_submit(form: NewRequirement, project_id: Option<String>) -> Result<()> {
    if let Err(e) = form.validate() {
        user_error(&e);
    }

    let (_, conn) = open_ledger()?;
    let project_id = match project_id {
        Some(id) => validate_project_id(&id).unwrap_or_else(|e| user_error(&e)),
        None => RequirementRepo::next_project_id(&conn, chrono::Local::now())?,
    };
    if RequirementRepo::get(&conn, &project_id)?.is_some() {
        user_error(&format!("Requirement '{}' already exists", project_id));
    }

    let tx = conn.unchecked_transaction()?;
    let mut session = SessionRepo::load(&tx)?;
    let store = SqliteStore::new(&tx);
    Sequencer::new(&store).submit_initial_requirement(&mut session, project_id.clone(), form)?;
    SessionRepo::save(&tx, &session)?;
    tx.commit()?;

    println!("Submitted requirement {}.", project_id);
    println!("Now at stage 1: {}", stage_label(1));
    Ok(())
}

fn handle_advance(fields: Vec<String>) -> Result<()> {
    let data = parse_workflow_fields(&fields).unwrap_or_else(|e| user_error(&e.to_string()));

    let (_, conn) = open_ledger()?;
    let tx = conn.unchecked_transaction()?;
    let mut session = SessionRepo::load(&tx)?;
    let from = session.state.current_stage;
    let store = SqliteStore::new(&tx);
    Sequencer::new(&store).advance(&mut session, data)?;
    SessionRepo::save(&tx, &session)?;
    tx.commit()?;

    let to = session.state.current_stage;
    println!("Completed stage {}: {}", from, stage_label(from));
    if session.state.is_complete() {
        println!("Procurement complete.");
    } else {
        println!("Now at stage {}: {}", to, stage_label(to));
    }
    Ok(())
}

fn handle_decide(decision: String) -> Result<()> {
    let approved = parse_decision(&decision).unwrap_or_else(|e| user_error(&e));

    let (config, conn) = open_ledger()?;
    let tx = conn.unchecked_transaction()?;
    let mut session = SessionRepo::load(&tx)?;
    let store = SqliteStore::new(&tx);
    let sequencer = Sequencer::new(&store);
    sequencer.ensure_decidable(&session)?;

    // The backend hears about the decision before anything changes locally
    let mut notified_backend = None;
    if let Some(project_id) = session.active_project_id.clone() {
        let source = open_source(&config, &conn)?;
        if let Err(e) = source.submit_decision(&AuthorityDecision::new(&project_id, approved)) {
            user_error(&format!("Failed to submit decision for {}: {:#}", project_id, e));
        }
        if config.backend_url.is_some() {
            notified_backend = Some(project_id);
        }
    }

    let recorded = sequencer
        .decide(&mut session, approved)
        .map_err(anyhow::Error::from)
        .and_then(|()| SessionRepo::save(&tx, &session));
    let recorded = recorded.and_then(|()| tx.commit().map_err(anyhow::Error::from));
    if let Err(e) = recorded {
        if let Some(project_id) = notified_backend {
            log::warn!(
                "Decision for {} was accepted by the backend but not recorded locally; the gate still shows pending: {:#}",
                project_id, e
            );
        }
        return Err(e);
    }

    if approved {
        println!("Approved. Now at stage {}: {}", session.state.current_stage, stage_label(session.state.current_stage));
    } else {
        println!("Rejected. The workflow has ended; run `procflow reset` to return to the dashboard.");
    }
    Ok(())
}

fn handle_reset() -> Result<()> {
    let (_, conn) = open_ledger()?;
    let mut session = SessionRepo::load(&conn)?;
    let store = SqliteStore::new(&conn);
    Sequencer::new(&store).reset(&mut session);
    SessionRepo::clear(&conn)?;
    println!("Workflow reset.");
    Ok(())
}

fn handle_show(json: bool) -> Result<()> {
    let (_, conn) = open_ledger()?;
    let session = SessionRepo::load(&conn)?;
    let screen = resolve_screen_or_initial(i64::from(session.state.current_stage));

    if json {
        let value = serde_json::json!({
            "current_stage": session.state.current_stage,
            "stage_name": stage_label(session.state.current_stage),
            "is_approved": session.state.is_approved,
            "screen": screen.as_str(),
            "project_id": session.active_project_id,
            "workflow_data": session.state.workflow_data,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", format_session(&session, screen));
    }
    Ok(())
}

fn handle_screen(stage: i64) -> Result<()> {
    let screen = match resolve_screen(stage) {
        Ok(screen) => screen,
        Err(e) => {
            eprintln!("Warning: {}; showing the initial screen.", e);
            resolve_screen_or_initial(stage)
        }
    };
    println!("{} (stage {})", screen.as_str(), screen.stage());
    Ok(())
}

fn handle_resume(project_id: String, dry_run: bool) -> Result<()> {
    let project_id = validate_project_id(&project_id).unwrap_or_else(|e| user_error(&e));

    let (config, conn) = open_ledger()?;
    let offline = config.backend_url.is_none();
    let source = open_source(&config, &conn)?;

    let tx = conn.unchecked_transaction()?;
    let store = SqliteStore::new(&tx);
    let reconciler = Reconciler::new(source.as_ref(), &store);

    let mut session = SessionRepo::load(&tx)?;
    let result = if dry_run {
        reconciler.reconcile(&project_id)
    } else {
        reconciler.resume(&mut session, &project_id)
    };

    let point = match result {
        Ok(point) => point,
        Err(e @ WorkflowError::ProjectLoad { .. }) if offline => {
            if RequirementRepo::get(&tx, &project_id)?.is_none() {
                unknown_project(&tx, &project_id);
            }
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    if dry_run {
        println!(
            "{} would resume at stage {} ({}).",
            point.project_id,
            point.stage,
            stage_label(point.stage)
        );
        return Ok(());
    }

    SessionRepo::save(&tx, &session)?;
    tx.commit()?;
    print!("{}", format_resume(&point));
    Ok(())
}

fn handle_requirements_list(json: bool) -> Result<()> {
    let (_, conn) = open_ledger()?;
    let requirements = RequirementRepo::list(&conn)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&requirements)?);
    } else {
        print!("{}", format_requirement_list_table(&requirements));
    }
    Ok(())
}

fn handle_requirements_show(project_id: String, json: bool) -> Result<()> {
    let (_, conn) = open_ledger()?;
    let Some(requirement) = RequirementRepo::get(&conn, project_id.trim())? else {
        unknown_project(&conn, project_id.trim());
    };

    let local = LocalSource::new(&conn);
    let progress = local.progress(&requirement.project_id)?;
    let navigation = local.navigation(&requirement.project_id)?.into_snapshot(&requirement.project_id);

    if json {
        let value = serde_json::json!({
            "requirement": requirement,
            "progress": progress,
            "navigation": navigation,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", format_requirement_detail(&requirement, progress.as_ref(), navigation.as_ref()));
    }
    Ok(())
}

fn handle_snapshot(subcommand: SnapshotCommands) -> Result<()> {
    let (_, conn) = open_ledger()?;
    match subcommand {
        SnapshotCommands::Progress { project_id, page, percent, status } => {
            let project_id = validate_project_id(&project_id).unwrap_or_else(|e| user_error(&e));
            let page = validate_page(page).unwrap_or_else(|e| user_error(&e));
            let percent = validate_percent(percent).unwrap_or_else(|e| user_error(&e));
            if let Err(e) = validate_non_empty(&status, "Status") {
                user_error(&e);
            }
            let snapshot = ProgressSnapshot {
                project_id,
                current_page: page,
                overall_progress: percent,
                status: ProgressStatus::parse(&status),
            };
            SnapshotRepo::record_progress(&conn, &snapshot)?;
            println!(
                "Recorded progress for {}: page {} ({:.0}%, {}).",
                snapshot.project_id, snapshot.current_page, snapshot.overall_progress, snapshot.status.as_str()
            );
        }
        SnapshotCommands::Nav { project_id, stage, component } => {
            let project_id = validate_project_id(&project_id).unwrap_or_else(|e| user_error(&e));
            let snapshot = NavigationSnapshot {
                project_id,
                current_stage: stage,
                current_page_component: component,
            };
            SnapshotRepo::record_navigation(&conn, &snapshot)?;
            println!("Recorded navigation for {}: stage {}.", snapshot.project_id, snapshot.current_stage);
        }
        SnapshotCommands::ClearNav { project_id } => {
            if SnapshotRepo::clear_navigation(&conn, project_id.trim())? {
                println!("Cleared navigation for {}.", project_id.trim());
            } else {
                println!("No navigation recorded for {}.", project_id.trim());
            }
        }
    }
    Ok(())
}

fn handle_dashboard(json: bool) -> Result<()> {
    let (config, conn) = open_ledger()?;

    let rejected: HashSet<String> = RequirementRepo::list(&conn)?
        .into_iter()
        .filter(|r| r.status == RequirementStatus::Rejected)
        .map(|r| r.project_id)
        .collect();

    let source = open_source(&config, &conn)?;
    let summary = summarize_from(source.as_ref(), rejected);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", format_dashboard(&summary));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_advance_fields() {
        let cli = Cli::try_parse_from(["procflow", "advance", "vendor=Acme", "score=9"]).unwrap();
        match cli.command {
            Commands::Advance { fields } => assert_eq!(fields, vec!["vendor=Acme", "score=9"]),
            _ => panic!("expected advance"),
        }
    }

    #[test]
    fn test_parse_negative_stage() {
        let cli = Cli::try_parse_from(["procflow", "screen", "-1"]).unwrap();
        assert!(matches!(cli.command, Commands::Screen { stage: -1 }));
    }

    #[test]
    fn test_parse_snapshot_progress() {
        let cli = Cli::try_parse_from([
            "procflow", "snapshot", "progress", "P-1", "4", "30", "--status", "in_progress",
        ]).unwrap();
        match cli.command {
            Commands::Snapshot { subcommand: SnapshotCommands::Progress { page, percent, .. } } => {
                assert_eq!(page, 4);
                assert_eq!(percent, 30.0);
            }
            _ => panic!("expected snapshot progress"),
        }
    }
}
