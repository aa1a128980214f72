//! CLI interface for postwatch.
//!
//! Designed for schedulers and humans alike to drive the attendance engine
//! from the command line. Each subcommand is non-interactive: arguments in,
//! structured output out.
//!
//! Commands split into two groups:
//!
//! - `postwatch assignment new|list` and `postwatch sweep` — no assignment
//!   context needed.
//! - `postwatch --assignment <id> <command>` — everything else, operating on
//!   one assignment.
//!
//! The `--assignment` flag takes a full UUID or unambiguous prefix.

use clap::{Args, Parser, Subcommand, ValueEnum};
use jiff::Timestamp;
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::engine::Engine;
use crate::model::{BreakKind, GeoSample, ReportKind, ShiftAssignment};
use crate::notify::HookNotifier;
use crate::store::SqliteStore;

/// Postwatch — track who is standing post.
#[derive(Debug, Parser)]
#[command(name = "postwatch", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Assignment ID: full UUID or unambiguous prefix (e.g. `a3b`).
    /// Required for check-in/out, breaks, reports, and `assignment show`.
    #[arg(long, global = true)]
    assignment: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: one guarded shift
  1. postwatch assignment new --guard <id> --site <id> \
       --start 2026-03-02T09:00:00Z --end 2026-03-02T17:00:00Z
     → prints an assignment ID (e.g. a3b0fc12)
  2. postwatch --assignment a3b check-in --guard <id> --lat 51.50 --lon -0.12 --accuracy 10
  3. postwatch --assignment a3b break start --guard <id> --kind lunch
  4. postwatch --assignment a3b break end --guard <id> --break-id <id>
  5. postwatch --assignment a3b report new --guard <id> --kind incident \
       --title "Broken gate" --description "East gate latch forced."
  6. postwatch --assignment a3b check-out --guard <id> --lat 51.50 --lon -0.12 --accuracy 10

Run `postwatch sweep` periodically (e.g. from cron) to finalize unattended
assignments as missed. Sweeps are safe to run from several schedulers at once."#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage assignments: create new ones, list existing, inspect one.
    Assignment {
        #[command(subcommand)]
        command: AssignmentCommand,
    },

    /// Check in to the assignment. Requires `--assignment`.
    ///
    /// Accepted from 30 minutes before scheduled start until 120 minutes
    /// after (configurable). Prints the updated assignment as JSON.
    CheckIn {
        /// Guard checking in.
        #[arg(long)]
        guard: Uuid,

        #[command(flatten)]
        geo: GeoArgs,
    },

    /// Check out of the assignment. Requires `--assignment`.
    ///
    /// Refused while a break is still open.
    CheckOut {
        /// Guard checking out.
        #[arg(long)]
        guard: Uuid,

        #[command(flatten)]
        geo: GeoArgs,

        /// Notes appended to the assignment record.
        #[arg(long)]
        notes: Option<String>,
    },

    /// Start or end a break on the assignment. Requires `--assignment`.
    Break {
        #[command(subcommand)]
        command: BreakCommand,
    },

    /// File, list, or review reports on the assignment.
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },

    /// Mark every unattended assignment past its check-in deadline as missed.
    Sweep,
}

#[derive(Debug, Subcommand)]
pub enum AssignmentCommand {
    /// Create a new assignment. Prints the assignment ID.
    New {
        /// Guard working the shift.
        #[arg(long)]
        guard: Uuid,

        /// Site being guarded.
        #[arg(long)]
        site: Uuid,

        /// Scheduled start (RFC 3339, e.g. 2026-03-02T09:00:00Z).
        #[arg(long)]
        start: Timestamp,

        /// Scheduled end (RFC 3339).
        #[arg(long)]
        end: Timestamp,
    },

    /// List assignments.
    List,

    /// Print one assignment as JSON. Requires `--assignment`.
    Show,
}

#[derive(Debug, Subcommand)]
pub enum BreakCommand {
    /// Start a break. Prints the break record as JSON.
    Start {
        /// Guard taking the break.
        #[arg(long)]
        guard: Uuid,

        /// What kind of break this is.
        #[arg(long, value_enum)]
        kind: BreakKindArg,

        #[command(flatten)]
        geo: OptionalGeoArgs,

        #[arg(long)]
        notes: Option<String>,
    },

    /// End a break. Prints the closed break record as JSON.
    End {
        /// Guard ending the break.
        #[arg(long)]
        guard: Uuid,

        /// The break being ended.
        #[arg(long)]
        break_id: Uuid,

        #[command(flatten)]
        geo: OptionalGeoArgs,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List the assignment's breaks as JSON.
    List,
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// File a report. Prints the report as JSON.
    New {
        /// Guard filing the report.
        #[arg(long)]
        guard: Uuid,

        /// What the report is about.
        #[arg(long, value_enum)]
        kind: ReportKindArg,

        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        #[command(flatten)]
        geo: OptionalGeoArgs,
    },

    /// List the assignment's reports as JSON.
    List,

    /// Mark a report reviewed.
    Review {
        /// Report to mark reviewed.
        report_id: Uuid,
    },
}

/// Required geolocation flags for check-in and check-out.
#[derive(Debug, Args)]
pub struct GeoArgs {
    /// Latitude in degrees.
    #[arg(long)]
    lat: f64,

    /// Longitude in degrees.
    #[arg(long)]
    lon: f64,

    /// Accuracy radius in meters.
    #[arg(long)]
    accuracy: f64,

    /// Street address, if known.
    #[arg(long)]
    address: Option<String>,
}

impl GeoArgs {
    fn to_sample(&self) -> GeoSample {
        GeoSample {
            latitude: self.lat,
            longitude: self.lon,
            accuracy_meters: self.accuracy,
            address: self.address.clone(),
        }
    }
}

/// Optional geolocation flags for breaks and reports: all-or-nothing.
#[derive(Debug, Args)]
pub struct OptionalGeoArgs {
    /// Latitude in degrees.
    #[arg(long)]
    lat: Option<f64>,

    /// Longitude in degrees.
    #[arg(long)]
    lon: Option<f64>,

    /// Accuracy radius in meters.
    #[arg(long)]
    accuracy: Option<f64>,

    /// Street address, if known.
    #[arg(long)]
    address: Option<String>,
}

impl OptionalGeoArgs {
    fn to_sample(&self) -> Result<Option<GeoSample>, String> {
        match (self.lat, self.lon, self.accuracy) {
            (Some(lat), Some(lon), Some(accuracy)) => Ok(Some(GeoSample {
                latitude: lat,
                longitude: lon,
                accuracy_meters: accuracy,
                address: self.address.clone(),
            })),
            (None, None, None) => {
                if self.address.is_some() {
                    return Err("--address requires --lat, --lon, and --accuracy".to_string());
                }
                Ok(None)
            }
            _ => Err("--lat, --lon, and --accuracy must be given together".to_string()),
        }
    }
}

/// CLI-facing break kind, mapped to the domain `BreakKind`.
#[derive(Debug, Clone, ValueEnum)]
pub enum BreakKindArg {
    /// A routine short break.
    Regular,
    /// A meal break.
    Lunch,
    /// Left post for an emergency.
    Emergency,
    /// Left post without authorization.
    Unauthorized,
}

impl BreakKindArg {
    fn to_domain(&self) -> BreakKind {
        match self {
            Self::Regular => BreakKind::Regular,
            Self::Lunch => BreakKind::Lunch,
            Self::Emergency => BreakKind::Emergency,
            Self::Unauthorized => BreakKind::Unauthorized,
        }
    }
}

/// CLI-facing report kind, mapped to the domain `ReportKind`.
#[derive(Debug, Clone, ValueEnum)]
pub enum ReportKindArg {
    Incident,
    Maintenance,
    SecurityBreach,
    MedicalEmergency,
    General,
}

impl ReportKindArg {
    fn to_domain(&self) -> ReportKind {
        match self {
            Self::Incident => ReportKind::Incident,
            Self::Maintenance => ReportKind::Maintenance,
            Self::SecurityBreach => ReportKind::SecurityBreach,
            Self::MedicalEmergency => ReportKind::MedicalEmergency,
            Self::General => ReportKind::General,
        }
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config, store: SqliteStore) -> Result<(), String> {
    let cli = Cli::parse();

    let mut engine = Engine::new(store).with_window(config.window());
    if let Some(hook) = &config.notify_hook {
        engine = engine.with_notifier(HookNotifier::new(hook.clone()));
    }

    match cli.command {
        Command::Assignment { command } => match command {
            AssignmentCommand::New {
                guard,
                site,
                start,
                end,
            } => cmd_new(&engine, guard, site, start, end),
            AssignmentCommand::List => cmd_list(&engine),
            AssignmentCommand::Show => {
                let assignment = require_assignment(&engine, cli.assignment.as_deref())?;
                print_json(&assignment)
            }
        },
        Command::CheckIn { guard, geo } => {
            let assignment = require_assignment(&engine, cli.assignment.as_deref())?;
            let updated = engine
                .check_in(assignment.id, guard, geo.to_sample())
                .map_err(|e| e.to_string())?;
            print_json(&updated)
        }
        Command::CheckOut { guard, geo, notes } => {
            let assignment = require_assignment(&engine, cli.assignment.as_deref())?;
            let updated = engine
                .check_out(assignment.id, guard, geo.to_sample(), notes.as_deref())
                .map_err(|e| e.to_string())?;
            print_json(&updated)
        }
        Command::Break { command } => {
            let assignment = require_assignment(&engine, cli.assignment.as_deref())?;
            match command {
                BreakCommand::Start {
                    guard,
                    kind,
                    geo,
                    notes,
                } => {
                    let record = engine
                        .start_break(
                            assignment.id,
                            guard,
                            kind.to_domain(),
                            geo.to_sample()?,
                            notes.as_deref(),
                        )
                        .map_err(|e| e.to_string())?;
                    print_json(&record)
                }
                BreakCommand::End {
                    guard,
                    break_id,
                    geo,
                    notes,
                } => {
                    let record = engine
                        .end_break(
                            assignment.id,
                            guard,
                            break_id,
                            geo.to_sample()?,
                            notes.as_deref(),
                        )
                        .map_err(|e| e.to_string())?;
                    print_json(&record)
                }
                BreakCommand::List => {
                    let breaks = engine
                        .breaks_for(assignment.id)
                        .map_err(|e| e.to_string())?;
                    print_json(&breaks)
                }
            }
        }
        Command::Report { command } => match command {
            ReportCommand::New {
                guard,
                kind,
                title,
                description,
                geo,
            } => {
                let assignment = require_assignment(&engine, cli.assignment.as_deref())?;
                let report = engine
                    .file_report(
                        assignment.id,
                        guard,
                        kind.to_domain(),
                        &title,
                        &description,
                        geo.to_sample()?,
                    )
                    .map_err(|e| e.to_string())?;
                print_json(&report)
            }
            ReportCommand::List => {
                let assignment = require_assignment(&engine, cli.assignment.as_deref())?;
                let reports = engine
                    .reports_for(assignment.id)
                    .map_err(|e| e.to_string())?;
                print_json(&reports)
            }
            ReportCommand::Review { report_id } => {
                let applied = engine.review_report(report_id).map_err(|e| e.to_string())?;
                if applied {
                    eprintln!("Report {report_id} marked reviewed");
                } else {
                    eprintln!("Report {report_id} was already reviewed");
                }
                Ok(())
            }
        },
        Command::Sweep => cmd_sweep(&engine),
    }
}

fn cmd_new(
    engine: &Engine<SqliteStore>,
    guard: Uuid,
    site: Uuid,
    start: Timestamp,
    end: Timestamp,
) -> Result<(), String> {
    let assignment = engine
        .create_assignment(guard, site, start, end)
        .map_err(|e| format!("failed to create assignment: {e}"))?;

    println!("{}", assignment.id);
    Ok(())
}

fn cmd_list(engine: &Engine<SqliteStore>) -> Result<(), String> {
    let assignments = engine
        .assignments()
        .map_err(|e| format!("failed to list assignments: {e}"))?;

    if assignments.is_empty() {
        println!("No assignments");
        return Ok(());
    }

    for a in &assignments {
        let short_id = &a.id.to_string()[..8];
        println!(
            "{short_id}  [{}]  {} → {}",
            a.status, a.scheduled_start, a.scheduled_end
        );
    }

    Ok(())
}

fn cmd_sweep(engine: &Engine<SqliteStore>) -> Result<(), String> {
    let outcome = engine.sweep_missed().map_err(|e| e.to_string())?;
    eprintln!(
        "Examined {} unattended assignment(s), marked {} missed",
        outcome.examined, outcome.marked
    );
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<(), String> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| format!("failed to serialize: {e}"))?;
    println!("{json}");
    Ok(())
}

/// Require that `--assignment` was provided and resolve it.
fn require_assignment(
    engine: &Engine<SqliteStore>,
    reference: Option<&str>,
) -> Result<ShiftAssignment, String> {
    let reference = reference.ok_or("this command requires --assignment <id>")?;
    resolve_assignment(engine, reference)
}

/// Resolve an assignment reference (full UUID or unambiguous prefix).
fn resolve_assignment(
    engine: &Engine<SqliteStore>,
    reference: &str,
) -> Result<ShiftAssignment, String> {
    // Try full UUID first.
    if let Ok(id) = reference.parse::<Uuid>() {
        return engine
            .assignment(id)
            .map_err(|e| format!("assignment not found: {e}"));
    }

    // Try as a prefix match against all assignments.
    let assignments = engine
        .assignments()
        .map_err(|e| format!("failed to list assignments: {e}"))?;

    let matches: Vec<&ShiftAssignment> = assignments
        .iter()
        .filter(|a| a.id.to_string().starts_with(reference))
        .collect();

    match matches.len() {
        0 => Err(format!("no assignment matching '{reference}'")),
        1 => Ok(matches[0].clone()),
        n => {
            let ids: Vec<String> = matches
                .iter()
                .map(|a| a.id.to_string()[..8].to_string())
                .collect();
            Err(format!(
                "'{reference}' is ambiguous — matches {n} assignments: {}",
                ids.join(", ")
            ))
        }
    }
}
