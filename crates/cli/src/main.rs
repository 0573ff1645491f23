//! CivicDesk CLI - complaint intake and lifecycle from the command line
//!
//! Usage:
//! ```bash
//! civicdesk init
//! civicdesk submit --title "Loud music" --category noise --description "After midnight"
//! civicdesk transition CMP-20261019083005-000001 acknowledged --note reviewed --actor mod-1
//! civicdesk show CMP-20261019083005-000001 --audit
//! civicdesk stats --department ENV
//! civicdesk report --kind history --id CMP-20261019083005-000001 --format csv
//! civicdesk verify-id 123456789010
//! ```

use anyhow::{Context, Result};
use civicdesk_core::{ComplaintStatus, Priority, ReporterType};
use civicdesk_service::ServiceConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod db;

use commands::{complaint, identity, stats};

/// CivicDesk - civic complaint lifecycle with identity verification
#[derive(Parser)]
#[command(name = "civicdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file path
    #[arg(long, default_value = "data/civicdesk.db", global = true)]
    pub db: PathBuf,

    /// Audit feed directory
    #[arg(long, default_value = "data/audit", global = true)]
    pub audit_dir: PathBuf,

    /// Service configuration (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Allow closed/rejected complaints to reopen to in_progress
    #[arg(long, global = true)]
    pub allow_reopen: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and apply migrations
    Init {
        /// Remove an existing database first
        #[arg(long)]
        force: bool,
    },

    /// Show database status
    Status,

    /// Submit a new complaint
    Submit(SubmitArgs),

    /// Move a complaint to another status
    Transition {
        /// Complaint ID
        id: String,
        /// Target status
        status: StatusArg,
        #[arg(long)]
        note: Option<String>,
        /// Actor reference recorded with the entry
        #[arg(long)]
        actor: Option<String>,
    },

    /// Show a complaint and its status history
    Show {
        /// Complaint ID
        id: String,
        /// Also print the audit feed entries
        #[arg(long)]
        audit: bool,
    },

    /// Summary counts per status
    Stats {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Ignore the cache and recompute
        #[arg(long)]
        refresh: bool,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a report
    Report {
        #[arg(long, default_value = "stats")]
        kind: ReportKind,
        /// Complaint ID (history reports)
        #[arg(long)]
        id: Option<String>,
        #[arg(long, default_value = "markdown")]
        format: ReportFormat,
        /// Output file path (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Check a 12-digit national ID
    VerifyId {
        /// National ID, or an 11-digit body with --check-digit
        national_id: String,
        /// Compute the check digit for an 11-digit body
        #[arg(long)]
        check_digit: bool,
    },
}

#[derive(Args)]
pub struct SubmitArgs {
    #[arg(long)]
    pub title: String,
    /// Category (noise, sanitation, roads, water_supply, ...)
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub description: String,
    #[arg(long, default_value = "medium")]
    pub priority: PriorityArg,
    #[arg(long, default_value = "anonymous")]
    pub reporter_type: ReporterArg,
    /// Reporter account reference (pseudonymous/verified)
    #[arg(long)]
    pub reporter_id: Option<String>,
    /// 12-digit national ID (verified reporters)
    #[arg(long)]
    pub national_id: Option<String>,
    #[arg(long)]
    pub holder: Option<String>,
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub handler: Option<String>,
    /// Actor reference recorded on the first history entry
    #[arg(long)]
    pub actor: Option<String>,
}

#[derive(Args)]
pub struct ScopeArgs {
    /// Only complaints from this reporter
    #[arg(long, conflicts_with_all = ["department", "reporter_type"])]
    pub reporter: Option<String>,
    /// Only complaints routed to this department
    #[arg(long, conflicts_with = "reporter_type")]
    pub department: Option<String>,
    /// Only complaints from this kind of reporter
    #[arg(long)]
    pub reporter_type: Option<ReporterArg>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Submitted,
    Acknowledged,
    InProgress,
    Resolved,
    Closed,
    Rejected,
}

impl StatusArg {
    pub fn to_core_type(self) -> ComplaintStatus {
        match self {
            StatusArg::Submitted => ComplaintStatus::Submitted,
            StatusArg::Acknowledged => ComplaintStatus::Acknowledged,
            StatusArg::InProgress => ComplaintStatus::InProgress,
            StatusArg::Resolved => ComplaintStatus::Resolved,
            StatusArg::Closed => ComplaintStatus::Closed,
            StatusArg::Rejected => ComplaintStatus::Rejected,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
    Urgent,
}

impl PriorityArg {
    pub fn to_core_type(self) -> Priority {
        match self {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
            PriorityArg::Urgent => Priority::Urgent,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReporterArg {
    Anonymous,
    Pseudonymous,
    Verified,
}

impl ReporterArg {
    pub fn to_core_type(self) -> ReporterType {
        match self {
            ReporterArg::Anonymous => ReporterType::Anonymous,
            ReporterArg::Pseudonymous => ReporterType::Pseudonymous,
            ReporterArg::Verified => ReporterType::Verified,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "markdown",
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportKind {
    Stats,
    History,
    List,
}

impl Cli {
    /// Service configuration from `--config` with flag overrides applied
    fn service_config(&self) -> Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::from_file(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => ServiceConfig::default(),
        };
        if self.allow_reopen {
            config.allow_terminal_reopen = true;
        }
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "civicdesk=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.service_config()?;
    debug!(
        id_prefix = %config.id_prefix,
        allow_terminal_reopen = config.allow_terminal_reopen,
        "Loaded service configuration"
    );

    if let Some(parent) = cli.db.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    match cli.command {
        Commands::Init { force } => {
            db::init_database(&cli.db, &cli.audit_dir, force).await?;
            println!("✅ Database initialized at {:?}", cli.db);
        }

        Commands::Status => {
            db::show_status(&cli.db, &cli.audit_dir).await?;
        }

        Commands::Submit(args) => {
            let ctx = db::open_context(&cli.db, &cli.audit_dir, config).await?;
            complaint::submit(&ctx, args).await?;
        }

        Commands::Transition {
            id,
            status,
            note,
            actor,
        } => {
            let ctx = db::open_context(&cli.db, &cli.audit_dir, config).await?;
            complaint::transition(
                &ctx,
                &id,
                status.to_core_type(),
                note.as_deref(),
                actor.as_deref(),
            )
            .await?;
        }

        Commands::Show { id, audit } => {
            let ctx = db::open_context(&cli.db, &cli.audit_dir, config).await?;
            complaint::show(&ctx, &id, audit).await?;
        }

        Commands::Stats {
            scope,
            refresh,
            json,
        } => {
            let ctx = db::open_context(&cli.db, &cli.audit_dir, config).await?;
            stats::show_stats(&ctx, scope.to_core_scope(), refresh, json).await?;
        }

        Commands::Report {
            kind,
            id,
            format,
            output,
            scope,
        } => {
            let ctx = db::open_context(&cli.db, &cli.audit_dir, config).await?;
            stats::generate_report(&ctx, kind, id, format, output, scope.to_core_scope()).await?;
        }

        Commands::VerifyId {
            national_id,
            check_digit,
        } => {
            identity::verify(&national_id, check_digit)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use civicdesk_core::StatsScope;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_transition() {
        let cli = Cli::try_parse_from([
            "civicdesk",
            "transition",
            "CMP-20261019083005-000001",
            "in-progress",
            "--note",
            "crew assigned",
        ])
        .unwrap();

        let Commands::Transition { status, note, .. } = cli.command else {
            panic!("expected transition");
        };
        assert_eq!(status.to_core_type(), ComplaintStatus::InProgress);
        assert_eq!(note.as_deref(), Some("crew assigned"));
        assert_eq!(cli.db, PathBuf::from("data/civicdesk.db"));
    }

    #[test]
    fn test_submit_defaults() {
        let cli = Cli::try_parse_from([
            "civicdesk",
            "submit",
            "--title",
            "Loud music",
            "--category",
            "noise",
            "--description",
            "After midnight",
        ])
        .unwrap();

        let Commands::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        assert_eq!(args.priority.to_core_type(), Priority::Medium);
        assert_eq!(args.reporter_type.to_core_type(), ReporterType::Anonymous);
    }

    #[test]
    fn test_scope_flags() {
        let cli = Cli::try_parse_from(["civicdesk", "stats", "--department", "ENV"]).unwrap();
        let Commands::Stats { scope, .. } = cli.command else {
            panic!("expected stats");
        };
        assert_eq!(
            scope.to_core_scope(),
            StatsScope::Department("ENV".to_string())
        );

        let conflicting = Cli::try_parse_from([
            "civicdesk",
            "stats",
            "--reporter",
            "u-1",
            "--department",
            "ENV",
        ]);
        assert!(conflicting.is_err());
    }

    #[test]
    fn test_reopen_flag_overrides_config() {
        let cli = Cli::try_parse_from(["civicdesk", "--allow-reopen", "status"]).unwrap();
        assert!(cli.service_config().unwrap().allow_terminal_reopen);
    }
}
