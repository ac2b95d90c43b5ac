use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lms_analytics::config::{Config, DEFAULT_CONFIG_FILE};
use lms_analytics::export::{self, ReportRow};
use lms_analytics::models::Snapshot;
use lms_analytics::report::{self, ReportKind};
use lms_analytics::{dashboard, markdown, snapshot, ReportFilter};

#[derive(Parser)]
#[command(name = "lms-analytics")]
#[command(about = "Dashboard statistics and reports for an LMS admin panel", long_about = None)]
struct Cli {
    /// Configuration file; a missing file means defaults
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Snapshot JSON file
    #[arg(long, global = true, env = "LMS_ANALYTICS_DATA")]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a realistic demo snapshot
    Seed {
        #[arg(long)]
        out: PathBuf,
    },
    /// Append attendance records from a CSV file to the snapshot
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print dashboard statistics as JSON
    Dashboard {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write a markdown digest of the dashboard
    Summary {
        #[arg(long, default_value = "summary.md")]
        out: PathBuf,
    },
    /// Build a filtered, paginated report
    Report(ReportArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Args)]
struct ReportArgs {
    #[arg(value_enum)]
    kind: ReportKind,
    #[arg(long)]
    start_date: Option<NaiveDate>,
    #[arg(long)]
    end_date: Option<NaiveDate>,
    #[arg(long)]
    course_id: Option<String>,
    #[arg(long)]
    user_id: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    account_type: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    completion_min: Option<f64>,
    #[arg(long)]
    completion_max: Option<f64>,
    #[arg(long)]
    page: Option<usize>,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
    /// Directory for CSV exports; defaults to the configured export_dir
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

impl ReportArgs {
    fn to_filter(&self, default_limit: usize) -> ReportFilter {
        ReportFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            course_id: self.course_id.clone(),
            user_id: self.user_id.clone(),
            status: self.status.clone(),
            gender: self.gender.clone(),
            account_type: self.account_type.clone(),
            location: self.location.clone(),
            search_term: self.search.clone(),
            completion_rate_min: self.completion_min,
            completion_rate_max: self.completion_max,
            page: self.page,
            limit: Some(self.limit.unwrap_or(default_limit)),
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("lms_analytics={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load(path: &Path) -> anyhow::Result<Snapshot> {
    snapshot::load_snapshot(path)
        .with_context(|| format!("failed to load snapshot from {}", path.display()))
}

fn emit<T: ReportRow>(
    kind: ReportKind,
    rows: Vec<T>,
    filter: &ReportFilter,
    format: OutputFormat,
    out_dir: &Path,
    today: NaiveDate,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let response = report::paginate(rows, filter);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Csv => {
            let payload = export::encode_report(&rows)
                .with_context(|| format!("failed to encode {} report", kind.as_str()))?;
            let path = export::write_export(out_dir, kind.as_str(), today, &payload)
                .with_context(|| format!("failed to write export to {}", out_dir.display()))?;
            println!("Exported {} rows to {}.", rows.len(), path.display());
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to read config from {}", cli.config.display()))?;
    init_tracing(cli.log_level.as_deref().unwrap_or(&config.logging.level));

    let today = Utc::now().date_naive();
    let data_path = cli.data.clone().or_else(|| config.data.snapshot.clone());
    let require_data = || {
        data_path.clone().context(
            "no snapshot given; pass --data, set LMS_ANALYTICS_DATA or configure [data] snapshot",
        )
    };

    match cli.command {
        Commands::Seed { out } => {
            let seeded = snapshot::seed_snapshot(today);
            snapshot::save_snapshot(&out, &seeded)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Seed snapshot written to {}.", out.display());
        }
        Commands::Import { csv } => {
            let path = require_data()?;
            let mut current = load(&path)?;
            let records = snapshot::import_attendance_csv(&csv)
                .with_context(|| format!("failed to import {}", csv.display()))?;
            let inserted = records.len();
            current.attendance.extend(records);
            snapshot::save_snapshot(&path, &current)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Inserted {inserted} attendance records from {}.", csv.display());
        }
        Commands::Dashboard { out } => {
            let current = load(&require_data()?)?;
            let stats = dashboard::assemble(&current, today);
            let body = serde_json::to_string_pretty(&stats)?;
            match out {
                Some(out) => {
                    std::fs::write(&out, body)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!("Dashboard written to {}.", out.display());
                }
                None => println!("{body}"),
            }
        }
        Commands::Summary { out } => {
            let current = load(&require_data()?)?;
            let stats = dashboard::assemble(&current, today);
            let digest = markdown::render_dashboard(&stats, today);
            std::fs::write(&out, digest)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Summary written to {}.", out.display());
        }
        Commands::Report(args) => {
            let filter = args.to_filter(config.reports.default_limit);
            filter.validate()?;
            let current = load(&require_data()?)?;
            let out_dir = args
                .out_dir
                .clone()
                .unwrap_or_else(|| config.reports.export_dir.clone());
            info!(kind = args.kind.as_str(), "building report");

            match args.kind {
                ReportKind::Students => emit(
                    args.kind,
                    report::student_rows(
                        &current.users,
                        &current.courses,
                        &current.payments,
                        &current.grades,
                        &filter,
                    ),
                    &filter,
                    args.format,
                    &out_dir,
                    today,
                )?,
                ReportKind::Courses => emit(
                    args.kind,
                    report::course_rows(
                        &current.courses,
                        &current.payments,
                        &current.grades,
                        &current.attendance,
                        &filter,
                    ),
                    &filter,
                    args.format,
                    &out_dir,
                    today,
                )?,
                ReportKind::Payments => emit(
                    args.kind,
                    report::payment_rows(
                        &current.payments,
                        &current.users,
                        &current.courses,
                        &filter,
                    ),
                    &filter,
                    args.format,
                    &out_dir,
                    today,
                )?,
                ReportKind::Attendance => emit(
                    args.kind,
                    report::attendance_rows(&current.attendance, &current.courses, &filter),
                    &filter,
                    args.format,
                    &out_dir,
                    today,
                )?,
            }
        }
    }

    Ok(())
}
