//! Binary entry point for the muster roster CLI.
#![forbid(unsafe_code)]

mod ui;

use std::error::Error;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use time::Date;
use tracing_subscriber::EnvFilter;

use muster::config::{EngineConfig, CONFIG_ENV};
use muster::data_generator::RosterGenerator;
use muster::query::analyze::QueryIssue;
use muster::query::date::{format_iso, parse_date, today_utc};
use muster::query::{FieldRegistry, FieldType, Group, QueryExecutor, SavedQuery};
use muster::stats::{
    analyze_fairness, default_eligibility, eligibility_counts, summarize_with, FairnessReport,
    SectionReports, StatisticsSummary,
};
use muster::{Personnel, Unit, UnitHierarchy};

use ui::Ui;

#[derive(Parser, Debug)]
#[command(
    name = "muster",
    version,
    about = "Query, statistics and duty fairness over personnel rosters",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = CONFIG_ENV,
        help = "Engine configuration file (TOML)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        value_name = "YYYY-MM-DD",
        value_parser = parse_day,
        help = "Evaluation date for relative date conditions (defaults to today, UTC)"
    )]
    today: Option<Date>,

    #[arg(long, global = true, help = "Disable colored output")]
    plain: bool,

    #[command(flatten)]
    roster: RosterArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct RosterArgs {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "JSON array of personnel records; a generated roster is used when absent"
    )]
    roster: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        default_value_t = 200,
        help = "Generated roster size"
    )]
    size: usize,

    #[arg(
        long,
        global = true,
        default_value_t = 42,
        help = "Seed for the generated roster"
    )]
    seed: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "List queryable fields and their operators")]
    Fields {
        #[arg(long = "type", value_enum, help = "Only fields of this type")]
        field_type: Option<FieldTypeArg>,
    },

    #[command(about = "Run a query and print the matching members")]
    Query(QueryCmd),

    #[command(about = "Check a query for problems without running it")]
    Validate {
        #[arg(long, value_name = "FILE", help = "Query file (group or saved query JSON)")]
        query: PathBuf,
    },

    #[command(about = "Summary statistics and section reports")]
    Stats(StatsCmd),

    #[command(about = "Generate a duty roster and report how evenly it is spread")]
    Fairness(FairnessCmd),
}

#[derive(Args, Debug)]
struct QueryCmd {
    #[arg(long, value_name = "FILE", help = "Query file (group or saved query JSON)")]
    query: PathBuf,

    #[arg(long, help = "Print at most this many matches")]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct StatsCmd {
    #[arg(long, value_name = "FILE", help = "Restrict to records matching this query")]
    query: Option<PathBuf>,

    #[arg(long, value_name = "ID", help = "Restrict to this unit and its subunits")]
    unit: Option<String>,

    #[arg(
        long,
        value_name = "FILE",
        requires = "unit",
        help = "JSON array of units that --unit resolves against; the generated unit tree is used when absent"
    )]
    units: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FairnessCmd {
    #[arg(long, default_value_t = 30, help = "Days of duty to generate")]
    days: u32,

    #[arg(
        long,
        value_name = "YYYY-MM-DD",
        value_parser = parse_day,
        help = "First duty day (defaults to the evaluation date)"
    )]
    start: Option<Date>,

    #[arg(long, help = "Override the imbalance threshold")]
    threshold: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum FieldTypeArg {
    String,
    Number,
    Boolean,
    Date,
    Array,
    Select,
}

impl From<FieldTypeArg> for FieldType {
    fn from(arg: FieldTypeArg) -> Self {
        match arg {
            FieldTypeArg::String => FieldType::String,
            FieldTypeArg::Number => FieldType::Number,
            FieldTypeArg::Boolean => FieldType::Boolean,
            FieldTypeArg::Date => FieldType::Date,
            FieldTypeArg::Array => FieldType::Array,
            FieldTypeArg::Select => FieldType::Select,
        }
    }
}

fn parse_day(raw: &str) -> Result<Date, String> {
    parse_date(raw).ok_or_else(|| format!("expected YYYY-MM-DD, got {raw:?}"))
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.clone())?;
    let today = cli.today.unwrap_or_else(today_utc);
    let ui = Ui::new(cli.plain);
    let executor = QueryExecutor::from_config(&config.query).today(today);

    match &cli.command {
        Command::Fields { field_type } => {
            let rows = field_rows(field_type.map(FieldType::from));
            emit(&cli.format, &rows, |_| print_fields_text(&ui, &rows))?;
        }
        Command::Query(cmd) => {
            let (name, group) = load_query(&cmd.query)?;
            let roster = load_roster(&cli.roster, today)?;
            let matched = executor.execute(&roster, Some(&group))?;
            let shown = cmd.limit.unwrap_or(matched.len()).min(matched.len());
            let output = QueryOutput {
                name,
                total: roster.len(),
                matched: matched.len(),
                records: matched[..shown].to_vec(),
            };
            emit(&cli.format, &output, |_| print_query_text(&ui, &output))?;
        }
        Command::Validate { query } => {
            let (name, group) = load_query(query)?;
            let issues = executor.validate(&group);
            let output = ValidationOutput {
                name,
                valid: issues.is_empty(),
                conditions: group.condition_count(),
                depth: group.depth(),
                issues: issues.iter().map(IssueRow::from).collect(),
            };
            emit(&cli.format, &output, |_| print_validation_text(&ui, &output))?;
            if !output.valid {
                std::process::exit(2);
            }
        }
        Command::Stats(cmd) => {
            let roster = load_roster(&cli.roster, today)?;
            let scoped: Vec<&Personnel> = match &cmd.unit {
                Some(unit) => {
                    let hierarchy = match &cmd.units {
                        Some(path) => read_units(path)?,
                        None => RosterGenerator::with_anchor(cli.roster.seed, today).generate_units(),
                    };
                    hierarchy.scope(&roster, unit)?
                }
                None => roster.iter().collect(),
            };
            let group = cmd
                .query
                .as_deref()
                .map(load_query)
                .transpose()?
                .map(|(_, group)| group);
            let selected = executor.execute(&scoped, group.as_ref())?;
            let output = StatsOutput {
                unit: cmd.unit.clone(),
                today: format_iso(today),
                summary: summarize_with(&selected, &config.stats),
                reports: SectionReports::build(&selected, &config.stats, today),
            };
            emit(&cli.format, &output, |_| print_stats_text(&ui, &output))?;
        }
        Command::Fairness(cmd) => {
            let mut generator = RosterGenerator::with_anchor(cli.roster.seed, today);
            let roster = match &cli.roster.roster {
                Some(path) => read_roster(path)?,
                None => generator.generate_personnel(cli.roster.size),
            };
            let start = cmd.start.unwrap_or(today);
            let duties = generator.generate_duty_roster(&roster, start, cmd.days);
            let eligibility = eligibility_counts(&roster, "unitId", &default_eligibility());
            let mut fairness = config.fairness.clone();
            if let Some(threshold) = cmd.threshold {
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(format!("threshold must be a non-negative number, got {threshold}").into());
                }
                fairness.imbalance_threshold = threshold;
            }
            let report = analyze_fairness(&duties, &eligibility, &fairness);
            let output = FairnessOutput {
                start: format_iso(start),
                days: cmd.days,
                report,
            };
            emit(&cli.format, &output, |_| print_fairness_text(&ui, &output))?;
        }
    }

    Ok(())
}

fn load_roster(args: &RosterArgs, today: Date) -> Result<Vec<Personnel>, Box<dyn Error>> {
    match &args.roster {
        Some(path) => read_roster(path),
        None => Ok(RosterGenerator::with_anchor(args.seed, today).generate_personnel(args.size)),
    }
}

fn read_roster(path: &Path) -> Result<Vec<Personnel>, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("failed to read roster {}: {err}", path.display()))?;
    serde_json::from_str(&text)
        .map_err(|err| format!("invalid roster {}: {err}", path.display()).into())
}

fn read_units(path: &Path) -> Result<UnitHierarchy, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("failed to read units {}: {err}", path.display()))?;
    let units: Vec<Unit> = serde_json::from_str(&text)
        .map_err(|err| format!("invalid units {}: {err}", path.display()))?;
    Ok(UnitHierarchy::new(units))
}

/// Reads either a saved query or a bare group.
fn load_query(path: &Path) -> Result<(Option<String>, Group), Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("failed to read query {}: {err}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|err| format!("invalid query {}: {err}", path.display()))?;
    let parsed = if value.get("group").is_some() {
        serde_json::from_value::<SavedQuery>(value).map(|saved| (Some(saved.name), saved.group))
    } else {
        serde_json::from_value::<Group>(value).map(|group| (None, group))
    };
    parsed.map_err(|err| format!("invalid query {}: {err}", path.display()).into())
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: Fn(OutputFormat),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(OutputFormat::Text),
    }
    Ok(())
}

#[derive(Serialize)]
struct FieldRow {
    key: &'static str,
    label: &'static str,
    category: &'static str,
    #[serde(rename = "type")]
    field_type: FieldType,
    options: &'static [&'static str],
    operators: Vec<String>,
}

fn field_rows(filter: Option<FieldType>) -> Vec<FieldRow> {
    FieldRegistry::personnel()
        .iter()
        .filter(|field| filter.map_or(true, |t| field.field_type == t))
        .map(|field| FieldRow {
            key: field.key,
            label: field.label,
            category: field.category,
            field_type: field.field_type,
            options: field.options,
            operators: field
                .operators()
                .iter()
                .map(|info| info.operator.to_string())
                .collect(),
        })
        .collect()
}

fn print_fields_text(ui: &Ui, rows: &[FieldRow]) {
    let mut categories: Vec<&str> = Vec::new();
    for row in rows {
        if !categories.contains(&row.category) {
            categories.push(row.category);
        }
    }
    for (index, category) in categories.into_iter().enumerate() {
        if index > 0 {
            ui.spacer();
        }
        ui.list(
            category,
            rows.iter()
                .filter(|row| row.category == category)
                .map(|row| {
                    format!(
                        "{} ({}): {}",
                        row.key,
                        row.field_type,
                        row.operators.join(", ")
                    )
                }),
        );
    }
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    total: usize,
    matched: usize,
    records: Vec<&'a Personnel>,
}

fn print_query_text(ui: &Ui, output: &QueryOutput<'_>) {
    ui.section(
        output.name.as_deref().unwrap_or("Query"),
        [
            ("matched", output.matched.to_string()),
            ("total", output.total.to_string()),
        ],
    );
    if output.records.is_empty() {
        return;
    }
    ui.spacer();
    ui.list(
        "Members",
        output.records.iter().map(|person| {
            format!(
                "{:<8} {:<24} {:<5} {}",
                person.id,
                person.full_name(),
                person.rank,
                person.unit_name
            )
        }),
    );
    if output.records.len() < output.matched {
        println!("  ... {} more", output.matched - output.records.len());
    }
}

#[derive(Serialize)]
struct IssueRow {
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
    message: String,
}

impl From<&QueryIssue> for IssueRow {
    fn from(issue: &QueryIssue) -> Self {
        Self {
            code: issue.code(),
            condition: issue.condition().map(str::to_string),
            message: issue.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ValidationOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    valid: bool,
    conditions: usize,
    depth: usize,
    issues: Vec<IssueRow>,
}

fn print_validation_text(ui: &Ui, output: &ValidationOutput) {
    let label = output.name.as_deref().unwrap_or("query");
    if output.valid {
        ui.success(&format!(
            "{label} is valid ({} conditions, depth {})",
            output.conditions, output.depth
        ));
        return;
    }
    ui.warn(&format!("{label} has {} issue(s)", output.issues.len()));
    ui.list(
        "Issues",
        output
            .issues
            .iter()
            .map(|issue| format!("[{}] {}", issue.code, issue.message)),
    );
}

#[derive(Serialize)]
struct StatsOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    today: String,
    summary: StatisticsSummary,
    reports: SectionReports,
}

fn print_stats_text(ui: &Ui, output: &StatsOutput) {
    let summary = &output.summary;
    let title = match &output.unit {
        Some(unit) => format!("Summary ({unit})"),
        None => "Summary".to_string(),
    };
    ui.section(
        &title,
        [
            ("total", summary.total.to_string()),
            (
                "deployable",
                format!(
                    "{} ({}%)",
                    summary.deployment_eligible_count, summary.deployment_eligible_percent
                ),
            ),
            (
                "medically ready",
                format!(
                    "{} ({}%)",
                    summary.medical_ready_count, summary.medical_ready_percent
                ),
            ),
            ("avg years", summary.avg_years_of_service.clone()),
        ],
    );
    ui.spacer();
    ui.distribution("By branch", &summary.by_branch);
    ui.spacer();
    ui.distribution("Top ranks", &summary.by_rank);

    let reports = &output.reports;
    ui.spacer();
    ui.section(
        "Readiness",
        [
            (
                "pt pass",
                format!(
                    "{} ({}%)",
                    reports.readiness.pt_pass_count, reports.readiness.pt_pass_percent
                ),
            ),
            ("avg pt score", reports.readiness.avg_pt_score.to_string()),
        ],
    );
    ui.distribution("Duty status", &reports.readiness.by_duty_status);
    ui.spacer();
    ui.section(
        "Security",
        [
            (
                "cleared",
                format!(
                    "{} ({}%)",
                    reports.security.cleared_count, reports.security.cleared_percent
                ),
            ),
            (
                "expiring soon",
                format!(
                    "{} (within {} days)",
                    reports.security.expiring_soon, reports.security.window_days
                ),
            ),
            ("expired", reports.security.expired.to_string()),
        ],
    );
    ui.distribution("Clearance", &reports.security.by_clearance);
    ui.spacer();
    ui.section(
        "Medical",
        [
            ("overdue physicals", reports.medical.overdue_physicals.to_string()),
        ],
    );
    ui.distribution("Readiness", &reports.medical.by_readiness);
    ui.distribution("Dental class", &reports.medical.by_dental_class);
    ui.spacer();
    ui.section(
        "Training",
        [
            ("avg courses", reports.training.avg_courses.clone()),
            ("certified", reports.training.certified_count.to_string()),
        ],
    );
    ui.distribution("Top courses", &reports.training.top_courses);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FairnessOutput {
    start: String,
    days: u32,
    report: FairnessReport,
}

fn print_fairness_text(ui: &Ui, output: &FairnessOutput) {
    let report = &output.report;
    ui.section(
        "Duty fairness",
        [
            ("start", output.start.clone()),
            ("days", output.days.to_string()),
            ("duties", report.total_events.to_string()),
            ("eligible", report.total_eligible.to_string()),
            ("avg per capita", format!("{:.3}", report.average_per_capita)),
            ("variance", format!("{:.3}", report.variance)),
            ("max deviation", format!("{:.3}", report.max_deviation)),
            ("threshold", format!("{:.3}", report.imbalance_threshold)),
        ],
    );
    ui.spacer();
    ui.list(
        "Units",
        report.rows.iter().map(|row| {
            let rate = if row.rate_defined {
                format!("{:.3}", row.per_capita)
            } else {
                "n/a".to_string()
            };
            let flag = if row.imbalanced { "  IMBALANCED" } else { "" };
            format!(
                "{:<8} duties={:<4} eligible={:<4} rate={rate}{flag}",
                row.group_id, row.total_events, row.total_eligible
            )
        }),
    );
    ui.spacer();
    if report.imbalanced_groups.is_empty() {
        ui.success("no unit deviates beyond the threshold");
    } else {
        ui.warn(&format!(
            "imbalanced: {}",
            report.imbalanced_groups.join(", ")
        ));
    }
}
