use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use winget_recon_config::{LocaleKeywords, ScanConfig};
use winget_recon_core::ScanOutcome;
use winget_recon_scan::session::{CommandSource, ScanSession, WingetSource};
use winget_recon_scan::{
    parse_list_output, parse_task_query, parse_upgrade_output, plan_installed_sync,
    probe_candidates, run_capture, task_query_args, InstalledProgram, InstalledPrograms,
    WingetProbeRunner,
};
use winget_recon_store::InstalledStore;

#[derive(Debug, Parser)]
#[command(name = "winget-recon")]
#[command(about = "Winget output parsing and installed-set reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse `winget upgrade` output from a file or stdin.
    ParseUpgrade(ParseArgs),
    /// Parse `winget list` output from a file or stdin.
    ParseList(ParseArgs),
    /// Run a full scan cycle against the live winget CLI.
    Check(CheckArgs),
    /// Plan (and optionally apply) an installed-set sync against ground truth.
    Sync(SyncArgs),
    /// Query and parse the scheduled maintenance task.
    Schedule(ScheduleArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Input file with raw captured output (default: stdin).
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Scan configuration YAML.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Installed-set database; seeds the session when present.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Probe not-applicable candidates individually after a degraded scan.
    #[arg(long)]
    probe: bool,
}

#[derive(Debug, Args)]
struct SyncArgs {
    /// Scan configuration YAML.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Installed-set database.
    #[arg(long)]
    db: PathBuf,
    /// JSON file with registry program entries to use as ground truth
    /// (default: exact presence in `winget list`).
    #[arg(long)]
    registry_file: Option<PathBuf>,
    /// Apply the plan instead of only printing it.
    #[arg(long)]
    apply: bool,
}

#[derive(Debug, Args)]
struct ScheduleArgs {
    /// Scheduled task name.
    #[arg(long)]
    task_name: String,
    /// Parse a saved query capture instead of invoking schtasks.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Locale keyword table YAML (default: built-in en/nb/sv table).
    #[arg(long)]
    locale_file: Option<PathBuf>,
    /// Query timeout in seconds.
    #[arg(long, default_value_t = 8)]
    timeout_secs: u64,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::ParseUpgrade(args) => run_parse_upgrade(args),
        Command::ParseList(args) => run_parse_list(args),
        Command::Check(args) => run_check(args),
        Command::Sync(args) => run_sync(args),
        Command::Schedule(args) => run_schedule(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn read_input(input: Option<&PathBuf>) -> Result<String, String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("failed to read '{}': {err}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| format!("failed to read stdin: {err}"))?;
            Ok(text)
        }
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| format!("failed to serialize output: {err}"))?;
    println!("{json}");
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<ScanConfig, String> {
    match path {
        Some(path) => ScanConfig::load(path)
            .map_err(|err| format!("failed to load config '{}': {err}", path.display())),
        None => Ok(ScanConfig::default()),
    }
}

#[derive(Debug, serde::Serialize)]
struct ParseSummary {
    records: Vec<winget_recon_core::PackageRecord>,
    warnings: Vec<String>,
    not_applicable_banner: bool,
}

fn run_parse_upgrade(args: ParseArgs) -> Result<(), String> {
    let text = read_input(args.input.as_ref())?;
    let report = parse_upgrade_output(&text);
    print_json(&ParseSummary {
        records: report.records,
        warnings: report.warnings,
        not_applicable_banner: report.saw_not_applicable_banner,
    })
}

fn run_parse_list(args: ParseArgs) -> Result<(), String> {
    let text = read_input(args.input.as_ref())?;
    let report = parse_list_output(&text);
    print_json(&ParseSummary {
        records: report.records,
        warnings: report.warnings,
        not_applicable_banner: report.saw_not_applicable_banner,
    })
}

#[derive(Debug, serde::Serialize)]
struct CheckSummary {
    #[serde(flatten)]
    outcome: ScanOutcome,
    not_applicable: BTreeSet<String>,
    degraded: bool,
    warnings: Vec<String>,
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let config = load_config(args.config.as_ref())?;

    let installed = match args.db.as_ref() {
        Some(path) => {
            let store = InstalledStore::open(path)
                .map_err(|err| format!("failed to open '{}': {err}", path.display()))?;
            store
                .load_ids()
                .map_err(|err| format!("failed to load installed set: {err}"))?
        }
        None => BTreeSet::new(),
    };

    let source = WingetSource::new(config.clone());
    let mut session = ScanSession::new(installed);
    let mut report = session.run_scan(&source);

    if args.probe && report.degraded && !report.not_applicable.is_empty() {
        let results = probe_candidates(&WingetProbeRunner, &config, &report.not_applicable);
        for record in &results.confirmed {
            report.not_applicable.remove(&record.id);
        }
        if !results.confirmed.is_empty() {
            report.outcome = ScanOutcome::Records {
                records: results.confirmed,
            };
            report.degraded = false;
        }
    }

    print_json(&CheckSummary {
        outcome: report.outcome,
        not_applicable: report.not_applicable,
        degraded: report.degraded,
        warnings: report.warnings,
    })
}

#[derive(Debug, serde::Serialize)]
struct SyncSummary {
    plan: winget_recon_core::SyncPlan,
    applied: bool,
    added: Vec<String>,
    removed: Vec<String>,
    failed: Vec<String>,
}

fn run_sync(args: SyncArgs) -> Result<(), String> {
    let config = load_config(args.config.as_ref())?;
    let store = InstalledStore::open(&args.db)
        .map_err(|err| format!("failed to open '{}': {err}", args.db.display()))?;
    let marked = store
        .load_ids()
        .map_err(|err| format!("failed to load installed set: {err}"))?;

    let source = WingetSource::new(config);
    let list_capture = source.list();
    if list_capture.is_empty() {
        return Err("winget list produced no output; keeping previous state".to_string());
    }
    let catalog: BTreeMap<String, String> = parse_list_output(&list_capture.text)
        .records
        .into_iter()
        .map(|record| (record.id, record.name))
        .collect();

    let plan = match args.registry_file.as_ref() {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|err| format!("failed to read '{}': {err}", path.display()))?;
            let programs: Vec<InstalledProgram> = serde_json::from_str(&json)
                .map_err(|err| format!("invalid registry file '{}': {err}", path.display()))?;
            let ground_truth = InstalledPrograms::new(programs);
            plan_installed_sync(&catalog, &marked, &ground_truth)
        }
        None => {
            let listed: HashSet<String> = catalog.keys().cloned().collect();
            plan_installed_sync(&catalog, &marked, &listed)
        }
    };

    let mut summary = SyncSummary {
        plan: plan.clone(),
        applied: false,
        added: Vec::new(),
        removed: Vec::new(),
        failed: Vec::new(),
    };

    if args.apply {
        let report = store.apply_plan(&plan, "winget");
        summary.applied = true;
        summary.added = report.added;
        summary.removed = report.removed;
        summary.failed = report.failed;
    }

    print_json(&summary)
}

fn run_schedule(args: ScheduleArgs) -> Result<(), String> {
    let keywords = match args.locale_file.as_ref() {
        Some(path) => LocaleKeywords::load(path)
            .map_err(|err| format!("failed to load locale file '{}': {err}", path.display()))?,
        None => LocaleKeywords::default(),
    };

    let text = match args.input.as_ref() {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("failed to read '{}': {err}", path.display()))?,
        None => {
            let query_args = task_query_args(&args.task_name);
            let arg_refs: Vec<&str> = query_args.iter().map(String::as_str).collect();
            let capture = run_capture(
                "schtasks",
                &arg_refs,
                std::time::Duration::from_secs(args.timeout_secs),
            );
            capture.text
        }
    };

    let info = parse_task_query(&text, &keywords);
    print_json(&info)
}
