//! Binary entry point for codetrack.
//!
//! This binary provides the CLI for the codetrack progress tracker.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow unnecessary_wraps for consistent command function signatures
#![allow(clippy::unnecessary_wraps)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use codetrack::awareness::{Band, awareness_score, total_unique_solved};
use codetrack::config::CodetrackConfig;
use codetrack::observability;
use codetrack::{
    ConflictStrategy, ExportOptions, ExportService, Format, ImportOptions, ImportReport,
    ImportService, MemoryStore, Mode, ProgressStore,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Codetrack - multi-format import/export for coding-interview progress.
#[derive(Parser)]
#[command(name = "codetrack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Export problems and progress.
    Export {
        /// Export a single list instead of every list.
        #[arg(short, long)]
        list: Option<String>,

        /// Serialization format: tsv, csv, json, xml, or yaml.
        #[arg(short, long)]
        format: Option<String>,

        /// Field projection: problems, user, or full.
        #[arg(short, long)]
        mode: Option<String>,

        /// Output file path; defaults to a timestamped name in the
        /// current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the serialized bundle to stdout instead of a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Import a progress or problem-set file.
    Import {
        /// File to import.
        file: PathBuf,

        /// Target list for records without their own addressing.
        #[arg(short, long)]
        list: Option<String>,

        /// Source format; detected from the file when omitted.
        #[arg(short, long)]
        format: Option<String>,

        /// Projection override: problems, user, or full.
        #[arg(short, long)]
        mode: Option<String>,

        /// Conflict strategy: ask, skip, merge, or replace.
        #[arg(short, long, default_value = "ask")]
        strategy: String,
    },

    /// Detect the format and mode of a file without importing it.
    Detect {
        /// File to inspect.
        file: PathBuf,
    },

    /// List problem lists with solve counts.
    Lists,

    /// Show progress and awareness scores.
    Status {
        /// Scope the report to one list.
        #[arg(short, long)]
        list: Option<String>,
    },

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    // A local .env may supply RUST_LOG or CODETRACK_CONFIG_PATH.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_config(config.observability.as_ref(), cli.verbose) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: CodetrackConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Export {
            list,
            format,
            mode,
            output,
            stdout,
        } => cmd_export(&config, list, format, mode, output, stdout),

        Commands::Import {
            file,
            list,
            format,
            mode,
            strategy,
        } => cmd_import(&config, file, list, format, mode, strategy),

        Commands::Detect { file } => cmd_detect(file),

        Commands::Lists => cmd_lists(&config),

        Commands::Status { list } => cmd_status(&config, list),

        Commands::Config { show } => cmd_config(&config, show),

        Commands::Completions { shell } => cmd_completions(shell),
    }
}

/// Loads configuration.
fn load_config(path: Option<&str>) -> codetrack::Result<CodetrackConfig> {
    // If a path is provided, load from that file
    if let Some(config_path) = path {
        return CodetrackConfig::load_from_file(Path::new(config_path));
    }

    // Otherwise, load from the environment override or default location
    Ok(CodetrackConfig::load_default())
}

/// Loads the snapshot-backed store.
fn load_store(config: &CodetrackConfig) -> anyhow::Result<Arc<MemoryStore>> {
    let store = MemoryStore::load_from_path(&config.snapshot_path)
        .with_context(|| format!("loading snapshot {}", config.snapshot_path.display()))?;
    Ok(Arc::new(store))
}

/// Parses a mode token.
fn parse_mode(s: &str) -> anyhow::Result<Mode> {
    Mode::parse(s).ok_or_else(|| anyhow::anyhow!("unknown mode '{s}' (problems, user, or full)"))
}

/// Parses a conflict strategy token.
fn parse_strategy(s: &str) -> anyhow::Result<ConflictStrategy> {
    ConflictStrategy::parse(s)
        .ok_or_else(|| anyhow::anyhow!("unknown strategy '{s}' (ask, skip, merge, or replace)"))
}

/// Export command.
fn cmd_export(
    config: &CodetrackConfig,
    list: Option<String>,
    format: Option<String>,
    mode: Option<String>,
    output: Option<PathBuf>,
    stdout: bool,
) -> anyhow::Result<()> {
    let store = load_store(config)?;
    let service = ExportService::new(store);

    let format = match format {
        Some(token) => token.parse::<Format>()?,
        None => config.export.format,
    };
    let mode = match mode {
        Some(token) => parse_mode(&token)?,
        None => config.export.mode,
    };

    let mut options = ExportOptions::default().with_format(format).with_mode(mode);
    if let Some(list_id) = list {
        options = options.with_list_id(list_id);
    }

    if stdout {
        let result = service.export_to_string(&options)?;
        print!("{}", result.content);
        if !result.content.ends_with('\n') {
            println!();
        }
        return Ok(());
    }

    let result = if let Some(path) = output {
        service.export_to_file(&path, &options)?
    } else {
        let result = service.export_to_string(&options)?;
        let path = PathBuf::from(&result.suggested_filename);
        std::fs::write(&path, &result.content)
            .with_context(|| format!("writing {}", path.display()))?;
        codetrack::ExportResult {
            output_path: Some(path.display().to_string()),
            ..result
        }
    };

    println!(
        "Exported {} records ({} mode, {} format)",
        result.record_count, result.mode, result.format
    );
    if let Some(path) = &result.output_path {
        println!("Wrote {path}");
    }
    if !result.has_records() {
        println!("Note: no records matched; the file carries headers only");
    }

    Ok(())
}

/// Import command.
fn cmd_import(
    config: &CodetrackConfig,
    file: PathBuf,
    list: Option<String>,
    format: Option<String>,
    mode: Option<String>,
    strategy: String,
) -> anyhow::Result<()> {
    let strategy = parse_strategy(&strategy)?;
    let store = load_store(config)?;
    let service = ImportService::new(Arc::clone(&store) as Arc<dyn ProgressStore>);

    let mut options = ImportOptions::default().with_strategy(strategy);
    if let Some(token) = format {
        options = options.with_format(token.parse::<Format>()?);
    }
    if let Some(token) = mode {
        options = options.with_mode(parse_mode(&token)?);
    }
    if let Some(list_id) = list {
        options = options.with_list_id(list_id);
    }

    let report = service.import_from_path(&file, &options)?;

    store
        .save_to_path(&config.snapshot_path)
        .with_context(|| format!("saving snapshot {}", config.snapshot_path.display()))?;

    print_report(&report);
    Ok(())
}

/// Prints an import report.
fn print_report(report: &ImportReport) {
    println!(
        "Imported {} records ({} mode, {} format)",
        report.success_count, report.mode, report.format
    );
    if let Some(list_id) = &report.list_id {
        println!("Target list: {list_id}");
    }
    if report.skipped_count > 0 {
        println!("Skipped: {}", report.skipped_count);
    }
    if report.failed_count > 0 {
        println!("Failed: {}", report.failed_count);
    }
    for warning in &report.warnings {
        println!("Warning: {warning}");
    }
    for error in &report.errors {
        println!("Error: {error}");
    }

    if report.has_pending() {
        println!();
        println!(
            "{} conflicting records were deferred:",
            report.pending.len()
        );
        for pending in &report.pending {
            println!("  {}", pending.conflict.name);
            for change in &pending.conflict.changes {
                println!(
                    "    {}: '{}' -> '{}'",
                    change.field.header(),
                    change.existing,
                    change.imported
                );
            }
        }
        println!();
        println!("Re-run with --strategy skip, merge, or replace to resolve them.");
    }
}

/// Detect command.
fn cmd_detect(file: PathBuf) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("reading {}", file.display()))?;
    let filename = file.file_name().and_then(|n| n.to_str());

    let format = codetrack::detect_format(filename, &content);
    let parsed = codetrack::codec_for(format).parse(&content);
    let mode = parsed
        .mode
        .unwrap_or_else(|| codetrack::io::detect_mode_from_fields(parsed.records.first()));

    println!("Format: {format}");
    println!("Mode: {mode}");
    println!("Records: {}", parsed.records.len());
    if let Some(file_key) = &parsed.file_key {
        println!("List: {file_key}");
    }
    if let Some(error) = &parsed.error {
        println!("Parse warning: {error}");
    }

    Ok(())
}

/// Lists command.
fn cmd_lists(config: &CodetrackConfig) -> anyhow::Result<()> {
    let store = load_store(config)?;
    let lists = store.get_all_lists()?;

    if lists.is_empty() {
        println!("No lists yet. Import a problem set to create one.");
        return Ok(());
    }

    println!("{:<28} {:>8} {:>8}", "List", "Problems", "Solved");
    for list in lists {
        let problems = store.get_problems_for_list(&list.id)?;
        let mut solved = 0usize;
        for problem in &problems {
            if store
                .get_progress(&problem.id)?
                .is_some_and(|progress| progress.solved)
            {
                solved += 1;
            }
        }
        println!("{:<28} {:>8} {:>8}", list.id, problems.len(), solved);
    }

    Ok(())
}

/// Status command.
fn cmd_status(config: &CodetrackConfig, list: Option<String>) -> anyhow::Result<()> {
    let store = load_store(config)?;
    let unique_solved = total_unique_solved(store.as_ref())?;
    let now_ms = codetrack::current_timestamp_ms();

    println!("Codetrack Status");
    println!("================");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Snapshot: {}", config.snapshot_path.display());
    println!("Unique problems solved: {unique_solved}");
    println!();

    if let Some(list_id) = list {
        let Some(meta) = store.get_list(&list_id)? else {
            anyhow::bail!("no list named '{list_id}'");
        };
        let problems = store.get_problems_for_list(&meta.id)?;
        println!("{} ({} problems)", meta.display_name, problems.len());
        println!(
            "{:<36} {:>6} {:>8} {:>9}",
            "Problem", "Diff", "Score", "Band"
        );
        for problem in &problems {
            let progress = store.get_progress(&problem.id)?.unwrap_or_default();
            let scored =
                awareness_score(problem, &progress, unique_solved, &config.awareness, now_ms);
            let band = config.awareness.thresholds.band_for(scored.score);
            let score_text = scored.score.map_or_else(
                || {
                    if scored.invalid_date {
                        "bad date".to_string()
                    } else {
                        "-".to_string()
                    }
                },
                |score| format!("{score:.1}"),
            );
            println!(
                "{:<36} {:>6} {:>8} {:>9}",
                problem.name,
                problem.difficulty.to_string(),
                score_text,
                band.to_string()
            );
        }
    } else {
        for meta in store.get_all_lists()? {
            let problems = store.get_problems_for_list(&meta.id)?;
            let mut solved = 0usize;
            let mut due = 0usize;
            for problem in &problems {
                let progress = store.get_progress(&problem.id)?.unwrap_or_default();
                if progress.solved {
                    solved += 1;
                }
                let scored =
                    awareness_score(problem, &progress, unique_solved, &config.awareness, now_ms);
                let band = config.awareness.thresholds.band_for(scored.score);
                if matches!(
                    band,
                    Band::Yellow | Band::Red | Band::DarkRed | Band::Flashing
                ) {
                    due += 1;
                }
            }
            println!(
                "{}: {solved}/{} solved, {due} due for review",
                meta.display_name,
                problems.len()
            );
        }
    }

    Ok(())
}

/// Config command.
fn cmd_config(config: &CodetrackConfig, show: bool) -> anyhow::Result<()> {
    if show {
        println!("Current Configuration");
        println!("=====================");
        println!();
        println!("Snapshot Path: {}", config.snapshot_path.display());
        println!("Default Export Format: {}", config.export.format);
        println!("Default Export Mode: {}", config.export.mode);
        println!();
        println!("Awareness:");
        println!("  Problems Per Day: {}", config.awareness.problems_per_day);
        println!("  Base Rate: {}", config.awareness.base_rate);
        println!("  Solved Scaling: {}", config.awareness.base_solved_scaling);
        let thresholds = &config.awareness.thresholds;
        println!(
            "  Thresholds: white {} / green {} / yellow {} / red {} / dark-red {}",
            thresholds.white,
            thresholds.green,
            thresholds.yellow,
            thresholds.red,
            thresholds.dark_red
        );
    } else {
        println!("Use --show to display configuration");
    }

    Ok(())
}

/// Completions command.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut command = Cli::command();
    clap_complete::generate(shell, &mut command, "codetrack", &mut std::io::stdout());
    Ok(())
}
