//! Subcommand dispatch for the binary.
//!
//! Everything here is presentation: resolve settings, call one library
//! operation, print the result and pick an exit code.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::actions::{TrashManager, TrashOperationResult};
use crate::cli::{
    Cli, Commands, ConfigArgs, DupesArgs, FlaggedBy, OutputFormat, RestoreArgs, TrashArgs,
};
use crate::config::{ConfigError, Settings};
use crate::duplicates::{DuplicateGrouper, Grouping, ModelHandle};
use crate::error::ExitCode;
use crate::logging::init_logging;
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::{BatchScanner, ImageMetrics, ScanCriterion, ScanResult, Score};
use crate::session::TriageSession;

/// Run the parsed command line.
///
/// # Errors
///
/// Returns an error when settings are invalid or an operation cannot start.
/// Per-file failures are reported in the output and the exit code instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet);

    let overrides = cli.command.overrides();
    let settings = Settings::load(cli.config.as_deref(), &overrides)?;
    log::debug!("Effective settings: {:?}", settings);

    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(cli.quiet));
    let out = Output {
        format: cli.output,
        quiet: cli.quiet,
    };

    match &cli.command {
        Commands::Blur(args) => {
            let criterion = settings.blur_criterion();
            run_scan(&settings, &progress, &args.path, criterion, args.all, out)
        }
        Commands::Dark(args) => {
            let criterion = settings.brightness_criterion();
            run_scan(&settings, &progress, &args.path, criterion, args.all, out)
        }
        Commands::Lowres(args) => {
            let criterion = settings.resolution_criterion();
            run_scan(&settings, &progress, &args.path, criterion, args.all, out)
        }
        Commands::Dupes(args) => run_dupes(&settings, &progress, args, out),
        Commands::Trash(args) => run_trash(&settings, &progress, args, out),
        Commands::Restore(args) => run_restore(&settings, args, out),
        Commands::Config(args) => run_config(&settings, cli.config.as_deref(), args),
    }
}

#[derive(Clone, Copy)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    fn json<T: Serialize>(self, value: &T) -> Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        serde_json::to_writer_pretty(&mut lock, value).context("failed to write JSON")?;
        writeln!(lock)?;
        Ok(())
    }

    fn is_json(self) -> bool {
        self.format == OutputFormat::Json
    }
}

fn run_scan(
    settings: &Settings,
    progress: &Arc<dyn ProgressCallback>,
    folder: &Path,
    criterion: ScanCriterion,
    show_all: bool,
    out: Output,
) -> Result<ExitCode> {
    let config = settings
        .scanner_config()
        .with_progress_callback(Arc::clone(progress));
    let scanner = BatchScanner::new(Arc::new(ImageMetrics::new()), config);
    let result = scanner
        .scan(folder, criterion)
        .with_context(|| format!("{} scan of {} failed", criterion.kind(), folder.display()))?;

    if out.is_json() {
        out.json(&result)?;
    } else {
        print_scan(&result, show_all, out.quiet);
    }
    Ok(ExitCode::for_outcome(result.total_flagged, result.failed.len()))
}

fn print_scan(result: &ScanResult, show_all: bool, quiet: bool) {
    if !quiet {
        println!(
            "Flagged {} of {} images ({} unreadable)",
            result.total_flagged,
            result.total_processed,
            result.failed.len()
        );
    }
    let rows = result
        .flagged
        .iter()
        .chain(result.unflagged.iter().filter(|_| show_all));
    for record in rows {
        let marker = if record.flagged { '*' } else { ' ' };
        let value = match record.score {
            Score::Value(v) => format!("{v:>10.2}"),
            Score::Dimensions { width, height } => {
                format!("{:>10}", format!("{width}x{height}"))
            }
        };
        println!("{marker} {value}  {:<12} {}", record.label(), record.path.display());
    }
    if !quiet {
        for path in &result.failed {
            eprintln!("unreadable: {}", path.display());
        }
    }
}

fn run_dupes(
    settings: &Settings,
    progress: &Arc<dyn ProgressCallback>,
    args: &DupesArgs,
    out: Output,
) -> Result<ExitCode> {
    let mut config = settings
        .grouper_config()
        .with_progress_callback(Arc::clone(progress));
    if !args.extensions.is_empty() {
        config.walker = config.walker.with_extensions(args.extensions.iter());
    }

    let grouper = DuplicateGrouper::new(Arc::new(ModelHandle::thumbnail()), config);
    let (store, grouping) = grouper
        .scan(&args.path)
        .with_context(|| format!("duplicate scan of {} failed", args.path.display()))?;
    log::debug!("{} embeddings cached", store.len());

    if out.is_json() {
        out.json(&grouping)?;
    } else {
        print_groups(&grouping, out.quiet);
    }
    Ok(ExitCode::for_outcome(grouping.duplicate_count(), 0))
}

fn print_groups(grouping: &Grouping, quiet: bool) {
    if !quiet {
        println!(
            "{} groups, {} duplicates at similarity >= {:.3}",
            grouping.groups.len(),
            grouping.duplicate_count(),
            grouping.threshold
        );
    }
    for (i, group) in grouping.groups.iter().enumerate() {
        println!("\nGroup {} ({} images)", i + 1, group.len());
        for (j, path) in group.members.iter().enumerate() {
            let score = grouping.score(path).unwrap_or(0.0);
            let tag = if j == 0 { "original" } else { "        " };
            println!("  {tag} {score:.3}  {}", path.display());
        }
    }
}

fn run_trash(
    settings: &Settings,
    progress: &Arc<dyn ProgressCallback>,
    args: &TrashArgs,
    out: Output,
) -> Result<ExitCode> {
    let outcome = match args.flagged {
        None => TrashManager::new(settings.trash_dir_name.clone())
            .move_to_trash(&args.files, &args.path)?,
        Some(kind) => {
            let mut session = TriageSession::new(
                Arc::new(ImageMetrics::new()),
                Arc::new(ModelHandle::thumbnail()),
                settings
                    .scanner_config()
                    .with_progress_callback(Arc::clone(progress)),
                settings
                    .grouper_config()
                    .with_progress_callback(Arc::clone(progress)),
                TrashManager::new(settings.trash_dir_name.clone()),
            );
            session.set_folder(&args.path);

            let selection: Vec<PathBuf> = match kind {
                FlaggedBy::Blur => session.run_scan(settings.blur_criterion())?.flagged_paths(),
                FlaggedBy::Dark => session
                    .run_scan(settings.brightness_criterion())?
                    .flagged_paths(),
                FlaggedBy::Lowres => session
                    .run_scan(settings.resolution_criterion())?
                    .flagged_paths(),
                FlaggedBy::Dupes => session
                    .find_duplicates(settings.similarity_threshold)?
                    .duplicate_paths(),
            };

            if selection.is_empty() {
                if !out.quiet {
                    println!("Nothing to move");
                }
                return Ok(ExitCode::NothingFound);
            }
            session.apply_trash(&selection)?
        }
    };

    report_move(&outcome, out)?;
    Ok(ExitCode::for_outcome(outcome.moved_count, outcome.failed.len()))
}

fn run_restore(settings: &Settings, args: &RestoreArgs, out: Output) -> Result<ExitCode> {
    let manager = TrashManager::new(settings.trash_dir_name.clone());
    let names = if args.all {
        trash_contents(&manager.trash_dir(&args.path))?
    } else {
        args.names.iter().map(OsString::from).collect()
    };
    if names.is_empty() {
        if !out.quiet {
            println!("Trash is empty");
        }
        return Ok(ExitCode::NothingFound);
    }

    let outcome = manager.restore(&names, &args.path)?;
    report_move(&outcome, out)?;
    Ok(ExitCode::for_outcome(outcome.moved_count, outcome.failed.len()))
}

/// File names directly inside the trash directory, sorted.
fn trash_contents(trash: &Path) -> Result<Vec<OsString>> {
    if !trash.is_dir() {
        return Ok(Vec::new());
    }
    let mut names: Vec<OsString> = fs::read_dir(trash)
        .with_context(|| format!("cannot read {}", trash.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.file_name())
        .collect();
    names.sort();
    Ok(names)
}

fn report_move(outcome: &TrashOperationResult, out: Output) -> Result<()> {
    if out.is_json() {
        return out.json(outcome);
    }
    if !out.quiet {
        for moved in &outcome.moved {
            println!("{} -> {}", moved.source.display(), moved.destination.display());
        }
    }
    println!("{}", outcome.summary());
    Ok(())
}

fn run_config(settings: &Settings, explicit: Option<&Path>, args: &ConfigArgs) -> Result<ExitCode> {
    if args.init {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(Settings::default_path)
            .ok_or(ConfigError::NoConfigDir)?;
        settings.save(&path)?;
        println!("Wrote {}", path.display());
    } else {
        print!("{}", settings.to_toml().context("cannot render settings")?);
    }
    Ok(ExitCode::Success)
}
