//! Command-line interface.
//!
//! This module handles everything between the process boundary and the walker:
//! - Flag parsing
//! - Prompting for paths that were not given as flags
//! - Source validation
//! - Running the walk on its worker thread
//! - Mapping errors to messages and exit codes

use chrono::Utc;
use clap::{ArgAction, Parser};
use log::{debug, error};
use std::any::Any;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use thiserror::Error;

use crate::config::{ConfigError, OrganizerConfig};
use crate::file_organizer::ConflictPolicy;
use crate::output::OutputFormatter;
use crate::report::{ReportError, RunReport, RunSummary};
use crate::walker::{DirectoryWalker, WalkError, WalkOptions};

/// Sort the files of a directory tree into category folders.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "smart-organizer", version)]
#[command(
    long_about = "Recursively moves every regular file under the source directory into \
                  <target>/<Category>/, where the category is chosen from the file's \
                  extension. Paths not given as flags are asked for interactively."
)]
pub struct Cli {
    /// Directory to scan (prompted for when omitted)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Directory that receives the category folders (prompted for when omitted)
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// What to do when a file with the same name already exists in its category
    #[arg(long, value_enum)]
    pub on_conflict: Option<ConflictPolicy>,

    /// Show what would be moved without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON summary of the run to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose diagnostics (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read input: {0}")]
    Input(#[source] io::Error),

    #[error("Source directory does not exist or is not a directory.")]
    InvalidSource { path: PathBuf },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Failed to start worker thread: {0}")]
    WorkerSpawn(#[source] io::Error),

    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),
}

impl CliError {
    /// Process exit status for this error.
    ///
    /// Only failures that happen before any file is touched are fatal.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Input(_) | CliError::InvalidSource { .. } => 1,
            _ => 0,
        }
    }

    /// Prints the error on standard error.
    pub fn report(&self) {
        match self {
            CliError::Input(_) | CliError::InvalidSource { .. } => {
                OutputFormatter::error(&self.to_string());
            }
            _ => {
                error!("run aborted: {self:?}");
                OutputFormatter::error(&format!("An error occurred: {self}"));
            }
        }
    }
}

/// Installs the `log` backend.
///
/// `RUST_LOG` wins over the level picked by the verbosity count.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// Runs one organize pass.
///
/// Paths missing from `cli` are asked for on `prompt` and read from `input`,
/// one line each. The walk itself runs on a dedicated worker thread, which is
/// joined before this returns.
///
/// # Errors
///
/// See [`CliError`]; [`CliError::exit_code`] tells fatal errors apart.
///
/// # Examples
///
/// ```no_run
/// use smart_organizer::cli::{Cli, run};
/// use std::io;
///
/// let cli = Cli::default();
/// let mut input = io::Cursor::new("/home/me/Downloads\n/home/me/Sorted\n");
/// match run(&cli, &mut input, &mut io::stdout()) {
///     Ok(summary) => println!("{} files moved", summary.moved()),
///     Err(e) => e.report(),
/// }
/// ```
pub fn run<R: BufRead, W: Write>(
    cli: &Cli,
    input: &mut R,
    prompt: &mut W,
) -> Result<RunSummary, CliError> {
    let source = match &cli.source {
        Some(path) => path.clone(),
        None => PathBuf::from(read_line(input, prompt, "Enter the source directory: ")?),
    };
    let target = match &cli.target {
        Some(path) => path.clone(),
        None => PathBuf::from(read_line(input, prompt, "Enter the target directory: ")?),
    };

    if !source.is_dir() {
        return Err(CliError::InvalidSource { path: source });
    }

    let config = OrganizerConfig::load(cli.config.as_deref())?;
    let filters = config.compile_filters()?;
    let options = WalkOptions {
        conflict_policy: cli.on_conflict.unwrap_or(config.organize.on_conflict),
        dry_run: cli.dry_run,
    };
    debug!("walk options: {options:?}");

    OutputFormatter::plain("Organizing files...");

    let started_at = Utc::now();
    let walker = DirectoryWalker::new(filters, options);
    let (walk_source, walk_target) = (source.clone(), target.clone());
    let summary = run_on_worker(move || walker.organize(&walk_source, &walk_target))?;

    OutputFormatter::summary_table(&summary.per_category, summary.moved(), summary.failed());
    if summary.skipped > 0 {
        OutputFormatter::info(&format!(
            "{} file(s) excluded by filter rules.",
            summary.skipped
        ));
    }

    if let Some(report_path) = &cli.report {
        RunReport::new(started_at, &source, &target, cli.dry_run, summary.clone())
            .save(report_path)?;
        OutputFormatter::info(&format!("Report written to {}", report_path.display()));
    }

    if summary.failed() > 0 {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be organized. Please review errors above.",
            summary.failed()
        ));
    }

    if cli.dry_run {
        OutputFormatter::success("Dry run complete. No files were modified.");
    } else {
        OutputFormatter::success("Organization complete!");
    }

    Ok(summary)
}

/// Writes `message` and reads one line, without its line ending.
///
/// End of input yields an empty string.
fn read_line<R: BufRead, W: Write>(
    input: &mut R,
    prompt: &mut W,
    message: &str,
) -> Result<String, CliError> {
    write!(prompt, "{message}").map_err(CliError::Input)?;
    prompt.flush().map_err(CliError::Input)?;

    let mut line = String::new();
    input.read_line(&mut line).map_err(CliError::Input)?;

    let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed_len);
    Ok(line)
}

/// Runs `job` on the `organizer` thread and waits for it.
///
/// A panic inside `job` comes back as [`CliError::WorkerPanicked`].
fn run_on_worker<F>(job: F) -> Result<RunSummary, CliError>
where
    F: FnOnce() -> Result<RunSummary, WalkError> + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("organizer".to_string())
        .spawn(job)
        .map_err(CliError::WorkerSpawn)?;

    let summary = handle
        .join()
        .map_err(|payload| CliError::WorkerPanicked(panic_message(payload.as_ref())))??;
    Ok(summary)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_line_strips_line_ending() {
        let mut input = Cursor::new("/tmp/in\r\n/tmp/out\n");
        let mut prompt = Vec::new();

        let first = read_line(&mut input, &mut prompt, "Enter the source directory: ").unwrap();
        let second = read_line(&mut input, &mut prompt, "Enter the target directory: ").unwrap();

        assert_eq!(first, "/tmp/in");
        assert_eq!(second, "/tmp/out");
        assert_eq!(
            String::from_utf8(prompt).unwrap(),
            "Enter the source directory: Enter the target directory: "
        );
    }

    #[test]
    fn test_read_line_keeps_inner_spaces() {
        let mut input = Cursor::new("  My Files \n");
        let line = read_line(&mut input, &mut io::sink(), "> ").unwrap();
        assert_eq!(line, "  My Files ");
    }

    #[test]
    fn test_read_line_at_eof_is_empty() {
        let mut input = Cursor::new("");
        let line = read_line(&mut input, &mut io::sink(), "> ").unwrap();
        assert_eq!(line, "");
    }

    #[test]
    fn test_exit_codes() {
        let invalid = CliError::InvalidSource {
            path: PathBuf::from("/nope"),
        };
        assert_eq!(invalid.exit_code(), 1);
        assert_eq!(
            invalid.to_string(),
            "Source directory does not exist or is not a directory."
        );
        assert_eq!(CliError::Input(io::Error::other("closed")).exit_code(), 1);
        assert_eq!(CliError::WorkerPanicked("boom".into()).exit_code(), 0);
    }

    #[test]
    fn test_panic_message() {
        let payload = thread::spawn(|| panic!("walker exploded")).join().unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "walker exploded");

        let payload = thread::spawn(|| panic!("{} exploded", "walker"))
            .join()
            .unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "walker exploded");
    }

    #[test]
    fn test_worker_panic_becomes_error() {
        let result = run_on_worker(|| panic!("walker exploded"));

        match result {
            Err(CliError::WorkerPanicked(message)) => assert_eq!(message, "walker exploded"),
            other => panic!("expected WorkerPanicked, got {other:?}"),
        }
    }

    #[test]
    fn test_worker_runs_on_named_thread() {
        let summary = run_on_worker(|| {
            assert_eq!(thread::current().name(), Some("organizer"));
            Ok(RunSummary {
                skipped: 3,
                ..Default::default()
            })
        })
        .unwrap();

        assert_eq!(summary.skipped, 3);
    }

    #[test]
    fn test_cli_flags_parse() {
        let cli = Cli::try_parse_from([
            "smart-organizer",
            "--source",
            "in",
            "-t",
            "out",
            "--on-conflict",
            "rename",
            "--dry-run",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.source, Some(PathBuf::from("in")));
        assert_eq!(cli.target, Some(PathBuf::from("out")));
        assert_eq!(cli.on_conflict, Some(ConflictPolicy::Rename));
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_no_flags_is_valid() {
        let cli = Cli::try_parse_from(["smart-organizer"]).unwrap();
        assert!(cli.source.is_none());
        assert!(cli.target.is_none());
        assert!(!cli.dry_run);
    }
}
