use crate::config::DEFAULT_UNDO_LEVELS;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Interactive file operations with grouped undo and redo.
///
/// Reads one command per line from SCRIPT, or from stdin when no script is
/// given. Type `help` for the command list.
#[derive(Parser, Debug, Clone)]
#[command(name = "fs-undo", version, about, verbatim_doc_comment)]
pub struct Cli {
    /// File to read commands from (defaults to stdin)
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,

    /// Number of command groups kept in history
    #[arg(
        long,
        value_name = "N",
        env = "FS_UNDO_LEVELS",
        default_value_t = DEFAULT_UNDO_LEVELS
    )]
    pub undo_levels: usize,

    /// Directory that receives removed files so they can be restored.
    ///
    /// A directory given here is kept after exit, including files whose
    /// history was evicted or reset. Without it a per-session directory
    /// under the system temp dir is used and deleted on exit.
    #[arg(long, value_name = "DIR", verbatim_doc_comment)]
    pub trash_dir: Option<PathBuf>,

    /// Check and log every step without touching the file system
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }

        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
