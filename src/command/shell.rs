use crate::cli::Cli;
use crate::command::script::{HELP, ShellCommand, parse_line};
use crate::config::UndoConfig;
use crate::error::{ErrorClass, Result, UndoError};
use crate::fs::{FsExecutor, FsPayload, LinkMode, path_exists};
use crate::undo::{Direction, Executor, GroupStatus, OperationKind, OperationRecord, UndoLog};

use anyhow::{Context, anyhow};
use colored::Colorize;
use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

/// Whether the read loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Session trash: removed paths are moved here so `rm` can be undone.
///
/// History does not outlive the session, so a trash the session owns is
/// deleted on exit. A user-supplied directory is kept.
#[derive(Debug)]
struct Trash {
    dir: PathBuf,
    next: usize,
    owned: bool,
}

impl Trash {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            next: 0,
            owned: false,
        }
    }

    fn purge(&self) -> io::Result<()> {
        if !self.owned || !path_exists(&self.dir, LinkMode::NoDeref) {
            return Ok(());
        }

        log::debug!("Removing session trash {}", self.dir.display());
        fs::remove_dir_all(&self.dir)
    }

    /// Reserves a unique location for `path` inside the trash.
    ///
    /// The trash directory itself is created by the move into it.
    fn slot(&mut self, path: &Path) -> anyhow::Result<PathBuf> {
        let name = path
            .file_name()
            .ok_or_else(|| anyhow!("Cannot trash {}", path.display()))?;

        loop {
            let slot = self
                .dir
                .join(format!("{:04}_{}", self.next, name.to_string_lossy()));
            self.next += 1;
            if !path_exists(&slot, LinkMode::NoDeref) {
                return Ok(slot);
            }
        }
    }
}

/// One interactive session: a log, the executor used for fresh mutations,
/// and the trash.
pub struct Shell {
    log: UndoLog<FsPayload, FsExecutor>,
    forward: FsExecutor,
    trash: Trash,
    cwd: PathBuf,
}

impl Shell {
    pub fn new(config: UndoConfig, dry_run: bool, trash_dir: PathBuf) -> Self {
        Self {
            // In dry run the recorded steps never happened on disk
            log: UndoLog::new(FsExecutor::new(dry_run).simulated(), config),
            forward: FsExecutor::new(dry_run),
            trash: Trash::new(trash_dir),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Deletes the trash directory in [`finish`](Self::finish).
    pub fn discard_trash_on_exit(mut self) -> Self {
        self.trash.owned = true;
        self
    }

    pub fn log(&self) -> &UndoLog<FsPayload, FsExecutor> {
        &self.log
    }

    pub fn trash_dir(&self) -> &Path {
        &self.trash.dir
    }

    /// Ends the session, warning about an uncommitted group and removing an
    /// owned trash.
    pub fn finish(self) -> Result<()> {
        if self.log.is_group_open() {
            log::warn!("Input ended inside an open group; it was not committed");
        }

        self.trash.purge()?;
        Ok(())
    }

    /// Runs one line, reporting failures on stderr instead of stopping.
    pub fn execute_line(&mut self, line: &str) -> Flow {
        let cmd = match parse_line(line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return Flow::Continue,
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                return Flow::Continue;
            }
        };

        match self.execute(cmd) {
            Ok(flow) => flow,
            Err(e) => {
                report(&e);
                Flow::Continue
            }
        }
    }

    pub fn execute(&mut self, cmd: ShellCommand) -> Result<Flow> {
        match cmd {
            ShellCommand::Move(src, dst) => {
                let message = format!(
                    "move {} to {}",
                    self.display_path(&src),
                    self.display_path(&dst)
                );
                self.mutate(message, record(OperationKind::Move, FsPayload::Empty, &src, &dst)?)?;
            }
            ShellCommand::Copy(src, dst) => {
                let message = format!(
                    "copy {} to {}",
                    self.display_path(&src),
                    self.display_path(&dst)
                );
                self.mutate(message, record(OperationKind::Copy, FsPayload::Empty, &src, &dst)?)?;
            }
            ShellCommand::Remove(path) => {
                let slot = self.trash.slot(&path)?;
                let message = format!("delete {}", self.display_path(&path));
                self.mutate(message, record(OperationKind::Move, FsPayload::Empty, &path, &slot)?)?;
            }
            ShellCommand::Mkdir(dir) => {
                let message = format!("mkdir {}", self.display_path(&dir));
                self.mutate(message, record(OperationKind::Mkdir, FsPayload::Empty, &dir, &dir)?)?;
            }
            ShellCommand::Rmdir(dir) => {
                let message = format!("rmdir {}", self.display_path(&dir));
                self.mutate(message, record(OperationKind::Rmdir, FsPayload::Empty, &dir, &dir)?)?;
            }
            ShellCommand::Link { target, link } => {
                let message = format!(
                    "symlink {} to {}",
                    self.display_path(&link),
                    self.display_path(&target)
                );
                let step = record(OperationKind::SymlinkCreate, FsPayload::Empty, &target, &link)?;
                self.mutate(message, step)?;
            }
            ShellCommand::Chmod { mode, path } => {
                let payload = FsPayload::Mode {
                    old: current_mode(&path)?,
                    new: mode,
                };
                let message = format!("chmod {:o} {}", mode, self.display_path(&path));
                let step = record(OperationKind::PermissionsChange, payload, &path, &path)?;
                self.mutate(message, step)?;
            }
            ShellCommand::Begin(message) => self.log.begin_group(message)?,
            ShellCommand::Continue => {
                self.log.continue_group()?;
                println!("Continuing: {}", self.log.open_message().unwrap_or_default());
            }
            ShellCommand::End => {
                if self.log.end_group()? == GroupStatus::Empty {
                    println!("{}", "Nothing recorded".yellow());
                }
            }
            ShellCommand::Undo => {
                let message = self.log.undo_message().unwrap_or_default().to_string();
                self.log.undo()?;
                println!("{} {}", "Undone:".green(), message);
            }
            ShellCommand::Redo => {
                let message = self.log.redo_message().unwrap_or_default().to_string();
                self.log.redo()?;
                println!("{} {}", "Redone:".green(), message);
            }
            ShellCommand::History { detailed } => self.print_history(detailed),
            ShellCommand::Levels(n) => {
                self.log.configure(n)?;
                println!("Keeping {} group(s)", n);
            }
            ShellCommand::Exists(path) => {
                let found = path_exists(&path, LinkMode::Deref);
                println!("{}: {}", self.display_path(&path), found);
            }
            ShellCommand::Reset => self.log.reset(),
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    /// Performs a mutation and records it.
    ///
    /// Outside an explicit `begin`/`end` pair the mutation gets a group of its own.
    fn mutate(&mut self, message: String, record: OperationRecord<FsPayload>) -> Result<()> {
        let implicit = !self.log.is_group_open();
        if implicit {
            self.log.begin_group(message)?;
        }

        let (primary, secondary) = record.paths(Direction::Redo);
        let result = self
            .forward
            .apply(Direction::Redo, record.kind, &record.payload, primary, secondary)
            .map_err(UndoError::from)
            .and_then(|()| {
                self.log.add_operation(
                    record.kind,
                    record.payload,
                    record.do_description,
                    record.undo_description,
                )
            });

        if implicit {
            self.log.end_group()?;
        }

        result
    }

    fn print_history(&self, detailed: bool) {
        let lines = self.log.listing(detailed);
        if lines.is_empty() {
            println!("{}", "History is empty".yellow());
            return;
        }

        // Everything above the cursor line has been undone
        let pos = self.log.listing_position(detailed);
        for (idx, line) in lines.iter().enumerate() {
            if idx < pos {
                println!("  {}", line.dimmed());
            } else if idx == pos {
                println!("{} {}", ">".cyan().bold(), line);
            } else {
                println!("  {}", line);
            }
        }

        let stats = self.log.stats();
        println!(
            "\n{} group{} ({} undoable, {} redoable), {} operation{}",
            stats.groups.to_string().cyan().bold(),
            if stats.groups == 1 { "" } else { "s" },
            stats.undoable,
            stats.redoable,
            stats.operations,
            if stats.operations == 1 { "" } else { "s" }
        );
    }

    /// Shows `path` relative to the working directory, with forward slashes.
    fn display_path(&self, path: &Path) -> String {
        let relative = if path.is_absolute() {
            pathdiff::diff_paths(path, &self.cwd).unwrap_or_else(|| path.to_path_buf())
        } else {
            path.to_path_buf()
        };
        relative.to_string_lossy().replace('\\', "/")
    }
}

fn record(
    kind: OperationKind,
    payload: FsPayload,
    do_path: &Path,
    undo_path: &Path,
) -> Result<OperationRecord<FsPayload>> {
    Ok(OperationRecord::new(
        kind,
        payload,
        path_str(do_path)?,
        path_str(undo_path)?,
    ))
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| UndoError::Other(anyhow!("Path is not valid UTF-8: {}", path.display())))
}

#[cfg(unix)]
fn current_mode(path: &Path) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::metadata(path)?.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn current_mode(path: &Path) -> Result<u32> {
    Err(UndoError::Other(anyhow!(
        "Permission bits are not supported here: {}",
        path.display()
    )))
}

fn report(err: &UndoError) {
    match err.class() {
        ErrorClass::Navigation => eprintln!("{}", err.to_string().yellow()),
        ErrorClass::Execution => {
            eprintln!("{} {}", "Error:".red().bold(), err);
            eprintln!("{}", "The group stays in place; fix the cause and retry.".yellow());
        }
        ErrorClass::Structural | ErrorClass::Internal => {
            eprintln!("{} {}", "Error:".red().bold(), err)
        }
    }
}

/// Runs the shell over a script file or stdin.
pub fn execute(cli: Cli) -> Result<()> {
    let config = UndoConfig::new(cli.undo_levels)?;
    let mut shell = match &cli.trash_dir {
        Some(dir) => Shell::new(config, cli.dry_run, dir.clone()),
        None => {
            let dir =
                std::env::temp_dir().join(format!("fs-undo-trash-{}", std::process::id()));
            Shell::new(config, cli.dry_run, dir).discard_trash_on_exit()
        }
    };
    log::debug!("Trash directory: {}", shell.trash_dir().display());

    if cli.dry_run {
        println!("{}", "DRY RUN - No changes will be made".yellow().bold());
    }

    let input: Box<dyn BufRead> = match &cli.script {
        Some(path) => Box::new(io::BufReader::new(fs::File::open(path).with_context(
            || format!("Failed to open script {}", path.display()),
        )?)),
        None => Box::new(io::stdin().lock()),
    };
    let interactive = cli.script.is_none() && io::stdin().is_terminal();

    let read = read_loop(&mut shell, input, interactive);
    shell.finish()?;
    read
}

fn read_loop(shell: &mut Shell, input: Box<dyn BufRead>, interactive: bool) -> Result<()> {
    prompt(interactive)?;
    for line in input.lines() {
        if shell.execute_line(&line?) == Flow::Quit {
            break;
        }
        prompt(interactive)?;
    }
    Ok(())
}

fn prompt(interactive: bool) -> Result<()> {
    if interactive {
        print!("{} ", "fs-undo>".cyan());
        io::stdout().flush()?;
    }
    Ok(())
}
