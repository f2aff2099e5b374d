//! Parsing of shell command lines.

use anyhow::{Context, bail};
use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  mv SRC DST        move or rename
  cp SRC DST        copy a file or directory tree
  rm PATH           move PATH to the trash
  mkdir DIR         create a directory
  rmdir DIR         remove an empty directory
  ln TARGET LINK    create a symbolic link
  chmod MODE PATH   change permission bits (octal)
  begin MESSAGE     start a group; mutations join it until `end`
  continue          reopen the last undoable group
  end               close the current group
  undo | redo       reverse or replay one group
  history[!]        list groups, `!` shows every step
  levels N          change the number of groups kept
  exists PATH       check a path (follows links)
  reset             forget all history
  help | quit

Paths with spaces go in quotes: mv \"old name\" 'new name'";

/// One parsed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Move(PathBuf, PathBuf),
    Copy(PathBuf, PathBuf),
    Remove(PathBuf),
    Mkdir(PathBuf),
    Rmdir(PathBuf),
    Link { target: PathBuf, link: PathBuf },
    Chmod { mode: u32, path: PathBuf },
    Begin(String),
    Continue,
    End,
    Undo,
    Redo,
    History { detailed: bool },
    Levels(usize),
    Exists(PathBuf),
    Reset,
    Help,
    Quit,
}

/// Parses one line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<ShellCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    // The group message is free text, quotes included
    if verb == "begin" {
        if rest.is_empty() {
            bail!("begin: missing message");
        }
        return Ok(Some(ShellCommand::Begin(rest.to_string())));
    }

    let owned = split_args(rest)?;
    let args: Vec<&str> = owned.iter().map(String::as_str).collect();

    let cmd = match verb {
        "mv" => {
            let [src, dst] = exactly::<2>(verb, &args)?;
            ShellCommand::Move(src.into(), dst.into())
        }
        "cp" => {
            let [src, dst] = exactly::<2>(verb, &args)?;
            ShellCommand::Copy(src.into(), dst.into())
        }
        "rm" => ShellCommand::Remove(exactly::<1>(verb, &args)?[0].into()),
        "mkdir" => ShellCommand::Mkdir(exactly::<1>(verb, &args)?[0].into()),
        "rmdir" => ShellCommand::Rmdir(exactly::<1>(verb, &args)?[0].into()),
        "ln" => {
            let [target, link] = exactly::<2>(verb, &args)?;
            ShellCommand::Link {
                target: target.into(),
                link: link.into(),
            }
        }
        "chmod" => {
            let [mode, path] = exactly::<2>(verb, &args)?;
            let mode = u32::from_str_radix(mode, 8)
                .with_context(|| format!("Invalid octal mode '{}'", mode))?;
            if mode > 0o7777 {
                bail!("Mode out of range: {:o}", mode);
            }
            ShellCommand::Chmod {
                mode,
                path: path.into(),
            }
        }
        "continue" => no_args(verb, &args, ShellCommand::Continue)?,
        "end" => no_args(verb, &args, ShellCommand::End)?,
        "undo" | "u" => no_args(verb, &args, ShellCommand::Undo)?,
        "redo" => no_args(verb, &args, ShellCommand::Redo)?,
        "history" => no_args(verb, &args, ShellCommand::History { detailed: false })?,
        "history!" => no_args(verb, &args, ShellCommand::History { detailed: true })?,
        "levels" => {
            let [n] = exactly::<1>(verb, &args)?;
            let n = n
                .parse()
                .with_context(|| format!("Invalid number of levels '{}'", n))?;
            ShellCommand::Levels(n)
        }
        "exists" => ShellCommand::Exists(exactly::<1>(verb, &args)?[0].into()),
        "reset" => no_args(verb, &args, ShellCommand::Reset)?,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => bail!("Unknown command '{}' (try `help`)", other),
    };

    Ok(Some(cmd))
}

/// Splits arguments on whitespace, honouring single and double quotes.
///
/// Single quotes are literal. Inside double quotes `\"` and `\\` are escapes.
fn split_args(input: &str) -> anyhow::Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some(q) if q == c => break,
                        Some('\\') if c == '"' => match chars.next() {
                            Some(e @ ('"' | '\\')) => current.push(e),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => bail!("Unterminated quote in '{}'", input),
                        },
                        Some(other) => current.push(other),
                        None => bail!("Unterminated quote in '{}'", input),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            other => {
                in_word = true;
                current.push(other);
            }
        }
    }

    if in_word {
        args.push(current);
    }
    Ok(args)
}

fn exactly<'a, const N: usize>(verb: &str, args: &[&'a str]) -> anyhow::Result<[&'a str; N]> {
    match <[&str; N]>::try_from(args) {
        Ok(args) => Ok(args),
        Err(_) => bail!(
            "{}: expected {} argument{}, got {}",
            verb,
            N,
            if N == 1 { "" } else { "s" },
            args.len()
        ),
    }
}

fn no_args(verb: &str, args: &[&str], cmd: ShellCommand) -> anyhow::Result<ShellCommand> {
    exactly::<0>(verb, args)?;
    Ok(cmd)
}
