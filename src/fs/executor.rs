//! Executor backed by the real file system.
//!
//! ## Step Semantics
//!
//! `a` is the primary path, `b` the secondary one (see [`Executor::apply`]).
//!
//! | Kind | Redo | Undo |
//! |------|------|------|
//! | Move | rename `a` → `b` | rename `a` → `b` |
//! | Copy | copy `a` → `b` | remove `a` |
//! | Remove | remove `a` | not possible |
//! | Mkdir | create dir `a` | remove empty dir `a` |
//! | Rmdir | remove empty dir `a` | create dir `a` |
//! | SymlinkCreate | link `b` → `a` | remove link `a` |
//! | PermissionsChange | set `new` mode on `a` | set `old` mode on `a` |
//!
//! Each step checks its own preconditions against the current state before
//! touching anything, so a failing step leaves the file system as it found it.

use crate::fs::exists::{LinkMode, path_exists};
use crate::undo::{Direction, Executor, OperationKind};

use anyhow::{Context, bail};
use std::fs;
use std::path::Path;

/// Caller data attached to a file system record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FsPayload {
    #[default]
    Empty,
    /// Permission bits before and after a permissions change.
    Mode { old: u32, new: u32 },
}

/// Applies records with `std::fs`.
///
/// ## Dry-Run Mode
///
/// When `dry_run = true`, preconditions are checked and the step is logged,
/// but nothing is changed.
///
/// A [`simulated`](Self::simulated) dry-run executor also skips the checks.
/// Undo and redo of dry-run history replay steps that never reached the disk,
/// so the real file system cannot confirm them.
#[derive(Debug, Clone, Default)]
pub struct FsExecutor {
    dry_run: bool,
    simulated: bool,
}

impl FsExecutor {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            simulated: false,
        }
    }

    /// Stops checking preconditions while in dry run. No effect otherwise.
    pub fn simulated(mut self) -> Self {
        self.simulated = true;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn checks(&self) -> bool {
        !(self.dry_run && self.simulated)
    }

    fn ensure_present(&self, path: &Path) -> anyhow::Result<()> {
        if self.checks() && !path_exists(path, LinkMode::NoDeref) {
            bail!("Path does not exist: {}", path.display());
        }
        Ok(())
    }

    fn ensure_absent(&self, path: &Path) -> anyhow::Result<()> {
        if self.checks() && path_exists(path, LinkMode::NoDeref) {
            bail!("Target already exists: {}", path.display());
        }
        Ok(())
    }

    /// Moves `from` to `to`, creating missing parents of `to`.
    ///
    /// Falls back to copy+delete across file systems.
    fn move_path(&self, from: &Path, to: &Path) -> anyhow::Result<()> {
        self.ensure_present(from)?;
        self.ensure_absent(to)?;

        if self.dry_run {
            log::info!("Would move: {} → {}", from.display(), to.display());
            return Ok(());
        }

        if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        if is_same_filesystem(from, to)? {
            fs::rename(from, to).with_context(|| {
                format!("Failed to move {} → {}", from.display(), to.display())
            })?;
        } else {
            copy_recursive(from, to)?;
            remove_recursive(from)?;
        }

        log::info!("Moved: {} → {}", from.display(), to.display());
        Ok(())
    }

    fn copy_path(&self, from: &Path, to: &Path) -> anyhow::Result<()> {
        self.ensure_present(from)?;
        self.ensure_absent(to)?;

        if self.dry_run {
            log::info!("Would copy: {} → {}", from.display(), to.display());
            return Ok(());
        }

        copy_recursive(from, to)?;
        log::info!("Copied: {} → {}", from.display(), to.display());
        Ok(())
    }

    fn remove_path(&self, path: &Path) -> anyhow::Result<()> {
        self.ensure_present(path)?;

        if self.dry_run {
            log::info!("Would remove: {}", path.display());
            return Ok(());
        }

        remove_recursive(path)?;
        log::info!("Removed: {}", path.display());
        Ok(())
    }

    fn make_dir(&self, path: &Path) -> anyhow::Result<()> {
        self.ensure_absent(path)?;

        if self.dry_run {
            log::info!("Would create directory: {}", path.display());
            return Ok(());
        }

        fs::create_dir(path).with_context(|| format!("Failed to create {}", path.display()))?;
        log::info!("Created directory: {}", path.display());
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> anyhow::Result<()> {
        self.ensure_present(path)?;

        if self.dry_run {
            log::info!("Would remove directory: {}", path.display());
            return Ok(());
        }

        fs::remove_dir(path).with_context(|| format!("Failed to remove {}", path.display()))?;
        log::info!("Removed directory: {}", path.display());
        Ok(())
    }

    fn create_link(&self, target: &Path, link: &Path) -> anyhow::Result<()> {
        self.ensure_absent(link)?;

        if self.dry_run {
            log::info!("Would link: {} → {}", link.display(), target.display());
            return Ok(());
        }

        symlink(target, link)?;
        log::info!("Linked: {} → {}", link.display(), target.display());
        Ok(())
    }

    fn remove_link(&self, link: &Path) -> anyhow::Result<()> {
        if self.checks() {
            let meta = fs::symlink_metadata(link)
                .with_context(|| format!("Link does not exist: {}", link.display()))?;
            if !meta.file_type().is_symlink() {
                bail!("Not a symbolic link: {}", link.display());
            }
        }

        if self.dry_run {
            log::info!("Would remove link: {}", link.display());
            return Ok(());
        }

        fs::remove_file(link).with_context(|| format!("Failed to remove {}", link.display()))?;
        log::info!("Removed link: {}", link.display());
        Ok(())
    }

    fn set_mode(&self, path: &Path, mode: u32) -> anyhow::Result<()> {
        self.ensure_present(path)?;

        if self.dry_run {
            log::info!("Would set mode {:o} on {}", mode, path.display());
            return Ok(());
        }

        set_permissions(path, mode)?;
        log::info!("Set mode {:o} on {}", mode, path.display());
        Ok(())
    }
}

impl Executor<FsPayload> for FsExecutor {
    fn apply(
        &mut self,
        direction: Direction,
        kind: OperationKind,
        payload: &FsPayload,
        primary: &str,
        secondary: &str,
    ) -> anyhow::Result<()> {
        let a = Path::new(primary);
        let b = Path::new(secondary);

        match (kind, direction) {
            (OperationKind::None, _) => Ok(()),
            (OperationKind::Move, _) => self.move_path(a, b),
            (OperationKind::Copy, Direction::Redo) => self.copy_path(a, b),
            (OperationKind::Copy, Direction::Undo) => self.remove_path(a),
            (OperationKind::Remove, Direction::Redo) => self.remove_path(a),
            (OperationKind::Remove, Direction::Undo) => {
                bail!("Cannot restore permanently removed {}", a.display())
            }
            (OperationKind::Mkdir, Direction::Redo) | (OperationKind::Rmdir, Direction::Undo) => {
                self.make_dir(a)
            }
            (OperationKind::Mkdir, Direction::Undo) | (OperationKind::Rmdir, Direction::Redo) => {
                self.remove_dir(a)
            }
            (OperationKind::SymlinkCreate, Direction::Redo) => self.create_link(a, b),
            (OperationKind::SymlinkCreate, Direction::Undo) => self.remove_link(a),
            (OperationKind::PermissionsChange, _) => match (payload, direction) {
                (FsPayload::Mode { old, .. }, Direction::Undo) => self.set_mode(a, *old),
                (FsPayload::Mode { new, .. }, Direction::Redo) => self.set_mode(a, *new),
                (FsPayload::Empty, _) => {
                    bail!("Permissions change on {} has no mode", a.display())
                }
            },
        }
    }
}

/// Checks if paths are on same filesystem.
///
/// Determines if atomic `rename()` is possible, or if cross-filesystem
/// copy+delete is required.
fn is_same_filesystem(from: &Path, to: &Path) -> anyhow::Result<bool> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let from_meta = fs::symlink_metadata(from)?;
        let to_parent = match to.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let to_meta = fs::metadata(to_parent)?;
        Ok(from_meta.dev() == to_meta.dev())
    }

    #[cfg(not(unix))]
    {
        let from_str = from.to_string_lossy();
        let to_str = to.to_string_lossy();

        if from_str.len() >= 2 && to_str.len() >= 2 {
            Ok(from_str.chars().next() == to_str.chars().next())
        } else {
            Ok(true)
        }
    }
}

/// Recursively copies a file, link or directory tree.
fn copy_recursive(from: &Path, to: &Path) -> anyhow::Result<()> {
    let file_type = fs::symlink_metadata(from)?.file_type();

    if file_type.is_symlink() {
        let target = fs::read_link(from)?;
        return symlink(&target, to);
    }

    if !file_type.is_dir() {
        fs::copy(from, to).with_context(|| {
            format!("Failed to copy {} → {}", from.display(), to.display())
        })?;
        return Ok(());
    }

    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
    }

    Ok(())
}

fn remove_recursive(path: &Path) -> anyhow::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.with_context(|| format!("Failed to remove {}", path.display()))
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> anyhow::Result<()> {
    std::os::unix::fs::symlink(target, link)
        .with_context(|| format!("Failed to link {} → {}", link.display(), target.display()))
}

#[cfg(not(unix))]
fn symlink(_target: &Path, link: &Path) -> anyhow::Result<()> {
    bail!("Symbolic links are not supported here: {}", link.display())
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to change mode of {}", path.display()))
}

#[cfg(not(unix))]
fn set_permissions(path: &Path, _mode: u32) -> anyhow::Result<()> {
    bail!("Permission bits are not supported here: {}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run(
        exec: &mut FsExecutor,
        direction: Direction,
        kind: OperationKind,
        a: &Path,
        b: &Path,
    ) -> anyhow::Result<()> {
        exec.apply(
            direction,
            kind,
            &FsPayload::Empty,
            a.to_str().unwrap(),
            b.to_str().unwrap(),
        )
    }

    #[test]
    fn test_none_kind_is_a_probe() {
        let mut exec = FsExecutor::new(false);
        exec.apply(
            Direction::Undo,
            OperationKind::None,
            &FsPayload::Empty,
            "/definitely/not/here",
            "",
        )
        .unwrap();
    }

    #[test]
    fn test_move_both_ways() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a.txt");
        let to = temp.path().join("nested/b.txt");
        fs::write(&from, "content").unwrap();

        let mut exec = FsExecutor::new(false);
        run(&mut exec, Direction::Redo, OperationKind::Move, &from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "content");

        run(&mut exec, Direction::Undo, OperationKind::Move, &to, &from).unwrap();
        assert!(from.exists());
        assert!(!to.exists());
    }

    #[test]
    fn test_move_refuses_existing_target() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a");
        let to = temp.path().join("b");
        fs::write(&from, "a").unwrap();
        fs::write(&to, "b").unwrap();

        let mut exec = FsExecutor::new(false);
        let result = run(&mut exec, Direction::Redo, OperationKind::Move, &from, &to);
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&to).unwrap(), "b");
    }

    #[test]
    fn test_copy_directory_and_undo() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("src");
        let to = temp.path().join("dst");
        fs::create_dir_all(from.join("inner")).unwrap();
        fs::write(from.join("inner/file.txt"), "x").unwrap();

        let mut exec = FsExecutor::new(false);
        run(&mut exec, Direction::Redo, OperationKind::Copy, &from, &to).unwrap();
        assert_eq!(fs::read_to_string(to.join("inner/file.txt")).unwrap(), "x");
        assert!(from.exists());

        run(&mut exec, Direction::Undo, OperationKind::Copy, &to, &from).unwrap();
        assert!(!to.exists());
        assert!(from.exists());
    }

    #[test]
    fn test_remove_cannot_be_undone() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("gone");

        let mut exec = FsExecutor::new(false);
        let result = run(&mut exec, Direction::Undo, OperationKind::Remove, &file, &file);
        assert!(result.is_err());
    }

    #[test]
    fn test_mkdir_and_rmdir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("d");

        let mut exec = FsExecutor::new(false);
        run(&mut exec, Direction::Redo, OperationKind::Mkdir, &dir, &dir).unwrap();
        assert!(dir.is_dir());
        run(&mut exec, Direction::Undo, OperationKind::Mkdir, &dir, &dir).unwrap();
        assert!(!dir.exists());
        run(&mut exec, Direction::Undo, OperationKind::Rmdir, &dir, &dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a");
        let to = temp.path().join("b");
        fs::write(&from, "a").unwrap();

        let mut exec = FsExecutor::new(true);
        assert!(exec.is_dry_run());
        run(&mut exec, Direction::Redo, OperationKind::Move, &from, &to).unwrap();
        assert!(from.exists());
        assert!(!to.exists());

        // Preconditions still apply
        let missing = temp.path().join("missing");
        assert!(run(&mut exec, Direction::Redo, OperationKind::Move, &missing, &to).is_err());
    }

    #[test]
    fn test_simulated_replay_skips_checks() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a");
        let to = temp.path().join("b");
        fs::write(&from, "a").unwrap();

        // `b` never existed: the forward move was only simulated
        let mut replay = FsExecutor::new(true).simulated();
        run(&mut replay, Direction::Undo, OperationKind::Move, &to, &from).unwrap();
        run(&mut replay, Direction::Redo, OperationKind::Move, &from, &to).unwrap();
        run(&mut replay, Direction::Undo, OperationKind::Mkdir, &to, &to).unwrap();
        assert!(from.exists());
        assert!(!to.exists());
    }

    #[test]
    fn test_simulated_has_no_effect_outside_dry_run() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");
        let to = temp.path().join("b");

        let mut exec = FsExecutor::new(false).simulated();
        assert!(run(&mut exec, Direction::Redo, OperationKind::Move, &missing, &to).is_err());
    }

    #[test]
    fn test_remove_file_and_tree() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("loose.txt");
        let tree = temp.path().join("tree");
        fs::write(&file, "x").unwrap();
        fs::create_dir_all(tree.join("a/b")).unwrap();
        fs::write(tree.join("a/b/deep.txt"), "y").unwrap();
        fs::write(tree.join("top.txt"), "z").unwrap();

        let mut exec = FsExecutor::new(false);
        run(&mut exec, Direction::Redo, OperationKind::Remove, &file, &file).unwrap();
        assert!(!file.exists());

        run(&mut exec, Direction::Redo, OperationKind::Remove, &tree, &tree).unwrap();
        assert!(!tree.exists());

        // Already gone
        assert!(run(&mut exec, Direction::Redo, OperationKind::Remove, &tree, &tree).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_link_keeps_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("dir");
        let link = temp.path().join("link");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("kept.txt"), "k").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let mut exec = FsExecutor::new(false);
        run(&mut exec, Direction::Redo, OperationKind::Remove, &link, &link).unwrap();
        assert!(!path_exists(&link, LinkMode::NoDeref));
        assert!(target.join("kept.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_create_and_remove() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target");
        let link = temp.path().join("link");
        fs::write(&target, "t").unwrap();

        let mut exec = FsExecutor::new(false);
        run(&mut exec, Direction::Redo, OperationKind::SymlinkCreate, &target, &link).unwrap();
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());

        run(&mut exec, Direction::Undo, OperationKind::SymlinkCreate, &link, &target).unwrap();
        assert!(!path_exists(&link, LinkMode::NoDeref));
        assert!(target.exists());

        // Refuses to treat a regular file as a link
        let result = run(&mut exec, Direction::Undo, OperationKind::SymlinkCreate, &target, &link);
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_follow_direction() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f");
        fs::write(&file, "").unwrap();
        let path = file.to_str().unwrap();
        let payload = FsPayload::Mode {
            old: 0o644,
            new: 0o600,
        };

        let mut exec = FsExecutor::new(false);
        exec.apply(Direction::Redo, OperationKind::PermissionsChange, &payload, path, path)
            .unwrap();
        assert_eq!(fs::metadata(&file).unwrap().permissions().mode() & 0o777, 0o600);

        exec.apply(Direction::Undo, OperationKind::PermissionsChange, &payload, path, path)
            .unwrap();
        assert_eq!(fs::metadata(&file).unwrap().permissions().mode() & 0o777, 0o644);
    }
}
