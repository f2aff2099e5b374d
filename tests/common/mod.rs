//! Shared helpers for fs-undo integration tests.

use assert_cmd::cargo::cargo_bin_cmd;
use fs_undo::undo::{Direction, Executor, OperationKind, UndoLog};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Executor that remembers the primary path of every successful step.
///
/// Clones share state, so a test can keep one handle while the log owns another.
#[derive(Clone, Default)]
#[allow(unused)]
pub struct Recorder {
    seen: Rc<RefCell<Vec<String>>>,
    fail_on: Rc<RefCell<Option<String>>>,
}

#[allow(unused)]
impl Recorder {
    pub fn seen(&self) -> Vec<String> {
        self.seen.borrow().clone()
    }

    pub fn clear(&self) {
        self.seen.borrow_mut().clear();
    }

    /// Makes every step whose primary path is `primary` fail.
    pub fn fail_on(&self, primary: &str) {
        *self.fail_on.borrow_mut() = Some(primary.to_string());
    }

    pub fn stop_failing(&self) {
        *self.fail_on.borrow_mut() = None;
    }
}

impl Executor<()> for Recorder {
    fn apply(
        &mut self,
        _direction: Direction,
        kind: OperationKind,
        _payload: &(),
        primary: &str,
        _secondary: &str,
    ) -> anyhow::Result<()> {
        if kind == OperationKind::None {
            return Ok(());
        }

        if self.fail_on.borrow().as_deref() == Some(primary) {
            anyhow::bail!("refusing {}", primary);
        }

        self.seen.borrow_mut().push(primary.to_string());
        Ok(())
    }
}

/// Creates a log with `depth` levels and a handle on its recorder.
#[allow(unused)]
pub fn recording_log(depth: usize) -> (UndoLog<(), Recorder>, Recorder) {
    let recorder = Recorder::default();
    let log = UndoLog::with_depth(recorder.clone(), depth).unwrap();
    (log, recorder)
}

/// Commits one group whose records use `do_X` / `undo_X` descriptions.
#[allow(unused)]
pub fn commit_group(log: &mut UndoLog<(), Recorder>, message: &str, steps: &[&str]) {
    log.begin_group(message).unwrap();
    for step in steps {
        log.add_operation(
            OperationKind::Move,
            (),
            format!("do_{}", step),
            format!("undo_{}", step),
        )
        .unwrap();
    }
    log.end_group().unwrap();
}

/// Runs the binary in `dir`, feeding `script` on stdin.
#[allow(unused)]
pub fn run_shell(dir: &Path, script: &str, extra_args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = cargo_bin_cmd!("fs-undo");
    cmd.arg("--trash-dir")
        .arg(dir.join(".trash"))
        .args(extra_args)
        .current_dir(dir)
        .env_remove("FS_UNDO_LEVELS")
        .write_stdin(script);

    cmd.assert()
}
