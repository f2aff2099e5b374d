//! End-to-end tests of the fs-undo binary.

mod common;

use common::*;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_move_undo_redo() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("a.txt"), "hello").unwrap();

    run_shell(root, "mv a.txt b.txt\nundo\n", &[])
        .success()
        .stdout(predicate::str::contains("Undone: move a.txt to b.txt"));
    assert!(root.join("a.txt").exists());
    assert!(!root.join("b.txt").exists());

    // A new session has no history of the old one
    run_shell(root, "redo\n", &[])
        .success()
        .stderr(predicate::str::contains("Nothing to redo"));
}

#[test]
fn test_group_undoes_as_one() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("one"), "1").unwrap();
    fs::write(root.join("two"), "2").unwrap();

    let script = "\
begin archive both
mkdir archive
mv one archive/one
mv two archive/two
end
undo
";
    run_shell(root, script, &[])
        .success()
        .stdout(predicate::str::contains("Undone: archive both"));

    assert!(root.join("one").exists());
    assert!(root.join("two").exists());
    assert!(!root.join("archive").exists());
}

#[test]
fn test_rm_restored_from_trash() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("notes.md"), "keep").unwrap();

    run_shell(root, "rm notes.md\nexists notes.md\nundo\n", &[])
        .success()
        .stdout(predicate::str::contains("notes.md: false"));

    assert_eq!(fs::read_to_string(root.join("notes.md")).unwrap(), "keep");
}

#[test]
fn test_history_listing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    run_shell(root, "mkdir a\nmkdir b\nundo\nhistory\n", &[])
        .success()
        .stdout(predicate::str::contains("mkdir b"))
        .stdout(predicate::str::contains("> mkdir a"))
        .stdout(predicate::str::contains("1 undoable, 1 redoable"));
}

#[test]
fn test_undo_levels_limit() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    run_shell(
        root,
        "mkdir a\nmkdir b\nmkdir c\nundo\nundo\nundo\n",
        &["--undo-levels", "2"],
    )
    .success()
    .stderr(predicate::str::contains("Nothing to undo"));

    // Only b and c were undone
    assert!(root.join("a").exists());
    assert!(!root.join("b").exists());
    assert!(!root.join("c").exists());
}

#[test]
fn test_zero_undo_levels_rejected() {
    let temp = TempDir::new().unwrap();
    run_shell(temp.path(), "", &["--undo-levels", "0"])
        .failure()
        .stderr(predicate::str::contains("Invalid history depth"));
}

#[test]
fn test_dry_run_does_not_modify() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("a.txt"), "x").unwrap();

    run_shell(root, "mv a.txt b.txt\n", &["--dry-run"])
        .success()
        .stdout(predicate::str::contains("DRY RUN"));

    assert!(root.join("a.txt").exists());
    assert!(!root.join("b.txt").exists());
}

#[test]
fn test_dry_run_undo_and_redo() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("a.txt"), "x").unwrap();

    run_shell(root, "mv a.txt b.txt\nundo\nredo\n", &["--dry-run"])
        .success()
        .stdout(predicate::str::contains("Undone: move a.txt to b.txt"))
        .stdout(predicate::str::contains("Redone: move a.txt to b.txt"))
        .stderr(predicate::str::contains("Error").not());

    assert!(root.join("a.txt").exists());
    assert!(!root.join("b.txt").exists());
}

#[test]
fn test_quoted_path_with_space() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("my notes.txt"), "n").unwrap();

    run_shell(root, "mv \"my notes.txt\" 'old notes.txt'\nexists \"old notes.txt\"\n", &[])
        .success()
        .stdout(predicate::str::contains("old notes.txt: true"));

    assert!(!root.join("my notes.txt").exists());
}

#[test]
fn test_failed_mutation_leaves_no_history() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    run_shell(root, "mv missing elsewhere\nhistory\nundo\n", &[])
        .success()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("Nothing to undo"))
        .stdout(predicate::str::contains("History is empty"));

    assert!(!root.join("elsewhere").exists());
}

#[test]
fn test_script_file_argument() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let script = root.join("ops.txt");
    fs::write(&script, "# make and undo\nmkdir made\nundo\nquit\nmkdir never\n").unwrap();

    run_shell(root, "", &[script.to_str().unwrap()]).success();
    assert!(!root.join("made").exists());
    assert!(!root.join("never").exists());
}
