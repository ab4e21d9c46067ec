//! End-to-end tests for the history walk and the report pipeline,
//! driven through the library entry point against fixture git
//! repositories in temp directories.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use sizetrack::cli::{Cli, Commands, GlobalOpts};
use sizetrack::commands::execute_with_dir;
use sizetrack::error::Result;
use sizetrack::persist;

/// Run git in the fixture repo, asserting success.
fn git(dir: &Path, args: &[&str]) {
    git_with_date(dir, args, None);
}

fn git_with_date(dir: &Path, args: &[&str], date: Option<&str>) {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(dir);
    if let Some(date) = date {
        cmd.env("GIT_AUTHOR_DATE", date)
            .env("GIT_COMMITTER_DATE", date);
    }
    let output = cmd.output().expect("git not runnable");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git not runnable");
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A fixture repository whose "build" copies the committed `payload`
/// file to `app.bin`, so every commit produces a different artifact
/// size without needing a real toolchain.
fn setup_repo() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();

    git(dir, &["init", "-q"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/master"]);
    git(dir, &["config", "user.name", "Size Tester"]);
    git(dir, &["config", "user.email", "sizes@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    git(dir, &["remote", "add", "origin", "git@github.com:acme/firmware.git"]);

    fs::write(
        dir.join("sizes.template"),
        "sizes=%(git_sizes)s\nrecent=%(recent_sizes)s\n\
         version=%(compiler_version)s\nremote=%(remote_url)s\n",
    )
    .unwrap();

    tmp
}

fn commit_payload(dir: &Path, len: usize, message: &str, date: &str) {
    fs::write(dir.join("payload"), vec![b'x'; len]).unwrap();
    git(dir, &["add", "payload"]);
    git_with_date(dir, &["commit", "-q", "-m", message], Some(date));
}

fn cli(command: Commands, label: &str, build_cmd: &str) -> Cli {
    Cli::builder()
        .global_opts(
            GlobalOpts::builder()
                .label(label)
                .build_cmd(build_cmd)
                .clean_cmd("true")
                .git_sizes("git_sizes.json")
                .sizes("recent_sizes.json")
                .template("sizes.template")
                .output("sizes.html")
                .quiet(true),
        )
        .command(command)
        .build()
}

fn run_history(dir: &Path, label: &str, build_cmd: &str) -> Result<()> {
    execute_with_dir(&cli(Commands::History, label, build_cmd), Some(dir))
}

#[test]
fn history_records_every_revision_in_date_order() {
    let tmp = setup_repo();
    let dir = tmp.path();
    commit_payload(dir, 100, "first", "2024-01-01T10:00:00+00:00");
    commit_payload(dir, 120, "second", "2024-01-02T10:00:00+00:00");

    run_history(dir, "9.9.9", "cp payload app.bin").unwrap();

    let ledger = persist::load_history(&dir.join("git_sizes.json")).unwrap();
    assert_eq!(ledger.len(), 2);

    let snapshots = ledger.snapshots();
    assert_eq!(snapshots[0].git.comment.as_deref(), Some("first"));
    assert_eq!(snapshots[0].sizes["9.9.9"]["app.bin"], 100);
    assert_eq!(snapshots[1].git.comment.as_deref(), Some("second"));
    assert_eq!(snapshots[1].sizes["9.9.9"]["app.bin"], 120);
    assert!(snapshots[0].git.date < snapshots[1].git.date);

    // the walk ends back on the original branch
    assert_eq!(git_stdout(dir, &["rev-parse", "--abbrev-ref", "HEAD"]), "master");

    // the report was rendered with the rewritten remote
    let html = fs::read_to_string(dir.join("sizes.html")).unwrap();
    assert!(html.contains("version=9.9.9"));
    assert!(html.contains("remote=https://github.com/acme/firmware.git"));
}

#[test]
fn history_is_idempotent_with_no_new_commits() {
    let tmp = setup_repo();
    let dir = tmp.path();
    commit_payload(dir, 100, "first", "2024-01-01T10:00:00+00:00");
    commit_payload(dir, 120, "second", "2024-01-02T10:00:00+00:00");

    run_history(dir, "9.9.9", "cp payload app.bin").unwrap();
    let first = fs::read(dir.join("git_sizes.json")).unwrap();

    run_history(dir, "9.9.9", "cp payload app.bin").unwrap();
    let second = fs::read(dir.join("git_sizes.json")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn stale_snapshots_are_dropped() {
    let tmp = setup_repo();
    let dir = tmp.path();
    commit_payload(dir, 100, "only", "2024-01-01T10:00:00+00:00");

    fs::write(
        dir.join("git_sizes.json"),
        r#"[
            {
                "9.9.9": {"app.bin": 999},
                "git": {
                    "hash": "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef",
                    "date": "2020-01-01 10:00:00 +0000"
                }
            }
        ]"#,
    )
    .unwrap();

    run_history(dir, "9.9.9", "cp payload app.bin").unwrap();

    let ledger = persist::load_history(&dir.join("git_sizes.json")).unwrap();
    assert_eq!(ledger.len(), 1);
    assert!(ledger.iter().all(|s| !s.git.hash.starts_with("deadbeef")));
    assert_eq!(ledger.snapshots()[0].sizes["9.9.9"]["app.bin"], 100);
}

#[test]
fn second_label_merges_into_existing_snapshots() {
    let tmp = setup_repo();
    let dir = tmp.path();
    commit_payload(dir, 100, "first", "2024-01-01T10:00:00+00:00");

    run_history(dir, "4.5.2", "cp payload app.bin").unwrap();
    run_history(dir, "4.6.2", "cp payload app.bin").unwrap();

    let ledger = persist::load_history(&dir.join("git_sizes.json")).unwrap();
    assert_eq!(ledger.len(), 1);
    let snapshot = &ledger.snapshots()[0];
    assert_eq!(snapshot.sizes["4.5.2"]["app.bin"], 100);
    assert_eq!(snapshot.sizes["4.6.2"]["app.bin"], 100);
}

#[test]
fn broken_build_records_empty_map_and_stays_eligible() {
    let tmp = setup_repo();
    let dir = tmp.path();
    commit_payload(dir, 100, "first", "2024-01-01T10:00:00+00:00");

    // "false" exits non-zero and produces no artifacts
    run_history(dir, "9.9.9", "false").unwrap();

    let ledger = persist::load_history(&dir.join("git_sizes.json")).unwrap();
    assert_eq!(ledger.len(), 1);
    assert!(ledger.snapshots()[0].sizes["9.9.9"].is_empty());

    // an empty map is not "recorded": a later run with a working build
    // fills it in
    run_history(dir, "9.9.9", "cp payload app.bin").unwrap();
    let ledger = persist::load_history(&dir.join("git_sizes.json")).unwrap();
    assert_eq!(ledger.snapshots()[0].sizes["9.9.9"]["app.bin"], 100);
}

#[test]
fn failed_walk_still_restores_the_original_branch() {
    let tmp = setup_repo();
    let dir = tmp.path();
    commit_payload(dir, 100, "first", "2024-01-01T10:00:00+00:00");

    // The second commit tracks gen.txt; the third removes it again, so
    // the branch tip has no gen.txt.
    fs::write(dir.join("gen.txt"), "tracked contents").unwrap();
    git(dir, &["add", "gen.txt"]);
    git_with_date(dir, &["commit", "-q", "-m", "second"], Some("2024-01-02T10:00:00+00:00"));
    git(dir, &["rm", "-q", "gen.txt"]);
    git_with_date(dir, &["commit", "-q", "-m", "third"], Some("2024-01-03T10:00:00+00:00"));

    // The "build" of the oldest revision drops an untracked gen.txt with
    // different contents, so the checkout of the second revision fails
    // mid-pass with the tree detached on the first one.
    let result = run_history(dir, "9.9.9", "cp payload gen.txt");

    assert!(result.is_err());
    assert_eq!(git_stdout(dir, &["rev-parse", "--abbrev-ref", "HEAD"]), "master");
}

#[test]
fn append_records_head_once() {
    let tmp = setup_repo();
    let dir = tmp.path();
    commit_payload(dir, 100, "first", "2024-01-01T10:00:00+00:00");
    fs::write(dir.join("app.bin"), vec![0u8; 321]).unwrap();

    let append = cli(Commands::Append, "9.9.9", "true");
    execute_with_dir(&append, Some(dir)).unwrap();
    execute_with_dir(&append, Some(dir)).unwrap();

    let ledger = persist::load_history(&dir.join("git_sizes.json")).unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.snapshots()[0].sizes["9.9.9"]["app.bin"], 321);
    assert_eq!(ledger.snapshots()[0].git.comment.as_deref(), Some("first"));
}

#[test]
fn generate_updates_recent_ledger_and_renders_report() {
    let tmp = setup_repo();
    let dir = tmp.path();
    fs::write(dir.join("app.bin"), vec![0u8; 100]).unwrap();

    let generate = cli(Commands::Generate, "9.9.9", "true");
    execute_with_dir(&generate, Some(dir)).unwrap();

    let recent = persist::load_recent(&dir.join("recent_sizes.json")).unwrap();
    assert_eq!(recent.counter, 1);
    let trace = recent.trace("9.9.9", "app.bin").unwrap();
    assert_eq!(trace[0].size, 100);
    assert_eq!(trace[0].index, 1);

    // unchanged tree: nothing appended, counter untouched
    execute_with_dir(&generate, Some(dir)).unwrap();
    let recent = persist::load_recent(&dir.join("recent_sizes.json")).unwrap();
    assert_eq!(recent.counter, 1);
    assert_eq!(recent.trace("9.9.9", "app.bin").unwrap().len(), 1);

    // a size change appends the next index
    fs::write(dir.join("app.bin"), vec![0u8; 120]).unwrap();
    execute_with_dir(&generate, Some(dir)).unwrap();
    let recent = persist::load_recent(&dir.join("recent_sizes.json")).unwrap();
    assert_eq!(recent.counter, 2);
    let trace = recent.trace("9.9.9", "app.bin").unwrap();
    assert_eq!(trace.len(), 2);
    assert_eq!(trace[1].size, 120);

    tmp.child("sizes.html")
        .assert(predicate::str::contains("version=9.9.9"))
        .assert(predicate::str::contains("\"app.bin\""));
}
