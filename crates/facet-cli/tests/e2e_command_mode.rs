//! E2E tests for command mode (`facet open face; ...`) and stdin sessions.

mod common;

use common::facet_cmd;
use predicates::str::contains;

// ─── Command Mode ───────────────────────────────────────────────

#[test]
fn empty_args_reads_stdin() {
    // No trailing args → session on stdin (exits on EOF).
    let (mut cmd, _guard) = facet_cmd();
    cmd.write_stdin("").assert().success();
}

#[test]
fn open_and_translate() {
    let (mut cmd, _guard) = facet_cmd();
    cmd.args(["open", "face;", "translate", "0", "0", "1;", "state", "translate"])
        .assert()
        .success()
        .stdout(contains("opened face"))
        .stdout(contains("translate: completed [AffineChange]"))
        .stdout(contains("translate: enabled=true"));
}

#[test]
fn unknown_command_fails() {
    let (mut cmd, _guard) = facet_cmd();
    cmd.args(["frobnicate"])
        .assert()
        .failure()
        .stderr(contains("unknown command: frobnicate"));
}

#[test]
fn undo_with_empty_history_fails() {
    let (mut cmd, _guard) = facet_cmd();
    cmd.args(["undo"])
        .assert()
        .failure()
        .stderr(contains("nothing to undo"));
}

// ─── Async + Propagation ────────────────────────────────────────

#[test]
fn invert_normals_cascades_to_curvature() {
    let (mut cmd, _guard) = facet_cmd();
    cmd.args(["--work-ms", "50", "open", "face;", "invert_normals"])
        .assert()
        .success()
        .stdout(contains("invert_normals: dispatched"))
        .stdout(contains("invert_normals -> curvature [MeshChange|Cache]"));
}

#[test]
fn undo_restores_and_rebroadcasts() {
    let (mut cmd, _guard) = facet_cmd();
    cmd.args([
        "open", "face;", "invert_normals;", "wait;", "undo;", "actions",
    ])
    .assert()
    .success()
    .stdout(contains("undid Invert Normals"))
    .stdout(contains("curvature [MeshChange|Cache|RestoreChange]"))
    .stdout(contains("Redo Invert Normals"));
}

#[test]
fn pass_limit_from_flag() {
    // Opening a scan triggers curvature, which announces its cache: two
    // passes against a limit of one.
    let (mut cmd, _guard) = facet_cmd();
    cmd.args(["--max-passes", "1", "open", "face"])
        .assert()
        .failure()
        .stdout(contains("aborted"))
        .stderr(contains("exceeded 1 propagation passes"));
}

// ─── Stdin Session ──────────────────────────────────────────────

#[test]
fn stdin_session_reports_errors_and_continues() {
    let (mut cmd, _guard) = facet_cmd();
    cmd.write_stdin("bogus\nopen face\nmodels\nquit\n")
        .assert()
        .success()
        .stdout(contains("error: unknown command: bogus"))
        .stdout(contains("* face"));
}

// ─── Configuration ──────────────────────────────────────────────

#[test]
fn invalid_env_var_is_a_config_error() {
    let (mut cmd, _guard) = facet_cmd();
    cmd.env("FACET_MAX_PASSES", "many")
        .args(["help"])
        .assert()
        .failure()
        .stderr(contains("Config error"));
}

#[test]
fn project_config_is_loaded() {
    let (mut cmd, guard) = facet_cmd();
    let dir = guard.path().join(".facet");
    std::fs::create_dir_all(&dir).expect("mkdir");
    std::fs::write(dir.join("config.toml"), "[undo]\nmax_entries = 0\n").expect("write");

    cmd.args(["help"])
        .assert()
        .failure()
        .stderr(contains("undo.max_entries"));
}
