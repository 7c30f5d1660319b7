//! Shared E2E test helpers for `facet` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::time::Duration;

/// Default timeout for CLI tests.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(20);

/// Build a Command for the `facet` binary isolated from user config.
///
/// The project root and global config point into a fresh temp directory
/// and `FACET_*` variables are cleared. Returns (command, _guard); keep the
/// guard alive for the test's duration.
pub fn facet_cmd() -> (assert_cmd::Command, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("facet");
    cmd.timeout(TIMEOUT_BASIC);
    for var in [
        "FACET_DEBUG",
        "FACET_MAX_CONCURRENT",
        "FACET_WORKER_THREADS",
        "FACET_MAX_PASSES",
        "FACET_UNDO_LIMIT",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.arg("-C").arg(tmp.path());
    cmd.arg("--config").arg(tmp.path().join("global.toml"));
    (cmd, tmp)
}
