//! CLI integration tests using the REAL image-builder binary

mod common;

use assert_cmd::Command;
use common::{TestHome, TestRepo, monorepo};
use predicates::prelude::*;

/// Binary with a clean environment: no `IB_*` variables and an empty home.
#[allow(deprecated)]
fn image_builder_cmd(home: &TestHome) -> Command {
    let mut cmd = Command::cargo_bin("image-builder").unwrap();
    for var in [
        "IB_DEBUG",
        "IB_JSON",
        "IB_GIT_URL",
        "IB_GIT_BRANCH",
        "IB_KEY_PATH",
        "IB_DOCKER_HOST",
        "IB_REGISTRY_AUTH",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("HOME", home.path());
    cmd
}

#[test]
fn test_help_output() {
    let home = TestHome::new();
    image_builder_cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--git-url"))
        .stdout(predicate::str::contains("--git-branch"))
        .stdout(predicate::str::contains("--key-path"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_missing_git_url_fails() {
    let home = TestHome::new();
    image_builder_cmd(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--git-url must be set"));
}

#[test]
fn test_dry_run_prints_affected_roots() {
    let home = TestHome::new();
    let repo = monorepo();
    image_builder_cmd(&home)
        .args(["--git-url", &repo.url(), "--git-branch", "main", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::eq("svc/api\n"));
}

#[test]
fn test_dry_run_with_root_commit_lists_every_root() {
    let home = TestHome::new();
    let repo = TestRepo::new();
    repo.commit(
        &[
            ("svc/api/Dockerfile", "FROM scratch\n"),
            ("svc/web/Dockerfile", "FROM scratch\n"),
            ("README.md", "# mono\n"),
        ],
        "initial",
    );
    image_builder_cmd(&home)
        .args(["-g", &repo.url(), "-b", "main", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::eq("svc/api\nsvc/web\n"));
}

#[test]
fn test_dry_run_without_marker_prints_nothing() {
    let home = TestHome::new();
    let repo = TestRepo::new();
    repo.commit(&[("docs/readme.md", "v1\n")], "initial");
    repo.commit(&[("docs/readme.md", "v2\n")], "docs");
    image_builder_cmd(&home)
        .args(["-g", &repo.url(), "-b", "main", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_git_url_from_environment() {
    let home = TestHome::new();
    let repo = monorepo();
    image_builder_cmd(&home)
        .env("IB_GIT_URL", repo.url())
        .env("IB_GIT_BRANCH", "main")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::eq("svc/api\n"));
}

#[test]
fn test_unknown_branch_fails() {
    let home = TestHome::new();
    let repo = monorepo();
    image_builder_cmd(&home)
        .args(["-g", &repo.url(), "-b", "release", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_unix_docker_host_is_rejected() {
    let home = TestHome::new();
    image_builder_cmd(&home)
        .args([
            "-g",
            "https://example.com/mono.git",
            "--docker-host",
            "unix:///var/run/docker.sock",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_unreachable_docker_host_fails_after_resolving() {
    let home = TestHome::new();
    let repo = monorepo();
    image_builder_cmd(&home)
        .args([
            "-g",
            &repo.url(),
            "-b",
            "main",
            "--docker-host",
            "tcp://127.0.0.1:1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("build"));
}
