use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const CI_VARS: &[&str] = &[
    "GITHUB_REPOSITORY",
    "GITHUB_REF",
    "GITHUB_SHA",
    "GITHUB_ACTOR",
    "GITHUB_OUTPUT",
    "GH_TOKEN",
    "GITHUB_TOKEN",
    "IMAGE_NAME",
    "DOCKER_USERNAME",
    "DOCKER_TOKEN",
];

/// `relkit` in an empty directory with no CI variables set.
fn relkit(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("relkit");
    cmd.current_dir(dir.path());
    for var in CI_VARS {
        cmd.env_remove(var);
    }
    cmd
}

// ── Help / Version ──

#[test]
fn shows_help() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Branch-scoped build versions"));
}

#[test]
fn shows_version() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("relkit"));
}

#[test]
fn lists_subcommands() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("version"))
        .stdout(predicate::str::contains("release"))
        .stdout(predicate::str::contains("image"))
        .stdout(predicate::str::contains("runners"));
}

// ── Version ──

#[test]
fn bump_requires_repository() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .args(["version", "bump", "--branch", "v1.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_REPOSITORY"));
}

#[test]
fn bump_requires_branch_without_flag() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .args(["version", "bump"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_REF"));
}

#[test]
fn strict_bump_rejects_non_version_branch() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .args(["version", "bump", "--branch", "feature/login", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("feature/login"));
}

#[test]
fn bump_requires_token() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .env("GITHUB_REPOSITORY", "acme/widget")
        .args(["version", "bump", "--branch", "v1.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GH_TOKEN or GITHUB_TOKEN"));
}

#[test]
fn rejects_malformed_repository() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .env("GITHUB_REPOSITORY", "not-a-repo")
        .args(["version", "show", "--branch", "v1.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("<owner>/<repo>"));
}

#[test]
fn invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("relkit.toml"), "[github\napi_url = ").unwrap();

    relkit(&tmp)
        .args(["version", "show", "--branch", "v1.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

// ── Release ──

#[test]
fn publish_requires_sha() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .env("GITHUB_REPOSITORY", "acme/widget")
        .args(["release", "publish", "--branch", "v1.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_SHA"));
}

#[test]
fn publish_rejects_missing_asset() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .env("GITHUB_REPOSITORY", "acme/widget")
        .args([
            "release", "publish", "--branch", "v1.2", "--sha", "abc123", "--asset", "nope.tar.gz",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("asset not found"));
}

// ── Image ──

#[test]
fn image_build_requires_image_name() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .env("GITHUB_REPOSITORY", "acme/widget")
        .args(["image", "build", "--branch", "v1.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IMAGE_NAME"));
}

#[test]
fn image_build_requires_docker_credentials() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .env("GITHUB_REPOSITORY", "acme/widget")
        .env("IMAGE_NAME", "widget")
        .args(["image", "build", "--branch", "v1.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DOCKER_USERNAME"));
}

#[test]
fn image_build_with_both_registries_disabled_fails() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("relkit.toml"),
        "[image]\nname = \"widget\"\npush_dockerhub = false\npush_ghcr = false\n",
    )
    .unwrap();

    relkit(&tmp)
        .env("GITHUB_REPOSITORY", "acme/widget")
        .args(["image", "build", "--branch", "v1.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("disabled"));
}

// ── Runners ──

#[test]
fn reap_rejects_non_github_url() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .args(["runners", "reap", "https://gitlab.com/acme", "tok", "--once"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gitlab.com"));
}

#[test]
fn reap_requires_url_and_token() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .args(["runners", "reap"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("<URL>"));
}

#[test]
fn token_rejects_url_without_owner() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .args(["runners", "token", "https://github.com/", "tok"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid runner URL"));
}

#[test]
fn reap_rejects_zero_interval() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .args(["runners", "reap", "https://github.com/acme", "tok", "--interval", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--interval"));
}

#[test]
fn reap_rejects_zero_interval_from_config() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("relkit.toml"), "[reaper]\ninterval_secs = 0\n").unwrap();

    relkit(&tmp)
        .args(["runners", "reap", "https://github.com/acme", "tok"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval_secs"));
}

#[test]
fn sbom_help_mentions_commit() {
    let tmp = TempDir::new().unwrap();
    relkit(&tmp)
        .args(["image", "sbom", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--commit"));
}
