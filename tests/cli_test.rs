// tests/cli_test.rs
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use git2::build::RepoBuilder;
use git2::{Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

fn tagbump(dir: &Path, args: &[&str], with_credentials: bool) -> Output {
    let config = dir.join("empty.toml");
    fs::write(&config, "").expect("Could not write config");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tagbump"));
    cmd.current_dir(dir)
        .arg("--config")
        .arg(&config)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("GIT_USER")
        .env_remove("GIT_TOKEN");

    if with_credentials {
        cmd.env("GIT_USER", "bot").env("GIT_TOKEN", "token");
    }

    cmd.output().expect("Failed to execute tagbump")
}

fn bare_remote(root: &Path, file: &str, content: &str) -> String {
    let seed_path = root.join("seed");
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let seed = Repository::init_opts(&seed_path, &opts).expect("Could not init seed repo");

    fs::write(seed_path.join(file), content).expect("Could not write file");
    let mut index = seed.index().expect("Could not get index");
    index.add_path(Path::new(file)).expect("Could not add file");
    index.write().expect("Could not write index");
    let tree = seed
        .find_tree(index.write_tree().expect("Could not write tree"))
        .expect("Could not find tree");
    let sig = Signature::now("Seeder", "seed@example.com").unwrap();
    seed.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
        .expect("Could not commit");

    let remote = root.join("remote.git");
    RepoBuilder::new()
        .bare(true)
        .clone(seed_path.to_str().unwrap(), &remote)
        .expect("Could not create bare remote");
    remote.to_str().unwrap().to_string()
}

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    let output = tagbump(dir.path(), &["--help"], false);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("--kustomize-image"));
    assert!(stdout.contains("--dry-run"));
}

#[test]
fn test_pattern_or_image_is_required() {
    let dir = TempDir::new().unwrap();
    let output = tagbump(
        dir.path(),
        &["--repo", "r", "--file", "f", "--tag", "v1"],
        true,
    );

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_missing_credentials_exit_code() {
    let dir = TempDir::new().unwrap();
    let output = tagbump(
        dir.path(),
        &["--repo", "r", "--file", "f", "--tag", "v1", "--pattern", "(a)(b)(c)"],
        false,
    );

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("[config]"), "stderr was: {}", stderr);
    assert!(stderr.contains("GIT_USER"));
}

#[test]
fn test_bad_pattern_exit_code() {
    let dir = TempDir::new().unwrap();
    let output = tagbump(
        dir.path(),
        &["--repo", "r", "--file", "f", "--tag", "v1", "--pattern", "(a)(b)"],
        true,
    );

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("exactly 3 capture groups"));
}

#[test]
fn test_checkout_failure_names_stage() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.git");
    let output = tagbump(
        dir.path(),
        &[
            "--repo",
            missing.to_str().unwrap(),
            "--file",
            "values.yaml",
            "--tag",
            "v1",
            "--pattern",
            r"(tag: )(\S+)()",
        ],
        true,
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("[checkout]"), "stderr was: {}", stderr);
}

#[test]
fn test_dry_run_prints_new_content() {
    let dir = TempDir::new().unwrap();
    let remote = bare_remote(dir.path(), "values.yaml", "image: foo\ntag: v1\n");

    let output = tagbump(
        dir.path(),
        &[
            "--repo",
            &remote,
            "--file",
            "values.yaml",
            "--tag",
            "v2",
            "--pattern",
            r"(tag: )(\S+)()",
            "--dry-run",
        ],
        true,
    );

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "image: foo\ntag: v2\n");

    let remote_repo = Repository::open_bare(&remote).unwrap();
    let head = remote_repo
        .find_reference("refs/heads/main")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(head.message(), Some("Initial commit"));
}

#[test]
fn test_credentials_from_env_file_in_working_directory() {
    let dir = TempDir::new().unwrap();
    let remote = bare_remote(dir.path(), "values.yaml", "tag: v1\n");
    fs::write(dir.path().join(".env"), "GIT_USER=bot\nGIT_TOKEN=token\n").unwrap();

    let output = tagbump(
        dir.path(),
        &[
            "--repo",
            &remote,
            "--file",
            "values.yaml",
            "--tag",
            "v2",
            "--pattern",
            r"(tag: )(\S+)()",
            "--dry-run",
        ],
        false,
    );

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "tag: v2\n");
}

#[test]
fn test_dry_run_preview_keeps_missing_trailing_newline() {
    let dir = TempDir::new().unwrap();
    let remote = bare_remote(dir.path(), "values.yaml", "tag: v1");

    let output = tagbump(
        dir.path(),
        &[
            "--repo",
            &remote,
            "--file",
            "values.yaml",
            "--tag",
            "v2",
            "--pattern",
            r"(tag: )(\S+)()",
            "--dry-run",
        ],
        true,
    );

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(output.stdout, b"tag: v2");
}
