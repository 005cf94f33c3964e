mod common;

use assert_cmd::Command;
use assert_fs::TempDir;
use common::fixtures::{commit_files, main_branch, seeded_repository_dir};
use gitship::areas::repository::Repository;
use predicates::prelude::*;
use rstest::rstest;

fn gitship_command() -> Command {
    Command::cargo_bin("gitship").expect("binary builds")
}

#[rstest]
fn help_lists_the_release_workflow() {
    gitship_command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("release"))
        .stdout(predicate::str::contains("switch"));
}

#[rstest]
fn release_subcommand_runs_a_full_cycle(
    seeded_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository = Repository::open(seeded_repository_dir.path())?;
    commit_files(
        &repository,
        &main_branch(),
        &[("app.txt", "v1"), ("secrets/key.pem", "private")],
        "initial",
    );

    let repo_arg = seeded_repository_dir.path().to_string_lossy().to_string();
    gitship_command()
        .args([
            "release",
            "--repo",
            &repo_arg,
            "--branch",
            "main",
            "--remote-path",
            "/tmp/unused-deploy-target",
            "--tag",
            "v1.0.0",
            "--remove",
            "secrets/key.pem",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("released"));

    // the cycle is visible through the library afterwards
    assert!(repository.refs().read_tag("v1.0.0")?.is_some());
    let release_branch =
        gitship::artifacts::branch::branch_name::BranchName::try_parse("release/main".to_string())?;
    assert!(repository.refs().read_ref(&release_branch)?.is_some());

    Ok(())
}

#[rstest]
fn tags_subcommand_lists_created_tags(
    seeded_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository = Repository::open(seeded_repository_dir.path())?;
    commit_files(&repository, &main_branch(), &[("app.txt", "v1")], "initial");

    let repo_arg = seeded_repository_dir.path().to_string_lossy().to_string();
    gitship_command()
        .args([
            "release",
            "--repo",
            &repo_arg,
            "--remote-path",
            "/tmp/unused-deploy-target",
            "--tag",
            "v1.0.0",
        ])
        .assert()
        .success();

    gitship_command()
        .args(["tags", "--repo", &repo_arg])
        .assert()
        .success()
        .stdout(predicate::str::contains("v1.0.0"));

    Ok(())
}

#[rstest]
fn missing_remote_path_fails_with_a_configuration_error(
    seeded_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository = Repository::open(seeded_repository_dir.path())?;
    commit_files(&repository, &main_branch(), &[("app.txt", "v1")], "initial");

    let repo_arg = seeded_repository_dir.path().to_string_lossy().to_string();
    gitship_command()
        .args(["push", "--repo", &repo_arg])
        .assert()
        .failure()
        .stderr(predicate::str::contains("remote repository path"));

    Ok(())
}
