//! Integration tests for file tasks and the build cache

mod common;

use common::{build_target, entries, new_log, record, silent};
use drake::error::ExecutionError;
use drake::runner::DEFAULT_CACHE_FILE;
use drake::{Action, DrakeError, Registry};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const NONE: &[&str] = &[];

fn cache_file(dir: &TempDir) -> PathBuf {
    dir.path().join(DEFAULT_CACHE_FILE)
}

#[tokio::test]
async fn test_file_task_runs_only_when_stale() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("in.txt"), "a").unwrap();

    let log = new_log();
    let mut registry = Registry::new(dir.path());
    registry
        .register("out.txt", &["in.txt"], build_target(&log, &dir, "built"))
        .unwrap();

    registry.run(&silent(), &["./out.txt"]).await.unwrap();
    assert_eq!(entries(&log), vec!["./out.txt"]);
    assert!(dir.path().join("out.txt").exists());
    assert!(cache_file(&dir).exists());

    registry.run(&silent(), &["./out.txt"]).await.unwrap();
    assert_eq!(entries(&log).len(), 1, "up to date target must be skipped");

    fs::write(dir.path().join("in.txt"), "changed").unwrap();
    registry.run(&silent(), &["./out.txt"]).await.unwrap();
    assert_eq!(entries(&log).len(), 2);

    registry.run(&silent(), &["./out.txt"]).await.unwrap();
    assert_eq!(entries(&log).len(), 2);
}

#[tokio::test]
async fn test_cache_survives_a_new_registry() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("in.txt"), "a").unwrap();
    let log = new_log();

    let mut first = Registry::new(dir.path());
    first
        .register("./out.txt", &["./in.txt"], build_target(&log, &dir, "built"))
        .unwrap();
    first.run(&silent(), &["./out.txt"]).await.unwrap();

    let mut second = Registry::new(dir.path());
    second
        .register("./out.txt", &["./in.txt"], build_target(&log, &dir, "built"))
        .unwrap();
    second.run(&silent(), &["./out.txt"]).await.unwrap();

    assert_eq!(entries(&log).len(), 1);
}

#[tokio::test]
async fn test_deleted_target_is_rebuilt() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("in.txt"), "a").unwrap();
    let log = new_log();

    let mut registry = Registry::new(dir.path());
    registry
        .register("./out.txt", &["./in.txt"], build_target(&log, &dir, "built"))
        .unwrap();
    registry.run(&silent(), &["./out.txt"]).await.unwrap();

    fs::remove_file(dir.path().join("out.txt")).unwrap();
    registry.run(&silent(), &["./out.txt"]).await.unwrap();
    assert_eq!(entries(&log).len(), 2);
}

#[tokio::test]
async fn test_always_make_ignores_cache() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("in.txt"), "a").unwrap();
    let log = new_log();

    let mut registry = Registry::new(dir.path());
    registry
        .register("./out.txt", &["./in.txt"], build_target(&log, &dir, "built"))
        .unwrap();
    registry.run(&silent(), &["./out.txt"]).await.unwrap();
    registry
        .run(&silent().with_always_make(true), &["./out.txt"])
        .await
        .unwrap();

    assert_eq!(entries(&log).len(), 2);
}

#[tokio::test]
async fn test_missing_prerequisite_file() {
    let dir = TempDir::new().unwrap();
    let log = new_log();

    let mut registry = Registry::new(dir.path());
    registry
        .register("./out.txt", &["./in.txt"], build_target(&log, &dir, "built"))
        .unwrap();

    let err = registry.run(&silent(), &["./out.txt"]).await.unwrap_err();
    assert!(matches!(
        &err,
        DrakeError::Execution(ExecutionError::MissingPrerequisiteFile { path, .. }) if path == "./in.txt"
    ));
    assert_eq!(err.to_string(), "./out.txt: missing prerequisite file: ./in.txt");
    assert!(entries(&log).is_empty());
    assert!(!cache_file(&dir).exists());
}

#[tokio::test]
async fn test_dry_run_assumes_missing_files_will_be_built() {
    let dir = TempDir::new().unwrap();
    let log = new_log();

    let mut registry = Registry::new(dir.path());
    registry
        .register("./out.txt", &["./in.txt"], build_target(&log, &dir, "built"))
        .unwrap();
    registry
        .register("./in.txt", NONE, build_target(&log, &dir, "source"))
        .unwrap();

    registry
        .run(&silent().with_dry_run(true), &["./out.txt"])
        .await
        .unwrap();

    assert!(entries(&log).is_empty());
    assert!(!dir.path().join("out.txt").exists());
    assert!(!cache_file(&dir).exists());
}

#[tokio::test]
async fn test_chained_file_tasks() {
    let dir = TempDir::new().unwrap();
    let log = new_log();

    let mut registry = Registry::new(dir.path());
    registry
        .register("./out.txt", &["./in.txt"], build_target(&log, &dir, "built"))
        .unwrap();
    registry
        .register("./in.txt", NONE, build_target(&log, &dir, "source"))
        .unwrap();

    registry.run(&silent(), &["./out.txt"]).await.unwrap();
    assert_eq!(entries(&log), vec!["./in.txt", "./out.txt"]);

    registry.run(&silent(), &["./out.txt"]).await.unwrap();
    assert_eq!(entries(&log).len(), 2);
}

#[tokio::test]
async fn test_cache_file_contents() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("in.txt"), "a").unwrap();
    let log = new_log();

    let mut registry = Registry::new(dir.path());
    registry
        .register("./out.txt", &["./in.txt"], build_target(&log, &dir, "built"))
        .unwrap();
    registry.run(&silent(), &["./out.txt"]).await.unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(cache_file(&dir)).unwrap()).unwrap();
    assert_eq!(json["version"], drake::VERSION);
    assert_eq!(json["os"], std::env::consts::OS);
    assert_eq!(json["tasks"]["./out.txt"]["./in.txt"]["size"], 1);
    assert_eq!(json["tasks"]["./out.txt"]["./out.txt"]["size"], 5);
}

#[tokio::test]
async fn test_normal_tasks_do_not_write_cache() {
    let dir = TempDir::new().unwrap();
    let log = new_log();

    let mut registry = Registry::new(dir.path());
    registry.register("build", NONE, record(&log)).unwrap();
    registry.run(&silent(), &["build"]).await.unwrap();

    assert_eq!(entries(&log), vec!["build"]);
    assert!(!cache_file(&dir).exists());
}

#[test]
fn test_cache_from_other_version_is_discarded() {
    let dir = TempDir::new().unwrap();
    let stale = serde_json::json!({
        "version": "0.0.0-old",
        "os": std::env::consts::OS,
        "tasks": {
            "./out.txt": {
                "./out.txt": { "size": 1, "mtime": "2020-01-01T00:00:00Z" }
            }
        }
    });
    fs::write(cache_file(&dir), stale.to_string()).unwrap();

    let mut registry = Registry::new(dir.path());
    registry.load_cache(&silent()).unwrap();

    assert!(registry.cache().is_empty());
    assert!(!cache_file(&dir).exists());
}

#[test]
fn test_cache_from_other_os_is_discarded() {
    let dir = TempDir::new().unwrap();
    let foreign = serde_json::json!({
        "version": drake::VERSION,
        "os": "some-other-os",
        "tasks": {
            "./out.txt": {
                "./out.txt": { "size": 1, "mtime": "2020-01-01T00:00:00Z" }
            }
        }
    });
    fs::write(cache_file(&dir), foreign.to_string()).unwrap();

    let mut registry = Registry::new(dir.path());
    registry.load_cache(&silent()).unwrap();

    assert!(registry.cache().is_empty());
    assert!(!cache_file(&dir).exists());
}

#[tokio::test]
async fn test_dry_run_leaves_stale_cache_file_alone() {
    let dir = TempDir::new().unwrap();
    let stale = serde_json::json!({
        "version": "0.0.0-old",
        "os": std::env::consts::OS,
        "tasks": {}
    })
    .to_string();
    fs::write(cache_file(&dir), &stale).unwrap();
    let log = new_log();

    let mut registry = Registry::new(dir.path());
    registry
        .register("./out.txt", NONE, build_target(&log, &dir, "built"))
        .unwrap();
    registry
        .run(&silent().with_dry_run(true), &["./out.txt"])
        .await
        .unwrap();

    assert!(registry.cache().is_empty());
    assert_eq!(fs::read_to_string(cache_file(&dir)).unwrap(), stale);
    assert!(entries(&log).is_empty());
}

#[test]
fn test_corrupt_cache_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(cache_file(&dir), "{ not json").unwrap();

    let mut registry = Registry::new(dir.path());
    let err = registry.load_cache(&silent()).unwrap_err();
    assert!(matches!(err, DrakeError::Cache(_)));
}

#[tokio::test]
async fn test_cache_saved_when_later_task_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("in.txt"), "a").unwrap();
    let log = new_log();

    let mut registry = Registry::new(dir.path());
    registry
        .register("./out.txt", &["./in.txt"], build_target(&log, &dir, "built"))
        .unwrap();
    registry
        .register(
            "deploy",
            &["./out.txt"],
            Action::sync(|_task| anyhow::bail!("deploy refused")),
        )
        .unwrap();

    let err = registry.run(&silent(), &["deploy"]).await.unwrap_err();
    assert_eq!(err.to_string(), "deploy: deploy refused");
    assert!(cache_file(&dir).exists());

    let mut reloaded = Registry::new(dir.path());
    reloaded.load_cache(&silent()).unwrap();
    assert!(reloaded.cache().get("./out.txt").is_some());
}

#[test]
fn test_glob_prerequisites() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::create_dir(dir.path().join("src/nested.c")).unwrap();
    fs::write(dir.path().join("src/b.c"), "b").unwrap();
    fs::write(dir.path().join("src/a.c"), "a").unwrap();
    fs::write(dir.path().join("src/a.h"), "h").unwrap();

    let mut registry = Registry::new(dir.path());
    let task = registry
        .register("./app", &["./src/*.c", "setup"], Action::None)
        .unwrap();
    assert_eq!(task.prerequisites(), &["./src/a.c", "./src/b.c", "setup"]);

    let task = registry
        .register("./lib", &["./src/*.rs"], Action::None)
        .unwrap();
    assert!(task.prerequisites().is_empty());
}

#[tokio::test]
async fn test_custom_cache_path() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("in.txt"), "a").unwrap();
    let log = new_log();

    let mut registry = Registry::new(dir.path());
    registry
        .register("./out.txt", &["./in.txt"], build_target(&log, &dir, "built"))
        .unwrap();

    let ctx = silent().with_cache_path(PathBuf::from("build-cache.json"));
    registry.run(&ctx, &["./out.txt"]).await.unwrap();

    assert!(dir.path().join("build-cache.json").exists());
    assert!(!cache_file(&dir).exists());

    registry.run(&ctx, &["./out.txt"]).await.unwrap();
    assert_eq!(entries(&log).len(), 1);
}
