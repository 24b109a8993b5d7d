//! Common test utilities

#![allow(dead_code)]

use drake::{Action, Context, Verbosity};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Shared log of task names, in the order their actions ran
pub type Log = Arc<Mutex<Vec<String>>>;

/// A context that prints nothing
pub fn silent() -> Context {
    Context::new().with_verbosity(Verbosity::Silent)
}

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A synchronous action that records the task name
pub fn record(log: &Log) -> Action {
    let log = Arc::clone(log);
    Action::sync(move |task| {
        log.lock().unwrap().push(task.name().to_string());
        Ok(())
    })
}

/// A synchronous action that records the task name and writes its target
pub fn build_target(log: &Log, dir: &TempDir, contents: &'static str) -> Action {
    let log = Arc::clone(log);
    let dir = dir.path().to_path_buf();
    Action::sync(move |task| {
        fs::write(dir.join(task.name()), contents)?;
        log.lock().unwrap().push(task.name().to_string());
        Ok(())
    })
}

/// Create a temporary directory with a Drakefile.yml
pub fn create_taskfile(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("Drakefile.yml");
    fs::write(&config_path, content).unwrap();
    (temp_dir, config_path)
}
