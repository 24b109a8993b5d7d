//! Incremental build cache
//!
//! Each file task maps its tracked paths (the target and its file
//! prerequisites) to the fingerprint recorded after its last successful run.
//! The whole cache is persisted as one JSON document stamped with the engine
//! version and OS; a stamp mismatch discards the file.

use crate::error::{CacheError, CacheResult, ExecutionError, Result};
use crate::runner::task::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default cache file name, relative to the working directory
pub const DEFAULT_CACHE_FILE: &str = ".drake.cache.json";

/// Operating system identifier written to the cache file
pub const OS: &str = std::env::consts::OS;

/// Size and modification time of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub size: u64,
    pub mtime: DateTime<Utc>,
}

impl Fingerprint {
    /// Fingerprint the file at `path`; `None` if it does not exist
    pub fn of(path: &Path) -> CacheResult<Option<Self>> {
        match fs::metadata(path) {
            Ok(meta) => {
                let modified = meta.modified().map_err(|source| CacheError::Stat {
                    path: path.to_path_buf(),
                    source,
                })?;
                Ok(Some(Fingerprint {
                    size: meta.len(),
                    mtime: DateTime::<Utc>::from(modified),
                }))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Stat {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Fingerprints recorded for one file task, keyed by tracked path
pub type TaskCache = BTreeMap<String, Fingerprint>;

/// On-disk cache document
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: String,
    os: String,
    tasks: BTreeMap<String, TaskCache>,
}

/// In-memory build cache
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BuildCache {
    tasks: BTreeMap<String, TaskCache>,
}

impl BuildCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cache file at `path`
    ///
    /// A missing file yields an empty cache. A file written by another
    /// engine version or OS yields an empty cache and is deleted unless
    /// `keep_stale` is set. Corrupt JSON is an error.
    pub fn load(path: &Path, keep_stale: bool) -> CacheResult<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => {
                return Err(CacheError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let file: CacheFile =
            serde_json::from_str(&contents).map_err(|source| CacheError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;

        if file.version != crate::VERSION || file.os != OS {
            log::info!(
                "discarding cache {} (version {} on {})",
                path.display(),
                file.version,
                file.os
            );
            if !keep_stale {
                fs::remove_file(path).map_err(|e| CacheError::Write {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                })?;
            }
            return Ok(Self::new());
        }

        log::debug!("loaded {} cached tasks from {}", file.tasks.len(), path.display());
        Ok(BuildCache { tasks: file.tasks })
    }

    /// Write the cache to `path`; an empty cache is not written
    pub fn save(&self, path: &Path) -> CacheResult<()> {
        if self.tasks.is_empty() {
            return Ok(());
        }

        let file = CacheFile {
            version: crate::VERSION.to_string(),
            os: OS.to_string(),
            tasks: self.tasks.clone(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| CacheError::Write {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| CacheError::Write {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        log::debug!("saved {} cached tasks to {}", self.tasks.len(), path.display());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Cached fingerprints for a file task
    pub fn get(&self, task: &str) -> Option<&TaskCache> {
        self.tasks.get(task)
    }

    /// Report whether a file task must run
    ///
    /// A missing file prerequisite is an error unless `dry_run` is set, in
    /// which case it is assumed to be produced by an earlier task and the
    /// target is reported out of date.
    pub fn is_out_of_date(&self, task: &Task, dir: &Path, dry_run: bool) -> Result<bool> {
        for prereq in task.file_prerequisites() {
            if !resolve_path(dir, prereq).exists() {
                if dry_run {
                    return Ok(true);
                }
                return Err(ExecutionError::MissingPrerequisiteFile {
                    task: task.name().to_string(),
                    path: prereq.to_string(),
                }
                .into());
            }
        }

        let Some(previous) = self.tasks.get(task.name()) else {
            return Ok(true);
        };

        if !resolve_path(dir, task.name()).exists() {
            return Ok(true);
        }

        for tracked in std::iter::once(task.name()).chain(task.file_prerequisites()) {
            let current = Fingerprint::of(&resolve_path(dir, tracked))?;
            if current.is_none() || previous.get(tracked) != current.as_ref() {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Record fresh fingerprints for a file task after its action succeeded
    ///
    /// The entry is replaced wholesale, so paths no longer tracked by the
    /// task are dropped.
    pub fn update(&mut self, task: &Task, dir: &Path) -> CacheResult<()> {
        let mut entry = TaskCache::new();
        for tracked in std::iter::once(task.name()).chain(task.file_prerequisites()) {
            if let Some(fingerprint) = Fingerprint::of(&resolve_path(dir, tracked))? {
                entry.insert(tracked.to_string(), fingerprint);
            }
        }
        self.tasks.insert(task.name().to_string(), entry);
        Ok(())
    }
}

/// Resolve a file task name against the working directory
pub fn resolve_path(dir: &Path, name: &str) -> PathBuf {
    let path = Path::new(name);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::task::Action;
    use tempfile::TempDir;

    fn file_task() -> Task {
        Task::new(
            "./target".into(),
            String::new(),
            vec!["./prereq".into(), "normal".into()],
            Action::None,
        )
    }

    #[test]
    fn test_fingerprint_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let fingerprint = Fingerprint::of(&temp_dir.path().join("nope")).unwrap();
        assert!(fingerprint.is_none());
    }

    #[test]
    fn test_out_of_date_without_cache_entry() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("prereq"), "").unwrap();
        fs::write(temp_dir.path().join("target"), "").unwrap();

        let cache = BuildCache::new();
        assert!(cache.is_out_of_date(&file_task(), temp_dir.path(), false).unwrap());
    }

    #[test]
    fn test_update_then_up_to_date() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let task = file_task();
        fs::write(dir.join("prereq"), "").unwrap();

        let mut cache = BuildCache::new();
        assert!(cache.is_out_of_date(&task, dir, false).unwrap(), "missing target");

        fs::write(dir.join("target"), "quux").unwrap();
        cache.update(&task, dir).unwrap();
        assert!(!cache.is_out_of_date(&task, dir, false).unwrap());

        let entry = cache.get("./target").unwrap();
        assert_eq!(entry["./target"].size, 4);
        assert_eq!(entry["./prereq"].size, 0);
        assert!(!entry.contains_key("normal"));

        fs::write(dir.join("prereq"), "baz").unwrap();
        assert!(cache.is_out_of_date(&task, dir, false).unwrap(), "modified prerequisite");
    }

    #[test]
    fn test_missing_prerequisite_file() {
        let temp_dir = TempDir::new().unwrap();
        let cache = BuildCache::new();

        let result = cache.is_out_of_date(&file_task(), temp_dir.path(), false);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("missing prerequisite file: ./prereq"));

        assert!(cache.is_out_of_date(&file_task(), temp_dir.path(), true).unwrap());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let cache_path = dir.join(DEFAULT_CACHE_FILE);
        fs::write(dir.join("prereq"), "").unwrap();
        fs::write(dir.join("target"), "quux").unwrap();

        let mut cache = BuildCache::new();
        cache.update(&file_task(), dir).unwrap();
        cache.save(&cache_path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&cache_path).unwrap()).unwrap();
        assert_eq!(json["version"], crate::VERSION);
        assert_eq!(json["os"], OS);
        assert!(json["tasks"]["./target"]["./target"]["mtime"].is_string());

        let loaded = BuildCache::load(&cache_path, false).unwrap();
        assert_eq!(loaded, cache);
    }

    #[test]
    fn test_empty_cache_not_written() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join(DEFAULT_CACHE_FILE);
        BuildCache::new().save(&cache_path).unwrap();
        assert!(!cache_path.exists());
    }

    fn stale_document(version: &str, os: &str) -> String {
        serde_json::json!({
            "version": version,
            "os": os,
            "tasks": {
                "./t": { "./t": { "size": 1, "mtime": "2020-01-01T00:00:00Z" } }
            }
        })
        .to_string()
    }

    #[test]
    fn test_version_mismatch_discards_file() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join(DEFAULT_CACHE_FILE);
        fs::write(&cache_path, stale_document("0.0.0-old", OS)).unwrap();

        let loaded = BuildCache::load(&cache_path, false).unwrap();
        assert!(loaded.is_empty());
        assert!(!cache_path.exists());
    }

    #[test]
    fn test_os_mismatch_discards_file() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join(DEFAULT_CACHE_FILE);
        fs::write(&cache_path, stale_document(crate::VERSION, "plan9")).unwrap();

        let loaded = BuildCache::load(&cache_path, false).unwrap();
        assert!(loaded.is_empty());
        assert!(!cache_path.exists());
    }

    #[test]
    fn test_stale_file_kept_when_asked() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join(DEFAULT_CACHE_FILE);
        fs::write(&cache_path, stale_document("0.0.0-old", OS)).unwrap();

        let loaded = BuildCache::load(&cache_path, true).unwrap();
        assert!(loaded.is_empty());
        assert!(cache_path.exists());
    }

    #[test]
    fn test_corrupt_cache_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join(DEFAULT_CACHE_FILE);
        fs::write(&cache_path, "{ not json").unwrap();

        let result = BuildCache::load(&cache_path, false);
        assert!(matches!(result, Err(CacheError::Corrupt { .. })));
    }
}
