//! Task registry
//!
//! The registry owns every task and the in-memory build cache. It enforces
//! the naming invariants at registration and resolves requested names into a
//! flat, duplicate-free execution order.

use crate::error::{DrakeError, RegistrationError, ResolutionError, Result};
use crate::runner::cache::{resolve_path, BuildCache, DEFAULT_CACHE_FILE};
use crate::runner::graph::Graph;
use crate::runner::name::{is_file_task, normalize_prerequisites, normalize_task_name};
use crate::runner::task::{Action, Task};
use crate::runner::Context;
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::path::{Path, PathBuf};

/// Registered tasks keyed by normalized name
#[derive(Debug)]
pub struct Registry {
    /// Directory relative file tasks, globs and the cache resolve against
    dir: PathBuf,

    tasks: BTreeMap<String, Task>,

    /// Description for the next registered task
    pending_description: String,

    pub(crate) cache: BuildCache,
}

impl Registry {
    /// Create an empty registry rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Registry {
            dir: dir.into(),
            tasks: BTreeMap::new(),
            pending_description: String::new(),
            cache: BuildCache::new(),
        }
    }

    /// Create an empty registry rooted at the current directory
    pub fn from_current_dir() -> Result<Self> {
        Ok(Self::new(env::current_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Set the description of the next registered task
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.pending_description = description.into();
    }

    /// Create and register a task
    ///
    /// The pending description is consumed. Registering an existing name, or
    /// naming the same prerequisite twice, is an error.
    pub fn register<S: AsRef<str>>(
        &mut self,
        name: &str,
        prerequisites: &[S],
        action: Action,
    ) -> Result<&Task> {
        let description = std::mem::take(&mut self.pending_description);
        let name = normalize_task_name(name)?;
        if self.tasks.contains_key(&name) {
            return Err(RegistrationError::DuplicateTask(name).into());
        }

        let prerequisites = normalize_prerequisites(prerequisites, &self.dir)?;
        let mut seen = HashSet::new();
        for prereq in &prerequisites {
            if !seen.insert(prereq.as_str()) {
                return Err(RegistrationError::DuplicatePrerequisite {
                    task: name,
                    prerequisite: prereq.clone(),
                }
                .into());
            }
        }

        log::debug!("registered {} {:?}", name, prerequisites);
        let task = Task::new(name.clone(), description, prerequisites, action);
        Ok(self.tasks.entry(name).or_insert(task))
    }

    /// Look up a task by name
    pub fn get(&self, name: &str) -> Result<&Task> {
        let name = normalize_task_name(name)?;
        self.tasks
            .get(&name)
            .ok_or_else(|| ResolutionError::MissingTask(name).into())
    }

    /// True if a task is registered under the normalized `name`
    pub fn contains(&self, name: &str) -> bool {
        normalize_task_name(name).is_ok_and(|name| self.tasks.contains_key(&name))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Registered tasks in name order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Printable task list, sorted by name
    ///
    /// Hidden tasks are listed only with `include_hidden`, which also
    /// annotates each task with its prerequisites.
    pub fn list(&self, include_hidden: bool) -> Vec<String> {
        let tasks: Vec<&Task> = self
            .tasks
            .values()
            .filter(|t| include_hidden || !t.is_hidden())
            .collect();
        let width = tasks
            .iter()
            .map(|t| t.name().chars().count())
            .max()
            .unwrap_or(0);

        tasks
            .into_iter()
            .map(|t| {
                let mut line = format!("{:<width$} {}", t.name(), t.description());
                if include_hidden && !t.prerequisites().is_empty() {
                    line = format!("{} [{}]", line.trim_end(), t.prerequisites().join(", "));
                }
                line.trim_end().to_string()
            })
            .collect()
    }

    /// Build the prerequisite graph over registered tasks
    pub fn graph(&self) -> Graph {
        let mut graph = Graph::new();
        for task in self.tasks.values() {
            let adjacents = task
                .prerequisites()
                .iter()
                .filter(|p| self.tasks.contains_key(p.as_str()))
                .cloned()
                .collect();
            graph.add_node(task.name(), adjacents);
        }
        graph
    }

    /// Fail with every cycle in the current prerequisite graph
    pub fn check_for_cycles(&self) -> Result<()> {
        let errors = self.graph().search_for_cycles();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DrakeError::CyclicDependency(errors))
        }
    }

    /// Resolve task names into execution order
    ///
    /// Every prerequisite precedes its dependents and each task appears once,
    /// at its first position. Requested names must exist and the graph must
    /// be acyclic.
    pub fn resolve_dependencies<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>> {
        let names = names
            .iter()
            .map(|n| normalize_task_name(n.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for name in &names {
            self.get(name)?;
        }
        self.check_for_cycles()?;

        let mut seen = HashSet::new();
        Ok(self
            .expand(&names, None)?
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect())
    }

    /// Recursively expand names into a flat list with prerequisites first
    ///
    /// Names are walked in reverse so each expansion is prepended ahead of
    /// the ones already produced. `parent` is the task whose prerequisites
    /// are being expanded.
    fn expand(&self, names: &[String], parent: Option<&Task>) -> Result<Vec<String>> {
        let mut result: Vec<String> = Vec::new();
        for name in names.iter().rev() {
            let Some(task) = self.tasks.get(name) else {
                match parent {
                    Some(parent) if !is_file_task(name) || !parent.is_file_task() => {
                        return Err(ResolutionError::MissingPrerequisite {
                            task: parent.name().to_string(),
                            prerequisite: name.clone(),
                        }
                        .into());
                    }
                    Some(_) => continue,
                    None if is_file_task(name) => continue,
                    None => return Err(ResolutionError::MissingTask(name.clone()).into()),
                }
            };

            let mut expanded = self.expand(task.prerequisites(), Some(task))?;
            expanded.push(task.name().to_string());
            expanded.append(&mut result);
            result = expanded;
        }
        Ok(result)
    }

    /// Path of the cache file for this registry
    pub fn cache_path(&self, ctx: &Context) -> PathBuf {
        match &ctx.cache_path {
            Some(path) => resolve_path(&self.dir, &path.to_string_lossy()),
            None => self.dir.join(DEFAULT_CACHE_FILE),
        }
    }

    /// Replace the in-memory cache with the persisted one
    ///
    /// A stale cache file is deleted, except on dry runs where it is only
    /// ignored.
    pub fn load_cache(&mut self, ctx: &Context) -> Result<()> {
        let path = self.cache_path(ctx);
        let existed = path.exists();
        self.cache = BuildCache::load(&path, ctx.dry_run)?;
        if existed && !path.exists() {
            ctx.print_info(&format!("deleted stale cache file: {}", path.display()));
        }
        Ok(())
    }

    /// Persist the in-memory cache
    pub fn save_cache(&self, ctx: &Context) -> Result<()> {
        Ok(self.cache.save(&self.cache_path(ctx))?)
    }

    pub fn cache(&self) -> &BuildCache {
        &self.cache
    }

    /// Report whether a file task must run; normal tasks always run
    pub fn is_out_of_date(&self, name: &str, ctx: &Context) -> Result<bool> {
        let task = self.get(name)?;
        if !task.is_file_task() {
            return Ok(true);
        }
        self.cache.is_out_of_date(task, &self.dir, ctx.dry_run)
    }

    /// Refresh a file task's cache entry from the files on disk
    pub fn update_cache(&mut self, name: &str) -> Result<()> {
        let task = self.get(name)?;
        if task.is_file_task() {
            let task = task.clone();
            self.cache.update(&task, &self.dir)?;
        }
        Ok(())
    }
}
