//! Task types
//!
//! A task is immutable once registered. Its action is an explicit variant so
//! the engine dispatches on the variant instead of probing the function.

use crate::runner::name::is_file_task;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Result returned by task actions
pub type ActionResult = anyhow::Result<()>;

type SyncFn = dyn Fn(&Task) -> ActionResult + Send + Sync;
type AsyncFn = dyn Fn(&Task) -> BoxFuture<'static, ActionResult> + Send + Sync;

/// The unit of work attached to a task
#[derive(Clone, Default)]
pub enum Action {
    /// No action; the task only groups its prerequisites
    #[default]
    None,

    /// Runs to completion on the calling thread
    Sync(Arc<SyncFn>),

    /// Started and then awaited with the rest of its batch
    Async(Arc<AsyncFn>),
}

impl Action {
    /// Wrap a synchronous action
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Task) -> ActionResult + Send + Sync + 'static,
    {
        Action::Sync(Arc::new(f))
    }

    /// Wrap an asynchronous action
    ///
    /// The returned future must own what it needs from the task.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(&Task) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        Action::Async(Arc::new(move |task: &Task| -> BoxFuture<'static, ActionResult> {
            Box::pin(f(task))
        }))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Action::None)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::None => write!(f, "None"),
            Action::Sync(_) => write!(f, "Sync(..)"),
            Action::Async(_) => write!(f, "Async(..)"),
        }
    }
}

/// Task kinds, decided by the lexical shape of the name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Normal,
    File,
}

/// A registered task
#[derive(Debug, Clone)]
pub struct Task {
    name: String,
    description: String,
    prerequisites: Vec<String>,
    action: Action,
}

impl Task {
    /// Create a task from already normalized parts
    pub(crate) fn new(
        name: String,
        description: String,
        prerequisites: Vec<String>,
        action: Action,
    ) -> Self {
        Task {
            name,
            description,
            prerequisites,
            action,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description; empty for hidden tasks
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn kind(&self) -> TaskKind {
        if is_file_task(&self.name) {
            TaskKind::File
        } else {
            TaskKind::Normal
        }
    }

    pub fn is_file_task(&self) -> bool {
        self.kind() == TaskKind::File
    }

    /// Hidden tasks are left out of default listings
    pub fn is_hidden(&self) -> bool {
        self.description.is_empty()
    }

    /// Prerequisites that name files
    pub fn file_prerequisites(&self) -> impl Iterator<Item = &str> {
        self.prerequisites
            .iter()
            .map(String::as_str)
            .filter(|p| is_file_task(p))
    }
}
