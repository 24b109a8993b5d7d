//! Task execution
//!
//! `run` walks the resolved order one task at a time, skipping file tasks
//! that are up to date. `execute` runs a batch of task actions: synchronous
//! actions in order, asynchronous actions concurrently.

use crate::error::{DrakeError, ExecutionError, ResolutionError, Result};
use crate::runner::name::normalize_task_name;
use crate::runner::task::{Action, Task};
use crate::runner::{Context, Registry};
use futures::future::{join_all, BoxFuture};

impl Registry {
    /// Run the named tasks and their prerequisites
    ///
    /// Tasks run in dependency order and at most once. The cache is loaded
    /// first and saved afterwards; if a task fails the cache is saved before
    /// the error is returned. Dry runs never write the cache and listing
    /// modes print the task list instead of running anything.
    pub async fn run<S: AsRef<str>>(&mut self, ctx: &Context, names: &[S]) -> Result<()> {
        if ctx.is_listing() {
            for line in self.list(ctx.list_all) {
                println!("{}", line);
            }
            return Ok(());
        }

        if names.is_empty() {
            return Err(ResolutionError::NoTaskSpecified.into());
        }
        let names = names
            .iter()
            .map(|n| normalize_task_name(n.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for name in &names {
            self.get(name)?;
        }

        self.load_cache(ctx)?;
        let order = self.resolve_dependencies(&names)?;
        log::debug!("execution order: {:?}", order);

        let result = self.run_in_order(ctx, &order).await;
        if ctx.dry_run {
            return result;
        }

        match result {
            Ok(()) => self.save_cache(ctx),
            Err(e) => {
                if let Err(save_error) = self.save_cache(ctx) {
                    log::warn!("failed to save cache after error: {}", save_error);
                }
                Err(e)
            }
        }
    }

    async fn run_in_order(&mut self, ctx: &Context, order: &[String]) -> Result<()> {
        for name in order {
            let task = self.get(name)?;
            if task.is_file_task() && !ctx.always_make && !self.is_out_of_date(name, ctx)? {
                ctx.print_task_skip(name, "up to date");
                continue;
            }
            self.execute(ctx, &[name]).await?;
        }
        Ok(())
    }

    /// Execute task actions as one batch, without walking prerequisites
    ///
    /// Tasks without an action are skipped. Synchronous actions run in list
    /// order as they are reached; asynchronous actions are started and then
    /// awaited together. Every started action settles before the first
    /// failure is returned. File tasks have their cache entry refreshed as
    /// soon as their action succeeds.
    pub async fn execute<S: AsRef<str>>(&mut self, ctx: &Context, names: &[S]) -> Result<()> {
        let tasks = names
            .iter()
            .map(|n| self.get(n.as_ref()).cloned())
            .collect::<Result<Vec<Task>>>()?;

        let mut pending: Vec<(&Task, BoxFuture<'static, anyhow::Result<()>>)> = Vec::new();
        let mut first_error: Option<DrakeError> = None;

        for task in &tasks {
            if task.action().is_none() {
                continue;
            }
            ctx.print_task_start(task.name());
            if ctx.dry_run {
                continue;
            }
            match task.action() {
                Action::None => {}
                Action::Sync(action) => match action(task) {
                    Ok(()) => self.task_succeeded(ctx, task)?,
                    Err(source) => {
                        first_error = Some(action_failed(task, source));
                        break;
                    }
                },
                Action::Async(action) => pending.push((task, action(task))),
            }
        }

        let results = join_all(
            pending
                .into_iter()
                .map(|(task, future)| async move { (task, future.await) }),
        )
        .await;

        for (task, result) in results {
            match result {
                Ok(()) => self.task_succeeded(ctx, task)?,
                Err(source) => {
                    if first_error.is_none() {
                        first_error = Some(action_failed(task, source));
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn task_succeeded(&mut self, ctx: &Context, task: &Task) -> Result<()> {
        if task.is_file_task() {
            self.update_cache(task.name())?;
        }
        ctx.print_task_complete(task.name());
        Ok(())
    }
}

fn action_failed(task: &Task, source: anyhow::Error) -> DrakeError {
    ExecutionError::ActionFailed {
        task: task.name().to_string(),
        source,
    }
    .into()
}
