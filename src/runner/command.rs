//! Shell command actions
//!
//! Commands run through the context interpreter with the run variables
//! interpolated into the command line and exported to the child environment.
//! A parallel step starts all of its commands and waits for every one.

use crate::error::{ExecutionError, Result};
use crate::runner::context::Verbosity;
use crate::runner::task::Action;
use crate::runner::{interpolate, interpolate_strict, Context};
use futures::future::{join_all, BoxFuture};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command as ProcessCommand;

/// A shell command
#[derive(Debug, Clone, PartialEq)]
pub struct ShellCommand {
    /// Command line to execute
    pub exec: String,

    /// What to print when running (defaults to exec)
    pub print: Option<String>,

    /// Whether to suppress the command echo
    pub quiet: bool,

    /// Working directory, relative to the run directory
    pub dir: Option<String>,
}

impl ShellCommand {
    pub fn new(exec: impl Into<String>) -> Self {
        ShellCommand {
            exec: exec.into(),
            print: None,
            quiet: false,
            dir: None,
        }
    }
}

/// One step of a command action
#[derive(Debug, Clone, PartialEq)]
pub enum CommandStep {
    Run(ShellCommand),

    /// Steps started together; the group fails if any member fails
    Parallel(Vec<CommandStep>),
}

impl From<ShellCommand> for CommandStep {
    fn from(command: ShellCommand) -> Self {
        CommandStep::Run(command)
    }
}

/// Execute a command in the given context
pub async fn execute_command(cmd: &ShellCommand, ctx: &Context, dir: &Path) -> Result<()> {
    let exec_str = interpolate(&cmd.exec, &ctx.vars)?;

    if !cmd.quiet && ctx.verbosity >= Verbosity::Normal {
        let print_str = match &cmd.print {
            Some(print) => interpolate(print, &ctx.vars)?,
            None => exec_str.clone(),
        };
        eprintln!("{}", print_str);
    }

    let working_dir = match &cmd.dir {
        Some(sub) => dir.join(interpolate_strict(sub, &ctx.vars)?),
        None => dir.to_path_buf(),
    };

    let (program, args) = ctx
        .interpreter
        .split_first()
        .ok_or_else(|| ExecutionError::Spawn {
            command: exec_str.clone(),
            error: "empty interpreter".to_string(),
        })?;

    let status = ProcessCommand::new(program)
        .args(args)
        .arg(&exec_str)
        .current_dir(&working_dir)
        .envs(&ctx.vars)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| ExecutionError::Spawn {
            command: exec_str.clone(),
            error: e.to_string(),
        })?;

    if !status.success() {
        return Err(ExecutionError::CommandFailed {
            command: exec_str,
            code: status.code(),
        }
        .into());
    }

    Ok(())
}

/// Run a step; every member of a parallel group settles before the first
/// failure, in group order, is returned
pub fn run_step<'a>(
    step: &'a CommandStep,
    ctx: &'a Context,
    dir: &'a Path,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        match step {
            CommandStep::Run(cmd) => execute_command(cmd, ctx, dir).await,
            CommandStep::Parallel(steps) => join_all(steps.iter().map(|s| run_step(s, ctx, dir)))
                .await
                .into_iter()
                .collect(),
        }
    })
}

/// Build an asynchronous action that runs `steps` one after another
pub fn command_action(steps: Vec<CommandStep>, ctx: &Context, dir: PathBuf) -> Action {
    if steps.is_empty() {
        return Action::None;
    }

    let steps = Arc::new(steps);
    let ctx = Arc::new(ctx.clone());
    let dir = Arc::new(dir);

    Action::from_async(move |_task| {
        let steps = Arc::clone(&steps);
        let ctx = Arc::clone(&ctx);
        let dir = Arc::clone(&dir);
        async move {
            for step in steps.iter() {
                run_step(step, &ctx, &dir).await?;
            }
            Ok::<(), anyhow::Error>(())
        }
    })
}
