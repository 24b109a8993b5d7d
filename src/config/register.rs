//! Registration of taskfile tasks

use crate::config::types::{Command, Config};
use crate::error::Result;
use crate::runner::{command_action, CommandStep, Context, Registry, ShellCommand};

impl From<&Command> for CommandStep {
    fn from(command: &Command) -> Self {
        match command {
            Command::Simple(exec) => CommandStep::Run(ShellCommand::new(exec.clone())),
            Command::Complex(detail) => CommandStep::Run(ShellCommand {
                exec: detail.exec.clone(),
                print: detail.print.clone(),
                quiet: detail.quiet,
                dir: detail.dir.clone(),
            }),
            Command::Parallel(group) => {
                CommandStep::Parallel(group.parallel.iter().map(CommandStep::from).collect())
            }
        }
    }
}

/// Register every taskfile task with `registry`
///
/// Commands become asynchronous actions that run with `ctx` in the registry
/// directory.
pub fn register_tasks(config: &Config, registry: &mut Registry, ctx: &Context) -> Result<()> {
    for (name, task) in &config.tasks {
        if let Some(desc) = &task.desc {
            registry.set_description(desc.clone());
        }
        let steps = task.run.iter().map(CommandStep::from).collect();
        let action = command_action(steps, ctx, registry.dir().to_path_buf());
        registry.register(name, &task.prereqs, action)?;
    }
    Ok(())
}
