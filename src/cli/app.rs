//! Main CLI application

use crate::config::{
    find_config_file_from, is_valid_variable_name, parse_config_file, register_tasks,
    validate_config, Config,
};
use crate::error::{ConfigError, DrakeError};
use crate::runner::{Context, Registry, Verbosity};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("drake")
        .version(crate::VERSION)
        .about("A make-like task runner")
        .arg(
            Arg::new("targets")
                .value_name("TASK|NAME=VALUE")
                .help("Tasks to run and variables to set")
                .num_args(0..),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Path to the taskfile (default: search for Drakefile.yml)"),
        )
        .arg(
            Arg::new("directory")
                .short('d')
                .long("directory")
                .value_name("DIR")
                .help("Run in directory DIR"),
        )
        .arg(
            Arg::new("cache")
                .long("cache")
                .value_name("FILE")
                .help("Build cache file (default: .drake.cache.json)"),
        )
        .arg(
            Arg::new("always-make")
                .short('a')
                .long("always-make")
                .help("Unconditionally run file tasks")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .help("Show tasks that would run without running them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-tasks")
                .short('l')
                .long("list-tasks")
                .help("List tasks that have descriptions")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-all")
                .short('L')
                .long("list-all")
                .help("List all tasks and their prerequisites")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Do not log drake messages")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Split positional arguments into task names and `NAME=VALUE` variables
fn split_targets(targets: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut tasks = Vec::new();
    let mut vars = HashMap::new();
    for target in targets {
        match target.split_once('=') {
            Some((name, value)) if is_valid_variable_name(name) => {
                vars.insert(name.to_string(), value.to_string());
            }
            _ => tasks.push(target.clone()),
        }
    }
    (tasks, vars)
}

/// Resolve the `--directory` option to an absolute directory
fn resolve_directory(option: Option<&String>) -> Result<PathBuf, DrakeError> {
    let current = env::current_dir()?;
    let dir = match option {
        Some(dir) => current.join(dir),
        None => current,
    };
    if !dir.is_dir() {
        return Err(ConfigError::BadDirectory(dir).into());
    }
    Ok(dir.canonicalize()?)
}

/// Directory the taskfile lives in
///
/// Tasks, globs, commands and the cache resolve against it, so running from
/// a subdirectory behaves the same as running next to the taskfile.
fn taskfile_dir(config_path: &Path, start_dir: &Path) -> Result<PathBuf, DrakeError> {
    match config_path.parent() {
        Some(parent) if parent.is_dir() => Ok(parent.canonicalize()?),
        _ => Ok(start_dir.to_path_buf()),
    }
}

/// Load a `.env` file from the run directory if there is one
fn load_env_file(dir: &Path) {
    let env_file = dir.join(".env");
    if env_file.is_file() {
        if let Err(e) = dotenvy::from_path(&env_file) {
            log::warn!("failed to load {}: {}", env_file.display(), e);
        }
    }
}

/// Build the run context from the command line and the taskfile
fn build_context(matches: &ArgMatches, config: &Config, vars: HashMap<String, String>) -> Context {
    let mut all_vars: HashMap<String, String> = config.vars.clone().into_iter().collect();
    all_vars.extend(vars);

    let mut ctx = Context::new()
        .with_abort_exits(true)
        .with_verbosity(get_verbosity(matches))
        .with_always_make(matches.get_flag("always-make"))
        .with_dry_run(matches.get_flag("dry-run"))
        .with_list_tasks(matches.get_flag("list-tasks"))
        .with_list_all(matches.get_flag("list-all"))
        .with_vars(all_vars);

    if let Some(cache) = matches.get_one::<String>("cache") {
        ctx = ctx.with_cache_path(PathBuf::from(cache));
    }
    if let Some(interpreter) = &config.interpreter {
        ctx = ctx.with_interpreter(interpreter.clone());
    }
    ctx
}

/// Register the taskfile and run the requested (or default) tasks
async fn run_tasks(
    config: &Config,
    ctx: &Context,
    dir: PathBuf,
    mut tasks: Vec<String>,
) -> Result<(), DrakeError> {
    let mut registry = Registry::new(dir);
    register_tasks(config, &mut registry, ctx)?;

    if tasks.is_empty() {
        if let Some(default) = &config.default {
            tasks.push(default.clone());
        }
    }
    registry.run(ctx, &tasks).await
}

/// Run the CLI application with the given arguments
pub async fn run_from<I, T>(args: I) -> Result<(), DrakeError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);

    let start_dir = resolve_directory(matches.get_one::<String>("directory"))?;

    let targets: Vec<String> = matches
        .get_many::<String>("targets")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let (tasks, vars) = split_targets(&targets);

    let config_path = match matches.get_one::<String>("file") {
        Some(file) => start_dir.join(file),
        None => find_config_file_from(&start_dir)?,
    };
    let dir = taskfile_dir(&config_path, &start_dir)?;
    log::debug!("using taskfile {} in {}", config_path.display(), dir.display());
    load_env_file(&dir);

    let config = parse_config_file(&config_path)?;
    validate_config(&config)?;

    let ctx = build_context(&matches, &config, vars);
    let result = run_tasks(&config, &ctx, dir, tasks).await;
    ctx.abort_on_error(result)
}

/// Run the CLI application with the process arguments
pub async fn run() -> Result<(), DrakeError> {
    run_from(env::args_os()).await
}
