//! Drake - a make-like task runner
//!
//! Tasks are registered with their prerequisites in a [`Registry`]. Running
//! a task runs its prerequisites first, each at most once. File tasks are
//! skipped while their target is up to date with respect to their file
//! prerequisites, tracked in a persisted build cache.
//!
//! ```no_run
//! use drake::{Action, Context, Registry};
//!
//! # async fn example() -> drake::Result<()> {
//! let mut registry = Registry::from_current_dir()?;
//! registry.set_description("Build the app");
//! registry.register("build", &["./out/app"], Action::None)?;
//! registry.register("./out/app", &["./src/*.c"], Action::sync(|_task| Ok(())))?;
//! registry.run(&Context::new(), &["build"]).await?;
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;

// Re-export commonly used types
pub use error::{DrakeError, Result};
pub use runner::{Action, Context, Registry, Task, Verbosity};

/// Current version of Drake
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
