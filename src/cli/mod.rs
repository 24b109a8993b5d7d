//! CLI interface and argument parsing
//!
//! A thin front-end that loads a taskfile into a registry and runs the
//! requested tasks.

pub mod app;

// Re-export main types
pub use app::*;
