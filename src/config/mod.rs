//! Taskfile parsing and validation
//!
//! This module handles discovery and parsing of Drakefile.yml taskfiles,
//! validation of their settings, and registration of their tasks.

pub mod parse;
pub mod register;
pub mod schema;
pub mod types;

// Re-export main types
pub use parse::*;
pub use register::*;
pub use schema::*;
pub use types::*;
