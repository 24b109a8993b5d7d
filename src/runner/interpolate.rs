//! Variable interpolation for command strings
//!
//! Replaces `${var}` references with values from the run variables, falling
//! back to the process environment.

use crate::error::{InterpolationError, InterpolationResult};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::env;
use std::sync::LazyLock;

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid variable regex"));

/// Maximum substitution passes before a reference chain is treated as recursive
const MAX_PASSES: usize = 32;

fn lookup(name: &str, vars: &HashMap<String, String>) -> Option<String> {
    vars.get(name).cloned().or_else(|| env::var(name).ok())
}

/// Interpolate variables in a string
///
/// Values may themselves contain references, which are expanded on the next
/// pass. Unknown variables are left as written.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> InterpolationResult<String> {
    let mut result = s.to_string();

    for _ in 0..MAX_PASSES {
        let mut changed = false;
        let next = VARIABLE
            .replace_all(&result, |caps: &Captures| match lookup(&caps[1], vars) {
                Some(value) => {
                    changed = true;
                    value
                }
                None => caps[0].to_string(),
            })
            .into_owned();

        if !changed {
            return Ok(next);
        }
        result = next;
    }

    Err(InterpolationError::RecursiveInterpolation)
}

/// Interpolate, failing on the first undefined variable
pub fn interpolate_strict(
    s: &str,
    vars: &HashMap<String, String>,
) -> InterpolationResult<String> {
    let result = interpolate(s, vars)?;
    match VARIABLE.captures(&result) {
        Some(caps) => Err(InterpolationError::UndefinedVariable(caps[1].to_string())),
        None => Ok(result),
    }
}
