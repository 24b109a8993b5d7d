//! Task name classification and normalization
//!
//! Normal tasks have bare identifier names. Every other name is a file task
//! and is rewritten to a canonical path so equal paths compare equal however
//! the caller spelled them.

use crate::error::{RegistrationError, RegistrationResult};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use std::sync::LazyLock;

static NORMAL_TASK_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid task name regex"));

const WILDCARD_CHARS: &[char] = &['*', '?', '['];

/// True if `name` is a normal (non-file) task name
pub fn is_normal_task(name: &str) -> bool {
    NORMAL_TASK_NAME.is_match(name)
}

/// True if `name` is a file task name
pub fn is_file_task(name: &str) -> bool {
    !is_normal_task(name)
}

/// True if `s` contains glob wildcard characters
pub fn has_wildcard(s: &str) -> bool {
    s.contains(WILDCARD_CHARS)
}

/// Lexically normalize a path and prefix relative paths with `./`
///
/// `.` components are dropped and `..` consumes the preceding component
/// where one exists. Paths that already start with a dot are left unprefixed.
pub fn normalize_path(path: &str) -> String {
    let mut out = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }

    let normalized = out.to_string_lossy().into_owned();
    if normalized.is_empty() {
        return ".".to_string();
    }
    if out.is_absolute() || normalized.starts_with('.') {
        normalized
    } else {
        format!(".{}{}", MAIN_SEPARATOR, normalized)
    }
}

/// Normalize a task name
///
/// Blank and wildcard names are rejected; file names are normalized to
/// their canonical path form.
pub fn normalize_task_name(raw: &str) -> RegistrationResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RegistrationError::BlankName);
    }
    if has_wildcard(name) {
        return Err(RegistrationError::WildcardName(name.to_string()));
    }
    if is_normal_task(name) {
        Ok(name.to_string())
    } else {
        Ok(normalize_path(name))
    }
}

/// Normalize a prerequisite list, expanding file globs against `dir`
///
/// Glob matches are sorted and deduplicated. A pattern that matches nothing
/// contributes nothing.
pub fn normalize_prerequisites<S: AsRef<str>>(
    prerequisites: &[S],
    dir: &Path,
) -> RegistrationResult<Vec<String>> {
    let mut result = Vec::new();
    for raw in prerequisites {
        let name = raw.as_ref().trim();
        if name.is_empty() {
            return Err(RegistrationError::BlankName);
        }
        if is_file_task(name) && has_wildcard(name) {
            result.extend(glob_files(&[name], dir)?);
        } else {
            result.push(normalize_task_name(name)?);
        }
    }
    Ok(result)
}

/// Return the normalized file names matching the glob patterns
///
/// Relative patterns are matched against `dir` and reported relative to it.
/// Directories are not included.
pub fn glob_files<S: AsRef<str>>(patterns: &[S], dir: &Path) -> RegistrationResult<Vec<String>> {
    let mut files = BTreeSet::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let absolute = Path::new(pattern).is_absolute();
        let full = if absolute {
            pattern.to_string()
        } else {
            format!(
                "{}{}{}",
                glob::Pattern::escape(&dir.to_string_lossy()),
                MAIN_SEPARATOR,
                pattern
            )
        };

        let paths = glob::glob(&full).map_err(|e| RegistrationError::InvalidGlob {
            pattern: pattern.to_string(),
            error: e.to_string(),
        })?;

        for path in paths.flatten() {
            if !path.is_file() {
                continue;
            }
            let path = if absolute {
                path
            } else {
                match path.strip_prefix(dir) {
                    Ok(relative) => relative.to_path_buf(),
                    Err(_) => path,
                }
            };
            files.insert(normalize_path(&path.to_string_lossy()));
        }
    }
    Ok(files.into_iter().collect())
}
