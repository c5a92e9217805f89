//! File globbing for bounded file sources.
//!
//! ```no_run
//! use windbeam::io::glob::expand_glob;
//!
//! let files = expand_glob("logs/*.txt")?;
//! # use anyhow::Error; Ok::<(), Error>(())
//! ```

use anyhow::{Context, Result, bail};
use glob::glob;
use std::path::PathBuf;

/// Every regular file matching `pattern`, sorted by path.
///
/// A pattern without wildcards names a single file and is returned as is
/// when that file exists.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path = entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }

    // deterministic order
    result.sort();

    Ok(result)
}

/// Like [`expand_glob`], but an empty match is an error.
pub fn expand_glob_required(pattern: &str) -> Result<Vec<PathBuf>> {
    let files = expand_glob(pattern)?;
    if files.is_empty() {
        bail!("no files found matching pattern: {pattern}");
    }
    Ok(files)
}

/// True when `s` contains glob metacharacters.
pub fn is_glob_pattern(s: &str) -> bool {
    s.contains(['*', '?', '['])
}
