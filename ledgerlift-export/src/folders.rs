//! Dated output folders and retention pruning.
//!
//! Every run writes into `<base>/<YYYY-MM-DD>/`; old runs age out by
//! folder name, so retention never has to stat file times.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DIR_DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's output directory under `base`, created if missing.
pub fn dated_output_dir(base: &Path, today: NaiveDate) -> Result<PathBuf> {
    let dir = base.join(today.format(DIR_DATE_FORMAT).to_string());
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

/// Delete dated subdirectories older than `keep_days`, returning what was
/// removed. Directories whose names are not dates are never touched.
pub fn prune_dated_dirs(base: &Path, keep_days: u32, today: NaiveDate) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    if !base.is_dir() {
        return Ok(removed);
    }
    let cutoff = today - Duration::days(i64::from(keep_days));

    for entry in fs::read_dir(base).with_context(|| format!("reading {}", base.display()))? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(name, DIR_DATE_FORMAT) else {
            debug!("leaving non-dated directory {name} alone");
            continue;
        };
        if date < cutoff {
            fs::remove_dir_all(&path).with_context(|| format!("removing {}", path.display()))?;
            removed.push(path);
        }
    }

    if !removed.is_empty() {
        info!(count = removed.len(), "pruned expired output directories");
    }
    Ok(removed)
}
