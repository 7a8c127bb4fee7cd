use anyhow::{Context, Result};
use ledgerlift_core::PolarityPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk policy file. The polarity vocabulary sits under its own table
/// so future knobs can join it without breaking existing files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyFile {
    pub polarity: PolarityPolicy,
}

/// Load a policy file, or the built-in vocabulary when no path is given.
pub fn load_policy(path: Option<&Path>) -> Result<PolicyFile> {
    let Some(path) = path else {
        return Ok(PolicyFile::default());
    };
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

/// Write the built-in vocabulary as a starting point for editing.
pub fn write_default_policy(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Policy already exists: {}", path.display());
        return Ok(());
    }
    let s = toml::to_string_pretty(&PolicyFile::default()).context("serialize policy")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
