//! Trigger-set file loading
//!
//! Files are TOML, one set per file. Directories are walked recursively;
//! files that fail to parse are logged and skipped.

use std::fs;
use std::path::{Path, PathBuf};

use super::{DslError, TriggerSetFile};

/// A parsed set with the file it came from
#[derive(Debug, Clone)]
pub struct LoadedSet {
    pub file: TriggerSetFile,
    pub path: PathBuf,
}

pub fn parse_set(content: &str, path: &Path) -> Result<TriggerSetFile, DslError> {
    toml::from_str(content).map_err(|source| DslError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Load one trigger-set file
pub fn load_set_from_file(path: &Path) -> Result<TriggerSetFile, DslError> {
    let content = fs::read_to_string(path).map_err(|source| DslError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_set(&content, path)
}

/// Load every `.toml` set under `dir`, sorted by path. A missing directory
/// yields no sets.
pub fn load_sets_from_dir(dir: &Path) -> Result<Vec<LoadedSet>, DslError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut sets = Vec::new();
    load_recursive(dir, &mut sets)?;
    sets.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(sets)
}

fn load_recursive(dir: &Path, sets: &mut Vec<LoadedSet>) -> Result<(), DslError> {
    let entries = fs::read_dir(dir).map_err(|source| DslError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            load_recursive(&path, sets)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match load_set_from_file(&path) {
                Ok(file) => {
                    tracing::debug!(set = %file.set.id, path = %path.display(), "Loaded trigger set file");
                    sets.push(LoadedSet { file, path });
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Skipping trigger set file");
                }
            }
        }
    }

    Ok(())
}
