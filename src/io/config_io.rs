use std::fs;
use std::path::{Path, PathBuf};

use crate::io::store::atomic_write;
use crate::model::config::OutlinerConfig;

/// Error type for reading and writing outliner.toml
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not parse config for editing: {0}")]
    Edit(#[from] toml_edit::TomlError),
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for format-preserving edits.
pub fn read_config(path: &Path) -> Result<(OutlinerConfig, toml_edit::DocumentMut), ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: OutlinerConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Read the config, falling back to defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<OutlinerConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(OutlinerConfig::default());
    }
    read_config(path).map(|(config, _)| config)
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    atomic_write(path, doc.to_string().as_bytes()).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

fn ensure_table(doc: &mut toml_edit::DocumentMut, name: &str) {
    if !doc.contains_key(name) {
        doc[name] = toml_edit::Item::Table(toml_edit::Table::new());
    }
}

/// Update the rebalance threshold in the config document
pub fn set_rebalance_threshold(doc: &mut toml_edit::DocumentMut, threshold: usize) {
    ensure_table(doc, "ordering");
    doc["ordering"]["rebalance_threshold"] = toml_edit::value(threshold as i64);
}

/// Update the default search options in the config document
pub fn set_search_defaults(doc: &mut toml_edit::DocumentMut, case_insensitive: bool, whole_words: bool) {
    ensure_table(doc, "search");
    doc["search"]["case_insensitive"] = toml_edit::value(case_insensitive);
    doc["search"]["whole_words"] = toml_edit::value(whole_words);
}

/// Update the generator name written into exported OPML
pub fn set_generator(doc: &mut toml_edit::DocumentMut, generator: &str) {
    ensure_table(doc, "export");
    doc["export"]["generator"] = toml_edit::value(generator);
}
