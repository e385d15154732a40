
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::RagError;

pub const DEFAULT_TITLE: &str = "No Title";

/// One document read from the dataset, ready to be embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub title: String,
    pub content: String,
    /// Path of the file the record came from
    pub source_path: String,
}

impl Record {
    /// Text that is embedded and handed to the LLM as context
    #[inline]
    pub fn text(&self) -> String {
        format!("Title: {}\nContent: {}", self.title, self.content)
    }
}

/// Load every record from the `*.json` files directly inside `dir`
///
/// Files are read in sorted path order, items in file order. Files that
/// cannot be read or parsed are logged and skipped. Source paths are
/// absolute, so the same file yields the same source however `dir` is spelled.
///
/// # Errors
/// Returns [`RagError::Config`] when `dir` is not a directory.
#[inline]
pub fn load_documents(dir: &Path) -> Result<Vec<Record>, RagError> {
    let files = json_files(dir)?;
    info!("Found {} JSON files in {}", files.len(), dir.display());

    let mut records = Vec::new();
    for path in files {
        match load_file(&path) {
            Ok(mut loaded) => {
                debug!("Loaded {} records from {}", loaded.len(), path.display());
                records.append(&mut loaded);
            }
            Err(e) => error!("Error loading {}: {}", path.display(), e),
        }
    }

    info!("Loaded {} documents", records.len());
    Ok(records)
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>, RagError> {
    if !dir.is_dir() {
        return Err(RagError::Config(format!(
            "Dataset directory {} does not exist",
            dir.display()
        )));
    }

    let dir = fs::canonicalize(dir)?;
    let mut files = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn load_file(path: &Path) -> Result<Vec<Record>, RagError> {
    let raw = fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&raw)
        .map_err(|e| RagError::Ingest(format!("invalid JSON: {}", e)))?;

    let source_path = path.to_string_lossy().to_string();
    let items = match data {
        Value::Array(items) => items,
        item @ Value::Object(_) => vec![item],
        _ => {
            return Err(RagError::Ingest(
                "top-level value is neither an array nor an object".to_string(),
            ));
        }
    };

    let records = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let record = parse_item(item, &source_path);
            if record.is_none() {
                warn!("Skipping item {} in {}: not a JSON object", index, source_path);
            }
            record
        })
        .collect();

    Ok(records)
}

fn parse_item(item: Value, source_path: &str) -> Option<Record> {
    let Value::Object(mut fields) = item else {
        return None;
    };

    let title = match fields.remove("title") {
        None | Some(Value::Null) => DEFAULT_TITLE.to_string(),
        Some(value) => stringify(value),
    };

    let content = match fields.remove("content") {
        None | Some(Value::Null) => String::new(),
        Some(Value::Array(parts)) => parts
            .into_iter()
            .map(stringify)
            .collect::<Vec<_>>()
            .join("\n"),
        Some(value) => stringify(value),
    };

    Some(Record {
        title,
        content,
        source_path: source_path.to_string(),
    })
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
