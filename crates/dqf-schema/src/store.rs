//! JSON persistence for [`SchemaTruth`].
//!
//! The document is an object keyed by canonical key. Each entry carries
//! `header` (equal to the key), `description`, `example`, `synonyms` and an
//! optional `header_regex`. The reserved `value_transforms` entry maps keys to
//! lists of `{pattern, suggest}` rules.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, info};

use dqf_model::ValueTransform;

use crate::error::SchemaError;
use crate::truth::{CanonicalColumn, MergeReport, SchemaTruth, compile_anchored};

const VALUE_TRANSFORMS_KEY: &str = "value_transforms";

/// Top-level entries in document order, duplicates included.
struct Entries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for Entries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Entries;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a JSON object keyed by canonical column")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Entries, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct ColumnEntry {
    #[serde(default)]
    header: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default, deserialize_with = "lenient_text")]
    example: String,
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    header_regex: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}

/// Parses a schema document. `origin` is only used in error messages.
pub fn parse_document(text: &str, origin: &Path) -> Result<SchemaTruth, SchemaError> {
    let mut truth = SchemaTruth::new();
    if text.trim().is_empty() {
        return Ok(truth);
    }
    let Entries(entries) =
        serde_json::from_str(text).map_err(|source| SchemaError::json(origin, source))?;

    let mut seen = HashSet::new();
    let mut transforms = None;
    for (key, value) in entries {
        if !seen.insert(key.clone()) {
            return Err(SchemaError::DuplicateKey { key });
        }
        if key == VALUE_TRANSFORMS_KEY {
            transforms = Some(value);
            continue;
        }
        let entry: ColumnEntry =
            serde_json::from_value(value).map_err(|err| SchemaError::InvalidDocument {
                message: format!("column {key}: {err}"),
            })?;
        truth.add_canonical(column_from_entry(key, entry)?)?;
    }

    if let Some(value) = transforms {
        let transforms: IndexMap<String, Vec<ValueTransform>> = serde_json::from_value(value)
            .map_err(|err| SchemaError::InvalidDocument {
                message: format!("{VALUE_TRANSFORMS_KEY}: {err}"),
            })?;
        for (key, list) in transforms {
            if !truth.contains(&key) {
                return Err(SchemaError::UnknownColumn { key });
            }
            for transform in list {
                compile_anchored(&transform.pattern).map_err(|source| {
                    SchemaError::InvalidTransform {
                        key: key.clone(),
                        pattern: transform.pattern.clone(),
                        source,
                    }
                })?;
                truth.record_transform(&key, &transform.pattern, &transform.suggest);
            }
        }
    }
    Ok(truth)
}

fn column_from_entry(key: String, entry: ColumnEntry) -> Result<CanonicalColumn, SchemaError> {
    if let Some(header) = entry.header.as_deref()
        && header.trim() != key
    {
        return Err(SchemaError::HeaderMismatch {
            key,
            header: header.to_string(),
        });
    }
    let column = CanonicalColumn::new(key)
        .with_description(entry.description)
        .with_example(entry.example)
        .with_synonyms(entry.synonyms)
        .with_extra(entry.extra);
    match entry.header_regex.as_deref().map(str::trim) {
        Some(pattern) if !pattern.is_empty() => column.with_header_pattern(pattern),
        _ => Ok(column),
    }
}

/// Renders the truth in the on-disk document shape.
pub fn to_document(truth: &SchemaTruth) -> Value {
    let mut document = Map::new();
    for column in truth.columns() {
        let mut entry = Map::new();
        entry.insert("header".into(), Value::String(column.key.clone()));
        entry.insert(
            "description".into(),
            Value::String(column.description.clone()),
        );
        entry.insert("example".into(), Value::String(column.example.clone()));
        entry.insert(
            "synonyms".into(),
            Value::Array(column.synonyms.iter().cloned().map(Value::String).collect()),
        );
        if let Some(pattern) = column.header_pattern() {
            entry.insert("header_regex".into(), Value::String(pattern.to_string()));
        }
        for (name, value) in column.extra_fields() {
            if !entry.contains_key(name) {
                entry.insert(name.clone(), value.clone());
            }
        }
        document.insert(column.key.clone(), Value::Object(entry));
    }

    let mut transforms = Map::new();
    for key in truth.transform_keys() {
        let list = truth
            .value_transforms(key)
            .map(|transform| {
                let mut rule = Map::new();
                rule.insert("pattern".into(), Value::String(transform.pattern.clone()));
                rule.insert("suggest".into(), Value::String(transform.suggest.clone()));
                Value::Object(rule)
            })
            .collect();
        transforms.insert(key.to_string(), Value::Array(list));
    }
    if !transforms.is_empty() {
        document.insert(VALUE_TRANSFORMS_KEY.into(), Value::Object(transforms));
    }
    Value::Object(document)
}

/// File-backed schema truth store.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    path: PathBuf,
}

impl SchemaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document. A missing file yields an empty schema.
    pub fn load(&self) -> Result<SchemaTruth, SchemaError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "schema file not found, starting empty");
                return Ok(SchemaTruth::new());
            }
            Err(err) => return Err(SchemaError::io(&self.path, err)),
        };
        let truth = parse_document(&text, &self.path)?;
        debug!(path = %self.path.display(), columns = truth.len(), "loaded schema truth");
        Ok(truth)
    }

    /// Writes the document through a sibling temp file and a rename.
    pub fn save(&self, truth: &SchemaTruth) -> Result<(), SchemaError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|err| SchemaError::io(dir, err))?;
        let mut file =
            tempfile::NamedTempFile::new_in(dir).map_err(|err| SchemaError::io(dir, err))?;
        serde_json::to_writer_pretty(&mut file, &to_document(truth))
            .map_err(|err| SchemaError::json(&self.path, err))?;
        file.write_all(b"\n")
            .map_err(|err| SchemaError::io(&self.path, err))?;
        file.as_file()
            .sync_all()
            .map_err(|err| SchemaError::io(&self.path, err))?;
        file.persist(&self.path)
            .map_err(|err| SchemaError::io(&self.path, err.error))?;
        Ok(())
    }

    /// Merges `truth` into the current on-disk document and writes the result.
    ///
    /// Claims already on disk win. On success `truth` is replaced by the merged
    /// state and the report of what reached the disk copy is returned.
    pub fn flush(&self, truth: &mut SchemaTruth) -> Result<MergeReport, SchemaError> {
        let mut merged = self.load()?;
        let report = merged.merge_from(truth);
        self.save(&merged)?;
        info!(
            path = %self.path.display(),
            changes = report.changes.len(),
            conflicts = report.conflicts.len(),
            columns = merged.len(),
            "flushed schema truth"
        );
        *truth = merged;
        Ok(report)
    }
}
