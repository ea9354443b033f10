//! Persistence of rule sets as JSON.
//!
//! Two shapes are accepted when loading:
//!
//! ```json
//! [
//!   { "folder": "INVOICES", "keywords": ["invoice", "receipt"] },
//!   { "folder": "DOCUMENTS", "keywords": [".pdf", ".docx"] }
//! ]
//! ```
//!
//! and the older mapping of folder to bare extensions:
//!
//! ```json
//! { "Images": ["jpg", "png"], "Documents": ["pdf"] }
//! ```
//!
//! A mapping carries no priority order. Its rules come out in the key order of
//! the parsed JSON object (lexicographic), which is only a best-effort
//! conversion. Rule sets are always saved in the list shape.

use crate::error::{Result, SorterError};
use crate::rules::{Rule, RuleSet};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Parses a rule set from JSON text in either supported shape.
///
/// Rules whose folder is not a single plain folder name are dropped.
pub fn load_rules_from_str(text: &str) -> Result<RuleSet> {
    let value: Value = serde_json::from_str(text)?;
    let mut rules: RuleSet = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        Value::Object(map) => {
            let mut rules = Vec::with_capacity(map.len());
            for (folder, extensions) in map {
                let extensions: Vec<String> = serde_json::from_value(extensions)?;
                let tokens = extensions.iter().map(|ext| legacy_extension_token(ext));
                rules.push(Rule::new(&folder, tokens));
            }
            log::debug!("Converted legacy folder mapping into {} rules", rules.len());
            RuleSet::new(rules)
        }
        other => {
            return Err(SorterError::RulesParse {
                path: PathBuf::new(),
                reason: format!(
                    "expected a list of rules or a folder mapping, found {}",
                    kind(&other)
                ),
            });
        }
    };
    rules.retain_valid_folders();
    Ok(rules)
}

fn legacy_extension_token(ext: &str) -> String {
    let ext = ext.trim();
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Serializes a rule set in the list shape with four-space indentation.
pub fn rules_to_string(rules: &RuleSet) -> Result<String> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    rules.serialize(&mut serializer)?;
    let mut text = String::from_utf8_lossy(&buffer).into_owned();
    text.push('\n');
    Ok(text)
}

/// A rule file on disk.
#[derive(Debug, Clone)]
pub struct RuleStore {
    path: PathBuf,
}

impl RuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the rule file, propagating any read or parse error.
    pub fn try_load(&self) -> Result<RuleSet> {
        let text = fs::read_to_string(&self.path).map_err(|e| SorterError::RulesRead {
            path: self.path.clone(),
            source: e,
        })?;
        load_rules_from_str(&text).map_err(|e| SorterError::RulesParse {
            path: self.path.clone(),
            reason: match e {
                SorterError::RulesParse { reason, .. } => reason,
                other => other.to_string(),
            },
        })
    }

    /// Loads the rule set, never failing.
    ///
    /// A missing file is created holding an empty rule list. A file that
    /// cannot be read or parsed is logged and treated as an empty rule set.
    pub fn load(&self) -> RuleSet {
        if !self.path.exists() {
            let empty = RuleSet::default();
            if let Err(e) = self.save(&empty) {
                log::error!("{}", e);
            }
            return empty;
        }

        match self.try_load() {
            Ok(rules) => {
                log::debug!("Loaded {} rules from {}", rules.len(), self.path.display());
                rules
            }
            Err(e) => {
                log::error!("{}; continuing with no rules", e);
                RuleSet::default()
            }
        }
    }

    /// Writes the rule set in the list shape, creating parent directories.
    pub fn save(&self, rules: &RuleSet) -> Result<()> {
        let write_error = |source| SorterError::RulesWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let text = rules_to_string(rules)?;
        fs::write(&self.path, text).map_err(write_error)?;
        log::debug!("Saved {} rules to {}", rules.len(), self.path.display());
        Ok(())
    }
}
