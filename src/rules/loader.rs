//! Rule configuration loading.
//!
//! Two on-disk shapes are accepted:
//!
//! - **legacy**: one document holding `htmlPreprocessors` and
//!   `markdownPostprocessors` arrays of rule objects;
//! - **split**: the same two keys holding filename lists, each filename
//!   prefixed with a strictly increasing numeric ordering token, each file
//!   holding one rule, an array of rules, or `{ "rules": [...] }`.
//!
//! How the bytes are fetched is a collaborator concern: the loader talks to a
//! [`RuleSource`] and ships a filesystem implementation.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{LoadError, RuleError};

use super::{CompiledRule, RuleSet, validate_rule};

/// Supplies rule documents by path. Implementations decide what a path means
/// (filesystem, bundled assets, a network cache).
pub trait RuleSource {
    fn fetch(&self, path: &str) -> Result<Value, LoadError>;
}

/// A [`RuleSource`] resolving paths against a root directory.
#[derive(Debug, Clone)]
pub struct FsRuleSource {
    root: PathBuf,
}

impl FsRuleSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl RuleSource for FsRuleSource {
    fn fetch(&self, path: &str) -> Result<Value, LoadError> {
        let full = self.root.join(path);
        let bytes = std::fs::read(&full).map_err(|source| LoadError::Io {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| LoadError::Json {
            path: path.to_string(),
            source,
        })
    }
}

/// Load a rule set, falling back to [`RuleSet::empty`] on any failure.
///
/// This is the entry point conversion hosts use: a broken configuration is
/// logged and conversion proceeds rule-free rather than failing outright.
#[must_use]
pub fn load_rules(source: &dyn RuleSource, entry: &str) -> RuleSet {
    match try_load_rules(source, entry) {
        Ok(set) => set,
        Err(err) => {
            tracing::warn!(
                entry,
                error = %err,
                "could not load rules configuration; conversion will omit custom rules"
            );
            RuleSet::empty()
        }
    }
}

/// Load a rule set, surfacing the typed failure.
pub fn try_load_rules(source: &dyn RuleSource, entry: &str) -> Result<RuleSet, LoadError> {
    let document = source.fetch(entry)?;

    let html = phase_array(&document, "htmlPreprocessors")?;
    let markdown = phase_array(&document, "markdownPostprocessors")?;

    let all_objects =
        |entries: &[Value]| entries.iter().all(|e| e.is_object() && e.get("pattern").is_some());
    let all_strings = |entries: &[Value]| entries.iter().all(Value::is_string);

    if all_objects(html) && all_objects(markdown) {
        return load_legacy(entry, html, markdown);
    }
    if all_strings(html) && all_strings(markdown) {
        return load_split(source, html, markdown);
    }
    Err(LoadError::UnrecognizedShape)
}

fn phase_array<'a>(document: &'a Value, key: &str) -> Result<&'a Vec<Value>, LoadError> {
    document
        .get(key)
        .and_then(Value::as_array)
        .ok_or(LoadError::UnrecognizedShape)
}

fn load_legacy(entry: &str, html: &[Value], markdown: &[Value]) -> Result<RuleSet, LoadError> {
    let mut seen_ids = HashSet::new();
    Ok(RuleSet {
        html_preprocessors: validate_phase(entry, html, &mut seen_ids)?,
        markdown_postprocessors: validate_phase(entry, markdown, &mut seen_ids)?,
    })
}

fn validate_phase(
    path: &str,
    entries: &[Value],
    seen_ids: &mut HashSet<String>,
) -> Result<Vec<CompiledRule>, LoadError> {
    let mut rules = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let label = format!("{path}#{}", index + 1);
        if let Some(rule) = validate_rule(entry, &label, seen_ids)? {
            rules.push(rule);
        }
    }
    Ok(rules)
}

fn load_split(
    source: &dyn RuleSource,
    html_files: &[Value],
    markdown_files: &[Value],
) -> Result<RuleSet, LoadError> {
    let html_files = filenames(html_files);
    let markdown_files = filenames(markdown_files);
    if html_files.is_empty() || markdown_files.is_empty() {
        return Err(LoadError::UnrecognizedShape);
    }

    assert_strictly_increasing(&html_files, "htmlPreprocessors")?;
    assert_strictly_increasing(&markdown_files, "markdownPostprocessors")?;

    let mut seen_ids = HashSet::new();
    Ok(RuleSet {
        html_preprocessors: load_phase_files(source, &html_files, &mut seen_ids)?,
        markdown_postprocessors: load_phase_files(source, &markdown_files, &mut seen_ids)?,
    })
}

fn filenames(entries: &[Value]) -> Vec<String> {
    entries
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

static ORDERING_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|/)(\d+)-").expect("ORDERING_PREFIX: hardcoded regex is valid")
});

/// Verify every filename carries a numeric prefix and the prefixes strictly
/// increase within the phase; load order must be deterministic from names
/// alone.
fn assert_strictly_increasing(files: &[String], phase: &'static str) -> Result<(), RuleError> {
    let mut previous: Option<u64> = None;
    for file in files {
        let token = ORDERING_PREFIX
            .captures(file)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .ok_or_else(|| RuleError::MissingPrefix {
                phase,
                file: file.clone(),
            })?;
        if previous.is_some_and(|prev| token <= prev) {
            return Err(RuleError::Ordering {
                phase,
                file: file.clone(),
            });
        }
        previous = Some(token);
    }
    Ok(())
}

fn load_phase_files(
    source: &dyn RuleSource,
    files: &[String],
    seen_ids: &mut HashSet<String>,
) -> Result<Vec<CompiledRule>, LoadError> {
    let mut rules = Vec::new();
    for file in files {
        let payload = source.fetch(file)?;
        let entries = rules_from_payload(payload, file)?;
        rules.extend(validate_phase(file, &entries, seen_ids)?);
    }
    Ok(rules)
}

/// A rule file may be an array of rules, `{ "rules": [...] }`, or a single
/// rule object.
fn rules_from_payload(payload: Value, path: &str) -> Result<Vec<Value>, LoadError> {
    match payload {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut object) => match object.remove("rules") {
            Some(Value::Array(entries)) => Ok(entries),
            Some(_) => Err(LoadError::BadFilePayload {
                path: path.to_string(),
            }),
            None => Ok(vec![Value::Object(object)]),
        },
        _ => Err(LoadError::BadFilePayload {
            path: path.to_string(),
        }),
    }
}
