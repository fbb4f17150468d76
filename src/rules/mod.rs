//! Rule data model: validation and eager compilation.
//!
//! Rules arrive as JSON in a JavaScript regex dialect (`pattern`,
//! `replacement` with `$1` capture references, JS-style `flags`). They are
//! validated and compiled at load time so configuration errors surface before
//! any document is processed, and applied as ordered text substitutions by
//! [`rewrite::apply_rules`].

mod loader;
mod rewrite;

pub use loader::{FsRuleSource, RuleSource, load_rules, try_load_rules};
pub use rewrite::apply_rules;

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::error::RuleError;

/// Wire shape of a single rule, deserialized after the required-field check.
#[derive(Debug, Clone, Deserialize)]
struct RawRule {
    id: String,
    description: String,
    pattern: String,
    replacement: String,
    #[serde(default)]
    flags: Option<String>,
    #[serde(default)]
    enabled: Option<bool>,
}

/// A validated rule with its pattern compiled.
///
/// JS `i`/`m`/`s` flags are folded into the pattern as inline groups; the `g`
/// flag selects replace-all versus replace-first behavior at apply time.
#[derive(Debug)]
pub struct CompiledRule {
    pub id: String,
    pub description: String,
    pub pattern: String,
    pub replacement: String,
    pub flags: String,
    pub(crate) regex: fancy_regex::Regex,
    pub(crate) global: bool,
}

/// An immutable, order-significant pair of rule lists.
///
/// Constructed once per load operation; a fresh set may replace it on demand.
#[derive(Debug, Default)]
pub struct RuleSet {
    pub html_preprocessors: Vec<CompiledRule>,
    pub markdown_postprocessors: Vec<CompiledRule>,
}

impl RuleSet {
    /// The rule-free set the loader falls back to on any failure.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.html_preprocessors.is_empty() && self.markdown_postprocessors.is_empty()
    }
}

const REQUIRED_FIELDS: [&str; 4] = ["id", "description", "pattern", "replacement"];

/// Validate one rule object and compile its pattern.
///
/// Returns `Ok(None)` for rules with `enabled: false`; they are excluded at
/// load time, not at apply time.
pub(crate) fn validate_rule(
    value: &Value,
    label: &str,
    seen_ids: &mut HashSet<String>,
) -> Result<Option<CompiledRule>, RuleError> {
    let object = value.as_object().ok_or_else(|| RuleError::Shape {
        label: label.to_string(),
        field: "id",
    })?;

    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(RuleError::Shape {
                label: label.to_string(),
                field,
            });
        }
    }
    if let Some(flags) = object.get("flags")
        && !flags.is_string()
    {
        return Err(RuleError::NonStringFlags {
            label: label.to_string(),
        });
    }

    let raw: RawRule = serde_json::from_value(value.clone()).map_err(|_| RuleError::Shape {
        label: label.to_string(),
        field: "id",
    })?;

    if !seen_ids.insert(raw.id.clone()) {
        return Err(RuleError::DuplicateId { id: raw.id });
    }

    if raw.enabled == Some(false) {
        return Ok(None);
    }

    Some(compile_rule(&raw)).transpose()
}

fn compile_rule(raw: &RawRule) -> Result<CompiledRule, RuleError> {
    let flags = raw.flags.clone().unwrap_or_else(|| "g".to_string());
    let (anchored_pattern, global) = translate_js_flags(&raw.pattern, &flags);

    let regex =
        fancy_regex::Regex::new(&anchored_pattern).map_err(|err| RuleError::InvalidPattern {
            id: raw.id.clone(),
            message: err.to_string(),
        })?;

    Ok(CompiledRule {
        id: raw.id.clone(),
        description: raw.description.clone(),
        pattern: raw.pattern.clone(),
        replacement: raw.replacement.clone(),
        flags,
        regex,
        global,
    })
}

/// Fold JS regex flags into an inline flag group.
///
/// `i`, `m`, and `s` have direct inline equivalents. `g` is not a pattern
/// property in Rust regex engines, so it is returned separately. `u` and `y`
/// have no meaningful translation (patterns are always Unicode here, and
/// sticky matching never applies to whole-text substitution) and are ignored.
fn translate_js_flags(pattern: &str, flags: &str) -> (String, bool) {
    let global = flags.contains('g');
    let inline: String = flags.chars().filter(|c| matches!(c, 'i' | 'm' | 's')).collect();
    if inline.is_empty() {
        (pattern.to_string(), global)
    } else {
        (format!("(?{inline}){pattern}"), global)
    }
}
