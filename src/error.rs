//! Error taxonomy for rule loading and rendering.
//!
//! Nothing in this crate lets a failure escape into the caller's conversion
//! path: load failures degrade to an empty rule set, render failures degrade
//! to an error-marker string. The typed variants exist so that tests (and
//! hosts that want diagnostics) can still tell the failure modes apart.

use thiserror::Error;

/// Validation failures raised while flattening a rule configuration.
///
/// These are fatal to the load operation and are converted into a
/// [`LoadError`] fallback one level up.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A rule object is missing one of the required fields.
    #[error("rule {label} is missing required field `{field}`")]
    Shape {
        /// Positional label of the offending rule, `file#index`.
        label: String,
        field: &'static str,
    },

    /// A rule carries a non-string `flags` value.
    #[error("rule {label} has non-string flags")]
    NonStringFlags { label: String },

    /// Two rules across the combined pre+post set share an id.
    #[error("duplicate rule id detected: {id}")]
    DuplicateId { id: String },

    /// A split-index filename is missing its numeric prefix or the prefixes
    /// are not strictly increasing within the phase.
    #[error("rule file ordering for {phase} is not strictly increasing at {file}")]
    Ordering { phase: &'static str, file: String },

    /// A split-index filename has no numeric ordering token at all.
    #[error("rule file for {phase} is missing numeric prefix: {file}")]
    MissingPrefix { phase: &'static str, file: String },

    /// The rule's pattern does not compile.
    #[error("rule {id} has invalid regex: {message}")]
    InvalidPattern { id: String, message: String },
}

/// Failure to load a rule configuration.
///
/// Callers of [`crate::rules::load_rules`] never see this: the loader logs it
/// and substitutes an empty rule set. [`crate::rules::try_load_rules`] exposes
/// it for tests and diagnostics.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read rules from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("rules file {path} is not valid JSON")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The entry document has neither the legacy nor the split shape.
    #[error("rules file must be legacy rule arrays or split index arrays")]
    UnrecognizedShape,

    /// A referenced rule file holds something other than an object, an array,
    /// or `{ "rules": [...] }`.
    #[error("rules file {path} must be an object, array, or {{ rules: [] }}")]
    BadFilePayload { path: String },

    #[error(transparent)]
    Invalid(#[from] RuleError),
}

/// Failure inside the tree-to-Markdown walk.
///
/// The pipeline never propagates this to the host; it substitutes a literal
/// error marker so the user still receives output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("document nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },
}
