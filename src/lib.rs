//! Confluence HTML to Markdown conversion.
//!
//! Converts HTML captured from Confluence pages, in either the editor or the
//! published-page rendering, into clean Markdown. The pipeline runs
//! configurable regex preprocessor rules over the HTML, renders the parsed
//! tree through an ordered set of structural node plugins, runs postprocessor
//! rules over the Markdown, then finalizes.
//!
//! ```no_run
//! use confluence_markdown::{convert_html_to_markdown, ConversionOptions, RuleSet};
//!
//! let md = convert_html_to_markdown(
//!     "<h1>Title</h1><p>Body</p>",
//!     &RuleSet::empty(),
//!     &ConversionOptions::default(),
//! );
//! assert_eq!(md, "# Title\n\nBody\n");
//! ```

pub mod dom;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod plugins;
pub mod renderer;
pub mod rules;

pub use dom::DocumentMode;
pub use error::{LoadError, RenderError, RuleError};
pub use options::{ConversionOptions, OptionOverrides};
pub use pipeline::convert_html_to_markdown;
pub use renderer::{Renderer, RunState};
pub use rules::{load_rules, try_load_rules, FsRuleSource, RuleSet, RuleSource};
