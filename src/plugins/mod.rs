//! Structural node transformations for Confluence-specific markup.
//!
//! Each plugin pairs a match predicate with a renderer. The registry offers
//! every element to the plugins in ascending `order`; the first match owns
//! the subtree exclusively, so later plugins and the built-in tag rules never
//! see it. A plugin renders descendant content through [`RenderScope`], which
//! re-enters the full registry, so nested structures compose.

mod expand;
mod extension_fallback;
mod math;
mod media;
mod mention;
mod panel;
mod table;
mod task_list;
mod toc;

use std::rc::Rc;

use markup5ever_rcdom::Node;

use crate::error::RenderError;
use crate::renderer::RenderScope;

pub use expand::ExpandPlugin;
pub use extension_fallback::ExtensionFallbackPlugin;
pub use math::MathPlugin;
pub use media::MediaPlugin;
pub use mention::MentionPlugin;
pub use panel::PanelPlugin;
pub use table::TablePlugin;
pub use task_list::TaskListPlugin;
pub use toc::TocPlugin;

/// A node transformation keyed on a match predicate.
pub trait Plugin {
    /// Stable identifier, used in trace logging.
    fn id(&self) -> &'static str;

    /// Registry position; lower runs first.
    fn order(&self) -> u32;

    /// Whether this plugin claims `node`. Must not mutate anything.
    fn matches(&self, node: &Rc<Node>) -> bool;

    /// Produce the Markdown for a claimed node and its entire subtree.
    fn render(&self, node: &Rc<Node>, scope: &mut RenderScope) -> Result<String, RenderError>;
}

/// The full built-in set, in registry order.
#[must_use]
pub fn default_plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(MediaPlugin),
        Box::new(MentionPlugin),
        Box::new(TaskListPlugin),
        Box::new(ExpandPlugin),
        Box::new(PanelPlugin),
        Box::new(TocPlugin),
        Box::new(TablePlugin),
        Box::new(MathPlugin),
        Box::new(ExtensionFallbackPlugin),
    ]
}
