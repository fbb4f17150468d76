//! Last-resort handling for unrecognized macros and extensions.
//!
//! Anything that still looks like a macro node after every specific plugin
//! has declined is flattened to its visible text on one line, so third-party
//! widgets degrade to something readable instead of leaking markup soup.

use std::rc::Rc;

use markup5ever_rcdom::Node;
use phf::phf_set;

use crate::dom;
use crate::error::RenderError;
use crate::renderer::text_util::single_line;
use crate::renderer::RenderScope;

use super::Plugin;

/// Editor node names with dedicated handling elsewhere; never swallowed here.
static STRUCTURAL_NODE_NAMES: phf::Set<&'static str> = phf_set! {
    "heading", "paragraph", "bulletList", "orderedList", "listItem",
    "blockquote", "codeBlock", "rule", "table", "tableRow", "tableCell",
    "tableHeader", "media", "mediaSingle", "panel", "expand", "nestedExpand",
    "mention",
};

/// HTML tags that are structural in their own right; a stray extension
/// attribute on one of these must not flatten real content.
static STRUCTURAL_TAGS: phf::Set<&'static str> = phf_set! {
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "ul", "ol", "li", "table",
    "tr", "td", "th", "blockquote", "pre", "hr", "img",
};

pub struct ExtensionFallbackPlugin;

impl Plugin for ExtensionFallbackPlugin {
    fn id(&self) -> &'static str {
        "extension_fallback"
    }

    fn order(&self) -> u32 {
        60
    }

    fn matches(&self, node: &Rc<Node>) -> bool {
        if dom::tag_name(node).is_some_and(|tag| STRUCTURAL_TAGS.contains(tag)) {
            return false;
        }
        if dom::get_attr(node, "data-prosemirror-node-name")
            .is_some_and(|name| STRUCTURAL_NODE_NAMES.contains(name.as_str()))
        {
            return false;
        }
        dom::has_attr(node, "data-extension-key")
            || dom::attr_equals(node, "data-node-type", "extension")
            || dom::get_attr(node, "data-prosemirror-node-name").is_some_and(|name| {
                matches!(
                    name.as_str(),
                    "extension" | "bodiedExtension" | "inlineExtension"
                )
            })
    }

    fn render(&self, node: &Rc<Node>, _scope: &mut RenderScope) -> Result<String, RenderError> {
        Ok(single_line(&dom::text_content(node)))
    }
}
