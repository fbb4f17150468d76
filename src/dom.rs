//! HTML parsing and rcdom node helpers.
//!
//! Everything structural works on `Rc<markup5ever_rcdom::Node>` trees parsed
//! once per conversion. The helpers here are the vocabulary plugins use to
//! express their match predicates: attribute lookups, class tokens, ancestor
//! and descendant walks, flattened text.

use std::rc::Rc;
use std::rc::Weak;

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Node, NodeData, RcDom};

/// Which dialect of editor HTML a document uses.
///
/// The editor emits two HTML dialects for the same logical document: the live
/// ProseMirror editing representation and the rendered read-only one. Some
/// plugins (the TOC renderer) only apply to the read-mode dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentMode {
    Edit,
    Read,
    Unknown,
}

/// Classify raw HTML by its decoration markers before parsing.
#[must_use]
pub fn detect_mode(html: &str) -> DocumentMode {
    if html.contains("data-prosemirror-node-name=") || html.contains("data-pm-slice=") {
        DocumentMode::Edit
    } else if html.contains("heading-anchor-wrapper") || html.contains("data-renderer-start-pos=") {
        DocumentMode::Read
    } else {
        DocumentMode::Unknown
    }
}

pub(crate) fn parse_html(html: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(html)
}

pub(crate) fn tag_name(node: &Rc<Node>) -> Option<&str> {
    match &node.data {
        NodeData::Document => Some("html"),
        NodeData::Element { name, .. } => Some(&name.local),
        _ => None,
    }
}

pub(crate) fn is_element(node: &Rc<Node>) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

pub(crate) fn get_attr(node: &Rc<Node>, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

pub(crate) fn has_attr(node: &Rc<Node>, name: &str) -> bool {
    get_attr(node, name).is_some()
}

pub(crate) fn attr_equals(node: &Rc<Node>, name: &str, value: &str) -> bool {
    get_attr(node, name).as_deref() == Some(value)
}

/// True when the `class` attribute contains `token` as a whole
/// whitespace-separated word.
pub(crate) fn class_contains_token(node: &Rc<Node>, token: &str) -> bool {
    get_attr(node, "class")
        .is_some_and(|class| class.split_whitespace().any(|t| t.eq_ignore_ascii_case(token)))
}

/// Fetch the parent through the weak back-reference.
///
/// rcdom stores the parent in a `Cell`, so it has to be taken out and put
/// back; the guard restores it even if the upgrade panics.
pub(crate) fn parent(node: &Rc<Node>) -> Option<Rc<Node>> {
    struct Restore<'a> {
        node: &'a Rc<Node>,
        value: Option<Option<Weak<Node>>>,
    }
    impl Drop for Restore<'_> {
        fn drop(&mut self) {
            if let Some(value) = self.value.take() {
                self.node.parent.set(value);
            }
        }
    }

    let guard = Restore {
        value: Some(node.parent.take()),
        node,
    };
    guard
        .value
        .as_ref()
        .and_then(|value| value.as_ref())
        .and_then(Weak::upgrade)
}

/// Walk ancestor elements, nearest first.
pub(crate) fn any_ancestor(node: &Rc<Node>, predicate: impl Fn(&Rc<Node>) -> bool) -> bool {
    let mut current = parent(node);
    while let Some(ancestor) = current {
        if is_element(&ancestor) && predicate(&ancestor) {
            return true;
        }
        current = parent(&ancestor);
    }
    false
}

/// Depth-first search for the first descendant element matching `predicate`.
/// The node itself is not considered.
pub(crate) fn find_descendant(
    node: &Rc<Node>,
    predicate: &dyn Fn(&Rc<Node>) -> bool,
) -> Option<Rc<Node>> {
    for child in node.children.borrow().iter() {
        if is_element(child) && predicate(child) {
            return Some(Rc::clone(child));
        }
        if let Some(found) = find_descendant(child, predicate) {
            return Some(found);
        }
    }
    None
}

/// Direct element children, in document order.
pub(crate) fn element_children(node: &Rc<Node>) -> Vec<Rc<Node>> {
    node.children
        .borrow()
        .iter()
        .filter(|child| is_element(child))
        .cloned()
        .collect()
}

/// First direct child with the given tag, ignoring text nodes.
pub(crate) fn direct_child(node: &Rc<Node>, tag: &str) -> Option<Rc<Node>> {
    node.children
        .borrow()
        .iter()
        .find(|child| tag_name(child) == Some(tag))
        .cloned()
}

/// Does `ancestor` contain `target` anywhere in its subtree?
pub(crate) fn subtree_contains(ancestor: &Rc<Node>, target: &Rc<Node>) -> bool {
    if Rc::ptr_eq(ancestor, target) {
        return true;
    }
    ancestor
        .children
        .borrow()
        .iter()
        .any(|child| subtree_contains(child, target))
}

/// Flatten the visible text of a subtree, verbatim.
pub(crate) fn text_content(node: &Rc<Node>) -> String {
    let mut buffer = String::new();
    collect_text(node, &mut buffer);
    buffer
}

fn collect_text(node: &Rc<Node>, buffer: &mut String) {
    match &node.data {
        NodeData::Text { contents } => buffer.push_str(&contents.borrow()),
        NodeData::Element { .. } | NodeData::Document => {
            for child in node.children.borrow().iter() {
                collect_text(child, buffer);
            }
        }
        _ => {}
    }
}

/// Decorative editor furniture with no Markdown counterpart: icon vectors,
/// screen-reader-hidden spans, expand-title anchors, labelled toggle buttons.
/// The renderer drops these when no plugin has claimed the node.
pub(crate) fn is_editor_chrome(node: &Rc<Node>) -> bool {
    let Some(tag) = tag_name(node) else {
        return false;
    };
    if tag == "svg" {
        return true;
    }
    if tag == "button" && has_attr(node, "aria-labelledby") {
        return true;
    }
    if tag == "span" && attr_equals(node, "aria-hidden", "true") {
        return true;
    }
    get_attr(node, "id").is_some_and(|id| id.starts_with("expand-title-"))
}
