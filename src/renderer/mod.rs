//! The DOM-tree-to-Markdown renderer.
//!
//! A depth-first walk over the parsed tree. Every element node is first
//! offered to the plugin registry in ascending order; the first plugin whose
//! match predicate fires owns the entire subtree. Unclaimed elements fall
//! through to the built-in tag rules in [`defaults`].
//!
//! All per-run mutable state (image counter, mention ordinals, detected
//! document mode) lives in [`RunState`], created fresh for every top-level
//! conversion call and threaded by `&mut` through every plugin invocation.
//! Nothing here is process-wide, so concurrent conversions on separate
//! renderer instances cannot cross-talk.

pub(crate) mod defaults;
pub(crate) mod text_util;

use std::borrow::Cow;
use std::collections::HashMap;
use std::rc::Rc;

use markup5ever_rcdom::{Node, NodeData, RcDom};

use crate::dom::{self, DocumentMode};
use crate::error::RenderError;
use crate::options::ConversionOptions;
use crate::plugins::Plugin;

use defaults::is_block_element;
use text_util::{compress_whitespace, escape_markdown};

/// Recursion guard for pathological nesting; real documents sit far below
/// this.
pub(crate) const MAX_RENDER_DEPTH: usize = 512;

/// Per-run mention numbering: each distinct mention id gets the next ordinal
/// the first time it is seen in the run.
#[derive(Debug, Default)]
pub struct MentionRegistry {
    map: HashMap<String, u32>,
    next: u32,
}

impl MentionRegistry {
    pub fn ordinal(&mut self, id: &str) -> u32 {
        if let Some(&ordinal) = self.map.get(id) {
            return ordinal;
        }
        self.next += 1;
        self.map.insert(id.to_string(), self.next);
        self.next
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Ephemeral state owned by one top-level conversion call.
///
/// Table cells render through nested passes that share this same value, so
/// mention ordinals and image labels continue in one document-global
/// sequence.
#[derive(Debug)]
pub struct RunState {
    image_counter: u32,
    pub mentions: MentionRegistry,
    mode: DocumentMode,
    depth: usize,
}

impl RunState {
    #[must_use]
    pub fn new(mode: DocumentMode) -> Self {
        Self {
            image_counter: 0,
            mentions: MentionRegistry::default(),
            mode,
            depth: 0,
        }
    }

    /// Next 1-based `[Image N]` ordinal.
    pub fn next_image_ordinal(&mut self) -> u32 {
        self.image_counter += 1;
        self.image_counter
    }
}

/// A renderer instance: options plus the ordered plugin registry.
///
/// Construction sorts plugins ascending by `order` with a stable sort, so
/// ties keep their registration sequence. The instance is immutable and
/// reusable; all mutation happens in the per-call [`RunState`].
pub struct Renderer {
    options: ConversionOptions,
    plugins: Vec<Box<dyn Plugin>>,
}

impl Renderer {
    #[must_use]
    pub fn new(options: ConversionOptions, mut plugins: Vec<Box<dyn Plugin>>) -> Self {
        plugins.sort_by_key(|plugin| plugin.order());
        Self { options, plugins }
    }

    /// A renderer carrying the full structural plugin set.
    #[must_use]
    pub fn with_default_plugins(options: ConversionOptions) -> Self {
        Self::new(options, crate::plugins::default_plugins())
    }

    pub fn render_document(
        &self,
        dom: &RcDom,
        state: &mut RunState,
    ) -> Result<String, RenderError> {
        let mut scope = RenderScope {
            renderer: self,
            state,
        };
        let mut buffer = String::new();
        walk_node(&mut scope, &dom.document, &mut buffer, true, false)?;
        Ok(buffer)
    }
}

/// What a plugin sees while rendering: the conversion options, the run state,
/// and callbacks for recursively rendering descendant content through the
/// full registry.
pub struct RenderScope<'a> {
    renderer: &'a Renderer,
    pub state: &'a mut RunState,
}

impl RenderScope<'_> {
    #[must_use]
    pub fn options(&self) -> &ConversionOptions {
        &self.renderer.options
    }

    #[must_use]
    pub fn mode(&self) -> DocumentMode {
        self.state.mode
    }

    /// Render a single node (plugins included) into a fresh buffer.
    pub fn render_node(&mut self, node: &Rc<Node>) -> Result<String, RenderError> {
        let mut buffer = String::new();
        walk_node(self, node, &mut buffer, true, false)?;
        Ok(buffer)
    }

    /// Render the children of `node` into a fresh buffer.
    pub fn render_children(&mut self, node: &Rc<Node>) -> Result<String, RenderError> {
        let mut buffer = String::new();
        let tag = dom::tag_name(node);
        let is_block = tag.is_some_and(is_block_element);
        let is_pre = tag.is_some_and(|t| t == "pre" || t == "code");
        walk_children(self, node, &mut buffer, is_block, is_pre)?;
        Ok(buffer)
    }

    /// Render the children of `node` keeping the caller's preformatted
    /// context, so elements nested inside a code block stay verbatim.
    pub(crate) fn render_children_verbatim(
        &mut self,
        node: &Rc<Node>,
    ) -> Result<String, RenderError> {
        let mut buffer = String::new();
        walk_children(self, node, &mut buffer, false, true)?;
        Ok(buffer)
    }
}

pub(crate) fn walk_node(
    scope: &mut RenderScope,
    node: &Rc<Node>,
    buffer: &mut String,
    trim_leading_spaces: bool,
    is_pre: bool,
) -> Result<(), RenderError> {
    match &node.data {
        NodeData::Document => {
            walk_children(scope, node, buffer, true, false)?;
            trim_buffer_end(buffer);
            let leading = buffer.len()
                - buffer.trim_start_matches(['\n', '\t', ' ']).len();
            buffer.drain(..leading);
        }

        NodeData::Text { contents } => {
            let borrowed = contents.borrow();
            let text: &str = borrowed.as_ref();

            if is_pre {
                buffer.push_str(text);
            } else {
                let text = escape_markdown(Cow::Borrowed(text));
                let text = compress_whitespace(&text);
                if trim_leading_spaces || (text.starts_with(' ') && buffer.ends_with(' ')) {
                    let trimmed = text.trim_start_matches(' ');
                    if !trimmed.is_empty() {
                        buffer.push_str(trimmed);
                    }
                } else if !text.is_empty() {
                    buffer.push_str(&text);
                }
            }
        }

        NodeData::Element { .. } => {
            if scope.state.depth >= MAX_RENDER_DEPTH {
                return Err(RenderError::NestingTooDeep {
                    limit: MAX_RENDER_DEPTH,
                });
            }
            scope.state.depth += 1;
            let rendered = render_element(scope, node, is_pre);
            scope.state.depth -= 1;

            let content = normalize_for_buffer(buffer, rendered?, is_pre);
            if !content.is_empty() {
                buffer.push_str(&content);
            }
        }

        // Comments, doctypes, and processing instructions have no Markdown
        // counterpart.
        _ => {}
    }
    Ok(())
}

/// Dispatch one element: plugins by ascending order (first match owns the
/// subtree exclusively), then chrome suppression, then built-in defaults.
fn render_element(
    scope: &mut RenderScope,
    node: &Rc<Node>,
    is_pre: bool,
) -> Result<String, RenderError> {
    let renderer: &Renderer = scope.renderer;
    for plugin in &renderer.plugins {
        if plugin.matches(node) {
            log::trace!("node claimed by plugin `{}`", plugin.id());
            return plugin.render(node, scope);
        }
    }

    if dom::is_editor_chrome(node) {
        return Ok(String::new());
    }

    let tag = dom::tag_name(node).unwrap_or_default().to_string();
    defaults::handle(scope, node, &tag, is_pre)
}

pub(crate) fn walk_children(
    scope: &mut RenderScope,
    node: &Rc<Node>,
    buffer: &mut String,
    parent_is_block: bool,
    is_pre: bool,
) -> Result<(), RenderError> {
    let mut trim_leading_spaces = !is_pre && parent_is_block;

    for child in node.children.borrow().iter() {
        let child_is_block = dom::tag_name(child).is_some_and(is_block_element);
        if child_is_block {
            trim_buffer_end_spaces(buffer);
        }

        let len_before = buffer.len();
        walk_node(scope, child, buffer, trim_leading_spaces, is_pre)?;
        if buffer.len() > len_before {
            trim_leading_spaces = child_is_block;
        }
    }
    Ok(())
}

/// Cap the seam between the buffer and new content at two newlines, and drop
/// a doubled space across an inline boundary.
fn normalize_for_buffer(buffer: &str, mut content: String, is_pre: bool) -> String {
    if buffer.is_empty() {
        return content;
    }

    let trailing = buffer.bytes().rev().take_while(|&b| b == b'\n').count();
    let leading = content.bytes().take_while(|&b| b == b'\n').count();
    if trailing + leading > 2 {
        content.drain(..(trailing + leading - 2).min(leading));
    }

    if !is_pre
        && trailing == 0
        && leading == 0
        && buffer.as_bytes().last() == Some(&b' ')
        && content.as_bytes().first() == Some(&b' ')
    {
        content.remove(0);
    }
    content
}

fn trim_buffer_end(buffer: &mut String) {
    let end = buffer
        .char_indices()
        .rev()
        .find(|(_, c)| !matches!(c, '\n' | '\t' | ' '))
        .map_or(0, |(i, c)| i + c.len_utf8());
    buffer.truncate(end);
}

fn trim_buffer_end_spaces(buffer: &mut String) {
    let end = buffer
        .char_indices()
        .rev()
        .find(|(_, c)| *c != ' ')
        .map_or(0, |(i, c)| i + c.len_utf8());
    buffer.truncate(end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn render(html: &str) -> String {
        let renderer = Renderer::with_default_plugins(ConversionOptions::default());
        let mut state = RunState::new(DocumentMode::Unknown);
        renderer
            .render_document(&parse_html(html), &mut state)
            .expect("render should succeed")
    }

    #[test]
    fn renders_headings_and_paragraphs() {
        let md = render("<h2>Title</h2><p>Body <strong>bold</strong> and <em>italic</em>.</p>");
        assert_eq!(md, "## Title\n\nBody **bold** and *italic*.");
    }

    #[test]
    fn collapses_text_whitespace_outside_pre() {
        let md = render("<p>a\n   b\t\tc</p>");
        assert_eq!(md, "a b c");
    }

    #[test]
    fn preserves_whitespace_in_code_blocks() {
        let md = render("<pre><code class=\"language-rust\">fn main() {\n    body\n}</code></pre>");
        assert_eq!(md, "```rust\nfn main() {\n    body\n}\n```");
    }

    #[test]
    fn keeps_verbatim_text_inside_highlight_spans() {
        // Read-mode code blocks wrap each line in a syntax-highlight span.
        let md = render(
            "<pre><code><span>    let x = a * b;</span>\n<span>}</span></code></pre>",
        );
        assert_eq!(md, "```\n    let x = a * b;\n}\n```");
    }

    #[test]
    fn nests_unordered_lists_with_indentation() {
        let md = render("<ul><li>one<ul><li>inner</li></ul></li><li>two</li></ul>");
        assert_eq!(md, "- one\n  - inner\n- two");
    }

    #[test]
    fn numbers_ordered_lists() {
        let md = render("<ol><li>first</li><li>second</li></ol>");
        assert_eq!(md, "1. first\n2. second");
    }

    #[test]
    fn renders_blockquotes_and_rules() {
        let md = render("<blockquote><p>quoted</p></blockquote><hr>");
        assert_eq!(md, "> quoted\n\n---");
    }

    #[test]
    fn drops_script_style_and_chrome() {
        let md = render(
            "<p>keep</p><script>alert(1)</script><style>p{}</style>\
             <svg><path d=\"m0\"/></svg><span aria-hidden=\"true\">icon</span>",
        );
        assert_eq!(md, "keep");
    }

    #[test]
    fn escapes_markdown_metacharacters_in_text() {
        let md = render("<p>2 * 3 = 6 [sic]</p>");
        assert_eq!(md, "2 \\* 3 = 6 \\[sic\\]");
    }

    #[test]
    fn mention_registry_numbers_by_first_appearance() {
        let mut mentions = MentionRegistry::default();
        assert_eq!(mentions.ordinal("abc"), 1);
        assert_eq!(mentions.ordinal("def"), 2);
        assert_eq!(mentions.ordinal("abc"), 1);
        assert_eq!(mentions.len(), 2);
    }
}
