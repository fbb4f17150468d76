//! Table-of-contents macro output.
//!
//! Published pages render the TOC macro as a nav of nested lists of anchor
//! links. Those become an indented Markdown link list. In the editor the
//! macro is a placeholder with no useful structure, so the subtree falls
//! through to normal rendering there.

use std::rc::Rc;

use markup5ever_rcdom::Node;

use crate::dom::{self, DocumentMode};
use crate::error::RenderError;
use crate::renderer::text_util::single_line;
use crate::renderer::RenderScope;

use super::Plugin;

pub struct TocPlugin;

fn looks_like_toc(node: &Rc<Node>) -> bool {
    dom::tag_name(node) == Some("nav")
        || dom::class_contains_token(node, "toc")
        || dom::get_attr(node, "class").is_some_and(|c| c.contains("table-of-contents"))
}

fn has_link_list(node: &Rc<Node>) -> bool {
    dom::find_descendant(node, &|n| {
        dom::tag_name(n) == Some("ul")
            && dom::find_descendant(n, &|li| {
                dom::tag_name(li) == Some("li")
                    && dom::find_descendant(li, &|a| dom::tag_name(a) == Some("a")).is_some()
            })
            .is_some()
    })
    .is_some()
}

fn render_level(list: &Rc<Node>, level: usize, out: &mut Vec<String>) {
    for item in dom::element_children(list) {
        if dom::tag_name(&item) != Some("li") {
            continue;
        }
        let link = dom::direct_child(&item, "a")
            .or_else(|| dom::find_descendant(&item, &|n| dom::tag_name(n) == Some("a")));
        if let Some(link) = link {
            let text = single_line(&dom::text_content(&link));
            let href = dom::get_attr(&link, "href").unwrap_or_default();
            if !text.is_empty() {
                out.push(format!("{}- [{text}]({href})", "  ".repeat(level)));
            }
        }
        if let Some(nested) = dom::direct_child(&item, "ul") {
            render_level(&nested, level + 1, out);
        }
    }
}

impl Plugin for TocPlugin {
    fn id(&self) -> &'static str {
        "toc"
    }

    fn order(&self) -> u32 {
        45
    }

    fn matches(&self, node: &Rc<Node>) -> bool {
        looks_like_toc(node) && has_link_list(node)
    }

    fn render(&self, node: &Rc<Node>, scope: &mut RenderScope) -> Result<String, RenderError> {
        // Only published pages carry the rendered nav structure.
        if scope.mode() != DocumentMode::Read {
            return scope.render_children(node);
        }

        let root = if dom::tag_name(node) == Some("ul") {
            Rc::clone(node)
        } else {
            match dom::find_descendant(node, &|n| dom::tag_name(n) == Some("ul")) {
                Some(ul) => ul,
                None => return Ok(String::new()),
            }
        };

        let mut lines = Vec::new();
        render_level(&root, 0, &mut lines);
        if lines.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("\n\n{}\n\n", lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::{parse_html, DocumentMode};
    use crate::options::ConversionOptions;
    use crate::renderer::{Renderer, RunState};

    fn render(html: &str, mode: DocumentMode) -> String {
        let renderer = Renderer::with_default_plugins(ConversionOptions::default());
        let mut state = RunState::new(mode);
        renderer
            .render_document(&parse_html(html), &mut state)
            .expect("render should succeed")
    }

    #[test]
    fn nested_toc_becomes_indented_links() {
        let html = "<nav class=\"toc\"><ul>\
                    <li><a href=\"#intro\">Intro</a><ul>\
                    <li><a href=\"#scope\">Scope</a></li></ul></li>\
                    <li><a href=\"#end\">End</a></li></ul></nav>";
        assert_eq!(
            render(html, DocumentMode::Read),
            "- [Intro](#intro)\n  - [Scope](#scope)\n- [End](#end)"
        );
    }

    #[test]
    fn unknown_mode_falls_through_to_normal_rendering() {
        let html = "<nav class=\"toc\"><ul>\
                    <li><a href=\"#a\">A</a> trailing note</li></ul></nav>";
        assert_eq!(
            render(html, DocumentMode::Unknown),
            "- [A](#a) trailing note"
        );
        assert_eq!(render(html, DocumentMode::Read), "- [A](#a)");
    }

    #[test]
    fn nav_without_links_is_not_claimed() {
        let html = "<nav><ul><li>plain item</li></ul></nav>";
        assert_eq!(render(html, DocumentMode::Read), "- plain item");
    }
}
