//! Expand (collapsible) sections.

use std::rc::Rc;

use markup5ever_rcdom::Node;

use crate::dom;
use crate::error::RenderError;
use crate::renderer::RenderScope;

use super::Plugin;

pub struct ExpandPlugin;

fn node_kind(node: &Rc<Node>) -> Option<String> {
    dom::get_attr(node, "data-node-type")
        .or_else(|| dom::get_attr(node, "data-prosemirror-node-name"))
}

impl Plugin for ExpandPlugin {
    fn id(&self) -> &'static str {
        "expand"
    }

    fn order(&self) -> u32 {
        30
    }

    fn matches(&self, node: &Rc<Node>) -> bool {
        matches!(node_kind(node).as_deref(), Some("expand" | "nestedExpand"))
    }

    fn render(&self, node: &Rc<Node>, scope: &mut RenderScope) -> Result<String, RenderError> {
        let title = dom::get_attr(node, "data-title")
            .or_else(|| dom::get_attr(node, "title"))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Expand".to_string());

        // Only an explicit "false" marks the section collapsed.
        let collapsed = dom::attr_equals(node, "data-expanded", "false");
        let body = if collapsed {
            "*Block is collapsed*".to_string()
        } else {
            scope
                .render_children(node)?
                .trim_matches('\n')
                .to_string()
        };

        if body.is_empty() {
            return Ok(format!(
                "\n\n(Expand Block - {title})\n(End Expand Block)\n\n"
            ));
        }
        Ok(format!(
            "\n\n(Expand Block - {title})\n{body}\n(End Expand Block)\n\n"
        ))
    }
}
