//! User mentions.
//!
//! Mentions carry account ids that must not leak into output. Each distinct
//! id gets a stable per-run ordinal, so `[User 1]` always refers to the same
//! person within one document.

use std::rc::Rc;

use markup5ever_rcdom::Node;

use crate::dom;
use crate::error::RenderError;
use crate::renderer::RenderScope;

use super::Plugin;

pub struct MentionPlugin;

pub(crate) fn is_mention(node: &Rc<Node>) -> bool {
    dom::attr_equals(node, "data-prosemirror-node-name", "mention")
        || dom::has_attr(node, "data-mention-id")
}

/// The anonymized token for a mention node, numbering through the shared
/// registry. Used both here and by the task list plugin for assignees.
pub(crate) fn mention_token(node: &Rc<Node>, scope: &mut RenderScope) -> String {
    match dom::get_attr(node, "data-mention-id") {
        Some(id) if !id.is_empty() => {
            let ordinal = scope.state.mentions.ordinal(&id);
            format!("[User {ordinal}]")
        }
        _ => "[User]".to_string(),
    }
}

impl Plugin for MentionPlugin {
    fn id(&self) -> &'static str {
        "mention"
    }

    fn order(&self) -> u32 {
        20
    }

    fn matches(&self, node: &Rc<Node>) -> bool {
        is_mention(node)
    }

    fn render(&self, node: &Rc<Node>, scope: &mut RenderScope) -> Result<String, RenderError> {
        Ok(mention_token(node, scope))
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::{parse_html, DocumentMode};
    use crate::options::ConversionOptions;
    use crate::renderer::{Renderer, RunState};

    fn render(html: &str) -> String {
        let renderer = Renderer::with_default_plugins(ConversionOptions::default());
        let mut state = RunState::new(DocumentMode::Unknown);
        renderer
            .render_document(&parse_html(html), &mut state)
            .expect("render should succeed")
    }

    #[test]
    fn same_id_keeps_same_ordinal() {
        let md = render(
            "<p><span data-mention-id=\"aa\">@Ann</span> and \
             <span data-mention-id=\"bb\">@Bob</span>, ping \
             <span data-mention-id=\"aa\">@Ann</span></p>",
        );
        assert_eq!(md, "[User 1] and [User 2], ping [User 1]");
    }

    #[test]
    fn mention_without_id_is_generic() {
        let md = render("<p><span data-prosemirror-node-name=\"mention\">@Ann</span></p>");
        assert_eq!(md, "[User]");
    }

    #[test]
    fn display_name_never_survives() {
        let md = render("<p><span data-mention-id=\"aa\">@Real Name</span></p>");
        assert!(!md.contains("Real Name"));
    }
}
