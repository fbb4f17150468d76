//! Info / warning / note panels.

use std::rc::Rc;

use markup5ever_rcdom::Node;

use crate::dom;
use crate::error::RenderError;
use crate::renderer::RenderScope;

use super::Plugin;

pub struct PanelPlugin;

/// Turn a raw token like `custom_panel-type` into `Custom Panel Type`.
fn normalize_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for c in raw.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
            at_word_start = true;
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.push(c);
        }
    }
    out.trim().to_string()
}

fn panel_label(node: &Rc<Node>) -> String {
    let panel_type = dom::get_attr(node, "data-panel-type")
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty());

    match panel_type.as_deref() {
        Some("custom") | None => {
            let icon = dom::get_attr(node, "data-panel-icon")
                .or_else(|| dom::get_attr(node, "data-panel-icon-text"))
                .map(|i| normalize_label(&i))
                .filter(|i| !i.is_empty())
                .unwrap_or_else(|| "Custom".to_string());
            format!("{icon} Custom Panel Start")
        }
        Some(kind) => format!("{} Panel Start", normalize_label(kind)),
    }
}

impl Plugin for PanelPlugin {
    fn id(&self) -> &'static str {
        "panel"
    }

    fn order(&self) -> u32 {
        40
    }

    fn matches(&self, node: &Rc<Node>) -> bool {
        dom::attr_equals(node, "data-prosemirror-node-name", "panel")
            || dom::has_attr(node, "data-panel-type")
    }

    fn render(&self, node: &Rc<Node>, scope: &mut RenderScope) -> Result<String, RenderError> {
        let label = panel_label(node);
        let content = dom::find_descendant(node, &|n| {
            dom::attr_equals(n, "data-panel-content", "true")
        })
        .unwrap_or_else(|| Rc::clone(node));

        let body = scope.render_children(&content)?;
        let body = body.trim_matches('\n');
        if body.is_empty() {
            return Ok(format!("\n\n({label})\n(Panel End)\n\n"));
        }
        Ok(format!("\n\n({label})\n{body}\n(Panel End)\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_label;
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
    fn known_panel_type_gets_title_cased_label() {
        let md = render("<div data-panel-type=\"warning\"><p>careful</p></div>");
        assert_eq!(md, "(Warning Panel Start)\ncareful\n(Panel End)");
    }

    #[test]
    fn custom_panel_uses_icon_label() {
        let md = render(
            "<div data-panel-type=\"custom\" data-panel-icon=\"rocket\"><p>lift off</p></div>",
        );
        assert_eq!(md, "(Rocket Custom Panel Start)\nlift off\n(Panel End)");
    }

    #[test]
    fn panel_content_wrapper_is_preferred() {
        let md = render(
            "<div data-panel-type=\"info\"><div class=\"icon\"></div>\
             <div data-panel-content=\"true\"><p>body only</p></div></div>",
        );
        assert_eq!(md, "(Info Panel Start)\nbody only\n(Panel End)");
    }

    #[test]
    fn empty_panel_omits_body_line() {
        let md = render("<div data-panel-type=\"note\"></div>");
        assert_eq!(md, "(Note Panel Start)\n(Panel End)");
    }

    #[test]
    fn labels_normalize_separators() {
        assert_eq!(normalize_label("custom_panel-type"), "Custom Panel Type");
        assert_eq!(normalize_label("note"), "Note");
    }
}
