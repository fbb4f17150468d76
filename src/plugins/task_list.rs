//! Action items (task lists).
//!
//! Task items look completely different in the two document variants: the
//! editor carries a `data-task-state` attribute, the published page renders a
//! real checkbox input. Both become `- [ ]` / `- [x]` lines, with the
//! assignee anonymized through the shared mention registry and any due date
//! reformatted from its millisecond timestamp.

use std::rc::Rc;

use chrono::{TimeZone, Utc};
use markup5ever_rcdom::Node;

use crate::dom::{self, DocumentMode};
use crate::error::RenderError;
use crate::renderer::RenderScope;

use super::mention::{is_mention, mention_token};
use super::Plugin;

pub struct TaskListPlugin;

fn is_task_item(node: &Rc<Node>) -> bool {
    dom::attr_equals(node, "data-prosemirror-node-name", "taskItem")
        || dom::has_attr(node, "data-task-local-id")
}

fn is_checked_checkbox(node: &Rc<Node>) -> bool {
    dom::tag_name(node) == Some("input")
        && dom::attr_equals(node, "type", "checkbox")
        && dom::has_attr(node, "checked")
}

fn is_done(node: &Rc<Node>, mode: DocumentMode) -> bool {
    let editor_done = || {
        dom::get_attr(node, "data-task-state")
            .is_some_and(|state| state.eq_ignore_ascii_case("done"))
    };
    let rendered_done = || dom::find_descendant(node, &is_checked_checkbox).is_some();
    match mode {
        DocumentMode::Edit => editor_done(),
        DocumentMode::Read => rendered_done(),
        DocumentMode::Unknown => editor_done() || rendered_done(),
    }
}

/// The element actually holding the item's prose, which differs per variant.
fn content_node(node: &Rc<Node>, mode: DocumentMode) -> Rc<Node> {
    let editor = || {
        dom::find_descendant(node, &|n| {
            dom::tag_name(n) == Some("div") && dom::class_contains_token(n, "task-item")
        })
    };
    let rendered = || {
        dom::find_descendant(node, &|n| {
            dom::tag_name(n) == Some("div") && dom::attr_equals(n, "data-component", "content")
        })
    };
    match mode {
        DocumentMode::Edit => editor(),
        DocumentMode::Read => rendered(),
        DocumentMode::Unknown => editor().or_else(rendered),
    }
    .unwrap_or_else(|| Rc::clone(node))
}

fn is_due_date(node: &Rc<Node>) -> bool {
    dom::attr_equals(node, "data-node-type", "date")
}

fn format_due_date(node: &Rc<Node>) -> Option<String> {
    let millis = dom::get_attr(node, "data-timestamp")?.parse::<i64>().ok()?;
    let date = Utc.timestamp_millis_opt(millis).single()?;
    Some(date.format("%-d %b %Y").to_string())
}

/// Render `node`'s subtree, skipping the listed nodes entirely.
fn render_excluding(
    scope: &mut RenderScope,
    node: &Rc<Node>,
    excluded: &[Rc<Node>],
) -> Result<String, RenderError> {
    let mut out = String::new();
    for child in node.children.borrow().iter() {
        if excluded.iter().any(|ex| Rc::ptr_eq(child, ex)) {
            continue;
        }
        if excluded.iter().any(|ex| dom::subtree_contains(child, ex)) {
            out.push_str(&render_excluding(scope, child, excluded)?);
        } else {
            out.push_str(&scope.render_node(child)?);
        }
    }
    Ok(out)
}

impl Plugin for TaskListPlugin {
    fn id(&self) -> &'static str {
        "task_list"
    }

    fn order(&self) -> u32 {
        25
    }

    fn matches(&self, node: &Rc<Node>) -> bool {
        is_task_item(node)
    }

    fn render(&self, node: &Rc<Node>, scope: &mut RenderScope) -> Result<String, RenderError> {
        let mode = scope.mode();
        let marker = if is_done(node, mode) { "x" } else { " " };
        let content = content_node(node, mode);

        let mention = dom::find_descendant(&content, &is_mention);
        let date = dom::find_descendant(&content, &is_due_date);
        let mut excluded = Vec::new();
        excluded.extend(mention.iter().cloned());
        excluded.extend(date.iter().cloned());

        let text = render_excluding(scope, &content, &excluded)?;
        let mut line = crate::renderer::text_util::single_line(&text);

        if let Some(mention) = &mention {
            let token = mention_token(mention, scope);
            if line.is_empty() {
                line = token;
            } else {
                line = format!("{line} {token}");
            }
        }
        if let Some(due) = date.as_ref().and_then(format_due_date) {
            line = format!("{line} by {due}");
        }

        // No trailing newline so consecutive items stack on adjacent lines.
        Ok(format!("\n- [{marker}] {}", line.trim()))
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
    fn editor_task_state_drives_checkbox() {
        let html = "<div data-prosemirror-node-name=\"taskItem\" data-task-state=\"DONE\">\
                    <div class=\"task-item\">ship it</div></div>\
                    <div data-prosemirror-node-name=\"taskItem\" data-task-state=\"TODO\">\
                    <div class=\"task-item\">write docs</div></div>";
        assert_eq!(
            render(html, DocumentMode::Edit),
            "- [x] ship it\n- [ ] write docs"
        );
    }

    #[test]
    fn rendered_checkbox_drives_state_in_read_mode() {
        let html = "<div data-task-local-id=\"1\"><input type=\"checkbox\" checked>\
                    <div data-component=\"content\">done thing</div></div>";
        assert_eq!(render(html, DocumentMode::Read), "- [x] done thing");
    }

    #[test]
    fn assignee_and_due_date_are_appended() {
        let html = "<div data-task-local-id=\"1\"><div data-component=\"content\">\
                    review <span data-mention-id=\"u1\">@Ann</span> \
                    <span data-node-type=\"date\" data-timestamp=\"1755648000000\"></span>\
                    </div></div>";
        assert_eq!(
            render(html, DocumentMode::Read),
            "- [ ] review [User 1] by 20 Aug 2025"
        );
    }

    #[test]
    fn task_mentions_share_document_numbering() {
        let html = "<p><span data-mention-id=\"u1\">@Ann</span></p>\
                    <div data-task-local-id=\"1\"><div data-component=\"content\">\
                    fix <span data-mention-id=\"u1\">@Ann</span></div></div>";
        assert_eq!(
            render(html, DocumentMode::Read),
            "[User 1]\n\n- [ ] fix [User 1]"
        );
    }
}
