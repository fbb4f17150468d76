//! Tables.
//!
//! Rows collapse into GitHub pipe syntax. Cell content is rendered through
//! the full registry with the same run state as the rest of the document, so
//! mention ordinals and image labels continue their global sequences inside
//! cells. Multi-line cell content is flattened with `<br>` breaks, list items
//! becoming bullet glyphs.

use std::rc::Rc;
use std::sync::LazyLock;

use markup5ever_rcdom::Node;
use regex::Regex;

use crate::dom;
use crate::error::RenderError;
use crate::renderer::RenderScope;

use super::Plugin;

static MULTI_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("MULTI_NEWLINE: hardcoded regex is valid"));
static RUN_OF_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("RUN_OF_SPACE: hardcoded regex is valid"));

pub struct TablePlugin;

/// The `tr` elements belonging to this table, not to a nested one.
fn collect_rows(node: &Rc<Node>, rows: &mut Vec<Rc<Node>>) {
    for child in dom::element_children(node) {
        match dom::tag_name(&child) {
            Some("tr") => rows.push(child),
            Some("table") => {}
            _ => collect_rows(&child, rows),
        }
    }
}

fn cells_of(row: &Rc<Node>) -> Vec<Rc<Node>> {
    dom::element_children(row)
        .into_iter()
        .filter(|c| matches!(dom::tag_name(c), Some("th" | "td")))
        .collect()
}

fn has_header_cell(row: &Rc<Node>) -> bool {
    dom::element_children(row)
        .iter()
        .any(|c| dom::tag_name(c) == Some("th"))
}

/// Flatten rendered cell Markdown onto one line.
fn collapse_cell(markdown: &str) -> String {
    let text = markdown.replace('\r', "");
    let text = MULTI_NEWLINE.replace_all(text.trim_matches('\n'), "\n");
    // The sentinel newline lets a bullet on the very first line convert too.
    let text = format!("\n{text}")
        .replace("\n- ", "<br>• ")
        .replace('\n', "<br>");
    let text = text.strip_prefix("<br>").unwrap_or(&text).to_string();
    let text = RUN_OF_SPACE.replace_all(&text, " ");
    let text = text.trim().replace('|', "\\|");
    if text.is_empty() {
        " ".to_string()
    } else {
        text
    }
}

impl Plugin for TablePlugin {
    fn id(&self) -> &'static str {
        "table"
    }

    fn order(&self) -> u32 {
        50
    }

    fn matches(&self, node: &Rc<Node>) -> bool {
        dom::tag_name(node) == Some("table")
    }

    fn render(&self, node: &Rc<Node>, scope: &mut RenderScope) -> Result<String, RenderError> {
        let mut rows = Vec::new();
        collect_rows(node, &mut rows);
        if rows.is_empty() {
            return Ok(String::new());
        }

        let header_index = rows.iter().position(has_header_cell).unwrap_or(0);
        let header_cells = cells_of(&rows[header_index]);
        if header_cells.is_empty() {
            return Ok(String::new());
        }
        let width = header_cells.len();

        let render_row = |cells: &[Rc<Node>],
                              scope: &mut RenderScope|
         -> Result<String, RenderError> {
            let mut out = Vec::with_capacity(width);
            for cell in cells.iter().take(width) {
                out.push(collapse_cell(&scope.render_children(cell)?));
            }
            while out.len() < width {
                out.push(" ".to_string());
            }
            Ok(format!("| {} |", out.join(" | ")))
        };

        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(render_row(&header_cells, scope)?);
        lines.push(format!("|{}", " --- |".repeat(width)));
        for (index, row) in rows.iter().enumerate() {
            if index == header_index {
                continue;
            }
            lines.push(render_row(&cells_of(row), scope)?);
        }

        Ok(format!("\n\n{}\n\n", lines.join("\n")))
    }
}
