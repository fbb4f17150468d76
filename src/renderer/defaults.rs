//! Built-in tag rules for element nodes no plugin claims.

use std::rc::Rc;

use markup5ever_rcdom::Node;
use phf::phf_set;

use crate::dom;
use crate::error::RenderError;

use super::text_util::{indent_except_first, single_line};
use super::RenderScope;

/// CommonMark block-level elements; everything else renders inline.
static BLOCK_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "address", "article", "aside", "blockquote", "body", "canvas", "dd",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "html",
    "li", "main", "nav", "noscript", "ol", "output", "p", "pre", "section",
    "table", "tfoot", "ul", "video",
};

/// Never emit anything for these, children included.
static SUPPRESSED_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "head", "script", "style", "title", "template", "noscript", "meta",
    "link", "base",
};

pub(crate) fn is_block_element(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(tag)
}

pub(crate) fn handle(
    scope: &mut RenderScope,
    node: &Rc<Node>,
    tag: &str,
    in_pre: bool,
) -> Result<String, RenderError> {
    if SUPPRESSED_ELEMENTS.contains(tag) {
        return Ok(String::new());
    }
    if in_pre {
        return scope.render_children_verbatim(node);
    }

    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<usize>().unwrap_or(1);
            let text = single_line(&scope.render_children(node)?);
            if text.is_empty() {
                return Ok(String::new());
            }
            Ok(format!("\n\n{} {text}\n\n", "#".repeat(level)))
        }

        "br" => Ok("  \n".to_string()),
        "hr" => Ok("\n\n---\n\n".to_string()),

        "strong" | "b" => wrap_inline(scope, node, "**"),
        "em" | "i" => wrap_inline(scope, node, "*"),
        "del" | "s" | "strike" => wrap_inline(scope, node, "~~"),

        "code" => {
            let content = scope.render_children(node)?;
            let content = content.trim();
            if content.is_empty() {
                return Ok(String::new());
            }
            if content.contains('`') {
                Ok(format!("`` {content} ``"))
            } else {
                Ok(format!("`{content}`"))
            }
        }

        "pre" => render_code_block(scope, node),

        "a" => {
            let text = single_line(&scope.render_children(node)?);
            let href = dom::get_attr(node, "href").unwrap_or_default();
            if href.is_empty() {
                return Ok(text);
            }
            let text = if text.is_empty() { href.clone() } else { text };
            Ok(format!("[{text}]({href})"))
        }

        "ul" => render_list(scope, node, None),
        "ol" => {
            let start = dom::get_attr(node, "start")
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            render_list(scope, node, Some(start))
        }
        // A stray li outside any list renders as plain content.
        "li" => scope.render_children(node),

        "blockquote" => {
            let content = scope.render_children(node)?;
            let content = content.trim_matches('\n');
            if content.is_empty() {
                return Ok(String::new());
            }
            let quoted: Vec<String> = content
                .lines()
                .map(|line| format!("> {line}").trim_end().to_string())
                .collect();
            Ok(format!("\n\n{}\n\n", quoted.join("\n")))
        }

        _ if is_block_element(tag) => {
            let content = scope.render_children(node)?;
            let content = content.trim_matches('\n');
            if content.is_empty() {
                return Ok(String::new());
            }
            Ok(format!("\n\n{content}\n\n"))
        }

        // Unknown inline element: pass the children through.
        _ => scope.render_children(node),
    }
}

fn wrap_inline(
    scope: &mut RenderScope,
    node: &Rc<Node>,
    marker: &str,
) -> Result<String, RenderError> {
    let content = scope.render_children(node)?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        // Whitespace-only emphasis would produce literal asterisks.
        return Ok(content);
    }
    let leading = &content[..content.len() - content.trim_start().len()];
    let trailing = &content[content.trim_end().len()..];
    Ok(format!("{leading}{marker}{trimmed}{marker}{trailing}"))
}

fn render_code_block(scope: &mut RenderScope, node: &Rc<Node>) -> Result<String, RenderError> {
    let language = dom::find_descendant(node, &|n| dom::tag_name(n) == Some("code"))
        .and_then(|code| dom::get_attr(&code, "class"))
        .and_then(|class| {
            class
                .split_ascii_whitespace()
                .find_map(|token| token.strip_prefix("language-").map(str::to_string))
        })
        .unwrap_or_default();

    let content = scope.render_children(node)?;
    let content = content.trim_matches('\n');
    Ok(format!("\n\n```{language}\n{content}\n```\n\n"))
}

fn render_list(
    scope: &mut RenderScope,
    node: &Rc<Node>,
    start: Option<u64>,
) -> Result<String, RenderError> {
    let mut items = Vec::new();
    let mut number = start.unwrap_or(0);

    for child in dom::element_children(node) {
        if dom::tag_name(&child) != Some("li") {
            continue;
        }
        let marker = match start {
            Some(_) => {
                let m = format!("{number}. ");
                number += 1;
                m
            }
            None => "- ".to_string(),
        };
        let content = scope.render_children(&child)?;
        let content = content.trim_matches('\n').trim_end();
        items.push(format!(
            "{marker}{}",
            indent_except_first(content, marker.len())
        ));
    }

    if items.is_empty() {
        return Ok(String::new());
    }
    let body = items.join("\n");
    // A nested list continues its parent item on the next line.
    let inside_item = dom::parent(node).is_some_and(|p| dom::tag_name(&p) == Some("li"));
    if inside_item {
        Ok(format!("\n{body}"))
    } else {
        Ok(format!("\n\n{body}\n\n"))
    }
}
