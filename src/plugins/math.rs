//! Easy-math macro blocks (LaTeX).
//!
//! The macro serializes its LaTeX source into attributes, differently per
//! variant. The editor embeds a JSON parameter blob on an extension node; the
//! published page uses a flat `key=value|key=value` macro parameter string.
//! Attribute values sometimes arrive HTML-entity-encoded, so JSON parsing
//! retries after entity decoding.

use std::rc::Rc;

use markup5ever_rcdom::Node;
use serde_json::Value;

use crate::dom;
use crate::error::RenderError;
use crate::renderer::RenderScope;

use super::Plugin;

const MACRO_EXTENSION_TYPE: &str = "com.atlassian.confluence.macro.core";
const MATH_EXTENSION_KEYS: [&str; 4] = [
    "easy-math-block",
    "easy-math-block-l",
    "easy-math-inline",
    "eazy-math-inline",
];

pub struct MathPlugin;

fn is_editor_math(node: &Rc<Node>) -> bool {
    dom::attr_equals(node, "data-extension-type", MACRO_EXTENSION_TYPE)
        && dom::get_attr(node, "data-extension-key")
            .is_some_and(|key| MATH_EXTENSION_KEYS.contains(&key.as_str()))
}

fn is_rendered_math(node: &Rc<Node>) -> bool {
    dom::has_attr(node, "data-macro-parameters")
        && (macro_hint(node).is_some()
            || dom::any_ancestor(node, |n: &Rc<Node>| macro_hint(n).is_some())
            || dom::find_descendant(node, &|n| macro_hint(n).is_some()).is_some())
}

/// A string naming the math variant, when this node carries one.
fn macro_hint(node: &Rc<Node>) -> Option<String> {
    dom::get_attr(node, "data-macro-name")
        .filter(|name| name.contains("math"))
        .or_else(|| {
            dom::get_attr(node, "data-vc")
                .filter(|vc| vc.contains("_easy-math") || vc.contains("_eazy-math"))
        })
}

fn parse_parameters(raw: &str) -> Option<Value> {
    serde_json::from_str(raw)
        .or_else(|_| serde_json::from_str(&html_escape::decode_html_entities(raw)))
        .ok()
}

/// Pull the LaTeX body out of an editor parameter blob.
fn latex_from_json(params: &Value) -> Option<String> {
    let candidates = [
        params.get("body"),
        params.pointer("/macroParams/body/value"),
        params.pointer("/macroParams/__bodyContent/value"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Pull the LaTeX body out of a rendered `key=value|key=value` string.
fn latex_from_macro_parameters(raw: &str) -> Option<String> {
    let decoded = html_escape::decode_html_entities(raw);
    decoded
        .split('|')
        .find_map(|pair| pair.strip_prefix("body="))
        .map(str::trim)
        .filter(|body| !body.is_empty())
        .map(str::to_string)
}

fn format_math(latex: &str, inline: bool) -> String {
    if inline {
        format!("${latex}$")
    } else {
        format!("\n\n$$\n{latex}\n$$\n\n")
    }
}

impl Plugin for MathPlugin {
    fn id(&self) -> &'static str {
        "math"
    }

    fn order(&self) -> u32 {
        55
    }

    fn matches(&self, node: &Rc<Node>) -> bool {
        is_editor_math(node) || is_rendered_math(node)
    }

    fn render(&self, node: &Rc<Node>, _scope: &mut RenderScope) -> Result<String, RenderError> {
        if is_editor_math(node) {
            let key = dom::get_attr(node, "data-extension-key").unwrap_or_default();
            let inline = key.contains("inline");
            let latex = dom::get_attr(node, "data-parameters")
                .and_then(|raw| parse_parameters(&raw))
                .and_then(|params| latex_from_json(&params));
            return Ok(match latex {
                Some(latex) => format_math(&latex, inline),
                None => String::new(),
            });
        }

        let hint = macro_hint(node)
            .or_else(|| {
                let mut found = None;
                let mut current = Rc::clone(node);
                while let Some(parent) = dom::parent(&current) {
                    if let Some(h) = macro_hint(&parent) {
                        found = Some(h);
                        break;
                    }
                    current = parent;
                }
                found
            })
            .or_else(|| {
                dom::find_descendant(node, &|n| macro_hint(n).is_some())
                    .and_then(|n| macro_hint(&n))
            })
            .unwrap_or_default();
        let inline = hint.contains("inline");

        let latex = dom::get_attr(node, "data-macro-parameters")
            .and_then(|raw| latex_from_macro_parameters(&raw));
        Ok(match latex {
            Some(latex) => format_math(&latex, inline),
            None => String::new(),
        })
    }
}
