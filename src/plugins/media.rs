//! Images and emoji.
//!
//! Claims the outermost media wrapper in a media subtree, so a `mediaSingle`
//! card containing an `img` renders exactly once. Raster content becomes a
//! numbered `[Image N]` placeholder with a document-global counter; emoji
//! become `:short-name:` tokens or vanish, depending on options.

use std::rc::Rc;
use std::sync::LazyLock;

use markup5ever_rcdom::Node;
use regex::Regex;

use crate::dom;
use crate::error::RenderError;
use crate::renderer::RenderScope;

use super::Plugin;

static PICTOGRAPHIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\p{Extended_Pictographic}").expect("PICTOGRAPHIC: hardcoded regex is valid")
});

pub struct MediaPlugin;

fn is_media_node(node: &Rc<Node>) -> bool {
    dom::tag_name(node) == Some("img")
        || dom::attr_equals(node, "data-node-type", "media")
        || dom::attr_equals(node, "data-prosemirror-node-name", "media")
}

fn is_media_wrapper(node: &Rc<Node>) -> bool {
    dom::attr_equals(node, "data-node-type", "mediaSingle")
        || dom::attr_equals(node, "data-prosemirror-node-name", "mediaSingle")
        || dom::class_contains_token(node, "mediaSingleView-content-wrap")
}

fn is_media_subtree(node: &Rc<Node>) -> bool {
    is_media_node(node) || is_media_wrapper(node)
}

/// The alt text, falling back through the attributes the editor and the
/// renderer variously populate.
fn resolve_alt(node: &Rc<Node>) -> Option<String> {
    for attr in ["alt", "data-alt", "data-file-name"] {
        if let Some(value) = dom::get_attr(node, attr) {
            let value = value.trim().to_string();
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

fn emoji_short_name(node: &Rc<Node>) -> Option<String> {
    dom::get_attr(node, "data-emoji-short-name")
        .map(|name| name.trim_matches(':').to_string())
        .filter(|name| !name.is_empty())
}

/// Emoji are distinguished from real images heuristically: pictographic alt
/// text, very short alt text, or an explicit short-name attribute.
fn is_emoji(node: &Rc<Node>, alt: Option<&str>) -> bool {
    if emoji_short_name(node).is_some() {
        return true;
    }
    match alt {
        Some(alt) => PICTOGRAPHIC.is_match(alt) || alt.chars().count() <= 3,
        None => false,
    }
}

impl Plugin for MediaPlugin {
    fn id(&self) -> &'static str {
        "media"
    }

    fn order(&self) -> u32 {
        10
    }

    fn matches(&self, node: &Rc<Node>) -> bool {
        is_media_subtree(node) && !dom::any_ancestor(node, &is_media_subtree)
    }

    fn render(&self, node: &Rc<Node>, scope: &mut RenderScope) -> Result<String, RenderError> {
        // The node carrying the attributes may be the wrapper itself or an
        // img buried inside it.
        let carrier = if is_media_node(node) {
            Rc::clone(node)
        } else {
            dom::find_descendant(node, &is_media_node).unwrap_or_else(|| Rc::clone(node))
        };

        let alt = resolve_alt(&carrier).or_else(|| resolve_alt(node));
        if is_emoji(&carrier, alt.as_deref()) {
            if !scope.options().emoji_names {
                return Ok(String::new());
            }
            let name = emoji_short_name(&carrier)
                .or(alt)
                .unwrap_or_else(|| "emoji".to_string());
            return Ok(format!(":{name}:"));
        }

        if !scope.options().include_image_placeholders {
            return Ok(String::new());
        }
        let ordinal = scope.state.next_image_ordinal();
        Ok(format!("[Image {ordinal}]"))
    }
}
