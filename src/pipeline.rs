//! The top-level conversion pipeline.
//!
//! Four stages, always in this order: HTML preprocessor rules, DOM rendering,
//! Markdown postprocessor rules, finalization. Rule stages are plain string
//! rewrites; the DOM stage owns all structural work.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::dom;
use crate::options::ConversionOptions;
use crate::renderer::{Renderer, RunState};
use crate::rules::{apply_rules, RuleSet};

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!?)\[([^\]]*)\]\(([^)]*)\)").expect("MARKDOWN_LINK: hardcoded regex is valid")
});

/// Convert one HTML document to Markdown.
///
/// This never fails: render errors (in practice only pathological nesting)
/// degrade to an explanatory message in the output, matching the contract
/// that a conversion always yields a string.
#[must_use]
pub fn convert_html_to_markdown(
    html: &str,
    rules: &RuleSet,
    options: &ConversionOptions,
) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    // Mode detection runs on the raw input, before user rules get a chance
    // to rewrite the marker attributes away.
    let mode = dom::detect_mode(html);
    tracing::debug!(?mode, rules = !rules.is_empty(), "starting conversion");

    let html = apply_rules(html, &rules.html_preprocessors);
    let dom = dom::parse_html(&html);

    let renderer = Renderer::with_default_plugins(options.clone());
    let mut state = RunState::new(mode);
    let markdown = match renderer.render_document(&dom, &mut state) {
        Ok(markdown) => markdown,
        Err(err) => {
            tracing::warn!(%err, "rendering failed");
            return format!("Error converting HTML to Markdown:\n{err}");
        }
    };

    let markdown = apply_rules(&markdown, &rules.markdown_postprocessors);
    finalize(&markdown, options)
}

fn finalize(markdown: &str, options: &ConversionOptions) -> String {
    let text = if options.include_links {
        markdown.to_string()
    } else {
        strip_links(markdown)
    };
    let text = text.trim();
    if text.is_empty() {
        String::new()
    } else {
        format!("{text}\n")
    }
}

/// Replace `[text](url)` with `text`, leaving image syntax untouched.
fn strip_links(markdown: &str) -> String {
    MARKDOWN_LINK
        .replace_all(markdown, |caps: &Captures| {
            if &caps[1] == "!" {
                caps[0].to_string()
            } else {
                caps[2].to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str) -> String {
        convert_html_to_markdown(html, &RuleSet::empty(), &ConversionOptions::default())
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(convert(""), "");
        assert_eq!(convert("   \n\t  "), "");
    }

    #[test]
    fn output_ends_with_single_newline() {
        let md = convert("<p>hello</p>");
        assert_eq!(md, "hello\n");
    }

    #[test]
    fn links_survive_by_default() {
        let md = convert("<p><a href=\"https://x.example\">site</a></p>");
        assert_eq!(md, "[site](https://x.example)\n");
    }

    #[test]
    fn links_can_be_stripped_to_text() {
        let options = ConversionOptions {
            include_links: false,
            ..ConversionOptions::default()
        };
        let md = convert_html_to_markdown(
            "<p>see <a href=\"https://x.example\">the site</a> now</p>",
            &RuleSet::empty(),
            &options,
        );
        assert_eq!(md, "see the site now\n");
    }

    #[test]
    fn strip_links_keeps_image_syntax() {
        assert_eq!(
            strip_links("![alt](img.png) and [text](url)"),
            "![alt](img.png) and text"
        );
    }

    #[test]
    fn image_numbering_restarts_per_call() {
        let html = "<p><img src=\"a.png\" alt=\"first diagram\"></p>";
        assert_eq!(convert(html), "[Image 1]\n");
        assert_eq!(convert(html), "[Image 1]\n");
    }
}
