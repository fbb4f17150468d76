//! The regex rewrite stage.
//!
//! Applied twice per conversion: once on raw HTML before tree parsing
//! (stripping editor chrome such as anchor-copy buttons, icon markup, and
//! column-group scaffolding) and once on the rendered Markdown (fixing
//! heading/list/table-header artifacts that only become visible after
//! structural conversion).

use fancy_regex::Expander;

use super::CompiledRule;

/// Apply each rule in array order, threading the output of one rule into the
/// next.
///
/// A rule that fails at match or expansion time is skipped with a logged
/// warning and the text passes through unchanged for that rule only; a single
/// bad rule never aborts the whole conversion.
#[must_use]
pub fn apply_rules(text: &str, rules: &[CompiledRule]) -> String {
    let mut out = text.to_string();
    for rule in rules {
        match apply_one(&out, rule) {
            Ok(Some(replaced)) => out = replaced,
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(rule = %rule.id, error = %err, "skipping rule that failed to apply");
            }
        }
    }
    out
}

/// Run one substitution. `Ok(None)` means the pattern matched nothing and the
/// input can be reused as-is.
fn apply_one(text: &str, rule: &CompiledRule) -> Result<Option<String>, fancy_regex::Error> {
    let expander = Expander::default();
    let mut out = String::with_capacity(text.len());
    let mut last_end = 0;
    let mut matched = false;

    for captures in rule.regex.captures_iter(text) {
        let captures = captures?;
        let whole = captures
            .get(0)
            .expect("capture group 0 always exists on a match");
        matched = true;
        out.push_str(&text[last_end..whole.start()]);
        expander.append_expansion(&mut out, &rule.replacement, &captures);
        last_end = whole.end();
        if !rule.global {
            break;
        }
    }

    if !matched {
        return Ok(None);
    }
    out.push_str(&text[last_end..]);
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::validate_rule;
    use serde_json::json;
    use std::collections::HashSet;

    fn compiled(id: &str, pattern: &str, replacement: &str, flags: &str) -> CompiledRule {
        let mut seen = HashSet::new();
        validate_rule(
            &json!({
                "id": id,
                "description": "test",
                "pattern": pattern,
                "replacement": replacement,
                "flags": flags,
            }),
            "test#1",
            &mut seen,
        )
        .unwrap()
        .unwrap()
    }

    #[test]
    fn applies_rules_in_order_threading_output() {
        let rules = vec![
            compiled("one", "a", "b", "g"),
            compiled("two", "bb", "c", "g"),
        ];
        assert_eq!(apply_rules("aab", &rules), "cb");
    }

    #[test]
    fn global_flag_controls_replace_all() {
        let all = compiled("g", "x", "y", "g");
        let first = compiled("f", "x", "y", "");
        assert_eq!(apply_rules("xx", std::slice::from_ref(&all)), "yy");
        assert_eq!(apply_rules("xx", std::slice::from_ref(&first)), "yx");
    }

    #[test]
    fn expands_capture_group_references() {
        let rule = compiled("caps", r"<mark[^>]*>([\s\S]*?)</mark>", "$1", "gi");
        assert_eq!(
            apply_rules("a <MARK class=\"x\">kept</MARK> b", &[rule]),
            "a kept b"
        );
    }

    #[test]
    fn multiline_flag_anchors_per_line() {
        let rule = compiled("heading", "^# - ", "- ", "gm");
        assert_eq!(apply_rules("# - one\n# - two", &[rule]), "- one\n- two");
    }

    #[test]
    fn no_match_leaves_text_untouched() {
        let rule = compiled("nomatch", "zzz", "y", "g");
        assert_eq!(apply_rules("abc", &[rule]), "abc");
    }

    #[test]
    fn supports_lookahead_patterns() {
        let rule = compiled("look", r"foo(?=bar)", "baz", "g");
        assert_eq!(apply_rules("foobar foo", &[rule]), "bazbar foo");
    }
}
