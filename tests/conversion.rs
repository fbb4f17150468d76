//! End-to-end conversion behavior through the public API.

use assert_fs::prelude::*;
use assert_fs::TempDir;
use proptest::prelude::*;

use confluence_markdown::{
    convert_html_to_markdown, try_load_rules, ConversionOptions, FsRuleSource, RuleSet,
};

fn convert(html: &str) -> String {
    convert_html_to_markdown(html, &RuleSet::empty(), &ConversionOptions::default())
}

fn rules_from(json: &str) -> RuleSet {
    let dir = TempDir::new().unwrap();
    dir.child("rules.json").write_str(json).unwrap();
    let source = FsRuleSource::new(dir.path());
    try_load_rules(&source, "rules.json").unwrap()
}

#[test]
fn document_conversion_covers_mixed_content() {
    let html = "<h1>Release notes</h1>\
                <p>Written by <span data-mention-id=\"u1\">@Ann</span>.</p>\
                <ul><li>shipped <strong>fast</strong></li></ul>\
                <table><tr><th>Item</th></tr><tr><td>row</td></tr></table>";
    let md = convert(html);
    assert_eq!(
        md,
        "# Release notes\n\nWritten by [User 1].\n\n- shipped **fast**\n\n\
         | Item |\n| --- |\n| row |\n"
    );
}

#[test]
fn image_numbering_is_document_order_and_resets_per_call() {
    let html = "<p><img alt=\"overview diagram\" src=\"a.png\">\
                <img alt=\"detail diagram\" src=\"b.png\"></p>";
    assert_eq!(convert(html), "[Image 1][Image 2]\n");
    // A second conversion starts over.
    assert_eq!(convert(html), "[Image 1][Image 2]\n");
}

#[test]
fn mention_ordinals_are_stable_within_a_document() {
    let html = "<p><span data-mention-id=\"b\">@B</span> \
                <span data-mention-id=\"a\">@A</span> \
                <span data-mention-id=\"b\">@B</span></p>";
    assert_eq!(convert(html), "[User 1] [User 2] [User 1]\n");
}

#[test]
fn preprocessor_rules_normalize_both_page_variants() {
    // One rule set rewrites editor markup into the rendered shape, so both
    // captures of the same page converge on the same Markdown.
    let rules = rules_from(
        r#"{"htmlPreprocessors":[
            {"id":"unwrap-inline-card","description":"unwrap",
             "pattern":"<span data-pm-slice=\"[^\"]*\">","replacement":"<span>","flags":"g"}],
           "markdownPostprocessors":[]}"#,
    );
    let edit = "<span data-pm-slice=\"1 1 []\">same words</span>";
    let read = "<span>same words</span>";
    let options = ConversionOptions::default();
    assert_eq!(
        convert_html_to_markdown(edit, &rules, &options),
        convert_html_to_markdown(read, &rules, &options),
    );
}

#[test]
fn postprocessor_rules_run_after_rendering() {
    // The pattern only exists in the rendered Markdown, never in the HTML.
    let rules = rules_from(
        r###"{"htmlPreprocessors":[],
           "markdownPostprocessors":[
            {"id":"demote","description":"demote top-level headings",
             "pattern":"^# ","replacement":"## ","flags":"gm"}]}"###,
    );
    let md = convert_html_to_markdown(
        "<h1>Title</h1>",
        &rules,
        &ConversionOptions::default(),
    );
    assert_eq!(md, "## Title\n");
}

#[test]
fn link_stripping_spares_image_placeholders() {
    let options = ConversionOptions {
        include_links: false,
        ..ConversionOptions::default()
    };
    let md = convert_html_to_markdown(
        "<p><a href=\"https://x.example\">text link</a> \
         <img alt=\"chart of results\" src=\"c.png\"></p>",
        &RuleSet::empty(),
        &options,
    );
    assert_eq!(md, "text link [Image 1]\n");
}

#[test]
fn first_matching_plugin_owns_the_subtree() {
    // A mention nested inside an expand renders through the expand body, but
    // an extension-flavored wrapper around a table must not flatten it.
    let md = convert(
        "<div data-node-type=\"expand\" data-title=\"People\">\
         <p><span data-mention-id=\"u9\">@X</span></p></div>",
    );
    assert_eq!(
        md,
        "(Expand Block - People)\n[User 1]\n(End Expand Block)\n"
    );
}

#[test]
fn deeply_nested_markup_degrades_to_error_text() {
    let mut html = String::new();
    for _ in 0..600 {
        html.push_str("<div><span>");
    }
    html.push('x');
    let md = convert(&html);
    assert!(md.starts_with("Error converting HTML to Markdown:"));
}

proptest! {
    #[test]
    fn plain_text_never_panics_and_output_is_finalized(text in "[ -~]{0,200}") {
        let md = convert(&text);
        prop_assert!(md.is_empty() || md.ends_with('\n'));
        prop_assert!(!md.ends_with("\n\n"));
    }
}
