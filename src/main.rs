use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;

use confluence_markdown::{
    convert_html_to_markdown, load_rules, try_load_rules, ConversionOptions, FsRuleSource,
    LoadError, OptionOverrides, RuleSet, RuleSource,
};

/// Rule set used when no `--rules` file is given: the Confluence cleanup
/// rewrites that every conversion wants.
const DEFAULT_RULES: &str = r##"{
  "htmlPreprocessors": [
    {
      "id": "unwrap-mark",
      "description": "Unwrap <mark> annotation tags",
      "pattern": "<mark[^>]*>([\\s\\S]*?)<\\/mark>",
      "replacement": "$1",
      "flags": "gi"
    },
    {
      "id": "strip-heading-anchors",
      "description": "Remove Confluence heading anchor buttons",
      "pattern": "<span[^>]*class=\"heading-anchor-wrapper\"[\\s\\S]*?<\\/span>",
      "replacement": "",
      "flags": "gi"
    },
    {
      "id": "strip-colgroups",
      "description": "Strip table colgroup definitions",
      "pattern": "<colgroup[\\s\\S]*?<\\/colgroup>",
      "replacement": "",
      "flags": "gi"
    },
    {
      "id": "strip-sorting-icons",
      "description": "Remove Confluence table sorting icons",
      "pattern": "<figure[^>]*class=\"ak-renderer-tableHeader-sorting-icon__wrapper\"[\\s\\S]*?<\\/figure>",
      "replacement": "",
      "flags": "gi"
    }
  ],
  "markdownPostprocessors": [
    {
      "id": "fix-heading-list-hybrid",
      "description": "Fix '# - ' heading-list hybrids",
      "pattern": "^# - ",
      "replacement": "- ",
      "flags": "gm"
    },
    {
      "id": "split-heading-table",
      "description": "Split combined heading + table header row",
      "pattern": "^# ([^|\\n]+)\\s*\\|\\s*(.+)$",
      "replacement": "# $1\n\n| $2",
      "flags": "gm"
    }
  ]
}"##;

/// Convert Confluence HTML to Markdown.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// HTML file to convert; reads stdin when omitted.
    input: Option<PathBuf>,

    /// Rule file (legacy or split shape). Paths inside a split manifest
    /// resolve relative to this file's directory.
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Replace [text](url) links with their plain text.
    #[arg(long)]
    no_links: bool,

    /// Drop [Image N] placeholders instead of emitting them.
    #[arg(long)]
    no_image_placeholders: bool,

    /// Render emoji as :short-name: tokens instead of dropping them.
    #[arg(long)]
    emoji_names: bool,
}

struct EmbeddedSource;

impl RuleSource for EmbeddedSource {
    fn fetch(&self, path: &str) -> Result<Value, LoadError> {
        serde_json::from_str(DEFAULT_RULES).map_err(|source| LoadError::Json {
            path: path.to_string(),
            source,
        })
    }
}

fn load_rule_set(rules: Option<&PathBuf>) -> Result<RuleSet> {
    match rules {
        Some(path) => {
            let root = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            let entry = path
                .file_name()
                .and_then(|name| name.to_str())
                .context("rule path has no file name")?;
            // A broken rule file degrades to no custom rules, same as the
            // library loader, so a conversion still runs.
            let source = FsRuleSource::new(root);
            Ok(load_rules(&source, entry))
        }
        None => Ok(try_load_rules(&EmbeddedSource, "embedded")
            .expect("embedded default rules are valid")),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let html = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading stdin")?;
            buffer
        }
    };

    let rules = load_rule_set(cli.rules.as_ref())?;
    let options = ConversionOptions::default().merged(OptionOverrides {
        include_links: cli.no_links.then_some(false),
        include_image_placeholders: cli.no_image_placeholders.then_some(false),
        emoji_names: cli.emoji_names.then_some(true),
    });

    print!("{}", convert_html_to_markdown(&html, &rules, &options));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_rules_load() {
        let rules = try_load_rules(&EmbeddedSource, "embedded").unwrap();
        assert_eq!(rules.html_preprocessors.len(), 4);
        assert_eq!(rules.markdown_postprocessors.len(), 2);
    }

    #[test]
    fn unreadable_rules_file_degrades_to_empty_set() {
        let rules = load_rule_set(Some(&PathBuf::from("/nonexistent/rules.json")))
            .expect("a missing rules file should not abort");
        assert!(rules.is_empty());
    }

    #[test]
    fn embedded_rules_clean_confluence_markup() {
        let rules = try_load_rules(&EmbeddedSource, "embedded").unwrap();
        let md = convert_html_to_markdown(
            "<h1>Title<span class=\"heading-anchor-wrapper\"><button>#</button></span></h1>\
             <p><mark data-mark=\"1\">highlighted</mark></p>",
            &rules,
            &ConversionOptions::default(),
        );
        assert_eq!(md, "# Title\n\nhighlighted\n");
    }
}
