//! Conversion options and per-call overrides.

/// Options controlling the rendered Markdown.
///
/// Defaults are established once; callers merge per-call overrides shallowly
/// with [`ConversionOptions::merged`]. Every toggle takes effect on the next
/// conversion call.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Keep `[text](url)` links. When false, links are stripped to bare text
    /// during finalization; image syntax is never stripped.
    pub include_links: bool,

    /// Render non-emoji media as numbered `[Image N]` placeholders.
    pub include_image_placeholders: bool,

    /// Render emoji as `:short-name:` tokens instead of suppressing them.
    pub emoji_names: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            include_links: true,
            include_image_placeholders: true,
            emoji_names: false,
        }
    }
}

/// Shallow per-call overrides for [`ConversionOptions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionOverrides {
    pub include_links: Option<bool>,
    pub include_image_placeholders: Option<bool>,
    pub emoji_names: Option<bool>,
}

impl ConversionOptions {
    /// Merge `overrides` over `self`, field by field.
    #[must_use]
    pub fn merged(&self, overrides: OptionOverrides) -> Self {
        Self {
            include_links: overrides.include_links.unwrap_or(self.include_links),
            include_image_placeholders: overrides
                .include_image_placeholders
                .unwrap_or(self.include_image_placeholders),
            emoji_names: overrides.emoji_names.unwrap_or(self.emoji_names),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let opts = ConversionOptions::default();
        assert!(opts.include_links);
        assert!(opts.include_image_placeholders);
        assert!(!opts.emoji_names);
    }

    #[test]
    fn merge_is_shallow_and_partial() {
        let base = ConversionOptions::default();
        let merged = base.merged(OptionOverrides {
            emoji_names: Some(true),
            ..OptionOverrides::default()
        });
        assert!(merged.emoji_names);
        assert!(merged.include_links);
        assert!(merged.include_image_placeholders);
    }
}
