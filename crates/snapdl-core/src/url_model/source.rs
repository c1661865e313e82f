//! Recognized short-form video URL shapes.

use once_cell::sync::Lazy;
use regex::RegexSet;
use std::fmt;

/// Short links (`vt.`, `vm.`) and the canonical `@user/video/<id>` page.
/// Matching is anchored at the start only; trailing query strings are kept.
static SOURCE_SHAPES: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^https://vt\.tiktok\.com/\w+",
        r"^https://vm\.tiktok\.com/\w+/",
        r"^https://www\.tiktok\.com/@\w+/video/\w+",
    ])
    .unwrap_or_else(|e| panic!("invalid built-in URL shape: {e}"))
});

/// A video page URL that matched one of the recognized shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceUrl(String);

impl SourceUrl {
    /// Validates `raw` (surrounding whitespace ignored).
    pub fn parse(raw: &str) -> Option<Self> {
        let url = raw.trim();
        SOURCE_SHAPES
            .is_match(url)
            .then(|| SourceUrl(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
