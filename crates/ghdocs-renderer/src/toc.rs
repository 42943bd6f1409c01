//! Heading anchors and table of contents.

use std::collections::HashMap;

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Convert heading text to a URL-safe anchor.
///
/// ```
/// use ghdocs_renderer::slugify;
///
/// assert_eq!(slugify("Data Loading & Actions"), "data-loading-actions");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true; // Prevents leading dash

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Hands out unique anchor ids within one document.
#[derive(Default)]
pub(crate) struct AnchorIds {
    seen: HashMap<String, usize>,
}

impl AnchorIds {
    /// Claim an id for a heading. Repeats get `-1`, `-2`, ... suffixes.
    pub(crate) fn claim(&mut self, explicit: Option<&str>, text: &str) -> String {
        let base = match explicit {
            Some(id) if !id.is_empty() => id.to_owned(),
            _ => slugify(text),
        };
        let base = if base.is_empty() {
            "section".to_owned()
        } else {
            base
        };

        let mut candidate = base.clone();
        while let Some(count) = self.seen.get_mut(&candidate) {
            *count += 1;
            candidate = format!("{base}-{count}");
        }
        self.seen.insert(candidate.clone(), 0);
        candidate
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  useNavigate()  "), "usenavigate");
        assert_eq!(slugify("v6.4 -- Data APIs"), "v64-data-apis");
        assert_eq!(slugify("snake_case_name"), "snake-case-name");
        assert_eq!(slugify("Übersicht"), "übersicht");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_claim_deduplicates() {
        let mut ids = AnchorIds::default();
        assert_eq!(ids.claim(None, "Example"), "example");
        assert_eq!(ids.claim(None, "Example"), "example-1");
        assert_eq!(ids.claim(None, "Example"), "example-2");
        assert_eq!(ids.claim(None, "Example 1"), "example-1-1");
    }

    #[test]
    fn test_claim_explicit_and_empty() {
        let mut ids = AnchorIds::default();
        assert_eq!(ids.claim(Some("custom"), "Ignored"), "custom");
        assert_eq!(ids.claim(None, "???"), "section");
        assert_eq!(ids.claim(None, ""), "section-1");
    }
}
