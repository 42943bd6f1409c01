//! Document front-matter.
//!
//! A document may start with a YAML block delimited by `---` lines:
//!
//! ```text
//! ---
//! title: Data Loading
//! order: 2
//! new: true
//! ---
//!
//! # Data Loading
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attributes parsed from a document's front-matter.
///
/// `title`, `order` and `hidden` are recognized. Every other key is kept
/// verbatim in `extra` and passed through to clients.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    /// Display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Position among siblings. Documents without one sort last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    /// Hidden documents are left out of menus but still served.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    /// Unrecognized keys.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Attributes {
    /// Parse attributes from YAML. Blank input yields default attributes.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }
}

/// Split a document into its front-matter block and body.
///
/// Returns `None` when the document has no front-matter. An opening `---`
/// without a closing line is treated as plain content.
fn split(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---")?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Parse a document into attributes and the markdown body after the
/// front-matter.
pub fn parse_front_matter(content: &str) -> Result<(Attributes, &str), serde_yaml::Error> {
    match split(content) {
        Some((yaml, body)) => Ok((Attributes::from_yaml(yaml)?, body)),
        None => Ok((Attributes::default(), content)),
    }
}
