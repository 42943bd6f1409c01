//! Version token resolution.
//!
//! Maps a loosely written version from a URL (`v6`, `5.2`, `dev`, `local`)
//! to the exact ref the source host understands, given the repository's
//! known tags and branches.
//!
//! ```
//! use ghdocs_refs::resolve_ref;
//!
//! let tags = ["v6.0.0", "v5.3.0", "v5.2.1"].map(String::from);
//! let branches = ["main", "dev"].map(String::from);
//!
//! assert_eq!(
//!     resolve_ref("v5", &tags, &branches, "refs/heads/main").as_deref(),
//!     Some("refs/tags/v5.3.0")
//! );
//! assert_eq!(resolve_ref("v4", &tags, &branches, "refs/heads/main"), None);
//! ```

use semver::{Version, VersionReq};

/// Reserved ref served from a local working copy.
pub const LOCAL_REF: &str = "local";

const TAG_PREFIX: &str = "refs/tags/";
const BRANCH_PREFIX: &str = "refs/heads/";

/// Mutability class of a resolved ref.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// Immutable release tag.
    Tag,
    /// Branch whose content moves under the same name.
    Branch,
    /// Local working copy, changes on every edit.
    Local,
}

impl RefKind {
    /// Classify a ref returned by [`resolve_ref`].
    ///
    /// Anything that is not a tag or the local ref is treated as a branch,
    /// so unknown refs get the short-lived cache policy.
    #[must_use]
    pub fn classify(git_ref: &str) -> Self {
        if git_ref == LOCAL_REF {
            Self::Local
        } else if git_ref.starts_with(TAG_PREFIX) {
            Self::Tag
        } else {
            Self::Branch
        }
    }

    /// Whether content at this ref can change without the ref changing.
    #[must_use]
    pub fn is_mutable(self) -> bool {
        !matches!(self, Self::Tag)
    }
}

/// Resolve a user supplied version token to a ref.
///
/// In order:
///
/// 1. A known branch name resolves to `refs/heads/<branch>`.
/// 2. A known tag name resolves to `refs/tags/<tag>`.
/// 3. A numeric prefix (`v5`, `5.2`, `v5.2.1`) selects the highest
///    non-prerelease tag whose leading components equal the prefix. When a
///    partial prefix picks the newest release overall, the default branch is
///    returned instead. A full `major.minor.patch` version always pins its
///    tag.
///
/// Returns `None` for everything else. There is no fallback to the default
/// branch for unknown tokens.
#[must_use]
pub fn resolve_ref(
    token: &str,
    tags: &[String],
    branches: &[String],
    default_branch_ref: &str,
) -> Option<String> {
    if branches.iter().any(|b| b == token) {
        return Some(format!("{BRANCH_PREFIX}{token}"));
    }
    if tags.iter().any(|t| t == token) {
        return Some(format!("{TAG_PREFIX}{token}"));
    }

    let (req, pinned) = prefix_req(token)?;

    let releases = || {
        tags.iter()
            .filter_map(|tag| parse_tag(tag).map(|version| (version, tag)))
            .filter(|(version, _)| version.pre.is_empty())
    };

    let newest = releases().map(|(version, _)| version).max()?;
    let (best, tag) = releases()
        .filter(|(version, _)| req.matches(version))
        .max_by(|(a, _), (b, _)| a.cmp(b))?;

    if best == newest && !pinned {
        Some(default_branch_ref.to_owned())
    } else {
        Some(format!("{TAG_PREFIX}{tag}"))
    }
}

/// Parse `v5`, `5.2` or `5.2.1` into an exact-prefix requirement, and
/// whether it names a full version.
///
/// `=5.2` matches `5.2.x` by component, so `5.2` never matches `5.20.0`.
fn prefix_req(token: &str) -> Option<(VersionReq, bool)> {
    let numeric = token.strip_prefix('v').unwrap_or(token);
    let parts: Vec<&str> = numeric.split('.').collect();

    let well_formed = (1..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
    if !well_formed {
        return None;
    }

    let req = VersionReq::parse(&format!("={numeric}")).ok()?;
    Some((req, parts.len() == 3))
}

fn parse_tag(tag: &str) -> Option<Version> {
    Version::parse(tag.strip_prefix('v').unwrap_or(tag)).ok()
}
