//! Repository archive fetching and extraction.
//!
//! [`ArchiveFetcher`] produces a gzip-compressed tar stream for a ref, either
//! from the host or by packaging the local snapshot directory. The local
//! archive uses the same layout as a host tarball (one synthetic top-level
//! directory), so [`ArchiveExtractor`] handles both the same way.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use ghdocs_refs::LOCAL_REF;
use regex::Regex;
use tar::{Archive, Entries, EntryType, Header};
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::host::{ArchiveReader, RepoId, SourceHost};

/// Top-level directory of packaged local snapshots.
const LOCAL_TOP_DIR: &str = "local";

/// A documentation file pulled from an archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveFile {
    /// Path relative to the repository root (e.g. `docs/guides/routing.md`).
    pub filename: String,
    /// UTF-8 file content.
    pub content: String,
}

/// Fetches repository archives for a ref.
pub struct ArchiveFetcher {
    host: Arc<dyn SourceHost>,
    local_dir: Option<PathBuf>,
}

impl ArchiveFetcher {
    /// Create a fetcher. `local_dir` backs the `local` ref.
    #[must_use]
    pub fn new(host: Arc<dyn SourceHost>, local_dir: Option<PathBuf>) -> Self {
        Self { host, local_dir }
    }

    /// Archive of `repo` at `git_ref`, or `None` if the host has none.
    ///
    /// The `local` ref never touches the network. Without a configured
    /// snapshot directory it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on transport failures, rate limiting, host
    /// server errors, or an unreadable local snapshot.
    pub fn fetch_archive(
        &self,
        repo: &RepoId,
        git_ref: &str,
    ) -> Result<Option<ArchiveReader>, SourceError> {
        if git_ref == LOCAL_REF {
            return match &self.local_dir {
                Some(dir) => {
                    info!(dir = %dir.display(), "Packaging local snapshot");
                    let bytes = pack_dir(dir)?;
                    Ok(Some(Box::new(Cursor::new(bytes))))
                }
                None => {
                    debug!("Local ref requested without a local snapshot");
                    Ok(None)
                }
            };
        }

        self.host.archive(repo, git_ref)
    }
}

/// Package `dir` into an in-memory `.tar.gz` under a synthetic top directory.
///
/// Dot-entries (`.git`, `.github`, editor state) are skipped.
///
/// # Errors
///
/// Returns [`SourceError`] if the directory cannot be read.
pub fn pack_dir(dir: &Path) -> Result<Vec<u8>, SourceError> {
    let mut files = Vec::new();
    collect_files(dir, dir, &mut files)
        .map_err(|e| SourceError::io(e).with_backend("Local"))?;

    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
    for (relative, full) in &files {
        let data = std::fs::read(full).map_err(|e| SourceError::io(e).with_backend("Local"))?;
        append_file(&mut builder, &format!("{LOCAL_TOP_DIR}/{relative}"), &data)
            .map_err(|e| SourceError::io(e).with_backend("Local"))?;
    }
    finish(builder).map_err(|e| SourceError::io(e).with_backend("Local"))
}

/// Package in-memory files into a `.tar.gz` under `top_dir`.
///
/// # Errors
///
/// Returns [`SourceError`] if compression fails.
pub fn pack_files<'a>(
    top_dir: &str,
    files: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<Vec<u8>, SourceError> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
    for (path, content) in files {
        append_file(&mut builder, &format!("{top_dir}/{path}"), content.as_bytes())
            .map_err(SourceError::io)?;
    }
    finish(builder).map_err(SourceError::io)
}

fn append_file(
    builder: &mut tar::Builder<GzEncoder<Vec<u8>>>,
    path: &str,
    data: &[u8],
) -> std::io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, path, data)
}

fn finish(builder: tar::Builder<GzEncoder<Vec<u8>>>) -> std::io::Result<Vec<u8>> {
    builder.into_inner()?.finish()
}

/// Walk `dir` in sorted order, collecting `(relative_path, full_path)`.
fn collect_files(
    root: &Path,
    dir: &Path,
    out: &mut Vec<(String, PathBuf)>,
) -> std::io::Result<()> {
    let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(root, &path, out)?;
        } else if file_type.is_file() {
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let relative: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            out.push((relative.join("/"), path));
        }
    }

    Ok(())
}

/// Pull-based reader of documentation files in a `.tar.gz` stream.
///
/// The stream is read once: [`ArchiveExtractor::files`] returns a lazy
/// iterator that decodes entries as it advances.
pub struct ArchiveExtractor<R: Read> {
    archive: Archive<GzDecoder<R>>,
    pattern: Regex,
}

impl<R: Read> ArchiveExtractor<R> {
    /// Wrap a gzip-compressed tar stream.
    ///
    /// `pattern` is matched against paths relative to the repository root.
    pub fn new(reader: R, pattern: Regex) -> Self {
        Self {
            archive: Archive::new(GzDecoder::new(reader)),
            pattern,
        }
    }

    /// Lazily iterate matching regular files.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the stream was already consumed.
    pub fn files(&mut self) -> Result<ArchiveFiles<'_, R>, SourceError> {
        let entries = self.archive.entries().map_err(SourceError::archive)?;
        Ok(ArchiveFiles {
            entries,
            pattern: &self.pattern,
        })
    }
}

/// Iterator returned by [`ArchiveExtractor::files`].
pub struct ArchiveFiles<'a, R: Read> {
    entries: Entries<'a, GzDecoder<R>>,
    pattern: &'a Regex,
}

/// Strip the synthetic top-level directory (`owner-repo-sha/`).
fn strip_top_dir(path: &str) -> Option<&str> {
    let (_, rest) = path.split_once('/')?;
    (!rest.is_empty()).then_some(rest)
}

impl<R: Read> Iterator for ArchiveFiles<'_, R> {
    type Item = Result<ArchiveFile, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(SourceError::archive(e))),
            };

            if !entry.header().entry_type().is_file() {
                continue;
            }

            let Some(filename) = std::str::from_utf8(&entry.path_bytes())
                .ok()
                .and_then(strip_top_dir)
                .map(str::to_owned)
            else {
                continue;
            };

            if !self.pattern.is_match(&filename) {
                continue;
            }

            let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
            if let Err(e) = entry.read_to_end(&mut bytes) {
                return Some(Err(SourceError::archive(e)));
            }

            match String::from_utf8(bytes) {
                Ok(content) => return Some(Ok(ArchiveFile { filename, content })),
                Err(_) => warn!(filename, "Skipping file that is not valid UTF-8"),
            }
        }
    }
}
