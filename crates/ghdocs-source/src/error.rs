//! Source host error type.
//!
//! Expected absence (missing ref, missing file, archive 404) is never an
//! error: host methods return `Ok(None)` for it. [`SourceError`] covers the
//! unexpected cases the cache layer may paper over with a stale value.

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SourceErrorKind {
    /// Repository identifier is not `owner/name`.
    InvalidRepo,
    /// Host is temporarily unavailable (5xx, connection failure).
    Unavailable,
    /// Host refused the request because the quota is exhausted.
    RateLimited,
    /// Request timed out.
    Timeout,
    /// Archive stream is corrupt or truncated.
    InvalidArchive,
    /// Local snapshot could not be read.
    Io,
    /// Other/unknown error category.
    Other,
}

/// Source error with semantic kind, request context and underlying cause.
#[derive(Debug)]
pub struct SourceError {
    /// Semantic error category.
    pub kind: SourceErrorKind,
    /// HTTP status returned by the host, if any.
    pub http_status: Option<u16>,
    /// Repository context (`owner/name`).
    pub repo: Option<String>,
    /// Ref context.
    pub git_ref: Option<String>,
    /// Backend identifier (e.g., "GitHub", "Local", "Mock").
    pub backend: Option<&'static str>,
    message: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    /// Create a new source error.
    #[must_use]
    pub fn new(kind: SourceErrorKind) -> Self {
        Self {
            kind,
            http_status: None,
            repo: None,
            git_ref: None,
            backend: None,
            message: None,
            source: None,
        }
    }

    /// Attach repository context.
    #[must_use]
    pub fn with_repo(mut self, repo: impl ToString) -> Self {
        self.repo = Some(repo.to_string());
        self
    }

    /// Attach ref context.
    #[must_use]
    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = Some(git_ref.into());
        self
    }

    /// Attach the HTTP status returned by the host.
    #[must_use]
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Whether the host is down or throttling, as opposed to returning bad
    /// data.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self.kind,
            SourceErrorKind::Unavailable | SourceErrorKind::RateLimited | SourceErrorKind::Timeout
        )
    }

    /// Attach a human readable detail (e.g. a response body).
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create an error for a corrupt archive stream.
    #[must_use]
    pub fn archive(err: std::io::Error) -> Self {
        Self::new(SourceErrorKind::InvalidArchive).with_source(err)
    }

    /// Create a source error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::TimedOut => SourceErrorKind::Timeout,
            _ => SourceErrorKind::Io,
        };
        Self::new(kind).with_source(err)
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (HTTP 503, repo: a/b, ref: refs/heads/main)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            SourceErrorKind::InvalidRepo => "Invalid repository",
            SourceErrorKind::Unavailable => "Unavailable",
            SourceErrorKind::RateLimited => "Rate limited",
            SourceErrorKind::Timeout => "Timeout",
            SourceErrorKind::InvalidArchive => "Invalid archive",
            SourceErrorKind::Io => "I/O error",
            SourceErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        } else if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        let context: Vec<String> = [
            self.http_status.map(|s| format!("HTTP {s}")),
            self.repo.as_ref().map(|r| format!("repo: {r}")),
            self.git_ref.as_ref().map(|r| format!("ref: {r}")),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !context.is_empty() {
            write!(f, " ({})", context.join(", "))?;
        }

        Ok(())
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_source_error_new() {
        let err = SourceError::new(SourceErrorKind::Other);

        assert_eq!(err.kind, SourceErrorKind::Other);
        assert!(err.repo.is_none());
        assert!(err.backend.is_none());
    }

    #[test]
    fn test_is_unavailable() {
        for kind in [
            SourceErrorKind::Unavailable,
            SourceErrorKind::RateLimited,
            SourceErrorKind::Timeout,
        ] {
            assert!(SourceError::new(kind).is_unavailable());
        }
        for kind in [
            SourceErrorKind::InvalidArchive,
            SourceErrorKind::Io,
            SourceErrorKind::InvalidRepo,
            SourceErrorKind::Other,
        ] {
            assert!(!SourceError::new(kind).is_unavailable());
        }
    }

    #[test]
    fn test_io_timeout() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = SourceError::io(io_err);

        assert_eq!(err.kind, SourceErrorKind::Timeout);
        assert!(err.downcast_source::<std::io::Error>().is_some());
    }

    #[test]
    fn test_display_simple() {
        let err = SourceError::new(SourceErrorKind::Unavailable);
        assert_eq!(err.to_string(), "Unavailable");
    }

    #[test]
    fn test_display_full() {
        let err = SourceError::new(SourceErrorKind::RateLimited)
            .with_backend("GitHub")
            .with_http_status(429)
            .with_repo("remix-run/react-router")
            .with_ref("refs/heads/main")
            .with_message("API rate limit exceeded");

        assert_eq!(
            err.to_string(),
            "[GitHub] Rate limited: API rate limit exceeded \
             (HTTP 429, repo: remix-run/react-router, ref: refs/heads/main)"
        );
    }

    #[test]
    fn test_display_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated");
        let err = SourceError::archive(io_err).with_backend("Local");

        assert_eq!(err.to_string(), "[Local] Invalid archive: truncated");
    }

    #[test]
    fn test_source_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SourceError>();
    }
}
