//! GitHub REST API host.
//!
//! Sync HTTP client over `ureq`. Statuses are mapped as follows:
//!
//! | Status                              | Result                 |
//! |-------------------------------------|------------------------|
//! | 2xx                                 | value                  |
//! | 404                                 | `Ok(None)` / empty     |
//! | 429, 403 with exhausted quota       | `Err(RateLimited)`     |
//! | 5xx                                 | `Err(Unavailable)`     |
//! | anything else                       | logged, `Ok(None)`     |
//!
//! List endpoints have no notion of absence beyond 404, so they turn the last
//! row into an error as well.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};
use ureq::http::{HeaderMap, Response};
use ureq::{Agent, Body};

use crate::error::{SourceError, SourceErrorKind};
use crate::host::{ArchiveReader, Release, RepoId, SourceHost};

const BACKEND: &str = "GitHub";
const USER_AGENT: &str = concat!("ghdocs/", env!("CARGO_PKG_VERSION"));
const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw";
const PER_PAGE: usize = 100;
/// Upper bound on followed `next` links.
const MAX_PAGES: usize = 50;

/// GitHub (or GitHub Enterprise) API client.
pub struct GitHubHost {
    agent: Agent,
    api_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, PartialEq, Eq)]
enum StatusClass {
    Success,
    Missing,
    Failure(SourceErrorKind),
    Unexpected,
}

fn classify(status: u16, headers: &HeaderMap) -> StatusClass {
    let quota_exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
        || headers.contains_key("retry-after");

    match status {
        200..=299 => StatusClass::Success,
        404 => StatusClass::Missing,
        429 => StatusClass::Failure(SourceErrorKind::RateLimited),
        403 if quota_exhausted => StatusClass::Failure(SourceErrorKind::RateLimited),
        500..=599 => StatusClass::Failure(SourceErrorKind::Unavailable),
        _ => StatusClass::Unexpected,
    }
}

/// Extract the `rel="next"` target from a `Link` header.
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|p| p.trim() == r#"rel="next""#)
            .then(|| {
                target
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_owned()
            })
    })
}

fn read_body(response: Response<Body>) -> String {
    response
        .into_body()
        .read_to_string()
        .unwrap_or_else(|_| "(unable to read error body)".to_owned())
}

fn transport_error(err: ureq::Error) -> SourceError {
    let kind = match err {
        ureq::Error::Timeout(_) => SourceErrorKind::Timeout,
        _ => SourceErrorKind::Unavailable,
    };
    SourceError::new(kind).with_backend(BACKEND).with_source(err)
}

fn status_error(kind: SourceErrorKind, response: Response<Body>) -> SourceError {
    let status = response.status().as_u16();
    SourceError::new(kind)
        .with_backend(BACKEND)
        .with_http_status(status)
        .with_message(read_body(response))
}

impl GitHubHost {
    /// Create a client for `api_url` (e.g. `https://api.github.com`).
    #[must_use]
    pub fn new(api_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            api_url: api_url.trim_end_matches('/').to_owned(),
            token,
        }
    }

    fn get(&self, url: &str, accept: &str) -> Result<Response<Body>, SourceError> {
        let mut request = self
            .agent
            .get(url)
            .header("Accept", accept)
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request.call().map_err(transport_error)
    }

    /// Fetch every page of a list endpoint.
    fn list<T: DeserializeOwned>(
        &self,
        repo: &RepoId,
        endpoint: &str,
    ) -> Result<Vec<T>, SourceError> {
        let mut next = Some(format!(
            "{}/repos/{repo}/{endpoint}?per_page={PER_PAGE}",
            self.api_url
        ));
        let mut items = Vec::new();
        let mut pages = 0;

        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                warn!(%repo, endpoint, pages = MAX_PAGES, "Stopping pagination at page limit");
                break;
            }

            debug!(%repo, endpoint, page = pages, "Listing");
            let response = self.get(&url, ACCEPT_JSON).map_err(|e| e.with_repo(repo))?;

            match classify(response.status().as_u16(), response.headers()) {
                StatusClass::Success => {}
                StatusClass::Missing => {
                    debug!(%repo, endpoint, "Repository not found");
                    return Ok(Vec::new());
                }
                StatusClass::Failure(kind) => {
                    return Err(status_error(kind, response).with_repo(repo));
                }
                StatusClass::Unexpected => {
                    return Err(status_error(SourceErrorKind::Other, response).with_repo(repo));
                }
            }

            next = response
                .headers()
                .get("link")
                .and_then(|v| v.to_str().ok())
                .and_then(next_link);

            let page: Vec<T> = response.into_body().read_json().map_err(|e| {
                SourceError::new(SourceErrorKind::Other)
                    .with_backend(BACKEND)
                    .with_repo(repo)
                    .with_source(e)
            })?;
            items.extend(page);
        }

        Ok(items)
    }

    /// Log an unexpected status and swallow it as absence.
    fn unexpected(response: Response<Body>, repo: &RepoId, git_ref: &str, what: &str) {
        let status = response.status().as_u16();
        let body = read_body(response);
        warn!(%repo, git_ref, status, body, "Unexpected response fetching {what}");
    }
}

impl SourceHost for GitHubHost {
    fn tags(&self, repo: &RepoId) -> Result<Vec<String>, SourceError> {
        let tags: Vec<Named> = self.list(repo, "tags")?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    fn branches(&self, repo: &RepoId) -> Result<Vec<String>, SourceError> {
        let branches: Vec<Named> = self.list(repo, "branches")?;
        Ok(branches.into_iter().map(|b| b.name).collect())
    }

    fn releases(&self, repo: &RepoId) -> Result<Vec<Release>, SourceError> {
        self.list(repo, "releases")
    }

    fn file(
        &self,
        repo: &RepoId,
        git_ref: &str,
        path: &str,
    ) -> Result<Option<String>, SourceError> {
        let url = format!(
            "{}/repos/{repo}/contents/{}?ref={git_ref}",
            self.api_url,
            path.trim_start_matches('/')
        );
        debug!(%repo, git_ref, path, "Fetching file");

        let response = self
            .get(&url, ACCEPT_RAW)
            .map_err(|e| e.with_repo(repo).with_ref(git_ref))?;

        match classify(response.status().as_u16(), response.headers()) {
            StatusClass::Success => {
                let content = response.into_body().read_to_string().map_err(|e| {
                    SourceError::new(SourceErrorKind::Other)
                        .with_backend(BACKEND)
                        .with_repo(repo)
                        .with_ref(git_ref)
                        .with_source(e)
                })?;
                Ok(Some(content))
            }
            StatusClass::Missing => Ok(None),
            StatusClass::Failure(kind) => {
                Err(status_error(kind, response).with_repo(repo).with_ref(git_ref))
            }
            StatusClass::Unexpected => {
                Self::unexpected(response, repo, git_ref, path);
                Ok(None)
            }
        }
    }

    fn archive(&self, repo: &RepoId, git_ref: &str) -> Result<Option<ArchiveReader>, SourceError> {
        let url = format!("{}/repos/{repo}/tarball/{git_ref}", self.api_url);
        info!(%repo, git_ref, "Downloading archive");

        let response = self
            .get(&url, ACCEPT_JSON)
            .map_err(|e| e.with_repo(repo).with_ref(git_ref))?;

        match classify(response.status().as_u16(), response.headers()) {
            StatusClass::Success => Ok(Some(Box::new(response.into_body().into_reader()))),
            StatusClass::Missing => {
                debug!(%repo, git_ref, "Archive not found");
                Ok(None)
            }
            StatusClass::Failure(kind) => {
                Err(status_error(kind, response).with_repo(repo).with_ref(git_ref))
            }
            StatusClass::Unexpected => {
                Self::unexpected(response, repo, git_ref, "archive");
                Ok(None)
            }
        }
    }
}
