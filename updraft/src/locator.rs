//! File URL splitting for the HTTP downloader.
//!
//! Manifest file URLs are absolute (`http://host/path`); the HTTP client
//! wants the host and path separately. `FileLocation` borrows both straight
//! out of the URL, so splitting allocates nothing.

use crate::error::{AgentError, AgentResult};

const HTTP_SCHEME: &str = "http://";

/// Host and path of a manifest file URL, borrowed from the URL itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileLocation<'a> {
    /// Hostname, including an optional `:port` suffix.
    pub host: &'a str,
    /// Absolute request path, starting with `/`.
    pub path: &'a str,
}

/// Split an `http://` URL into host and path.
///
/// # Errors
///
/// Returns `InvalidArgument` if the scheme is not `http://`, the host is
/// empty, or no `/` follows the host.
pub fn parse_file_url(url: &str) -> AgentResult<FileLocation<'_>> {
    let rest = url.strip_prefix(HTTP_SCHEME).ok_or_else(|| {
        AgentError::InvalidArgument(format!("file url is not http: {}", url))
    })?;

    let slash = rest
        .find('/')
        .ok_or_else(|| AgentError::InvalidArgument(format!("file url has no path: {}", url)))?;

    let (host, path) = rest.split_at(slash);

    if host.is_empty() {
        return Err(AgentError::InvalidArgument(format!(
            "file url has no host: {}",
            url
        )));
    }

    Ok(FileLocation { host, path })
}
