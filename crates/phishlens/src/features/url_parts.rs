//! Best-effort lexical URL splitting.
//!
//! This is a splitter, not a validator: it slices the input the
//! way a generic `scheme://netloc/path?query#fragment` splitter does, keeps
//! user-info and port inside the netloc, and does no normalization. Anything
//! it cannot make sense of is reported as a [`UrlSplitError`] so callers can
//! default the dependent features.

use thiserror::Error;

/// Why part of a URL could not be recovered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlSplitError {
    #[error("no authority component")]
    NoAuthority,

    #[error("unbalanced brackets in authority")]
    UnbalancedBracket,

    #[error("invalid port {0:?}")]
    InvalidPort(String),
}

/// The `netloc` of a URL: `[userinfo@]host[:port]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authority<'a> {
    netloc: &'a str,
}

impl<'a> Authority<'a> {
    /// The raw authority text.
    pub fn netloc(&self) -> &'a str {
        self.netloc
    }

    /// Host without user-info, port or IPv6 brackets. Not lower-cased.
    pub fn host(&self) -> &'a str {
        self.host_and_port().0
    }

    /// The explicit port, if one is written.
    ///
    /// An empty port (`host:`) counts as absent. Non-digits or values above
    /// 65535 are an error.
    pub fn port(&self) -> Result<Option<u16>, UrlSplitError> {
        let (_, port) = self.host_and_port();
        if port.is_empty() {
            return Ok(None);
        }
        if !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(UrlSplitError::InvalidPort(port.to_string()));
        }
        port.parse::<u16>()
            .map(Some)
            .map_err(|_| UrlSplitError::InvalidPort(port.to_string()))
    }

    fn hostinfo(&self) -> &'a str {
        self.netloc
            .rsplit_once('@')
            .map_or(self.netloc, |(_, hostinfo)| hostinfo)
    }

    fn host_and_port(&self) -> (&'a str, &'a str) {
        let hostinfo = self.hostinfo();
        match hostinfo.split_once('[') {
            Some((_, bracketed)) => {
                let (host, rest) = bracketed.split_once(']').unwrap_or((bracketed, ""));
                let port = rest.split_once(':').map_or("", |(_, port)| port);
                (host, port)
            }
            None => hostinfo.split_once(':').unwrap_or((hostinfo, "")),
        }
    }
}

/// Split off a leading `scheme:` if the text before the first colon is a
/// syntactically valid scheme.
pub fn split_scheme(url: &str) -> Option<(&str, &str)> {
    let colon = url.find(':')?;
    let scheme = &url[..colon];
    let first = scheme.chars().next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !scheme
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }
    Some((scheme, &url[colon + 1..]))
}

/// Locate the authority of `url`.
pub fn authority(url: &str) -> Result<Authority<'_>, UrlSplitError> {
    // Leading control characters and spaces are not part of the URL.
    let url = url.trim_start_matches(|c: char| c <= ' ');
    let rest = split_scheme(url).map_or(url, |(_, rest)| rest);
    let after = rest.strip_prefix("//").ok_or(UrlSplitError::NoAuthority)?;
    let end = after
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(after.len());
    let netloc = &after[..end];

    if netloc.is_empty() {
        return Err(UrlSplitError::NoAuthority);
    }
    if netloc.contains('[') != netloc.contains(']') {
        return Err(UrlSplitError::UnbalancedBracket);
    }
    Ok(Authority { netloc })
}
