//! Boundary URL validation. Runs before any URL reaches the detector.

use thiserror::Error;
use url::{Host, Url};

/// Message shown to users for any rejected input.
pub const INVALID_URL_MESSAGE: &str = "Please enter a valid URL format (e.g., https://example.com)";

const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "ftp"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidUrl {
    #[error("URL is empty")]
    Empty,

    #[error("URL contains whitespace")]
    Whitespace,

    #[error("not an absolute URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme {0:?}")]
    Scheme(String),

    #[error("URL has no host")]
    NoHost,

    #[error("host {0:?} is not a fully qualified domain name")]
    Host(String),
}

/// Accept absolute `http`, `https` and `ftp` URLs whose host is an IP
/// literal or a dotted domain name.
///
/// The input is checked as given. Leading or trailing whitespace is rejected
/// rather than trimmed, so an accepted string is exactly what the detector
/// scores.
pub fn validate_url(input: &str) -> Result<Url, InvalidUrl> {
    if input.trim().is_empty() {
        return Err(InvalidUrl::Empty);
    }
    if input.chars().any(char::is_whitespace) {
        return Err(InvalidUrl::Whitespace);
    }

    let url = Url::parse(input)?;
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(InvalidUrl::Scheme(url.scheme().to_string()));
    }
    match url.host() {
        None => Err(InvalidUrl::NoHost),
        Some(Host::Ipv4(_) | Host::Ipv6(_)) => Ok(url),
        Some(Host::Domain(domain)) => {
            let labels: Vec<&str> = domain.split('.').collect();
            if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
                return Err(InvalidUrl::Host(domain.to_string()));
            }
            Ok(url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_urls() {
        for url in [
            "https://example.com",
            "http://login.banking-secure.com/verify?id=1",
            "ftp://files.example.org/pub",
            "http://192.168.1.1:8080/admin",
            "http://[2001:db8::1]/",
            "https://user:pw@sub.example.co.uk:8443/path#frag",
        ] {
            assert!(validate_url(url).is_ok(), "{url}");
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(validate_url(""), Err(InvalidUrl::Empty));
        assert_eq!(validate_url("   "), Err(InvalidUrl::Empty));
        assert_eq!(validate_url("not a url"), Err(InvalidUrl::Whitespace));
        assert!(matches!(validate_url("example.com"), Err(InvalidUrl::Parse(_))));
        assert_eq!(
            validate_url("javascript:alert(1)"),
            Err(InvalidUrl::Scheme("javascript".into()))
        );
        assert_eq!(
            validate_url("mailto:someone@example.com"),
            Err(InvalidUrl::Scheme("mailto".into()))
        );
        assert_eq!(
            validate_url("http://localhost/"),
            Err(InvalidUrl::Host("localhost".into()))
        );
        assert!(validate_url("http://example..com/").is_err());
    }

    #[test]
    fn test_rejects_surrounding_whitespace() {
        for url in [
            "  https://www.google.com",
            "https://www.google.com ",
            "\thttps://www.google.com\n",
        ] {
            assert_eq!(validate_url(url), Err(InvalidUrl::Whitespace), "{url:?}");
        }
    }
}
