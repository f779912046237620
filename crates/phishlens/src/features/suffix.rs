//! Public-suffix lookup for the `tld_length` feature.
//!
//! Backed by the full Mozilla Public Suffix List, ICANN and private sections,
//! compiled into the binary so extraction stays free of I/O and gives the
//! same answer at training and serving time. IDN rules match in both their
//! Unicode and punycode spellings.

use publicsuffix::{List, Psl};
use std::net::Ipv4Addr;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;

const PUBLIC_SUFFIX_DATA: &str = include_str!("../../data/public_suffix_list.dat");

static SUFFIX_LIST: LazyLock<Option<List>> =
    LazyLock::new(|| match PUBLIC_SUFFIX_DATA.parse::<List>() {
        Ok(list) => Some(list),
        Err(err) => {
            warn!(%err, "embedded public suffix list failed to parse");
            None
        }
    });

/// Why a host has no usable top-level domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuffixError {
    #[error("empty host")]
    EmptyHost,

    #[error("host is an IP literal")]
    IpLiteral,

    #[error("host has an empty label")]
    EmptyLabel,

    #[error("no known public suffix")]
    Unknown,

    #[error("public suffix list unavailable")]
    ListUnavailable,
}

/// Length in characters of the public suffix of `host` (`com` → 3,
/// `co.uk` → 5).
pub fn tld_length(host: &str) -> Result<usize, SuffixError> {
    let host = host.to_lowercase();
    if host.is_empty() {
        return Err(SuffixError::EmptyHost);
    }
    if host.contains(':') || host.parse::<Ipv4Addr>().is_ok() {
        return Err(SuffixError::IpLiteral);
    }
    if host.split('.').any(str::is_empty) {
        return Err(SuffixError::EmptyLabel);
    }

    let list = SUFFIX_LIST.as_ref().ok_or(SuffixError::ListUnavailable)?;
    let suffix = list
        .suffix(host.as_bytes())
        .filter(|s| s.is_known())
        .ok_or(SuffixError::Unknown)?;
    Ok(String::from_utf8_lossy(suffix.as_bytes()).chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_list_parses() {
        assert!(SUFFIX_LIST.is_some());
    }

    #[test]
    fn test_known_suffixes() {
        assert_eq!(tld_length("www.google.com"), Ok(3));
        assert_eq!(tld_length("WWW.GOOGLE.COM"), Ok(3));
        assert_eq!(tld_length("paypal.com.secure.phishing.com"), Ok(3));
        assert_eq!(tld_length("example.de"), Ok(2));
        assert_eq!(tld_length("bbc.co.uk"), Ok(5));
        assert_eq!(tld_length("abc.net.au"), Ok(6));
        assert_eq!(tld_length("example.info"), Ok(4));
    }

    #[test]
    fn test_long_tail_gtlds() {
        assert_eq!(tld_length("shop.example.sbs"), Ok(3));
        assert_eq!(tld_length("a.example.cyou"), Ok(4));
        assert_eq!(tld_length("x.buzz"), Ok(4));
        assert_eq!(tld_length("verify.accountant"), Ok(10));
    }

    #[test]
    fn test_idn_suffixes() {
        assert_eq!(tld_length("пример.рф"), Ok(2));
        assert_eq!(tld_length("ПРИМЕР.РФ"), Ok(2));
        assert_eq!(tld_length("x.xn--p1ai"), Ok(8));
    }

    #[test]
    fn test_private_suffixes() {
        assert_eq!(tld_length("me.github.io"), Ok(9));
        assert_eq!(tld_length("github.io"), Ok(9));
    }

    #[test]
    fn test_lookup_failures() {
        assert_eq!(tld_length(""), Err(SuffixError::EmptyHost));
        assert_eq!(tld_length("192.168.1.1"), Err(SuffixError::IpLiteral));
        assert_eq!(tld_length("2001:db8::1"), Err(SuffixError::IpLiteral));
        assert_eq!(tld_length("example.com."), Err(SuffixError::EmptyLabel));
        assert_eq!(tld_length("a..com"), Err(SuffixError::EmptyLabel));
        assert_eq!(tld_length("intranet"), Err(SuffixError::Unknown));
        assert_eq!(tld_length("a.b.c"), Err(SuffixError::Unknown));
        assert_eq!(tld_length("printer.local"), Err(SuffixError::Unknown));
    }
}
