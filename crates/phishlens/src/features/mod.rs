//! Encode a URL string into a fixed 23-slot lexical feature vector.
//!
//! The schema is the [`Feature`] enum. Its variants are declared in ascending
//! name order and the discriminant *is* the vector position, so the name list
//! stored with a trained model and the vector produced here can never drift
//! apart. A const assertion below rejects any reordering at compile time.
//!
//! Extraction is total: it never fails and never drops a slot. Parse problems
//! degrade individual features to 0 (see [`url_parts`] and [`suffix`]).

pub mod suffix;
pub mod url_parts;

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::LazyLock;
use tracing::trace;

/// Number of slots in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 23;

/// One named slot of the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    CountAnd,
    CountAsterisk,
    CountAt,
    CountComma,
    CountDollar,
    CountDots,
    CountEqual,
    CountHash,
    CountHyphens,
    CountOr,
    CountPercent,
    CountPlus,
    CountQuestionMark,
    CountSlashes,
    CountTilde,
    CountUnderscore,
    HasHttp,
    HasHttps,
    HasIpAddress,
    HasPort,
    LengthHostname,
    LengthUrl,
    TldLength,
}

impl Feature {
    /// Every feature, in vector order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::CountAnd,
        Feature::CountAsterisk,
        Feature::CountAt,
        Feature::CountComma,
        Feature::CountDollar,
        Feature::CountDots,
        Feature::CountEqual,
        Feature::CountHash,
        Feature::CountHyphens,
        Feature::CountOr,
        Feature::CountPercent,
        Feature::CountPlus,
        Feature::CountQuestionMark,
        Feature::CountSlashes,
        Feature::CountTilde,
        Feature::CountUnderscore,
        Feature::HasHttp,
        Feature::HasHttps,
        Feature::HasIpAddress,
        Feature::HasPort,
        Feature::LengthHostname,
        Feature::LengthUrl,
        Feature::TldLength,
    ];

    /// Position of this feature in a [`FeatureVector`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Training-time name of this feature.
    pub const fn name(self) -> &'static str {
        match self {
            Feature::CountAnd => "count_and",
            Feature::CountAsterisk => "count_asterisk",
            Feature::CountAt => "count_at",
            Feature::CountComma => "count_comma",
            Feature::CountDollar => "count_dollar",
            Feature::CountDots => "count_dots",
            Feature::CountEqual => "count_equal",
            Feature::CountHash => "count_hash",
            Feature::CountHyphens => "count_hyphens",
            Feature::CountOr => "count_or",
            Feature::CountPercent => "count_percent",
            Feature::CountPlus => "count_plus",
            Feature::CountQuestionMark => "count_question_mark",
            Feature::CountSlashes => "count_slashes",
            Feature::CountTilde => "count_tilde",
            Feature::CountUnderscore => "count_underscore",
            Feature::HasHttp => "has_http",
            Feature::HasHttps => "has_https",
            Feature::HasIpAddress => "has_ip_address",
            Feature::HasPort => "has_port",
            Feature::LengthHostname => "length_hostname",
            Feature::LengthUrl => "length_url",
            Feature::TldLength => "tld_length",
        }
    }

    /// The character a `count_*` feature counts, `None` for the others.
    pub const fn counted_char(self) -> Option<char> {
        match self {
            Feature::CountAnd => Some('&'),
            Feature::CountAsterisk => Some('*'),
            Feature::CountAt => Some('@'),
            Feature::CountComma => Some(','),
            Feature::CountDollar => Some('$'),
            Feature::CountDots => Some('.'),
            Feature::CountEqual => Some('='),
            Feature::CountHash => Some('#'),
            Feature::CountHyphens => Some('-'),
            Feature::CountOr => Some('|'),
            Feature::CountPercent => Some('%'),
            Feature::CountPlus => Some('+'),
            Feature::CountQuestionMark => Some('?'),
            Feature::CountSlashes => Some('/'),
            Feature::CountTilde => Some('~'),
            Feature::CountUnderscore => Some('_'),
            _ => None,
        }
    }

    /// Look a feature up by its training-time name.
    pub fn from_name(name: &str) -> Option<Feature> {
        FEATURE_NAMES
            .binary_search(&name)
            .ok()
            .map(|i| Feature::ALL[i])
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Feature names in vector order (ascending).
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = {
    let mut names = [""; FEATURE_COUNT];
    let mut i = 0;
    while i < FEATURE_COUNT {
        names[i] = Feature::ALL[i].name();
        i += 1;
    }
    names
};

const fn name_precedes(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut i = 0;
    while i < a.len() && i < b.len() {
        if a[i] != b[i] {
            return a[i] < b[i];
        }
        i += 1;
    }
    a.len() < b.len()
}

const _: () = {
    let mut i = 0;
    while i < FEATURE_COUNT {
        assert!(
            Feature::ALL[i] as usize == i,
            "Feature::ALL must list variants in discriminant order"
        );
        if i > 0 {
            assert!(
                name_precedes(FEATURE_NAMES[i - 1], FEATURE_NAMES[i]),
                "features must be declared in ascending name order"
            );
        }
        i += 1;
    }
};

/// Dotted-quad IPv4, searched anywhere inside the authority.
static IPV4_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)",
    )
    .unwrap()
});

/// Fully expanded 8-group IPv6 only; `::` compressed forms do not match.
static IPV6_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[a-fA-F0-9]{1,4}:){7}[a-fA-F0-9]{1,4}").unwrap());

/// A URL's feature values, one per [`Feature`], in [`FEATURE_NAMES`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    fn zeroed() -> Self {
        Self {
            values: [0.0; FEATURE_COUNT],
        }
    }

    fn set(&mut self, feature: Feature, value: f64) {
        self.values[feature.index()] = value;
    }

    /// Value of one feature.
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    /// Values in vector order.
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Names aligned with [`values`](Self::values).
    pub fn names(&self) -> &'static [&'static str; FEATURE_COUNT] {
        &FEATURE_NAMES
    }

    /// `(feature, value)` pairs in vector order.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.iter().map(|&f| (f, self.get(f)))
    }

    /// Split into owned `(values, names)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<&'static str>) {
        (self.values.to_vec(), FEATURE_NAMES.to_vec())
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (feature, value) in self.iter() {
            map.serialize_entry(feature.name(), &value)?;
        }
        map.end()
    }
}

/// Extract the feature vector for `url`.
pub fn extract(url: &str) -> FeatureVector {
    let mut feats = FeatureVector::zeroed();

    // ── Raw-string features: never depend on parsing ──
    feats.set(Feature::LengthUrl, url.chars().count() as f64);
    for feature in Feature::ALL {
        if let Some(c) = feature.counted_char() {
            feats.set(feature, url.matches(c).count() as f64);
        }
    }
    feats.set(Feature::HasHttps, flag(url.starts_with("https://")));
    feats.set(Feature::HasHttp, flag(url.starts_with("http://")));

    // ── Authority features ──
    let authority = match url_parts::authority(url) {
        Ok(authority) => authority,
        Err(err) => {
            trace!(%err, "no authority, host features default to 0");
            return feats;
        }
    };
    let netloc = authority.netloc();
    feats.set(Feature::LengthHostname, netloc.chars().count() as f64);
    feats.set(Feature::HasIpAddress, flag(contains_ip_literal(netloc)));

    // An unusable port invalidates the split for both port and TLD.
    match authority.port() {
        Ok(port) => {
            feats.set(Feature::HasPort, flag(port.is_some()));
            let tld_length = match suffix::tld_length(authority.host()) {
                Ok(len) => len,
                Err(err) => {
                    trace!(host = authority.host(), %err, "tld lookup failed");
                    0
                }
            };
            feats.set(Feature::TldLength, tld_length as f64);
        }
        Err(err) => trace!(%err, "port and tld default to 0"),
    }

    feats
}

/// True when the authority contains an IPv4 or fully expanded IPv6 literal.
fn contains_ip_literal(netloc: &str) -> bool {
    IPV4_RE.is_match(netloc) || IPV6_RE.is_match(netloc)
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
