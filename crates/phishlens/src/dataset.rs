//! Labeled URL datasets: the built-in toy set, a plain-text file format and
//! a seeded train/test split.
//!
//! File format: one example per line, `<label> <url>`, where the label is
//! `0`/`legitimate` or `1`/`phishing`. Blank lines and lines starting with
//! `#` are skipped.

use crate::error::DatasetError;
use crate::model::Label;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One training example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledUrl {
    pub url: String,
    pub label: Label,
}

impl LabeledUrl {
    pub fn new(url: impl Into<String>, label: Label) -> Self {
        Self {
            url: url.into(),
            label,
        }
    }
}

const TOY_LEGITIMATE: [&str; 5] = [
    "https://www.google.com",
    "https://www.amazon.com",
    "https://www.github.com",
    "https://www.microsoft.com",
    "https://www.apple.com",
];

const TOY_PHISHING: [&str; 5] = [
    "http://googgle.com.phish.com",
    "http://amazonn-secure.com",
    "http://paypal.com.secure.phishing.com",
    "http://secure-banking.com",
    "http://login.banking-secure.com",
];

/// Ten-URL demonstration set: five legitimate, five phishing.
pub fn toy_dataset() -> Vec<LabeledUrl> {
    TOY_LEGITIMATE
        .iter()
        .map(|u| LabeledUrl::new(*u, Label::Legitimate))
        .chain(TOY_PHISHING.iter().map(|u| LabeledUrl::new(*u, Label::Phishing)))
        .collect()
}

/// Parse dataset text. Line numbers in errors are 1-based.
pub fn parse_dataset(text: &str) -> Result<Vec<LabeledUrl>, DatasetError> {
    let mut out = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (label, url) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| DatasetError::Parse {
                line: i + 1,
                reason: "expected `<label> <url>`".into(),
            })?;
        let label = parse_label(label).ok_or_else(|| DatasetError::Parse {
            line: i + 1,
            reason: format!("unknown label {label:?}"),
        })?;
        let url = url.trim();
        if url.is_empty() {
            return Err(DatasetError::Parse {
                line: i + 1,
                reason: "missing url".into(),
            });
        }
        out.push(LabeledUrl::new(url, label));
    }
    Ok(out)
}

/// Read and parse a dataset file.
pub fn load_dataset(path: &Path) -> Result<Vec<LabeledUrl>, DatasetError> {
    let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let examples = parse_dataset(&text)?;
    debug!(path = %path.display(), examples = examples.len(), "loaded dataset");
    Ok(examples)
}

fn parse_label(s: &str) -> Option<Label> {
    match s.to_ascii_lowercase().as_str() {
        "0" | "legitimate" | "legit" => Some(Label::Legitimate),
        "1" | "phishing" | "phish" => Some(Label::Phishing),
        _ => None,
    }
}

/// Shuffle with `seed` and hold out `ceil(len * test_fraction)` examples.
///
/// Returns `(train, test)`. A fraction of 0 yields an empty test set.
pub fn train_test_split<T: Clone>(
    examples: &[T],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<T>, Vec<T>), DatasetError> {
    if !(0.0..1.0).contains(&test_fraction) {
        return Err(DatasetError::InvalidTestFraction(test_fraction));
    }
    let mut shuffled = examples.to_vec();
    shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

    let n_test = (shuffled.len() as f64 * test_fraction).ceil() as usize;
    let train = shuffled.split_off(n_test);
    Ok((train, shuffled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toy_dataset_is_balanced() {
        let toy = toy_dataset();
        assert_eq!(toy.len(), 10);
        let phishing = toy.iter().filter(|e| e.label == Label::Phishing).count();
        assert_eq!(phishing, 5);
        assert_eq!(toy[0].url, "https://www.google.com");
        assert_eq!(toy[9].url, "http://login.banking-secure.com");
    }

    #[test]
    fn test_parse_dataset() {
        let text = "\
# comment line
0 https://www.example.com

1\thttp://secure-login.example-bank.com/verify
phishing http://paypa1.com
LEGITIMATE https://docs.rs
";
        let examples = parse_dataset(text).unwrap();
        assert_eq!(examples.len(), 4);
        assert_eq!(examples[1].label, Label::Phishing);
        assert_eq!(examples[1].url, "http://secure-login.example-bank.com/verify");
        assert_eq!(examples[3], LabeledUrl::new("https://docs.rs", Label::Legitimate));
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = parse_dataset("0 https://a.com\n2 https://b.com\n").unwrap_err();
        assert!(matches!(err, DatasetError::Parse { line: 2, .. }));

        let err = parse_dataset("https://no-label.com").unwrap_err();
        assert!(matches!(err, DatasetError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_load_dataset_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(&path, "1 http://a.com\n0 https://b.com\n").unwrap();
        assert_eq!(load_dataset(&path).unwrap().len(), 2);

        let err = load_dataset(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn test_split_sizes_and_determinism() {
        let items: Vec<u32> = (0..10).collect();
        let (train, test) = train_test_split(&items, 0.2, 42).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);

        let (train2, test2) = train_test_split(&items, 0.2, 42).unwrap();
        assert_eq!(train, train2);
        assert_eq!(test, test2);

        let mut all: Vec<u32> = train.into_iter().chain(test).collect();
        all.sort_unstable();
        assert_eq!(all, items);
    }

    #[test]
    fn test_split_rounds_test_size_up() {
        let items: Vec<u32> = (0..7).collect();
        let (train, test) = train_test_split(&items, 0.2, 1).unwrap();
        assert_eq!(test.len(), 2);
        assert_eq!(train.len(), 5);

        let (train, test) = train_test_split(&items, 0.0, 1).unwrap();
        assert!(test.is_empty());
        assert_eq!(train.len(), 7);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        assert!(matches!(
            train_test_split(&[1, 2, 3], 1.0, 0),
            Err(DatasetError::InvalidTestFraction(_))
        ));
        assert!(train_test_split(&[1, 2, 3], -0.1, 0).is_err());
    }
}
