//! Analyze URLs from the terminal.

use crate::cli::output::{self, Styled};
use crate::validate::{validate_url, INVALID_URL_MESSAGE};
use crate::verdict::{self, VerdictBody};
use anyhow::Result;
use phishlens::Detector;
use std::path::Path;
use tracing::warn;

/// Analyze each URL in `urls`. Exits with status 1 if the model cannot be
/// loaded or any URL was rejected.
pub async fn run(model_dir: &Path, urls: &[String], details: bool, top: usize) -> Result<()> {
    let s = Styled::new();

    let detector = match Detector::load(model_dir) {
        Ok(d) => d,
        Err(e) => {
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "error": "Model not available",
                    "reason": e.to_string(),
                }));
            } else {
                eprintln!("  {} Model not available: {e}", s.fail_sym());
                eprintln!("  Train one first with 'phishlens train'.");
            }
            std::process::exit(1);
        }
    };

    let mut failed = false;
    let mut results = Vec::with_capacity(urls.len());

    for url in urls {
        if let Err(e) = validate_url(url) {
            failed = true;
            if output::is_json() {
                results.push(serde_json::json!({
                    "url": url,
                    "error": INVALID_URL_MESSAGE,
                    "reason": e.to_string(),
                }));
            } else {
                eprintln!("  {} {url}", s.fail_sym());
                eprintln!("    {INVALID_URL_MESSAGE}");
                if output::is_verbose() {
                    eprintln!("    {}", s.dim(&e.to_string()));
                }
            }
            continue;
        }

        let analysis = match detector.analyze(url) {
            Ok(a) => a,
            Err(e) => {
                warn!(url = url.as_str(), error = %e, "analysis failed");
                failed = true;
                let message = format!("Error analyzing URL: {e}");
                if output::is_json() {
                    results.push(serde_json::json!({ "url": url, "error": message }));
                } else {
                    eprintln!("  {} {url}", s.fail_sym());
                    eprintln!("    {message}");
                }
                continue;
            }
        };

        if output::is_json() {
            let body = VerdictBody::new(&analysis, details.then_some(top));
            results.push(serde_json::to_value(&body)?);
            continue;
        }

        let symbol = if analysis.is_phishing() {
            s.warn_sym()
        } else {
            s.ok_sym()
        };
        let headline = verdict::headline(&analysis);
        let headline = if analysis.is_phishing() {
            s.red(&headline)
        } else {
            s.green(&headline)
        };
        eprintln!("  {symbol} {url}");
        eprintln!("    {headline}");

        if details {
            eprintln!();
            eprintln!("    {}", s.bold("URL Features Analysis"));
            for c in analysis.top(top) {
                eprintln!("    - {}", verdict::detail_line(c));
            }
        }
        if !output::is_quiet() && urls.len() > 1 {
            eprintln!();
        }
    }

    if output::is_json() {
        output::print_json(&serde_json::Value::Array(results));
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
