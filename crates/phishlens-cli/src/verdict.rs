//! User-facing wording for an [`Analysis`], shared by the terminal and web
//! surfaces.

use phishlens::{Analysis, FeatureContribution, Label};
use serde::Serialize;

/// Percentage with two decimals (`0.97` → `97.00%`).
pub fn percent(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

/// "This URL appears to be legitimate (Confidence: 97.00%)".
pub fn headline(analysis: &Analysis) -> String {
    let verdict = match analysis.label {
        Label::Legitimate => "legitimate",
        Label::Phishing => "suspicious",
    };
    format!(
        "This URL appears to be {verdict} (Confidence: {})",
        percent(analysis.confidence)
    )
}

/// "count_dots: 3.00 (importance: 21.40%)".
pub fn detail_line(c: &FeatureContribution) -> String {
    format!(
        "{}: {:.2} (importance: {})",
        c.name,
        c.value,
        percent(c.importance)
    )
}

/// JSON body for one analyzed URL.
#[derive(Debug, Serialize)]
pub struct VerdictBody<'a> {
    pub url: &'a str,
    pub label: Label,
    pub phishing: bool,
    pub confidence: f64,
    pub message: String,
    pub probabilities: phishlens::ClassProbabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_features: Option<&'a [FeatureContribution]>,
}

impl<'a> VerdictBody<'a> {
    pub fn new(analysis: &'a Analysis, top: Option<usize>) -> Self {
        Self {
            url: &analysis.url,
            label: analysis.label,
            phishing: analysis.is_phishing(),
            confidence: analysis.confidence,
            message: headline(analysis),
            probabilities: analysis.probabilities,
            top_features: top.map(|n| analysis.top(n)),
        }
    }
}
