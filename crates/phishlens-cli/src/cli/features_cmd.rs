//! Print the raw feature vector for a URL.

use crate::cli::output;
use anyhow::Result;
use phishlens::{extract, FeatureVector};

/// `name = value` lines in vector order.
pub fn render(features: &FeatureVector) -> String {
    features
        .iter()
        .map(|(feature, value)| format!("{:<20} = {value}\n", feature.name()))
        .collect()
}

pub async fn run(url: &str) -> Result<()> {
    let features = extract(url);

    if output::is_json() {
        output::print_json(&serde_json::to_value(features)?);
        return Ok(());
    }

    print!("{}", render(&features));
    Ok(())
}
