//! Offline training: labeled URLs in, model artifact out.

use crate::cli::output::{self, Styled};
use anyhow::{Context, Result};
use phishlens::dataset::{self, LabeledUrl};
use phishlens::metrics::ClassificationReport;
use phishlens::{extract, ForestParams, Label, ModelArtifact};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Options for `phishlens train`.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// `<label> <url>` file; the built-in toy set when absent.
    pub dataset: Option<PathBuf>,
    pub test_size: f64,
    pub params: ForestParams,
}

/// What a training run produced.
#[derive(Debug)]
pub struct TrainOutcome {
    pub artifact: ModelArtifact,
    pub train_samples: usize,
    pub test_samples: usize,
    pub report: Option<ClassificationReport>,
}

/// Split, fit and evaluate. No I/O besides reading the dataset.
pub fn fit(opts: &TrainOptions) -> Result<TrainOutcome> {
    let examples = match &opts.dataset {
        Some(path) => dataset::load_dataset(path)
            .with_context(|| format!("failed to load dataset {}", path.display()))?,
        None => dataset::toy_dataset(),
    };
    info!(examples = examples.len(), "loaded training data");

    let (train, test) = dataset::train_test_split(&examples, opts.test_size, opts.params.seed)?;
    anyhow::ensure!(!train.is_empty(), "no training examples left after the split");

    info!(train = train.len(), test = test.len(), "extracting features");
    let train_rows: Vec<_> = train.iter().map(featurize).collect();

    info!(trees = opts.params.n_estimators, "training random forest");
    let artifact = phishlens::train(&train_rows, &opts.params).context("training failed")?;

    let report = (!test.is_empty()).then(|| {
        let classifier = artifact.classifier();
        let actual: Vec<Label> = test.iter().map(|ex| ex.label).collect();
        let predicted: Vec<Label> = test
            .iter()
            .map(|ex| classifier.predict(extract(&ex.url).values()))
            .collect();
        ClassificationReport::new(&actual, &predicted)
    });

    Ok(TrainOutcome {
        artifact,
        train_samples: train.len(),
        test_samples: test.len(),
        report,
    })
}

fn featurize(ex: &LabeledUrl) -> (phishlens::FeatureVector, Label) {
    (extract(&ex.url), ex.label)
}

/// Train and write the artifact to `model_dir`.
pub async fn run(model_dir: &Path, opts: TrainOptions) -> Result<()> {
    let s = Styled::new();
    let started = Instant::now();

    let outcome = tokio::task::spawn_blocking(move || fit(&opts))
        .await
        .context("training task panicked")??;

    outcome
        .artifact
        .save(model_dir)
        .with_context(|| format!("failed to save model to {}", model_dir.display()))?;
    let elapsed = started.elapsed().as_millis();

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "model_dir": model_dir.display().to_string(),
            "train_samples": outcome.train_samples,
            "test_samples": outcome.test_samples,
            "trees": outcome.artifact.forest().trees().len(),
            "report": outcome.report,
            "elapsed_ms": elapsed as u64,
        }));
        return Ok(());
    }

    if let Some(report) = &outcome.report {
        if !output::is_quiet() {
            eprintln!("  {}", s.bold("Model Evaluation"));
            eprintln!();
            for line in report.to_string().lines() {
                eprintln!("  {line}");
            }
            eprintln!();
        }
    }

    if !output::is_quiet() {
        eprintln!(
            "  {} Trained {} trees on {} URLs in {}",
            s.ok_sym(),
            outcome.artifact.forest().trees().len(),
            outcome.train_samples,
            output::format_elapsed(elapsed)
        );
        eprintln!("  Saved model to {}", model_dir.display());
        if output::is_verbose() {
            let mut ranked: Vec<(&String, f64)> = outcome
                .artifact
                .feature_names()
                .iter()
                .zip(outcome.artifact.classifier().feature_importances())
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            for (name, imp) in ranked.iter().take(5) {
                eprintln!("    {name:<20} {}", crate::verdict::percent(*imp));
            }
        }
    }

    Ok(())
}
