//! Model readiness check.
//!
//! Reports where the model directory resolved from, whether both artifact
//! files are present, and whether they load and line up with the extractor's
//! feature schema. Every failure comes with the command that fixes it.

use crate::cli::output::{self, Styled};
use crate::settings::ModelDir;
use anyhow::Result;
use phishlens::model::artifact_paths;
use phishlens::{Detector, ModelError, FEATURE_COUNT};

pub async fn run(model_dir: &ModelDir) -> Result<()> {
    let loaded = Detector::load(&model_dir.path);

    if output::is_json() {
        return run_json(model_dir, &loaded);
    }

    let s = Styled::new();
    let mut ready = true;

    output::print_header(&s);
    output::print_section(&s, "Model");

    output::print_check(
        s.ok_sym(),
        "Directory:",
        &format!("{} ({})", model_dir.path.display(), model_dir.source),
    );

    for path in artifact_paths(&model_dir.path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match std::fs::metadata(&path) {
            Ok(meta) => output::print_check(
                s.ok_sym(),
                "Artifact:",
                &format!("{name} ({})", output::format_size(meta.len())),
            ),
            Err(_) => {
                output::print_check(s.fail_sym(), "Artifact:", &format!("{name} missing"));
                ready = false;
            }
        }
    }

    match &loaded {
        Ok(detector) => {
            let artifact = detector.artifact();
            let meta = artifact.metadata();
            output::print_check(
                s.ok_sym(),
                "Load:",
                &format!(
                    "{} trees, trained {} on {} URLs",
                    artifact.forest().trees().len(),
                    meta.created_at.format("%Y-%m-%d %H:%M UTC"),
                    meta.training_samples
                ),
            );
            output::print_check(
                s.ok_sym(),
                "Features:",
                &format!("{FEATURE_COUNT} names aligned with extractor"),
            );
            if output::is_verbose() {
                for (name, imp) in detector.importances().take(5) {
                    output::print_detail(&format!("{name:<20} {}", crate::verdict::percent(imp)));
                }
            }
        }
        Err(e @ ModelError::FeatureMismatch { .. }) => {
            output::print_check(s.fail_sym(), "Features:", &e.to_string());
            output::print_detail("Retrain with 'phishlens train' to regenerate both files.");
            ready = false;
        }
        Err(e) => {
            output::print_check(s.fail_sym(), "Load:", &e.to_string());
            output::print_detail("Run 'phishlens train' to create the model.");
            ready = false;
        }
    }

    if ready {
        output::print_status(&s, &s.green("READY"), "start with 'phishlens serve'");
    } else {
        output::print_status(&s, &s.red("NOT READY"), "fix issues above");
    }
    Ok(())
}

fn run_json(model_dir: &ModelDir, loaded: &Result<Detector, ModelError>) -> Result<()> {
    let files: Vec<serde_json::Value> = artifact_paths(&model_dir.path)
        .iter()
        .map(|p| {
            serde_json::json!({
                "path": p.display().to_string(),
                "bytes": std::fs::metadata(p).ok().map(|m| m.len()),
            })
        })
        .collect();

    let json = serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "model_dir": model_dir.path.display().to_string(),
        "model_dir_source": model_dir.source.to_string(),
        "files": files,
        "ready": loaded.is_ok(),
        "error": loaded.as_ref().err().map(|e| e.to_string()),
        "metadata": loaded.as_ref().ok().map(|d| d.artifact().metadata().clone()),
        "feature_count": FEATURE_COUNT,
    });
    output::print_json(&json);
    Ok(())
}
