//! Start the web surface.

use crate::cli::output::{self, Styled};
use crate::server::{self, AppState};
use anyhow::{Context, Result};
use phishlens::Detector;
use std::path::Path;
use tracing::info;

pub async fn run(model_dir: &Path, addr: &str, top: usize) -> Result<()> {
    let s = Styled::new();

    let detector = Detector::load(model_dir);
    if let Err(e) = &detector {
        if !output::is_quiet() {
            eprintln!("  {} Model not available: {e}", s.warn_sym());
            eprintln!("  Serving anyway; run 'phishlens train' and restart to enable analysis.");
        }
    }
    let state = AppState::new(detector, top);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local = listener.local_addr()?;

    if !output::is_quiet() {
        eprintln!(
            "  {} phishlens v{} listening on http://{local}",
            s.ok_sym(),
            env!("CARGO_PKG_VERSION")
        );
    }

    server::serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
    })
    .await?;

    if !output::is_quiet() {
        eprintln!("  {} Server stopped.", s.ok_sym());
    }
    Ok(())
}
