use anyhow::Result;
use clap::{Parser, Subcommand};
use phishlens::ForestParams;
use phishlens_cli::cli::{self, train_cmd::TrainOptions};
use phishlens_cli::settings::{self, DEFAULT_ADDR, DEFAULT_TOP};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "phishlens",
    version,
    about = "Detect phishing URLs from their lexical features"
)]
struct Cli {
    /// Machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Show extra detail
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// Directory holding phishing_detector_model.json and feature_names.json
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and save it to the model directory
    Train {
        /// Labeled URLs, one `<label> <url>` per line (default: built-in toy set)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Fraction held out for evaluation (0 disables)
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,

        #[arg(long, default_value_t = 100)]
        n_estimators: usize,

        #[arg(long)]
        max_depth: Option<usize>,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Classify one or more URLs
    Check {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Show the most important features and their values
        #[arg(long, short)]
        details: bool,

        /// How many features --details shows
        #[arg(long, default_value_t = DEFAULT_TOP)]
        top: usize,
    },

    /// Print the feature vector extracted from a URL
    Features { url: String },

    /// Run the web interface and JSON API
    Serve {
        #[arg(long, env = "PHISHLENS_ADDR", default_value = DEFAULT_ADDR)]
        addr: String,

        /// Features shown with details
        #[arg(long, default_value_t = DEFAULT_TOP)]
        top: usize,
    },

    /// Check that a usable model is installed
    Doctor,
}

impl Cli {
    /// Environment switches read by `cli::output`.
    fn output_switches(&self) -> Vec<&'static str> {
        [
            (self.json, "PHISHLENS_JSON"),
            (self.quiet, "PHISHLENS_QUIET"),
            (self.verbose, "PHISHLENS_VERBOSE"),
            (self.no_color, "PHISHLENS_NO_COLOR"),
        ]
        .into_iter()
        .filter_map(|(enabled, var)| enabled.then_some(var))
        .collect()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Still single-threaded here; the runtime's workers start below.
    for var in cli.output_switches() {
        std::env::set_var(var, "1");
    }

    let default_directive = match (&cli.command, cli.verbose) {
        (_, true) => "phishlens=debug",
        (Commands::Serve { .. }, false) => "phishlens=info",
        _ => "warn",
    };
    cli::init_logging(default_directive, cli.log_json);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let model_dir = settings::resolve_model_dir(cli.model_dir);

    match cli.command {
        Commands::Train {
            dataset,
            test_size,
            n_estimators,
            max_depth,
            seed,
        } => {
            let opts = TrainOptions {
                dataset,
                test_size,
                params: ForestParams {
                    n_estimators,
                    max_depth,
                    seed,
                    ..ForestParams::default()
                },
            };
            cli::train_cmd::run(&model_dir.path, opts).await
        }
        Commands::Check { urls, details, top } => {
            cli::check_cmd::run(&model_dir.path, &urls, details, top).await
        }
        Commands::Features { url } => cli::features_cmd::run(&url).await,
        Commands::Serve { addr, top } => cli::serve_cmd::run(&model_dir.path, &addr, top).await,
        Commands::Doctor => cli::doctor::run(&model_dir).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_switches_follow_flags() {
        let cli = Cli::try_parse_from(["phishlens", "--json", "-q", "doctor"]).unwrap();
        assert_eq!(cli.output_switches(), ["PHISHLENS_JSON", "PHISHLENS_QUIET"]);

        let cli = Cli::try_parse_from(["phishlens", "check", "https://a.com", "-v", "--no-color"])
            .unwrap();
        assert_eq!(
            cli.output_switches(),
            ["PHISHLENS_VERBOSE", "PHISHLENS_NO_COLOR"]
        );

        let cli = Cli::try_parse_from(["phishlens", "features", "https://a.com"]).unwrap();
        assert!(cli.output_switches().is_empty());
    }
}
