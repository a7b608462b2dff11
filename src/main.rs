//! `guardian-fetch`: search the Guardian and publish the results.
//!
//! ```sh
//! guardian-fetch "climate change" --date-from 2024-01-01 --max-articles 20
//! ```
//!
//! Exits 0 when the run succeeded and 1 otherwise.

use clap::Parser;
use guardian_content_fetcher::cli::Cli;
use guardian_content_fetcher::config::{config_template, normalize_log_level, tracing_directive};
use guardian_content_fetcher::fetcher::FetcherFactory;
use guardian_content_fetcher::output::format_result;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

const QUIET_DEPENDENCIES: &str = "aws_config=warn,aws_smithy_runtime=warn,hyper=warn,reqwest=warn";

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let args = Cli::parse();

    if args.print_config_template {
        println!("{}", config_template());
        return ExitCode::SUCCESS;
    }

    // --- Tracing init ---
    let level = match args.log_level_override() {
        Some(level) => level.to_string(),
        None => normalize_log_level(std::env::var("LOG_LEVEL").ok().as_deref()),
    };
    init_tracing(tracing_directive(&level));

    if args.verbose && args.quiet {
        warn!("Both --verbose and --quiet given; using the default log level");
    }
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "Loaded .env file");
    }

    let start_time = std::time::Instant::now();
    let outcome = run(&args).await;
    info!(elapsed = ?start_time.elapsed(), "Execution complete");

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "Run aborted");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},{QUIET_DEPENDENCIES}")));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
}

/// One fetch-and-publish run. Returns the result's `success` flag.
#[instrument(level = "info", skip_all, fields(term = args.search_term.as_deref().unwrap_or_default()))]
async fn run(args: &Cli) -> Result<bool, Box<dyn Error>> {
    let search_term = args.search_term.as_deref().ok_or("a search term is required")?;
    let config = args.app_config(|key| std::env::var(key).ok())?;
    debug!(use_mock = config.use_mock_broker, log_level = %config.log_level, "Configuration loaded");

    let mut fetcher = FetcherFactory::from_config(&config).await?;
    let result = fetcher
        .fetch_and_publish(search_term, args.date_from.as_deref(), args.max_articles)
        .await?;
    fetcher.close();

    println!("{}", format_result(&result, args.output_format)?);
    Ok(result.success)
}
