mod cli;
mod config;

use cli::Cli;
use config::Config;
use mock_http_service::{MockHttpError, MockHttpService};
use std::process;
use tokio::signal;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), MockHttpError> {
    // Parse command line arguments
    let cli = Cli::parse_args();
    let config = Config::from_cli(cli)?;

    // Set up logging if verbose mode is enabled
    if config.verbose {
        setup_logging();
    }

    // Start the mock server
    let mut service: MockHttpService =
        MockHttpService::start_with_options(config.options.clone()).await?;

    // Register stubs from every mapping directory
    for dir in &config.mappings {
        eprintln!("Loading mappings from: {}", dir.display());
        let count = service.load_mappings(dir).await?;
        eprintln!("Registered {count} stubs");
    }

    if config.verbose {
        for rule in service.rules() {
            eprintln!("  {} -> {}", rule.request, rule.response.status);
        }
    }

    eprintln!("Mock HTTP server ready on {}", service.complete_url(""));

    // Wait for shutdown signal
    signal::ctrl_c().await?;
    eprintln!("\nShutdown signal received, stopping server...");

    service.stop();
    eprintln!("Server stopped gracefully.");

    Ok(())
}

fn setup_logging() {
    use std::env;

    // Set log level if not already set
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "info");
        }
    }

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
