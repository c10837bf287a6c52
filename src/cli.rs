use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "mock-http-server")]
#[command(about = "Mock HTTP Server - Serve stubbed responses from mapping files")]
pub struct Cli {
    /// Port to bind the mock server to (0 picks an ephemeral port)
    #[arg(long, short = 'p', default_value = "0")]
    pub port: u16,

    /// Directory of JSON mapping files to serve
    #[arg(long = "mappings", short = 'm', action = clap::ArgAction::Append, help = "Directory of JSON mapping files to serve (can be used multiple times)")]
    pub mappings: Vec<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
