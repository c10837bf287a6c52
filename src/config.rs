use crate::cli::Cli;
use mock_http_service::{MockHttpError, ServiceOptions};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub options: ServiceOptions,
    pub mappings: Vec<PathBuf>,
    pub verbose: bool,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, MockHttpError> {
        for dir in &cli.mappings {
            if !dir.exists() {
                return Err(MockHttpError::Config(format!(
                    "Mappings directory does not exist: {}",
                    dir.display()
                )));
            }
            if !dir.is_dir() {
                return Err(MockHttpError::Config(format!(
                    "Mappings path is not a directory: {}",
                    dir.display()
                )));
            }
        }

        Ok(Config {
            options: ServiceOptions::with_port(cli.port),
            mappings: cli.mappings,
            verbose: cli.verbose,
        })
    }
}
