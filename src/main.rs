//! Command-line front end for rest-request.
//!
//! Loads an optional JSON configuration file, applies command-line overrides and
//! executes one run. Exits with status 0 when every item succeeded and 1 otherwise,
//! printing the consolidated failure report to stderr.

use clap::Parser;
use rest_request::{Config, FileSetConfig, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Send files to a REST endpoint and store the responses.
#[derive(Parser, Debug)]
#[command(name = "rest-request")]
#[command(version)]
struct Cli {
    /// JSON configuration file; flags below override its values.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL of the REST service.
    #[arg(long)]
    endpoint: Option<String>,

    /// Path appended to the endpoint.
    #[arg(long)]
    resource: Option<String>,

    /// HTTP method (default: POST).
    #[arg(short = 'X', long)]
    method: Option<String>,

    /// Directory the responses are written to.
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Output name used when no files are selected (GET/DELETE).
    #[arg(long, value_name = "NAME")]
    output_filename: Option<String>,

    /// Select files below DIR (repeatable).
    #[arg(long = "dir", value_name = "DIR")]
    dirs: Vec<PathBuf>,

    /// Include pattern for directories given with --dir (repeatable).
    #[arg(long = "include", value_name = "PATTERN")]
    includes: Vec<String>,

    /// Exclude pattern for directories given with --dir (repeatable).
    #[arg(long = "exclude", value_name = "PATTERN")]
    excludes: Vec<String>,

    /// Query parameter (repeatable).
    #[arg(long = "query", value_name = "KEY=VALUE", value_parser = parse_pair)]
    query: Vec<(String, String)>,

    /// Request header (repeatable).
    #[arg(short = 'H', long = "header", value_name = "KEY=VALUE", value_parser = parse_pair)]
    headers: Vec<(String, String)>,

    /// Content-Type of uploaded files.
    #[arg(long, value_name = "MIME")]
    request_type: Option<String>,

    /// Accepted response type.
    #[arg(long, value_name = "MIME")]
    response_type: Option<String>,

    /// Skip TLS certificate validation.
    #[arg(long)]
    insecure: bool,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if self.resource.is_some() {
            config.resource = self.resource;
        }
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(output_filename) = self.output_filename {
            config.output_filename = output_filename;
        }
        if let Some(request_type) = self.request_type {
            config.request_type = request_type;
        }
        if let Some(response_type) = self.response_type {
            config.response_type = response_type;
        }
        if self.insecure {
            config.transport.accept_invalid_certs = true;
        }

        config.query_params.extend(self.query);
        config.headers.extend(self.headers);

        for dir in self.dirs {
            config.filesets.push(FileSetConfig {
                includes: self.includes.clone(),
                excludes: self.excludes.clone(),
                ..FileSetConfig::new(dir)
            });
        }

        Ok(config)
    }
}

fn parse_pair(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.into_config() {
        Ok(config) => rest_request::run(config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
