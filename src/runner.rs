//! Run coordination
//!
//! A [`Runner`] owns one validated [`Config`] and drives a run:
//!
//! 1. Compile the request template, remap rules and selection rules (fatal on error)
//! 2. Create the output directory (fatal on error)
//! 3. Resolve the input files (fatal on error)
//! 4. Send one request per file, in order, handing each response to the
//!    [`ResponseHandler`]; with no files, send a single bodyless request for GET/DELETE
//!    and nothing otherwise
//! 5. Fail with every collected [`ErrorRecord`] if any item failed
//!
//! Items are processed strictly one after another. A failed item never stops the ones
//! after it.

use crate::config::Config;
use crate::error::{Error, ErrorRecord, Result, RunFailure};
use crate::fileset::FileSelector;
use crate::remap::FilenameRemapper;
use crate::request::RequestTemplate;
use crate::response::ResponseHandler;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of a run in which every item succeeded
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of requests issued
    pub requests: usize,
    /// Output files written, in processing order
    pub written: Vec<PathBuf>,
}

/// Everything a single item needs, built once per run
struct Pipeline {
    template: RequestTemplate,
    remapper: FilenameRemapper,
    handler: ResponseHandler,
}

impl Pipeline {
    async fn submit_file(&self, file: &Path) -> std::result::Result<PathBuf, ErrorRecord> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = self
            .remapper
            .remap(&name)
            .map_err(|e| ErrorRecord::io(e.to_string()))?;

        let body = tokio::fs::read(file)
            .await
            .map_err(|e| ErrorRecord::io(format!("unable to read input: {e}")))?;

        debug!(file = %file.display(), bytes = body.len(), "submitting file");
        let response = self
            .template
            .with_body(body)
            .send()
            .await
            .map_err(|e| ErrorRecord::io(e.to_string()))?;

        self.handler.handle(response, &output).await
    }

    async fn submit_bodyless(&self, default_name: &str) -> std::result::Result<PathBuf, ErrorRecord> {
        let output = self
            .remapper
            .remap(default_name)
            .map_err(|e| ErrorRecord::io(e.to_string()))?;

        debug!(method = %self.template.method(), "bodyless request");
        let response = self
            .template
            .without_body()
            .send()
            .await
            .map_err(|e| ErrorRecord::io(e.to_string()))?;

        self.handler.handle(response, &output).await
    }

    /// Submit `files` in order, recording every outcome
    async fn submit_files(
        &self,
        files: &[PathBuf],
        summary: &mut RunSummary,
        errors: &mut Vec<ErrorRecord>,
    ) {
        for file in files {
            summary.requests += 1;
            match self.submit_file(file).await {
                Ok(path) => summary.written.push(path),
                Err(record) => errors.push(record.with_file(file)),
            }
        }
    }
}

/// Drives one run over a validated configuration
#[derive(Debug, Clone)]
pub struct Runner {
    config: Config,
}

impl Runner {
    /// Create a runner
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration fails [`Config::validate`].
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this runner executes
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute the run
    ///
    /// # Errors
    ///
    /// Fatal problems (configuration, output directory, file selection) are returned
    /// before any request is sent. Per-item failures are collected and returned together
    /// as [`Error::Failed`] once every item has been processed.
    pub async fn run(&self) -> Result<RunSummary> {
        let config = &self.config;

        let template = RequestTemplate::from_config(config)?;
        let remapper = FilenameRemapper::from_config(config)?;
        let selector = FileSelector::from_config(config)?;

        let output_dir = prepare_output_dir(&config.output_dir).await?;
        info!(output_dir = %output_dir.display(), "output dir");
        info!(method = %template.method(), endpoint = %template.url(), "endpoint");

        let files = selector.select()?;
        let pipeline = Pipeline {
            template,
            remapper,
            handler: ResponseHandler::new(output_dir),
        };

        let mut summary = RunSummary::default();
        let mut errors = Vec::new();

        if files.is_empty() {
            if !config.is_bodyless_method() {
                info!("no files to process");
                return Ok(summary);
            }

            summary.requests += 1;
            match pipeline.submit_bodyless(&config.output_filename).await {
                Ok(path) => summary.written.push(path),
                Err(record) => errors.push(record),
            }
        }

        pipeline
            .submit_files(&files, &mut summary, &mut errors)
            .await;

        if errors.is_empty() {
            info!(
                requests = summary.requests,
                written = summary.written.len(),
                "run complete"
            );
            Ok(summary)
        } else {
            info!(
                requests = summary.requests,
                failed = errors.len(),
                "run finished with errors"
            );
            Err(Error::Failed(RunFailure { errors }))
        }
    }
}

/// Validate and run `config` in one call
pub async fn run(config: Config) -> Result<RunSummary> {
    Runner::new(config)?.run().await
}

/// Create the output directory if needed; an existing non-directory is an error
async fn prepare_output_dir(path: &Path) -> Result<PathBuf> {
    let output_dir_error = |reason: String| Error::OutputDir {
        path: path.to_path_buf(),
        reason,
    };

    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => return Ok(path.to_path_buf()),
        Ok(_) => return Err(output_dir_error("not a directory".into())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(output_dir_error(e.to_string())),
    }

    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| output_dir_error(e.to_string()))?;
    Ok(path.to_path_buf())
}
