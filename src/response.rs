//! Response handling
//!
//! Successful responses are streamed into the output directory; anything else becomes an
//! [`ErrorRecord`] carrying the status code and whatever body the endpoint returned.

use crate::error::ErrorRecord;
use reqwest::{Response, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Classification of an HTTP status code
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusFamily {
    /// 1xx
    Informational,
    /// 2xx
    Successful,
    /// 3xx
    Redirection,
    /// 4xx
    ClientError,
    /// 5xx
    ServerError,
    /// Anything outside 100-599
    Other,
}

impl StatusFamily {
    /// Family of a numeric status code
    pub fn of(code: u16) -> Self {
        match code {
            100..=199 => StatusFamily::Informational,
            200..=299 => StatusFamily::Successful,
            300..=399 => StatusFamily::Redirection,
            400..=499 => StatusFamily::ClientError,
            500..=599 => StatusFamily::ServerError,
            _ => StatusFamily::Other,
        }
    }
}

impl From<StatusCode> for StatusFamily {
    fn from(status: StatusCode) -> Self {
        Self::of(status.as_u16())
    }
}

/// Writes successful response bodies under one output directory
#[derive(Debug, Clone)]
pub struct ResponseHandler {
    output_dir: PathBuf,
}

impl ResponseHandler {
    /// Handler writing into `output_dir`, which must already exist
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The directory outputs are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Handle one response
    ///
    /// Returns the written path for a 2xx response. Any other status, or an I/O failure
    /// while writing, is returned as an [`ErrorRecord`]; nothing here aborts the run.
    pub async fn handle(
        &self,
        response: Response,
        output_filename: &str,
    ) -> std::result::Result<PathBuf, ErrorRecord> {
        let status = response.status();

        if StatusFamily::from(status) != StatusFamily::Successful {
            warn!(status = status.as_u16(), "error code");
            let message = body_text(response).await;
            debug!(status = status.as_u16(), body = %message, "error response body");
            return Err(ErrorRecord::status(status.as_u16(), message));
        }

        debug!(status = status.as_u16(), "status");
        let path = self.output_dir.join(output_filename);
        info!(path = %path.display(), "writing file");

        match write_body(response, &path).await {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes, "file written");
                Ok(path)
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "failed to write response body");
                Err(ErrorRecord::io(e.to_string()))
            }
        }
    }
}

/// Best-effort string form of an error body
async fn body_text(response: Response) -> String {
    let status = response.status();
    match response.bytes().await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!(error = %e, "failed to read error response body");
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string()
        }
    }
}

/// Stream the body into `path`, creating or truncating it
///
/// The file is flushed on every exit path. A flush failure after a failed copy is
/// logged and the copy error is returned. A partially written file is removed.
async fn write_body(mut response: Response, path: &Path) -> std::io::Result<u64> {
    let mut file = File::create(path).await?;

    let copied = copy_chunks(&mut response, &mut file).await;
    let released = file.flush().await;
    drop(file);

    let result = match (copied, released) {
        (Ok(bytes), Ok(())) => return Ok(bytes),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release)) => {
            warn!(path = %path.display(), error = %release, "failed to flush output file");
            Err(e)
        }
    };

    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "failed to remove partial output file");
    }
    result
}

async fn copy_chunks(response: &mut Response, file: &mut File) -> std::io::Result<u64> {
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await.map_err(std::io::Error::other)? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    Ok(written)
}
