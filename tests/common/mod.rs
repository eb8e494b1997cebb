//! Common test utilities for rest-request end-to-end tests

use rest_request::{Config, FileSetConfig};
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::MockServer;

/// Scratch layout for one run: an input directory and an output directory
pub struct Workspace {
    /// Keeps the scratch directory alive for the test duration
    _root: TempDir,
    /// Where input files are created
    pub input: PathBuf,
    /// Where the run writes responses
    pub output: PathBuf,
}

impl Workspace {
    /// Create an empty workspace; the output directory is left for the run to create
    pub fn new() -> Self {
        let root = TempDir::new().expect("create temp dir");
        let input = root.path().join("input");
        let output = root.path().join("target").join("rest");
        std::fs::create_dir_all(&input).expect("create input dir");
        Self {
            _root: root,
            input,
            output,
        }
    }

    /// Create an input file and return its path
    pub fn add_input(&self, name: &str, content: &str) -> PathBuf {
        let path = self.input.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create input parent");
        }
        std::fs::write(&path, content).expect("write input");
        path
    }

    /// Contents of an output file, if it was written
    pub fn output_file(&self, name: &str) -> Option<Vec<u8>> {
        std::fs::read(self.output.join(name)).ok()
    }

    /// Number of files in the output directory (0 if it does not exist)
    pub fn output_count(&self) -> usize {
        std::fs::read_dir(&self.output)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Config posting everything under `input` to `<server>/x`
    pub fn config(&self, server: &MockServer) -> Config {
        Config {
            output_dir: self.output.clone(),
            fileset: Some(FileSetConfig::new(&self.input)),
            ..Config::new(format!("{}/x", server.uri()))
        }
    }

    /// Same as [`Workspace::config`] without any selection rule
    pub fn config_without_files(&self, server: &MockServer) -> Config {
        Config {
            fileset: None,
            ..self.config(server)
        }
    }
}
