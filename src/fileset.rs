//! File selection
//!
//! Resolves the configured selection rules into the ordered list of files a run sends.
//! The single `fileset` shorthand and the `filesets` list are merged once, up front, into
//! one canonical rule list: the list first, then the shorthand. Within a rule, files are
//! returned sorted by path.

use crate::config::{Config, FileSetConfig};
use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Patterns excluded from every rule unless `use_default_excludes` is off
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/*~",
    "**/#*#",
    "**/.#*",
    "**/%*%",
    "**/._*",
    "**/CVS/**",
    "**/.cvsignore",
    "**/.svn/**",
    "**/.git/**",
    "**/.gitignore",
    "**/.gitattributes",
    "**/.hg/**",
    "**/.hgignore",
    "**/.bzr/**",
    "**/.DS_Store",
];

/// A selection rule with its patterns compiled
#[derive(Debug)]
struct CompiledFileSet {
    directory: PathBuf,
    includes: GlobSet,
    excludes: GlobSet,
}

impl CompiledFileSet {
    fn compile(directory: &Path, rule: &FileSetConfig) -> Result<Self> {
        let includes: Vec<&str> = if rule.includes.is_empty() {
            vec!["**"]
        } else {
            rule.includes.iter().map(String::as_str).collect()
        };

        let mut excludes: Vec<&str> = rule.excludes.iter().map(String::as_str).collect();
        if rule.use_default_excludes {
            excludes.extend_from_slice(DEFAULT_EXCLUDES);
        }

        Ok(Self {
            directory: directory.to_path_buf(),
            includes: build_globset(&includes)?,
            excludes: build_globset(&excludes)?,
        })
    }

    fn matches(&self, relative: &Path) -> bool {
        self.includes.is_match(relative) && !self.excludes.is_match(relative)
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        if !self.directory.is_dir() {
            let reason = if self.directory.exists() {
                "not a directory"
            } else {
                "directory does not exist"
            };
            return Err(Error::Selection {
                directory: self.directory.clone(),
                reason: reason.to_string(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.directory).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Selection {
                directory: self.directory.clone(),
                reason: e.to_string(),
            })?;

            if !entry.path().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.directory) else {
                continue;
            };
            if self.matches(relative) {
                files.push(entry.path().to_path_buf());
            }
        }

        Ok(files)
    }
}

/// Translate one Ant-style pattern into globset syntax
fn normalize_pattern(pattern: &str) -> String {
    let pattern = pattern.trim().replace('\\', "/");
    if pattern.ends_with('/') {
        format!("{pattern}**")
    } else {
        pattern
    }
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let normalized = normalize_pattern(pattern);
        let glob = GlobBuilder::new(&normalized)
            .literal_separator(true)
            .build()
            .map_err(|e| Error::config("filesets", format!("invalid pattern '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::config("filesets", format!("invalid pattern set: {e}")))
}

/// Resolves selection rules into input files
#[derive(Debug, Default)]
pub struct FileSelector {
    sets: Vec<CompiledFileSet>,
}

impl FileSelector {
    /// Compile `rules` in order; rules without a directory are skipped with a warning
    pub fn new<'a>(rules: impl IntoIterator<Item = &'a FileSetConfig>) -> Result<Self> {
        let mut sets = Vec::new();
        for rule in rules {
            match &rule.directory {
                Some(directory) => sets.push(CompiledFileSet::compile(directory, rule)?),
                None => warn!(?rule, "fileset has no directory, skipping"),
            }
        }
        Ok(Self { sets })
    }

    /// Build the canonical rule list from `filesets` followed by `fileset`
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.filesets.iter().chain(config.fileset.as_ref()))
    }

    /// Number of usable rules
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether no usable rule was configured
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Walk every rule and collect the selected files
    ///
    /// # Errors
    ///
    /// Returns [`Error::Selection`] if a rule's directory is missing or cannot be read.
    pub fn select(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for set in &self.sets {
            let selected = set.files()?;
            debug!(
                directory = %set.directory.display(),
                count = selected.len(),
                "resolved fileset"
            );
            files.extend(selected);
        }
        Ok(files)
    }
}
