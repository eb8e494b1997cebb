//! Output filename remapping
//!
//! A [`FilenameRemapper`] turns the base name of an input file into the name the response
//! is stored under. Rules come from a closed set ([`RemapRule`]) and are compiled once per
//! run. When a single rule is configured it is used on its own; otherwise the rule list is
//! folded left to right, each rule consuming the previous rule's output.
//!
//! # Example
//!
//! ```
//! use rest_request::remap::{FilenameRemapper, RemapRule};
//!
//! let remapper = FilenameRemapper::new(
//!     None,
//!     &[
//!         RemapRule::Extension { extension: "pdf".into() },
//!         RemapRule::Prefix { prefix: "doc-".into() },
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(remapper.remap("guide.md").unwrap(), "doc-guide.pdf");
//! ```

use crate::config::Config;
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// Compiled regex size limit, keeps pathological patterns from blowing up memory
const REGEX_SIZE_LIMIT: usize = 1024 * 1024;

/// One filename renaming rule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemapRule {
    /// Leave the name unchanged
    Identity,
    /// Drop any leading directories
    Flatten,
    /// Replace the whole name with a fixed target
    Merge {
        /// The name every input maps to
        target: String,
    },
    /// Prepend a prefix to the base name
    Prefix {
        /// Text placed in front of the base name
        prefix: String,
    },
    /// Insert a suffix in front of the extension ("a.txt" + "-x" = "a-x.txt")
    Suffix {
        /// Text placed before the extension
        suffix: String,
    },
    /// Replace the extension, or add one if the name has none
    Extension {
        /// New extension, with or without the leading dot
        extension: String,
    },
    /// Regex substitution
    Regex {
        /// Pattern to search for
        pattern: String,
        /// Replacement, may reference groups as `$1` or `${name}`
        replacement: String,
        /// Replace every match instead of the first one
        #[serde(default)]
        replace_all: bool,
    },
}

impl RemapRule {
    fn kind(&self) -> &'static str {
        match self {
            RemapRule::Identity => "identity",
            RemapRule::Flatten => "flatten",
            RemapRule::Merge { .. } => "merge",
            RemapRule::Prefix { .. } => "prefix",
            RemapRule::Suffix { .. } => "suffix",
            RemapRule::Extension { .. } => "extension",
            RemapRule::Regex { .. } => "regex",
        }
    }
}

#[derive(Debug)]
enum CompiledRule {
    Identity,
    Flatten,
    Merge(String),
    Prefix(String),
    Suffix(String),
    Extension(String),
    Regex {
        regex: Regex,
        replacement: String,
        replace_all: bool,
    },
}

impl CompiledRule {
    fn compile(rule: &RemapRule) -> Result<Self> {
        Ok(match rule {
            RemapRule::Identity => CompiledRule::Identity,
            RemapRule::Flatten => CompiledRule::Flatten,
            RemapRule::Merge { target } => CompiledRule::Merge(target.clone()),
            RemapRule::Prefix { prefix } => CompiledRule::Prefix(prefix.clone()),
            RemapRule::Suffix { suffix } => CompiledRule::Suffix(suffix.clone()),
            RemapRule::Extension { extension } => {
                let extension = extension.trim_start_matches('.');
                CompiledRule::Extension(format!(".{extension}"))
            }
            RemapRule::Regex {
                pattern,
                replacement,
                replace_all,
            } => {
                let regex = regex::RegexBuilder::new(pattern)
                    .size_limit(REGEX_SIZE_LIMIT)
                    .build()
                    .map_err(|e| {
                        Error::config("file_mappers", format!("invalid regex '{pattern}': {e}"))
                    })?;
                CompiledRule::Regex {
                    regex,
                    replacement: replacement.clone(),
                    replace_all: *replace_all,
                }
            }
        })
    }

    fn apply(&self, name: &str) -> String {
        match self {
            CompiledRule::Identity => name.to_string(),
            CompiledRule::Flatten => split_dir(name).1.to_string(),
            CompiledRule::Merge(target) => target.clone(),
            CompiledRule::Prefix(prefix) => {
                let (dir, base) = split_dir(name);
                format!("{dir}{prefix}{base}")
            }
            CompiledRule::Suffix(suffix) => {
                let (stem, ext) = split_extension(name);
                format!("{stem}{suffix}{ext}")
            }
            CompiledRule::Extension(extension) => {
                let (stem, _) = split_extension(name);
                format!("{stem}{extension}")
            }
            CompiledRule::Regex {
                regex,
                replacement,
                replace_all,
            } => {
                if *replace_all {
                    regex.replace_all(name, replacement.as_str()).into_owned()
                } else {
                    regex.replace(name, replacement.as_str()).into_owned()
                }
            }
        }
    }
}

/// Split "dir/base" into ("dir/", "base"); either separator style is accepted
fn split_dir(name: &str) -> (&str, &str) {
    match name.rfind(['/', '\\']) {
        Some(idx) => name.split_at(idx + 1),
        None => ("", name),
    }
}

/// Split "dir/stem.ext" into ("dir/stem", ".ext"); a leading dot is not an extension
fn split_extension(name: &str) -> (&str, &str) {
    let (dir, base) = split_dir(name);
    match base.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(dir.len() + idx),
        _ => (name, ""),
    }
}

/// Applies the configured remap rules to input names
#[derive(Debug)]
pub struct FilenameRemapper {
    rules: Vec<(&'static str, CompiledRule)>,
}

impl FilenameRemapper {
    /// Remapper that returns every name unchanged
    pub fn identity() -> Self {
        Self { rules: Vec::new() }
    }

    /// Compile a remapper; `single` wins over `chain` when both are given
    pub fn new(single: Option<&RemapRule>, chain: &[RemapRule]) -> Result<Self> {
        let selected: Vec<&RemapRule> = match single {
            Some(rule) => vec![rule],
            None => chain.iter().collect(),
        };

        let rules = selected
            .into_iter()
            .map(|rule| Ok((rule.kind(), CompiledRule::compile(rule)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Compile the remapper described by `file_mapper`/`file_mappers`
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.file_mapper.as_ref(), &config.file_mappers)
    }

    /// Number of rules that will be applied
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether this remapper is the identity
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Map an input name to its output name
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remap`] when a rule turns a name into an empty string, or when the
    /// result is not a relative path that stays below the output directory.
    pub fn remap(&self, name: &str) -> Result<String> {
        let mapped = self
            .rules
            .iter()
            .try_fold(name.to_string(), |current, (kind, rule)| {
                let mapped = rule.apply(&current);
                if mapped.is_empty() {
                    return Err(Error::Remap {
                        input: current,
                        reason: format!("{kind} rule produced an empty name"),
                    });
                }
                Ok(mapped)
            })?;

        ensure_nested(name, &mapped)?;
        Ok(mapped)
    }
}

/// Reject names that would resolve outside the directory they are joined onto
fn ensure_nested(input: &str, mapped: &str) -> Result<()> {
    let escapes = Path::new(mapped).components().any(|c| {
        matches!(
            c,
            Component::RootDir | Component::Prefix(_) | Component::ParentDir
        )
    });
    if escapes {
        return Err(Error::Remap {
            input: input.to_string(),
            reason: format!("output name '{mapped}' escapes the output directory"),
        });
    }
    Ok(())
}

impl Default for FilenameRemapper {
    fn default() -> Self {
        Self::identity()
    }
}
