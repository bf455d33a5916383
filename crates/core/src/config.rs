//! Block-list configuration
//!
//! A configuration document is YAML with a single `importblocks` key holding
//! an ordered list of pattern groups. A group's position is its bucket index.
//!
//! ```yaml
//! importblocks:
//!   - ["!std"]
//!   - ["*"]
//!   - ["!mod"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Group receiving standard library imports
pub const STD_TOKEN: &str = "!std";
/// Group receiving imports matched by no other pattern
pub const CATCH_ALL_TOKEN: &str = "*";
/// Placeholder for the module path declared in the nearest `go.mod`
pub const MODULE_TOKEN: &str = "!mod";
/// Accepted spelling of [`MODULE_TOKEN`]
pub const MODULE_TOKEN_ALIAS: &str = "!module";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("error reading config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("error parsing config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn is_module_token(token: &str) -> bool {
    token == MODULE_TOKEN || token == MODULE_TOKEN_ALIAS
}

/// Ordered pattern groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockConfig {
    #[serde(rename = "importblocks", default)]
    pub blocks: Vec<Vec<String>>,
}

impl BlockConfig {
    pub fn new(blocks: Vec<Vec<String>>) -> Self {
        Self { blocks }
    }

    /// Standard library first, everything else second, own module last.
    pub fn default_blocks() -> Self {
        Self::new(vec![
            vec![STD_TOKEN.to_string()],
            vec![CATCH_ALL_TOKEN.to_string()],
            vec![MODULE_TOKEN.to_string()],
        ])
    }

    pub fn from_yaml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whether any group needs the module path resolved
    pub fn references_module(&self) -> bool {
        self.blocks
            .iter()
            .flatten()
            .any(|token| is_module_token(token))
    }

    /// Reject blank patterns and unknown `!` directives.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, group) in self.blocks.iter().enumerate() {
            for pattern in group {
                if pattern.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "group {} contains an empty pattern",
                        index
                    )));
                }

                if pattern.starts_with('!') && pattern != STD_TOKEN && !is_module_token(pattern) {
                    return Err(ConfigError::Invalid(format!(
                        "group {} contains unknown directive `{}`",
                        index, pattern
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Read, parse and validate one configuration document.
pub fn read_config(path: &Path) -> Result<BlockConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config = BlockConfig::from_yaml(&contents, path)?;
    config.validate()?;

    info!("config file found: {}", path.display());
    Ok(config)
}

/// Where the block list comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in default
    Default,
    /// One explicit document
    Explicit(PathBuf),
    /// File name looked up in the working directory and all its ancestors
    Lookup(String),
}

/// The block list a run uses, with the files it was assembled from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub config: BlockConfig,
    /// Consulted documents, topmost first
    pub sources: Vec<PathBuf>,
    /// The built-in default was substituted
    pub is_default: bool,
}

impl ResolvedConfig {
    fn default_blocks() -> Self {
        Self {
            config: BlockConfig::default_blocks(),
            sources: Vec::new(),
            is_default: true,
        }
    }
}

/// Build the block list for a run. Only an explicit document can fail.
pub fn resolve(source: &ConfigSource, work_dir: &Path) -> Result<ResolvedConfig, ConfigError> {
    match source {
        ConfigSource::Default => {
            info!("no --config or --lookup given, default config will be used");
            Ok(ResolvedConfig::default_blocks())
        }
        ConfigSource::Explicit(path) => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                work_dir.join(path)
            };
            let config = read_config(&path)?;
            Ok(ResolvedConfig {
                config,
                sources: vec![path],
                is_default: false,
            })
        }
        ConfigSource::Lookup(file_name) => Ok(lookup(work_dir, file_name)),
    }
}

/// Merge every `file_name` found from `start_dir` up to the filesystem root.
///
/// Fragments closer to the root come first, so a directory's groups are
/// ordered after those of all its ancestors. Missing files are skipped
/// silently, broken ones with a warning.
pub fn lookup(start_dir: &Path, file_name: &str) -> ResolvedConfig {
    let (blocks, sources) = start_dir
        .ancestors()
        .filter_map(|dir| {
            let path = dir.join(file_name);
            read_fragment(&path).map(|fragment| (path, fragment))
        })
        .fold(
            (Vec::new(), Vec::new()),
            |(blocks, sources): (Vec<Vec<String>>, Vec<PathBuf>), (path, fragment)| {
                info!("lookup: {}", path.display());
                let mut merged_blocks = fragment.blocks;
                merged_blocks.extend(blocks);
                let mut merged_sources = vec![path];
                merged_sources.extend(sources);
                (merged_blocks, merged_sources)
            },
        );

    if blocks.is_empty() {
        warn!("empty config after lookup, default config will be used");
        return ResolvedConfig::default_blocks();
    }

    ResolvedConfig {
        config: BlockConfig::new(blocks),
        sources,
        is_default: false,
    }
}

/// Load one lookup fragment; `None` when absent, broken or empty.
fn read_fragment(path: &Path) -> Option<BlockConfig> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("skip config, error reading {}: {}", path.display(), e);
            return None;
        }
    };

    let fragment = match BlockConfig::from_yaml(&contents, path) {
        Ok(fragment) => fragment,
        Err(e) => {
            warn!("skip config, {}", e);
            return None;
        }
    };

    if let Err(e) = fragment.validate() {
        warn!("skip config {}: {}", path.display(), e);
        return None;
    }

    if fragment.is_empty() {
        debug!("skip config, no groups in {}", path.display());
        return None;
    }

    Some(fragment)
}
