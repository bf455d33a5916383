//! Bucket classification
//!
//! An [`Ordering`] is compiled once per run from the resolved block list and
//! maps every import path to the index of the group it is printed in.
//!
//! Resolution order for a path:
//!
//! 1. Standard library packages go to the `!std` group, whatever the user
//!    patterns say.
//! 2. Otherwise the longest matching prefix pattern wins.
//! 3. Otherwise the catch-all group.
//!
//! Without an explicit `!std` group, bucket 0 is reserved for the standard
//! library and every configured group moves down by one. Without `*`, the
//! catch-all bucket sits after the last configured group.

use crate::config::{is_module_token, BlockConfig, CATCH_ALL_TOKEN, STD_TOKEN};
use crate::module::{resolve_module_path, ModulePath};
use crate::stdlib::StdLibrary;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderingError {
    #[error("failed to load standard library packages: {0}")]
    StdLibrary(String),
}

#[derive(Debug, Clone)]
pub struct Ordering {
    std_bucket: usize,
    catch_all_bucket: usize,
    /// Prefix pattern -> bucket. A pattern listed in several groups keeps
    /// the last one.
    patterns: HashMap<String, usize>,
    std: StdLibrary,
}

impl Ordering {
    pub fn new(config: &BlockConfig, std: StdLibrary, module: &ModulePath) -> Self {
        let mut std_bucket = None;
        let mut catch_all_bucket = None;
        let mut patterns = HashMap::new();

        for (index, group) in config.blocks.iter().enumerate() {
            for token in group {
                if token == STD_TOKEN {
                    std_bucket = Some(index);
                    continue;
                }

                let pattern = if is_module_token(token) {
                    module.as_pattern()
                } else {
                    token.as_str()
                };

                if pattern == CATCH_ALL_TOKEN {
                    catch_all_bucket = Some(index);
                    continue;
                }

                patterns.insert(pattern.to_string(), index);
            }
        }

        let mut catch_all_bucket = catch_all_bucket.unwrap_or(config.blocks.len());

        let std_bucket = match std_bucket {
            Some(bucket) => bucket,
            None => {
                for bucket in patterns.values_mut() {
                    *bucket += 1;
                }
                catch_all_bucket += 1;
                0
            }
        };

        Self {
            std_bucket,
            catch_all_bucket,
            patterns,
            std,
        }
    }

    /// Load the standard library from `go list std` and, when the block list
    /// asks for it, the module path of the `go.mod` above `work_dir`.
    pub fn from_toolchain(config: &BlockConfig, work_dir: &Path) -> Result<Self, OrderingError> {
        let std = StdLibrary::from_toolchain()?;

        let module = if config.references_module() {
            resolve_module_path(work_dir)
        } else {
            ModulePath::Wildcard
        };

        Ok(Self::new(config, std, &module))
    }

    /// Bucket index for an import path
    pub fn bucket(&self, path: &str) -> usize {
        if self.std.contains(path) {
            return self.std_bucket;
        }

        // Distinct prefixes of one path differ in length, so the longest
        // match is unique.
        self.patterns
            .iter()
            .filter(|(pattern, _)| path.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, &bucket)| bucket)
            .unwrap_or(self.catch_all_bucket)
    }

    /// One more than the highest bucket index
    pub fn bucket_count(&self) -> usize {
        self.patterns
            .values()
            .copied()
            .chain([self.std_bucket, self.catch_all_bucket])
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn std_bucket(&self) -> usize {
        self.std_bucket
    }

    pub fn catch_all_bucket(&self) -> usize {
        self.catch_all_bucket
    }

    /// Bucket configured for an exact pattern
    #[cfg(test)]
    fn pattern_bucket(&self, pattern: &str) -> Option<usize> {
        self.patterns.get(pattern).copied()
    }
}
