//! Traversal of the requested paths
//!
//! Each command line argument becomes a [`Target`]: a single file, the direct
//! file children of a directory, or a whole tree when the argument ends with
//! `...`. Every Go file found is handed to [`rewrite_file`] with the shared
//! [`Ordering`].

use crate::models::{FileOutcome, FileReport, Language, RunMetadata, RunReport, RunStats};
use crate::ordering::Ordering;
use crate::rewriter::rewrite_file;
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Argument suffix requesting a recursive walk (`./...`)
pub const RECURSIVE_SUFFIX: &str = "...";

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Invalid exclude pattern: {0}")]
    InvalidGlob(#[from] globset::Error),
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),
}

/// One path argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    File(PathBuf),
    /// Direct file children only
    Directory(PathBuf),
    /// The directory and all its descendants
    Recursive(PathBuf),
}

impl Target {
    /// Interpret a command line argument relative to `work_dir`.
    pub fn parse(arg: &str, work_dir: &Path) -> Self {
        if let Some(dir) = arg.strip_suffix(RECURSIVE_SUFFIX) {
            return Target::Recursive(absolutize(dir, work_dir));
        }

        let path = absolutize(arg, work_dir);
        if path.is_dir() {
            Target::Directory(path)
        } else {
            Target::File(path)
        }
    }
}

fn absolutize(arg: &str, work_dir: &Path) -> PathBuf {
    let path = Path::new(arg);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        work_dir.join(path)
    };

    joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Settings for a formatting run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Base for relative arguments and reported paths
    pub work_dir: PathBuf,
    /// Glob patterns of files and directories to leave alone
    pub exclude_patterns: Vec<String>,
    /// Number of threads (1 = sequential, 0 = one per CPU)
    pub threads: usize,
}

impl RunConfig {
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            exclude_patterns: Vec::new(),
            threads: 1,
        }
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

/// Filter for excluded files and directories
pub struct ExcludeFilter {
    work_dir: PathBuf,
    globs: GlobSet,
}

impl ExcludeFilter {
    pub fn new(config: &RunConfig) -> Result<Self, WalkError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude_patterns {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            work_dir: config.work_dir.clone(),
            globs: builder.build()?,
        })
    }

    /// Patterns match the path relative to the working directory.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.globs.is_empty() {
            return false;
        }
        let relative = path.strip_prefix(&self.work_dir).unwrap_or(path);
        self.globs.is_match(relative)
    }
}

/// Applies one [`Ordering`] to every Go file of the requested targets
pub struct ImportFormatter<'a> {
    ordering: &'a Ordering,
    config: RunConfig,
    exclude: ExcludeFilter,
}

impl<'a> ImportFormatter<'a> {
    pub fn new(ordering: &'a Ordering, config: RunConfig) -> Result<Self, WalkError> {
        let exclude = ExcludeFilter::new(&config)?;
        Ok(Self {
            ordering,
            config,
            exclude,
        })
    }

    /// Process every target; per-file failures end up in the report.
    pub fn run(&self, targets: &[Target]) -> Result<RunReport, WalkError> {
        let start = Instant::now();

        let files = self.collect_files(targets);

        let reports: Vec<FileReport> = if self.config.threads == 1 {
            files.iter().map(|path| self.process_file(path)).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()
                .map_err(|e| WalkError::ThreadPoolError(e.to_string()))?;

            pool.install(|| files.par_iter().map(|path| self.process_file(path)).collect())
        };

        let stats = RunStats::from_files(&reports);
        let metadata = RunMetadata {
            duration_ms: start.elapsed().as_millis() as u64,
            ..Default::default()
        };

        Ok(RunReport {
            root: self.config.work_dir.clone(),
            files: reports,
            stats,
            metadata,
        })
    }

    /// Go files of all targets, in traversal order
    pub fn collect_files(&self, targets: &[Target]) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for target in targets {
            match target {
                Target::File(path) => {
                    if !path.exists() {
                        warn!("{}: skip. not found", self.display_path(path).display());
                    } else if self.accepts(path) {
                        files.push(path.clone());
                    }
                }
                Target::Directory(dir) => self.collect_dir(dir, &mut files),
                Target::Recursive(dir) => self.collect_tree(dir, &mut files),
            }
        }

        files
    }

    fn collect_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("{}: skip. error reading directory: {}", dir.display(), e);
                return;
            }
        };

        let mut children: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect();
        children.sort();

        files.extend(children.into_iter().filter(|path| self.accepts(path)));
    }

    fn collect_tree(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Skip excluded directories
                !(e.depth() > 0 && e.file_type().is_dir() && self.exclude.is_excluded(e.path()))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skip. error walking {}: {}", dir.display(), e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            if self.accepts(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        Language::from_path(path).is_some() && !self.exclude.is_excluded(path)
    }

    fn process_file(&self, path: &Path) -> FileReport {
        let shown = self.display_path(path);

        let outcome = match rewrite_file(path, self.ordering) {
            Ok(outcome) => {
                match outcome {
                    FileOutcome::Changed => info!("{}: rewritten", shown.display()),
                    _ => debug!("{}: no changes", shown.display()),
                }
                outcome
            }
            Err(e) => {
                warn!("{}: skip. {}", shown.display(), e);
                FileOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        };

        FileReport {
            path: shown,
            outcome,
        }
    }

    /// Path relative to the working directory when it lives below it
    fn display_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.config.work_dir)
            .unwrap_or(path)
            .to_path_buf()
    }
}
