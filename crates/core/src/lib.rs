//! Importblocks Core Library
//!
//! This library regroups and sorts the import header of Go source files
//! according to a configurable list of blocks.
//!
//! # Features
//!
//! - Classify import paths into buckets (`!std`, `!mod`, `*`, prefixes)
//! - Resolve the block list from a file, a lookup up the directory tree, or defaults
//! - Merge every import declaration of the header into one sorted `import ( ... )`
//! - Keep names, doc comments, and trailing comments with their imports
//! - Report the outcome of a run as text, JSON, or YAML
//!
//! # Example
//!
//! ```no_run
//! use importblocks_core::{config, ConfigSource, ImportFormatter, Ordering, RunConfig, Target};
//! use std::path::PathBuf;
//!
//! let work_dir = PathBuf::from(".");
//! let resolved = config::resolve(&ConfigSource::Default, &work_dir).unwrap();
//! let ordering = Ordering::from_toolchain(&resolved.config, &work_dir).unwrap();
//!
//! let formatter = ImportFormatter::new(&ordering, RunConfig::new(work_dir.clone())).unwrap();
//! let report = formatter.run(&[Target::parse("./...", &work_dir)]).unwrap();
//!
//! for file in report.changed_files() {
//!     println!("{}", file.path.display());
//! }
//! ```

pub mod config;
pub mod models;
pub mod module;
pub mod ordering;
pub mod output;
pub mod parsers;
pub mod rewriter;
pub mod stdlib;
pub mod walker;

// Re-exports for convenience
pub use config::{BlockConfig, ConfigError, ConfigSource, ResolvedConfig};
pub use models::*;
pub use module::{resolve_module_path, ModulePath};
pub use ordering::{Ordering, OrderingError};
pub use output::{format_report, format_summary, OutputFormat};
pub use rewriter::{rewrite_file, RewriteError};
pub use stdlib::StdLibrary;
pub use walker::{ImportFormatter, RunConfig, Target, WalkError};
