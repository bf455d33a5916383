use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Language of the source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
}

impl Language {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "go" => Some(Language::Go),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| Self::from_extension(&ext.to_string_lossy()))
    }
}

/// A single dependency declaration inside the import header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Decoded import path (`net/http`)
    pub path: String,
    /// Path literal exactly as written in the source, quotes included
    pub literal: String,
    /// Binding name (`foo`, `_` or `.`)
    pub name: Option<String>,
    /// Comments on the lines directly above the declaration
    pub doc: Vec<String>,
    /// Comment trailing the declaration on its own line
    pub comment: Option<String>,
    /// Line number in source file (1-based)
    pub line: usize,
}

impl ImportSpec {
    pub fn new(path: impl Into<String>, literal: impl Into<String>, line: usize) -> Self {
        Self {
            path: path.into(),
            literal: literal.into(),
            name: None,
            doc: Vec::new(),
            comment: None,
            line,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_doc(mut self, doc: Vec<String>) -> Self {
        self.doc = doc;
        self
    }

    /// Render the declaration as the lines it occupies inside `import ( ... )`.
    pub fn render(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.doc.iter().flat_map(|c| indent(c)).collect();

        let mut decl = String::new();
        if let Some(ref name) = self.name {
            decl.push_str(name);
            decl.push(' ');
        }
        decl.push_str(&self.literal);
        if let Some(ref comment) = self.comment {
            decl.push(' ');
            decl.push_str(comment);
        }
        lines.extend(indent(&decl));

        lines
    }
}

/// Tab-indent the first line of a (possibly multi-line) fragment; continuation
/// lines of block comments keep their own indentation.
pub(crate) fn indent(text: &str) -> Vec<String> {
    text.split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("\t{}", line)
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// The import header of one source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportHeader {
    pub specs: Vec<ImportSpec>,
    /// First line of the first import declaration (1-based, 0 when absent)
    pub start_line: usize,
    /// Last line of the last import declaration (1-based, 0 when absent)
    pub end_line: usize,
    /// Byte offset where the first import declaration starts
    pub start_byte: usize,
    /// Byte offset past the last declaration or comment taken into the header.
    /// Code sharing the first or last line stays outside `start_byte..end_byte`.
    pub end_byte: usize,
    /// Comments inside the header that follow the last declaration
    pub dangling_comments: Vec<String>,
}

impl ImportHeader {
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// What happened to one file during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// The import header was rewritten
    Changed,
    /// The header was already in order; the file was not touched
    Unchanged,
    /// The file has no import declarations
    NoImports,
    /// The file could not be read, parsed or written
    Skipped { reason: String },
}

impl FileOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, FileOutcome::Changed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Path relative to the working directory when possible
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_files: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub no_imports: usize,
    pub skipped: usize,
}

impl RunStats {
    pub fn from_files(files: &[FileReport]) -> Self {
        let mut stats = RunStats {
            total_files: files.len(),
            ..Default::default()
        };

        for file in files {
            match file.outcome {
                FileOutcome::Changed => stats.changed += 1,
                FileOutcome::Unchanged => stats.unchanged += 1,
                FileOutcome::NoImports => stats.no_imports += 1,
                FileOutcome::Skipped { .. } => stats.skipped += 1,
            }
        }

        stats
    }
}

/// Run metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub duration_ms: u64,
    pub timestamp: String,
    pub tool_version: String,
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self {
            duration_ms: 0,
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Result of processing every requested path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub root: PathBuf,
    pub files: Vec<FileReport>,
    pub stats: RunStats,
    pub metadata: RunMetadata,
}

impl RunReport {
    pub fn changed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.outcome.is_changed())
    }
}
