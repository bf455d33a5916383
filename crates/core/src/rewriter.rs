//! Import block rewriting
//!
//! The header region (first to last import declaration) is replaced by a
//! single `import ( ... )` declaration whose specs are grouped per bucket,
//! sorted by path, and separated by one blank line. Everything outside the
//! header is kept byte for byte, and the file is only written when the
//! result differs from what is on disk.

use crate::models::{indent, FileOutcome, ImportHeader, ImportSpec, Language};
use crate::ordering::Ordering;
use crate::parsers::{create_parser, ParserError};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

pub const BLOCK_OPEN: &str = "import (";
pub const BLOCK_CLOSE: &str = ")";

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("error reading: {0}")]
    Read(#[source] io::Error),
    #[error("error parsing: {0}")]
    Parse(#[from] ParserError),
    #[error("error writing: {0}")]
    Write(#[source] io::Error),
}

/// Lines between `import (` and `)`, buckets in ascending order.
pub fn assemble_block(header: &ImportHeader, ordering: &Ordering) -> Vec<String> {
    let mut buckets: Vec<Vec<&ImportSpec>> = vec![Vec::new(); ordering.bucket_count()];
    for spec in &header.specs {
        buckets[ordering.bucket(&spec.path)].push(spec);
    }

    let mut lines = Vec::new();
    for bucket in buckets.iter_mut().filter(|bucket| !bucket.is_empty()) {
        bucket.sort_by(|a, b| a.path.cmp(&b.path));
        lines.extend(bucket.iter().flat_map(|spec| spec.render()));
        lines.push(String::new());
    }

    let mut lines = trim_blank_lines(lines);
    lines.extend(header.dangling_comments.iter().flat_map(|c| indent(c)));
    lines
}

fn trim_blank_lines(lines: Vec<String>) -> Vec<String> {
    let Some(first) = lines.iter().position(|line| !line.is_empty()) else {
        return Vec::new();
    };
    let last = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .unwrap_or(first);

    lines[first..=last].to_vec()
}

/// New file contents, or `None` when the header is already in order.
///
/// Only `start_byte..end_byte` of the header is replaced, so code sharing
/// its first or last line (`package p; import "x"`) survives.
pub fn reorder_source(source: &str, header: &ImportHeader, ordering: &Ordering) -> Option<String> {
    if header.is_empty() {
        return None;
    }

    let block = assemble_block(header, ordering);
    if block.is_empty() {
        return None;
    }

    let (start, end) = (header.start_byte, header.end_byte);
    if start >= end
        || end > source.len()
        || !source.is_char_boundary(start)
        || !source.is_char_boundary(end)
    {
        return None;
    }

    let mut rewritten = String::with_capacity(source.len() + block.len());
    rewritten.push_str(&source[..start]);
    rewritten.push_str(BLOCK_OPEN);
    rewritten.push('\n');
    for line in &block {
        rewritten.push_str(line);
        rewritten.push('\n');
    }
    rewritten.push_str(BLOCK_CLOSE);
    rewritten.push_str(&source[end..]);

    if rewritten == source {
        None
    } else {
        Some(rewritten)
    }
}

/// Rewrite one file in place when its import header is out of order.
pub fn rewrite_file(path: &Path, ordering: &Ordering) -> Result<FileOutcome, RewriteError> {
    let source = fs::read_to_string(path).map_err(RewriteError::Read)?;

    let language = Language::from_path(path).unwrap_or(Language::Go);
    let mut parser = create_parser(&language)?;
    let header = parser.parse(&source)?;

    if header.is_empty() {
        return Ok(FileOutcome::NoImports);
    }

    match reorder_source(&source, &header, ordering) {
        Some(rewritten) => {
            fs::write(path, rewritten).map_err(RewriteError::Write)?;
            Ok(FileOutcome::Changed)
        }
        None => Ok(FileOutcome::Unchanged),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlockConfig;
    use crate::module::ModulePath;
    use crate::parsers::GoParser;
    use crate::parsers::ImportParser;
    use crate::stdlib::StdLibrary;

    fn ordering(blocks: &[&[&str]]) -> Ordering {
        let config = BlockConfig::new(
            blocks
                .iter()
                .map(|g| g.iter().map(|s| s.to_string()).collect())
                .collect(),
        );
        Ordering::new(
            &config,
            StdLibrary::from_packages(["fmt", "os", "strings", "net/http"]),
            &ModulePath::Found("example.com/app".to_string()),
        )
    }

    fn reorder(source: &str, ordering: &Ordering) -> Option<String> {
        let header = GoParser::new().unwrap().parse(source).unwrap();
        reorder_source(source, &header, ordering)
    }

    #[test]
    fn test_groups_and_sorts() {
        let source = "package main\n\nimport (\n\t\"pkg/b\"\n\t\"fmt\"\n\t\"pkg/a\"\n)\n\nfunc main() {}\n";
        let result = reorder(source, &ordering(&[&["!std"], &["*"]])).unwrap();

        assert_eq!(
            result,
            "package main\n\nimport (\n\t\"fmt\"\n\n\t\"pkg/a\"\n\t\"pkg/b\"\n)\n\nfunc main() {}\n"
        );
    }

    #[test]
    fn test_sorted_source_is_unchanged() {
        let source = "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n\n\t\"github.com/x/y\"\n\n\t\"example.com/app/db\"\n)\n";
        assert_eq!(reorder(source, &ordering(&[&["!std"], &["*"], &["!mod"]])), None);
    }

    #[test]
    fn test_empty_buckets_leave_no_gaps() {
        let source = "package main\n\nimport (\n\t\"example.com/app/db\"\n\t\"fmt\"\n)\n";
        let result = reorder(source, &ordering(&[&["!std"], &["*"], &["!mod"]])).unwrap();

        assert_eq!(
            result,
            "package main\n\nimport (\n\t\"fmt\"\n\n\t\"example.com/app/db\"\n)\n"
        );
    }

    #[test]
    fn test_single_import_is_wrapped() {
        let source = "package main\n\nimport \"fmt\"\n\nfunc main() {}";
        let result = reorder(source, &ordering(&[&["!std"]])).unwrap();

        assert_eq!(result, "package main\n\nimport (\n\t\"fmt\"\n)\n\nfunc main() {}");
    }

    #[test]
    fn test_declarations_are_merged() {
        let source = "package main\n\nimport \"os\"\nimport (\n\t\"github.com/z\"\n)\nimport \"fmt\"\n\nvar _ = 1\n";
        let result = reorder(source, &ordering(&[&["!std"], &["*"]])).unwrap();

        assert_eq!(
            result,
            "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n\n\t\"github.com/z\"\n)\n\nvar _ = 1\n"
        );
    }

    #[test]
    fn test_names_and_comments_travel_with_spec() {
        let source = "package main\n\nimport (\n\tzz \"github.com/z\" // last\n\t// the standard printer\n\t\"fmt\"\n\t_ \"embed\"\n)\n";
        let ordering = Ordering::new(
            &BlockConfig::new(vec![vec!["!std".to_string()], vec!["*".to_string()]]),
            StdLibrary::from_packages(["fmt", "embed"]),
            &ModulePath::Wildcard,
        );
        let result = reorder(source, &ordering).unwrap();

        assert_eq!(
            result,
            "package main\n\nimport (\n\t_ \"embed\"\n\t// the standard printer\n\t\"fmt\"\n\n\tzz \"github.com/z\" // last\n)\n"
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let source = "package main\n\nimport (\n\t\"strings\"\n\t\"example.com/app/x\"\n\tgh \"github.com/a/b\" // c\n\t\"fmt\"\n\t// tail\n)\n\nfunc f() {}\n";
        let ordering = ordering(&[&["!std"], &["*"], &["!mod"]]);

        let once = reorder(source, &ordering).unwrap();
        assert_eq!(reorder(&once, &ordering), None);
    }

    #[test]
    fn test_code_after_header_on_same_line_is_kept() {
        let source = "package main\n\nimport (\n\t\"os\"\n\t\"fmt\"\n); var x = 1\n\nfunc main() { _ = x }\n";
        let ordering = ordering(&[&["!std"], &["*"]]);
        let result = reorder(source, &ordering).unwrap();

        assert_eq!(
            result,
            "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n); var x = 1\n\nfunc main() { _ = x }\n"
        );
        assert_eq!(reorder(&result, &ordering), None);
    }

    #[test]
    fn test_code_before_header_on_same_line_is_kept() {
        let source = "package main; import \"os\"\nimport \"fmt\"\n\nfunc main() {}\n";
        let ordering = ordering(&[&["!std"], &["*"]]);
        let result = reorder(source, &ordering).unwrap();

        assert_eq!(
            result,
            "package main; import (\n\t\"fmt\"\n\t\"os\"\n)\n\nfunc main() {}\n"
        );
        assert_eq!(reorder(&result, &ordering), None);
    }

    #[test]
    fn test_trailing_comment_of_single_import_is_not_duplicated() {
        let source = "package main\n\nimport \"fmt\" // print\n\nfunc main() {}\n";
        let result = reorder(source, &ordering(&[&["!std"]])).unwrap();

        assert_eq!(
            result,
            "package main\n\nimport (\n\t\"fmt\" // print\n)\n\nfunc main() {}\n"
        );
    }

    #[test]
    fn test_no_imports_is_noop() {
        let source = "package main\n\nfunc main() {}\n";
        assert_eq!(reorder(source, &ordering(&[&["!std"]])), None);
    }

    #[test]
    fn test_trim_blank_lines() {
        let lines = vec![
            String::new(),
            "\t\"a\"".to_string(),
            String::new(),
            "\t\"b\"".to_string(),
            String::new(),
            String::new(),
        ];
        assert_eq!(
            trim_blank_lines(lines),
            vec!["\t\"a\"".to_string(), String::new(), "\t\"b\"".to_string()]
        );
        assert!(trim_blank_lines(vec![String::new()]).is_empty());
    }
}
