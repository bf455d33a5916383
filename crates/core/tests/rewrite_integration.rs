use importblocks_core::config::{self, BlockConfig, ConfigSource};
use importblocks_core::{
    FileOutcome, ImportFormatter, ModulePath, Ordering, RunConfig, StdLibrary, Target,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const UNSORTED: &str = r#"// Package app does things.
package app

import (
	"github.com/acme/lib"
	"example.com/app/store" // local
	"strings"
	// printing
	"fmt"
)

import "os"

// Run is the entry point.
func Run() {
	fmt.Println(strings.ToUpper(os.Args[0]), lib.X, store.Y)
}
"#;

const SORTED: &str = r#"// Package app does things.
package app

import (
	// printing
	"fmt"
	"os"
	"strings"

	"github.com/acme/lib"

	"example.com/app/store" // local
)

// Run is the entry point.
func Run() {
	fmt.Println(strings.ToUpper(os.Args[0]), lib.X, store.Y)
}
"#;

fn default_ordering() -> Ordering {
    Ordering::new(
        &BlockConfig::default_blocks(),
        StdLibrary::from_packages(["fmt", "os", "strings", "net/http"]),
        &ModulePath::Found("example.com/app".to_string()),
    )
}

fn write(dir: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

fn outcome_of<'a>(
    report: &'a importblocks_core::RunReport,
    relative: &str,
) -> Option<&'a FileOutcome> {
    report
        .files
        .iter()
        .find(|f| f.path == Path::new(relative))
        .map(|f| &f.outcome)
}

#[test]
fn test_rewrite_groups_and_preserves_rest() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "app.go", UNSORTED);
    let ordering = default_ordering();

    let formatter = ImportFormatter::new(&ordering, RunConfig::new(dir.path().to_path_buf())).unwrap();
    let report = formatter.run(&[Target::File(file.clone())]).unwrap();

    assert_eq!(report.stats.changed, 1);
    assert_eq!(outcome_of(&report, "app.go"), Some(&FileOutcome::Changed));
    assert_eq!(fs::read_to_string(&file).unwrap(), SORTED);
}

#[test]
fn test_second_run_is_noop() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "app.go", UNSORTED);
    let ordering = default_ordering();
    let formatter = ImportFormatter::new(&ordering, RunConfig::new(dir.path().to_path_buf())).unwrap();

    formatter.run(&[Target::File(file.clone())]).unwrap();
    let first = fs::read_to_string(&file).unwrap();

    let report = formatter.run(&[Target::File(file.clone())]).unwrap();
    assert_eq!(outcome_of(&report, "app.go"), Some(&FileOutcome::Unchanged));
    assert_eq!(fs::read_to_string(&file).unwrap(), first);
}

#[test]
fn test_broken_file_is_skipped_and_run_continues() {
    let dir = TempDir::new().unwrap();
    let broken_src = "package app\n\nimport (\n\t\"os\"\n\nfunc {\n";
    let broken = write(dir.path(), "a_broken.go", broken_src);
    let good = write(dir.path(), "b_good.go", UNSORTED);
    let ordering = default_ordering();

    let formatter = ImportFormatter::new(&ordering, RunConfig::new(dir.path().to_path_buf())).unwrap();
    let report = formatter
        .run(&[Target::Directory(dir.path().to_path_buf())])
        .unwrap();

    assert!(matches!(
        outcome_of(&report, "a_broken.go"),
        Some(FileOutcome::Skipped { .. })
    ));
    assert_eq!(outcome_of(&report, "b_good.go"), Some(&FileOutcome::Changed));
    assert_eq!(fs::read_to_string(&broken).unwrap(), broken_src);
    assert_eq!(fs::read_to_string(&good).unwrap(), SORTED);
}

#[test]
fn test_file_without_imports_is_untouched() {
    let dir = TempDir::new().unwrap();
    let source = "package app\n\nfunc Run() {}\n";
    let file = write(dir.path(), "plain.go", source);
    let ordering = default_ordering();

    let formatter = ImportFormatter::new(&ordering, RunConfig::new(dir.path().to_path_buf())).unwrap();
    let report = formatter.run(&[Target::File(file.clone())]).unwrap();

    assert_eq!(outcome_of(&report, "plain.go"), Some(&FileOutcome::NoImports));
    assert_eq!(fs::read_to_string(&file).unwrap(), source);
}

#[test]
fn test_directory_target_is_not_recursive() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "top.go", UNSORTED);
    let nested = write(dir.path(), "pkg/nested.go", UNSORTED);
    write(dir.path(), "notes.txt", "not go");
    let ordering = default_ordering();

    let formatter = ImportFormatter::new(&ordering, RunConfig::new(dir.path().to_path_buf())).unwrap();
    let report = formatter
        .run(&[Target::parse(".", dir.path())])
        .unwrap();

    assert_eq!(report.stats.total_files, 1);
    assert_eq!(outcome_of(&report, "top.go"), Some(&FileOutcome::Changed));
    assert_eq!(fs::read_to_string(&nested).unwrap(), UNSORTED);
}

#[test]
fn test_recursive_target_with_excludes() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "top.go", UNSORTED);
    write(dir.path(), "pkg/nested.go", UNSORTED);
    let vendored = write(dir.path(), "vendor/dep/dep.go", UNSORTED);
    let generated = write(dir.path(), "pkg/model_gen.go", UNSORTED);
    let ordering = default_ordering();

    let config = RunConfig::new(dir.path().to_path_buf()).with_exclude_patterns(vec![
        "vendor".to_string(),
        "**/*_gen.go".to_string(),
    ]);
    let formatter = ImportFormatter::new(&ordering, config).unwrap();
    let report = formatter
        .run(&[Target::parse("./...", dir.path())])
        .unwrap();

    assert_eq!(report.stats.total_files, 2);
    assert_eq!(report.stats.changed, 2);
    assert_eq!(fs::read_to_string(&vendored).unwrap(), UNSORTED);
    assert_eq!(fs::read_to_string(&generated).unwrap(), UNSORTED);
}

#[test]
fn test_parallel_run_matches_sequential() {
    let dir = TempDir::new().unwrap();
    for name in ["a.go", "b.go", "c.go", "d.go"] {
        write(dir.path(), &format!("pkg/{}", name), UNSORTED);
    }
    let ordering = default_ordering();

    let config = RunConfig::new(dir.path().to_path_buf()).with_threads(0);
    let formatter = ImportFormatter::new(&ordering, config).unwrap();
    let report = formatter
        .run(&[Target::parse("pkg/...", dir.path())])
        .unwrap();

    assert_eq!(report.stats.changed, 4);
    let paths: Vec<_> = report.files.iter().map(|f| f.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("pkg/a.go"),
            PathBuf::from("pkg/b.go"),
            PathBuf::from("pkg/c.go"),
            PathBuf::from("pkg/d.go"),
        ]
    );
}

#[test]
fn test_lookup_merge_drives_ordering() {
    let dir = TempDir::new().unwrap();
    let name = "importblocks-integration.yaml";
    write(dir.path(), &format!("a/{}", name), "importblocks:\n  - [\"*\"]\n");
    write(
        dir.path(),
        &format!("a/b/c/{}", name),
        "importblocks:\n  - [\"github.com/a/b/c\"]\n",
    );
    let work_dir = dir.path().join("a/b/c");

    let resolved = config::resolve(&ConfigSource::Lookup(name.to_string()), &work_dir).unwrap();
    assert!(!resolved.is_default);
    assert_eq!(
        resolved.config.blocks,
        vec![vec!["*".to_string()], vec!["github.com/a/b/c".to_string()]]
    );

    let ordering = Ordering::new(
        &resolved.config,
        StdLibrary::from_packages(["fmt"]),
        &ModulePath::Wildcard,
    );
    let file = write(
        &work_dir,
        "main.go",
        "package main\n\nimport (\n\t\"github.com/a/b/c/x\"\n\t\"github.com/z\"\n\t\"fmt\"\n)\n",
    );

    let formatter = ImportFormatter::new(&ordering, RunConfig::new(work_dir.clone())).unwrap();
    formatter.run(&[Target::File(file.clone())]).unwrap();

    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "package main\n\nimport (\n\t\"fmt\"\n\n\t\"github.com/z\"\n\n\t\"github.com/a/b/c/x\"\n)\n"
    );
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    let result = config::resolve(
        &ConfigSource::Explicit(PathBuf::from("absent.yaml")),
        dir.path(),
    );
    assert!(result.is_err());
}
