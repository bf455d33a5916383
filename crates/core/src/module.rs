//! Resolution of the enclosing module path from `go.mod`

use regex::Regex;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::config::CATCH_ALL_TOKEN;

pub const GO_MOD: &str = "go.mod";

/// Module path substituted for the module token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModulePath {
    Found(String),
    /// No usable `go.mod`; the module group acts as the catch-all group
    Wildcard,
}

impl ModulePath {
    pub fn as_pattern(&self) -> &str {
        match self {
            ModulePath::Found(path) => path,
            ModulePath::Wildcard => CATCH_ALL_TOKEN,
        }
    }
}

/// Walk up from `start_dir` to the nearest `go.mod` and read its module path.
pub fn resolve_module_path(start_dir: &Path) -> ModulePath {
    for dir in start_dir.ancestors() {
        let manifest = dir.join(GO_MOD);

        let contents = match fs::read_to_string(&manifest) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => {
                warn!("skip !mod, error reading {}: {}", manifest.display(), e);
                return ModulePath::Wildcard;
            }
        };

        return match parse_module_directive(&contents) {
            Some(path) => {
                debug!("module {} from {}", path, manifest.display());
                ModulePath::Found(path)
            }
            None => {
                warn!("skip !mod, error parsing {}", manifest.display());
                ModulePath::Wildcard
            }
        };
    }

    warn!("skip !mod, module not found");
    ModulePath::Wildcard
}

/// Extract the path of the `module` directive.
pub fn parse_module_directive(contents: &str) -> Option<String> {
    static DIRECTIVE_RE: OnceLock<Regex> = OnceLock::new();
    let directive = DIRECTIVE_RE.get_or_init(|| {
        Regex::new(r#"^\s*module\s+(?:"([^"]+)"|`([^`]+)`|(\S+))\s*$"#)
            .expect("module directive pattern is valid")
    });

    contents
        .lines()
        .map(|line| line.split("//").next().unwrap_or(line))
        .find_map(|line| {
            let caps = directive.captures(line)?;
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
        })
}
