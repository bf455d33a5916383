use crate::ordering::OrderingError;
use std::collections::HashSet;
use std::env;
use std::ffi::{OsStr, OsString};
use std::process::Command;
use tracing::debug;

/// Overrides the `go` binary used to list standard library packages
pub const GO_BINARY_ENV: &str = "IMPORTBLOCKS_GO";

/// Import paths of the Go standard library
#[derive(Debug, Clone, Default)]
pub struct StdLibrary {
    packages: HashSet<String>,
}

impl StdLibrary {
    pub fn from_packages<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    /// Ask the installed toolchain for `go list std`.
    pub fn from_toolchain() -> Result<Self, OrderingError> {
        let go = env::var_os(GO_BINARY_ENV).unwrap_or_else(|| OsString::from("go"));
        Self::from_toolchain_with(&go)
    }

    /// Run `<go> list std` with an explicit binary.
    pub fn from_toolchain_with(go: &OsStr) -> Result<Self, OrderingError> {
        let output = Command::new(go)
            .args(["list", "std"])
            .output()
            .map_err(|e| {
                OrderingError::StdLibrary(format!(
                    "cannot run `{} list std`: {}",
                    go.to_string_lossy(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(OrderingError::StdLibrary(format!(
                "`{} list std` failed: {}",
                go.to_string_lossy(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let std = Self::from_listing(&String::from_utf8_lossy(&output.stdout));
        if std.is_empty() {
            return Err(OrderingError::StdLibrary(
                "`go list std` returned no packages".to_string(),
            ));
        }

        debug!("loaded {} standard library packages", std.len());
        Ok(std)
    }

    /// One package path per line, as printed by `go list`.
    pub fn from_listing(listing: &str) -> Self {
        Self::from_packages(
            listing
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    /// `path` is a standard package or lives below one (`net/http/httptest`
    /// under `net/http`). Prefixes only match on `/` boundaries.
    pub fn contains(&self, path: &str) -> bool {
        if self.packages.contains(path) {
            return true;
        }

        path.match_indices('/')
            .any(|(idx, _)| self.packages.contains(&path[..idx]))
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
