//! Checker configuration
//!
//! Options come from a `tuff.json` project file (discovered by walking up
//! from the input's directory) and may be overridden on the command line.
//!
//! ```json
//! { "typecheck": { "strictSafety": true } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Options for a single verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckOptions {
    /// Enables the `E_SAFETY_*` proofs and match exhaustiveness. Structural
    /// type errors are reported regardless.
    pub strict_safety: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self::strict()
    }
}

impl CheckOptions {
    pub fn strict() -> Self {
        Self {
            strict_safety: true,
        }
    }

    /// Skips safety proofs; used while bootstrapping code that predates them.
    pub fn relaxed() -> Self {
        Self {
            strict_safety: false,
        }
    }
}

/// Contents of a `tuff.json` project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TuffConfig {
    pub typecheck: CheckOptions,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl TuffConfig {
    pub const FILE_NAME: &'static str = "tuff.json";

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Nearest `tuff.json` at or above `start`.
    pub fn find(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(Self::FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load the nearest readable project file at or above `start`. Files that
    /// cannot be read or parsed are skipped; with none left the defaults apply.
    pub fn discover(start: &Path) -> Self {
        let candidates = start
            .ancestors()
            .map(|dir| dir.join(Self::FILE_NAME))
            .filter(|candidate| candidate.is_file());
        for path in candidates {
            match Self::from_file(&path) {
                Ok(config) => {
                    debug!(path = %path.display(), strict = config.typecheck.strict_safety, "loaded config");
                    return config;
                }
                Err(err) => warn!("{err}; skipping"),
            }
        }
        debug!(start = %start.display(), "no usable tuff.json found, using defaults");
        Self::default()
    }
}
