//! Workspace layout for dev-compose.
//!
//! This module centralizes where things live under the output root,
//! ensuring consistency and avoiding duplication: resolved applications are
//! checked out under `<output-root>/apps/<name>/` and the aggregate compose
//! file is written to `<output-root>/docker-compose.yml`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default output root, relative to the directory the tool is run in.
pub const DEFAULT_OUTPUT_ROOT: &str = "_build";

/// File name of the aggregate descriptor written at the end of a run.
pub const AGGREGATE_FILE: &str = "docker-compose.yml";

/// The on-disk layout of a run: one output root holding the checked-out
/// application repositories and the aggregate compose file.
#[derive(Debug, Clone)]
pub struct Workspace {
    output_root: PathBuf,
}

impl Workspace {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    /// The root everything is written under.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// The directory holding all application checkouts.
    pub fn apps_dir(&self) -> PathBuf {
        self.output_root.join("apps")
    }

    /// The checkout directory for a named application.
    pub fn app_dir(&self, name: &str) -> PathBuf {
        self.apps_dir().join(name)
    }

    /// Where the aggregate compose file is written.
    pub fn aggregate_path(&self) -> PathBuf {
        self.output_root.join(AGGREGATE_FILE)
    }

    /// Create the checkout directory for a named application if it does not
    /// exist yet, returning its path.
    pub fn ensure_app_dir(&self, name: &str) -> Result<PathBuf> {
        let path = self.app_dir(name);
        if !path.is_dir() {
            fs::create_dir_all(&path)?;
        }
        Ok(path)
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_ROOT)
    }
}
