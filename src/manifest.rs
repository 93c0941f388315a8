//! # Manifest Schema and Parsing
//!
//! This module defines the data structures that represent the
//! `dev-compose.yml` manifest file, as well as the logic for parsing it and
//! normalizing its entries.
//!
//! A manifest declares which other application repositories an application
//! depends on, under a single top-level `repos` list. Each entry is either a
//! bare clone-URL string or a mapping with optional `name`, `url` and `ref`
//! fields:
//!
//! ```yaml
//! repos:
//!   - https://example.com/foo.git
//!   - url: git@example.com:platform/billing.git
//!     ref: v2.1
//!   - name: frontend
//!     url: https://example.com/web.git
//! ```
//!
//! Both shapes normalize into a [`RepoSpec`]: `ref` defaults to `master`,
//! and `name` is derived from the URL's final path segment with its
//! extension stripped. The two shapes are modeled as the [`RawSpec`] sum
//! type with explicit variant handling rather than inspecting value types at
//! use sites.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;

use crate::error::{Error, Result};

/// File name of the per-application manifest.
pub const MANIFEST_FILE: &str = "dev-compose.yml";

/// Checkout target used when a spec does not pin one.
pub const DEFAULT_REF: &str = "master";

/// A parsed `dev-compose.yml` manifest.
///
/// `repos` entries are kept as raw YAML values here; [`normalize_spec`]
/// turns each one into a [`RepoSpec`] and is where malformed entries are
/// rejected with a diagnostic naming the entry, rather than a parse error
/// for the whole file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// The declared repository dependencies. A missing or empty list means
    /// the application has no dependencies.
    #[serde(default)]
    pub repos: Option<Vec<Value>>,
}

impl Manifest {
    /// Read and parse the manifest in `dir`, if one is readable there.
    ///
    /// A missing or unreadable file yields `Ok(None)`; whether that is fatal
    /// is the caller's decision (it is fine for the root project, fatal for
    /// a declared dependency). A file that reads but fails to parse is
    /// always an error.
    pub fn load(dir: &Path) -> Result<Option<Manifest>> {
        Self::load_file(&dir.join(MANIFEST_FILE))
    }

    /// Like [`Manifest::load`], but for an explicitly named manifest file
    /// (the root manifest location is overridable on the command line).
    pub fn load_file(path: &Path) -> Result<Option<Manifest>> {
        match std::fs::read_to_string(path) {
            Ok(content) => parse(&content).map(Some),
            Err(_) => Ok(None),
        }
    }

    /// The raw dependency entries, empty when `repos` is absent or null.
    pub fn entries(&self) -> &[Value] {
        self.repos.as_deref().unwrap_or(&[])
    }
}

/// Parse a YAML string into a [`Manifest`].
pub fn parse(content: &str) -> Result<Manifest> {
    Ok(serde_yaml::from_str(content)?)
}

/// A raw manifest entry: either a bare clone URL or a spec mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSpec {
    /// `- https://example.com/foo.git`
    Url(String),
    /// `- {name: ..., url: ..., ref: ...}` with every field optional except
    /// that a usable `url` must be present.
    Detailed(DetailedSpec),
}

/// The mapping form of a manifest entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedSpec {
    /// Unique application name; derived from the URL when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Clone URL of the repository.
    #[serde(default)]
    pub url: Option<String>,
    /// Pinned checkout target (branch, tag, or commit).
    #[serde(default)]
    pub r#ref: Option<String>,
}

/// A fully normalized repository dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    /// Unique identifier; also the checkout directory name.
    pub name: String,
    /// Clone URL.
    pub url: String,
    /// Pinned checkout target.
    pub r#ref: String,
}

impl RepoSpec {
    /// Normalize a [`RawSpec`] by filling in the defaulted fields.
    pub fn from_raw(raw: RawSpec) -> Result<Self> {
        match raw {
            RawSpec::Url(url) => Ok(Self {
                name: derive_name(&url)?,
                r#ref: DEFAULT_REF.to_string(),
                url,
            }),
            RawSpec::Detailed(spec) => {
                let url = spec.url.ok_or_else(|| Error::InvalidSpec {
                    message: "spec mapping has no 'url' field".to_string(),
                })?;
                let name = match spec.name {
                    Some(name) => name,
                    None => derive_name(&url)?,
                };
                Ok(Self {
                    name,
                    url,
                    r#ref: spec.r#ref.unwrap_or_else(|| DEFAULT_REF.to_string()),
                })
            }
        }
    }
}

/// Normalize one raw manifest entry into a [`RepoSpec`].
///
/// Anything that is neither a string nor a mapping is rejected as
/// `InvalidSpec`, as is a mapping without a usable `url`.
pub fn normalize_spec(raw: &Value) -> Result<RepoSpec> {
    let raw: RawSpec =
        serde_yaml::from_value(raw.clone()).map_err(|_| Error::InvalidSpec {
            message: format!(
                "entry must be a URL string or a spec mapping, got: {}",
                serde_yaml::to_string(raw).unwrap_or_default().trim_end()
            ),
        })?;
    RepoSpec::from_raw(raw)
}

/// Derive an application name from its clone URL: the final path segment
/// with any extension (`.git`, typically) stripped.
///
/// Handles both proper URLs and scp-style locations
/// (`git@example.com:org/repo.git`).
fn derive_name(url_str: &str) -> Result<String> {
    let basename = match url::Url::parse(url_str) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .map(str::to_string),
        // scp-style remotes are not URLs; take whatever follows the last
        // path or host separator
        Err(_) => url_str
            .rsplit(['/', ':'])
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    };

    let basename = basename.ok_or_else(|| Error::InvalidSpec {
        message: format!("cannot derive a name from url '{}'", url_str),
    })?;

    let stem = Path::new(&basename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&basename)
        .to_string();

    if stem.is_empty() {
        return Err(Error::InvalidSpec {
            message: format!("cannot derive a name from url '{}'", url_str),
        });
    }
    Ok(stem)
}
