//! # Descriptor Merging
//!
//! This module folds each resolved application's compose descriptor into
//! one aggregate document. The root project is processed first, then every
//! resolved application in resolution order, so the aggregate is stable
//! across runs.
//!
//! Per service the rules are:
//!
//! - a name not yet in the aggregate is inserted, after its path-valued
//!   fields are rewritten to resolve from the output root
//! - a redeclaration whose rewritten definition is structurally identical
//!   to the existing entry is skipped (two applications legitimately
//!   sharing a transitive dependency)
//! - a redeclaration that differs is a fatal conflict
//!
//! An application without a descriptor, or with a descriptor declaring no
//! services, contributes nothing. The aggregate is serialized exactly once,
//! and only after the entire merge has succeeded - a conflict never leaves
//! a partial file behind.

use std::path::Path;

use log::{debug, info};
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::compose::{self, ComposeFile, COMPOSE_VERSION};
use crate::error::{Error, Result};
use crate::resolver::ResolvedApp;
use crate::workspace::Workspace;

/// The merged orchestration document: a format-version tag plus the
/// accumulated service definitions.
#[derive(Debug, Clone, Serialize)]
pub struct Aggregate {
    pub version: String,
    pub services: Mapping,
}

impl Aggregate {
    fn new() -> Self {
        Self {
            version: COMPOSE_VERSION.to_string(),
            services: Mapping::new(),
        }
    }
}

/// Combines per-application descriptors into one [`Aggregate`].
pub struct Merger {
    workspace: Workspace,
}

impl Merger {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    /// Merge the root project and every resolved application, in that
    /// order, into a fresh aggregate.
    pub fn merge_all(&self, root: &Path, apps: &[ResolvedApp]) -> Result<Aggregate> {
        let mut aggregate = Aggregate::new();
        self.merge_app(root, &mut aggregate)?;
        for app in apps {
            self.merge_app(&app.path, &mut aggregate)?;
        }
        Ok(aggregate)
    }

    /// Fold one application's descriptor into `aggregate`.
    ///
    /// A missing descriptor or an empty `services` mapping contributes
    /// nothing and is not an error.
    pub fn merge_app(&self, app_path: &Path, aggregate: &mut Aggregate) -> Result<()> {
        let Some(descriptor) = ComposeFile::load(app_path)? else {
            debug!("no descriptor at {}, skipping", app_path.display());
            return Ok(());
        };
        let Some(services) = descriptor.services else {
            debug!("descriptor at {} declares no services", app_path.display());
            return Ok(());
        };

        let mut merged = 0;
        for (name, definition) in services {
            let mut definition = definition;
            if let Value::Mapping(service) = &mut definition {
                compose::rewrite_service(self.workspace.output_root(), app_path, service)?;
            }

            if let Some(existing) = aggregate.services.get(&name) {
                if *existing == definition {
                    debug!("service {:?} redeclared identically, skipping", name);
                    continue;
                }
                return Err(Error::ConflictingService {
                    name: service_name(&name),
                });
            }
            aggregate.services.insert(name, definition);
            merged += 1;
        }

        info!(
            "merged {} service(s) from {}",
            merged,
            app_path.display()
        );
        Ok(())
    }

    /// Serialize an aggregate to its output location. Called exactly once
    /// per run, after the whole merge succeeded.
    pub fn write(&self, aggregate: &Aggregate) -> Result<std::path::PathBuf> {
        let path = self.workspace.aggregate_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_yaml::to_string(aggregate)?)?;
        Ok(path)
    }
}

fn service_name(key: &Value) -> String {
    match key.as_str() {
        Some(name) => name.to_string(),
        None => format!("{:?}", key),
    }
}
