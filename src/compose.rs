//! Compose descriptor schema and path rewriting
//!
//! This module reads per-application `docker-compose.yml` descriptors and
//! rewrites their path-valued fields so the definitions stay valid when the
//! aggregate file is consumed from the output root instead of the
//! application's own workspace.
//!
//! Three service fields are recognized; everything else passes through
//! byte-for-byte:
//!
//! - `build` - a bare context string, or a mapping whose `context` is
//!   rewritten and whose `dockerfile` defaults to `Dockerfile`
//! - `env_file` (also accepted as `env-file`) - one path or a list of paths
//! - `volumes` - short `source:target[:mode]` strings or long-form
//!   mappings; only sources that start with a relative-path indicator are
//!   rewritten, named volumes and absolute or home-rooted paths are left
//!   alone
//!
//! The string-vs-record shapes are modeled as untagged sum types with
//! explicit variant handling.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::Path;

use crate::error::Result;
use crate::path::relativize;

/// File name of the per-application orchestration descriptor.
pub const COMPOSE_FILE: &str = "docker-compose.yml";

/// Format-version tag written into the aggregate descriptor.
pub const COMPOSE_VERSION: &str = "3.0";

/// Dockerfile name filled into detailed build mappings that omit one.
pub const DEFAULT_DOCKERFILE: &str = "Dockerfile";

/// A parsed compose descriptor. Top-level keys other than `services` are
/// not interesting to the merge and are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeFile {
    #[serde(default)]
    pub services: Option<Mapping>,
}

impl ComposeFile {
    /// Read and parse the descriptor in `dir`, if one is readable there.
    ///
    /// A missing or unreadable descriptor yields `Ok(None)` - the
    /// application simply contributes nothing. A descriptor that reads but
    /// fails to parse is an error.
    pub fn load(dir: &Path) -> Result<Option<ComposeFile>> {
        match std::fs::read_to_string(dir.join(COMPOSE_FILE)) {
            Ok(content) => Ok(Some(serde_yaml::from_str(&content)?)),
            Err(_) => Ok(None),
        }
    }
}

/// The `build` field of a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildSpec {
    /// `build: ./dir` - the context itself
    Context(String),
    /// `build: {context: ..., dockerfile: ..., ...}`
    Detailed(Mapping),
}

/// The `env_file` field of a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvFiles {
    One(String),
    Many(Vec<String>),
}

/// One entry of the `volumes` field of a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Volume {
    /// `source:target[:mode]`
    Short(String),
    /// `{type: ..., source: ..., target: ...}`
    Long(Mapping),
}

/// Rewrite the path-valued fields of one service definition in place so
/// they resolve from the output root instead of `app_path`.
pub fn rewrite_service(
    output_root: &Path,
    app_path: &Path,
    service: &mut Mapping,
) -> Result<()> {
    let build_key = Value::from("build");
    if let Some(value) = service.get(&build_key) {
        let build: BuildSpec = serde_yaml::from_value(value.clone())?;
        let rewritten = rewrite_build(output_root, app_path, build)?;
        service.insert(build_key, serde_yaml::to_value(rewritten)?);
    }

    // the original spelling is kept, whichever one the descriptor used
    for key in ["env_file", "env-file"] {
        let env_key = Value::from(key);
        if let Some(value) = service.get(&env_key) {
            let env: EnvFiles = serde_yaml::from_value(value.clone())?;
            let rewritten = rewrite_env_files(output_root, app_path, env)?;
            service.insert(env_key, serde_yaml::to_value(rewritten)?);
        }
    }

    let volumes_key = Value::from("volumes");
    if let Some(value) = service.get(&volumes_key) {
        let volumes: Vec<Volume> = serde_yaml::from_value(value.clone())?;
        let rewritten = volumes
            .into_iter()
            .map(|v| rewrite_volume(output_root, app_path, v))
            .collect::<Result<Vec<_>>>()?;
        service.insert(volumes_key, serde_yaml::to_value(rewritten)?);
    }

    Ok(())
}

fn rewrite_build(output_root: &Path, app_path: &Path, build: BuildSpec) -> Result<BuildSpec> {
    match build {
        BuildSpec::Context(context) => {
            let rewritten = relativize(output_root, app_path, &context)?;
            debug!("rewrote build context {} -> {}", context, rewritten);
            Ok(BuildSpec::Context(rewritten))
        }
        BuildSpec::Detailed(mut detail) => {
            let context_key = Value::from("context");
            if let Some(Value::String(context)) = detail.get(&context_key) {
                let rewritten = relativize(output_root, app_path, context)?;
                debug!("rewrote build context {} -> {}", context, rewritten);
                detail.insert(context_key, Value::from(rewritten));
            }
            let dockerfile_key = Value::from("dockerfile");
            if !detail.contains_key(&dockerfile_key) {
                detail.insert(dockerfile_key, Value::from(DEFAULT_DOCKERFILE));
            }
            Ok(BuildSpec::Detailed(detail))
        }
    }
}

fn rewrite_env_files(output_root: &Path, app_path: &Path, env: EnvFiles) -> Result<EnvFiles> {
    match env {
        EnvFiles::One(file) => Ok(EnvFiles::One(relativize(output_root, app_path, &file)?)),
        EnvFiles::Many(files) => Ok(EnvFiles::Many(
            files
                .iter()
                .map(|f| relativize(output_root, app_path, f))
                .collect::<Result<Vec<_>>>()?,
        )),
    }
}

fn rewrite_volume(output_root: &Path, app_path: &Path, volume: Volume) -> Result<Volume> {
    match volume {
        Volume::Short(entry) => {
            // source:target[:mode] - only the source half may need rewriting
            let mut tokens: Vec<&str> = entry.split(':').collect();
            if !is_workspace_relative(tokens[0]) {
                return Ok(Volume::Short(entry));
            }
            let rewritten = relativize(output_root, app_path, tokens[0])?;
            debug!("rewrote volume source {} -> {}", tokens[0], rewritten);
            tokens[0] = &rewritten;
            Ok(Volume::Short(tokens.join(":")))
        }
        Volume::Long(mut detail) => {
            let source_key = Value::from("source");
            if let Some(Value::String(source)) = detail.get(&source_key) {
                if is_workspace_relative(source) {
                    let rewritten = relativize(output_root, app_path, source)?;
                    debug!("rewrote volume source {} -> {}", source, rewritten);
                    detail.insert(source_key, Value::from(rewritten));
                }
            }
            Ok(Volume::Long(detail))
        }
    }
}

/// A volume source is rewritten only when it is a relative path rooted in
/// the application's own workspace. Absolute paths, home-directory
/// references, and named volumes pass through unchanged.
fn is_workspace_relative(source: &str) -> bool {
    source.starts_with('.')
}
