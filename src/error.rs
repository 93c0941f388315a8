//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `dev-compose` application. It uses the `thiserror` library to create a
//! single `Error` enum that covers all anticipated failure modes, providing
//! clear and descriptive error messages.
//!
//! Every fatal condition unwinds to the top level through this type: a
//! malformed manifest entry, two manifests pinning the same application at
//! different refs, a declared dependency without a manifest of its own, two
//! applications declaring the same service with differing definitions, and
//! failures of the underlying `git` invocations. Non-fatal conditions (a
//! missing descriptor, a missing root manifest) are absorbed where they
//! occur and never surface here.
//!
//! The `Result<T>` alias is used throughout the library to keep signatures
//! short.

use thiserror::Error;

/// Main error type for dev-compose operations
#[derive(Error, Debug)]
pub enum Error {
    /// A manifest entry is neither a URL string nor a spec record, or lacks
    /// a usable URL to derive a name from.
    #[error("Invalid repo spec: {message}")]
    InvalidSpec { message: String },

    /// The same application name was pinned at two different refs by
    /// different manifests. `ref1` is the first-seen ref, `ref2` the
    /// conflicting one.
    #[error("Conflicting versions for app '{name}': {ref1} - {ref2}")]
    ConflictingVersion {
        name: String,
        ref1: String,
        ref2: String,
    },

    /// A declared dependency has no readable manifest at its workspace root.
    #[error("Dependency '{name}' is not dev-compose compatible (no readable manifest)")]
    IncompatibleDependency { name: String },

    /// Two applications declare the same service name with differing
    /// definitions.
    #[error("Service '{name}' seen with differing definitions")]
    ConflictingService { name: String },

    /// An error occurred while cloning a Git repository.
    ///
    /// Includes the repository URL, ref (branch/tag), error message, and an
    /// optional hint for resolution.
    #[error("Git clone error for {url}@{r#ref}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        r#ref: String,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// An error occurred while executing a Git command against a working
    /// copy.
    #[error("Git command failed in {path}: {command} - {stderr}")]
    GitCommand {
        command: String,
        path: String,
        stderr: String,
    },

    /// An error occurred with a path-related operation.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
