//! # dev-compose Library
//!
//! This library provides the core functionality for assembling a
//! multi-repository development environment into a single docker-compose
//! file. It is designed to be used by the `dev-compose` command-line tool
//! but can also be integrated into other applications that drive the same
//! resolution and merge steps.
//!
//! ## Quick Example
//!
//! ```
//! use dev_compose::manifest;
//!
//! let parsed = manifest::parse("repos:\n  - https://example.com/foo.git\n").unwrap();
//! let spec = manifest::normalize_spec(&parsed.entries()[0]).unwrap();
//! assert_eq!(spec.name, "foo");
//! assert_eq!(spec.r#ref, "master");
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifest (`manifest`)**: the `dev-compose.yml` schema - which
//!   repositories an application depends on and at what pinned refs.
//! - **Resolver (`resolver`)**: walks the manifest graph breadth-first,
//!   deduplicates repositories by name, detects version conflicts, and
//!   checks each repository out into the workspace.
//! - **Merger (`merger`, `compose`)**: folds every application's
//!   `docker-compose.yml` into one aggregate document, rewriting relative
//!   paths so they stay valid from the output root.
//! - **Workspace (`workspace`)**: the on-disk layout under the output root
//!   (`apps/<name>/` checkouts plus the aggregate file).
//!
//! ## Execution Flow
//!
//! 1.  **Resolution**: read the root manifest, resolve every reachable
//!     dependency, materialize checkouts.
//! 2.  **Merging**: fold the root project's descriptor and then each
//!     resolved application's descriptor, in resolution order, into the
//!     aggregate.
//! 3.  **Output**: serialize the aggregate exactly once; print the
//!     suggested `docker-compose ... up` command.
//!
//! Any fatal error (invalid spec, version conflict, incompatible
//! dependency, service conflict) aborts before the aggregate is written.

pub mod compose;
pub mod error;
pub mod git;
pub mod manifest;
pub mod merger;
pub mod output;
pub mod path;
pub mod resolver;
pub mod workspace;
