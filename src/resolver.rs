//! # Manifest Graph Resolution
//!
//! This module computes the full, conflict-free, deduplicated set of
//! application dependencies reachable from the root manifest and
//! materializes each one onto local storage at its pinned reference.
//!
//! ## Process
//!
//! The [`Resolver`] maintains an explicit breadth-first worklist of
//! manifest locations, seeded with the root. For each location it reads the
//! `dev-compose.yml` manifest (if any), normalizes every declared entry,
//! and resolves it:
//!
//! - a name already in the registry at the same ref is an idempotent no-op
//! - a name already in the registry at a different ref aborts the run with
//!   a version conflict
//! - an unseen name is checked out into the workspace and queued for its
//!   own manifest discovery
//!
//! Cycles in the manifest graph are harmless: a repository already resolved
//! is never re-materialized or re-queued. A missing manifest is fine for
//! the root (no dependencies) but fatal for a declared dependency.
//!
//! ## Design
//!
//! Git actions sit behind the [`GitOperations`] trait so tests can inject
//! fakes; [`SystemGit`] is the default implementation and shells out to the
//! system `git` command. The resolved-app registry is owned by the
//! `Resolver` value, so independent runs cannot contaminate each other.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{Error, Result};
use crate::manifest::{normalize_spec, Manifest, RepoSpec};
use crate::workspace::Workspace;

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Clone a repository into `target_dir`. The pinned ref is checked out
    /// separately via [`GitOperations::checkout`].
    fn clone(&self, url: &str, ref_name: &str, target_dir: &Path) -> Result<()>;

    /// Fetch `origin` in an existing working copy.
    fn fetch(&self, workdir: &Path) -> Result<()>;

    /// Check out a ref in a working copy.
    fn checkout(&self, workdir: &Path, ref_name: &str) -> Result<()>;

    /// Whether `dir` already holds a working copy.
    fn is_repo(&self, dir: &Path) -> bool;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
pub struct SystemGit;

impl GitOperations for SystemGit {
    fn clone(&self, url: &str, ref_name: &str, target_dir: &Path) -> Result<()> {
        crate::git::clone(url, ref_name, target_dir)
    }

    fn fetch(&self, workdir: &Path) -> Result<()> {
        crate::git::fetch(workdir)
    }

    fn checkout(&self, workdir: &Path, ref_name: &str) -> Result<()> {
        crate::git::checkout(workdir, ref_name)
    }

    fn is_repo(&self, dir: &Path) -> bool {
        crate::git::is_repo(dir)
    }
}

/// The result of successfully processing one [`RepoSpec`]: the application
/// is checked out at `path` at the pinned `ref`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedApp {
    pub name: String,
    pub r#ref: String,
    /// Workspace directory the repository was checked out into.
    pub path: PathBuf,
}

/// A pending manifest location on the worklist. `name` is `None` only for
/// the root project, whose manifest may legitimately be absent.
struct WorkItem {
    manifest_path: PathBuf,
    name: Option<String>,
}

/// Walks the manifest graph and drives checkouts.
pub struct Resolver {
    workspace: Workspace,
    git: Box<dyn GitOperations>,
    apps: Vec<ResolvedApp>,
}

impl Resolver {
    /// Create a resolver that runs real git commands.
    pub fn new(workspace: Workspace) -> Self {
        Self::with_git(workspace, Box::new(SystemGit))
    }

    /// Create a resolver with a custom [`GitOperations`] implementation.
    ///
    /// This is primarily used by tests to inject fakes.
    pub fn with_git(workspace: Workspace, git: Box<dyn GitOperations>) -> Self {
        Self {
            workspace,
            git,
            apps: Vec::new(),
        }
    }

    /// The applications resolved so far, in resolution order.
    pub fn apps(&self) -> &[ResolvedApp] {
        &self.apps
    }

    /// Resolve every application reachable from the root manifest.
    ///
    /// Breadth-first over the manifest graph: each newly resolved
    /// application's workspace is queued so its own manifest gets read in
    /// turn. Returns once the worklist is exhausted; any conflict or
    /// checkout failure aborts immediately.
    pub fn resolve_all(&mut self, root_manifest: &Path) -> Result<()> {
        let mut worklist = VecDeque::new();
        worklist.push_back(WorkItem {
            manifest_path: root_manifest.to_path_buf(),
            name: None,
        });

        while let Some(item) = worklist.pop_front() {
            let manifest = match (Manifest::load_file(&item.manifest_path)?, item.name) {
                (Some(manifest), _) => manifest,
                (None, None) => {
                    debug!(
                        "no manifest at {}, root has no dependencies",
                        item.manifest_path.display()
                    );
                    continue;
                }
                (None, Some(name)) => return Err(Error::IncompatibleDependency { name }),
            };

            for entry in manifest.entries() {
                let spec = normalize_spec(entry)?;
                if let Some(app) = self.resolve_one(&spec)? {
                    worklist.push_back(WorkItem {
                        manifest_path: app.path.join(crate::manifest::MANIFEST_FILE),
                        name: Some(app.name),
                    });
                }
            }
        }

        Ok(())
    }

    /// Resolve a single normalized spec.
    ///
    /// Returns the new [`ResolvedApp`] when the spec produced one, `None`
    /// when the name was already resolved at an identical ref.
    pub fn resolve_one(&mut self, spec: &RepoSpec) -> Result<Option<ResolvedApp>> {
        if let Some(existing) = self.apps.iter().find(|app| app.name == spec.name) {
            if existing.r#ref != spec.r#ref {
                return Err(Error::ConflictingVersion {
                    name: spec.name.clone(),
                    ref1: existing.r#ref.clone(),
                    ref2: spec.r#ref.clone(),
                });
            }
            debug!("app '{}' already resolved at {}", spec.name, spec.r#ref);
            return Ok(None);
        }

        let path = self.workspace.ensure_app_dir(&spec.name)?;
        if self.git.is_repo(&path) {
            info!("refreshing existing checkout {}", path.display());
            self.git.fetch(&path)?;
        } else {
            info!("cloning {} into {}", spec.url, path.display());
            self.git.clone(&spec.url, &spec.r#ref, &path)?;
        }
        self.git.checkout(&path, &spec.r#ref)?;

        let app = ResolvedApp {
            name: spec.name.clone(),
            r#ref: spec.r#ref.clone(),
            path,
        };
        self.apps.push(app.clone());
        Ok(Some(app))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Fake git that materializes canned manifests on "clone" and records
    /// every call.
    struct MockGit {
        /// url -> manifest content written into the checkout
        manifests: HashMap<String, String>,
        clone_calls: Arc<Mutex<Vec<(String, String, PathBuf)>>>,
        checkout_calls: Arc<Mutex<Vec<(PathBuf, String)>>>,
        fetch_calls: Arc<Mutex<Vec<PathBuf>>>,
        cloned: Arc<Mutex<HashSet<PathBuf>>>,
    }

    impl MockGit {
        fn new(manifests: HashMap<String, String>) -> Self {
            Self {
                manifests,
                clone_calls: Arc::new(Mutex::new(Vec::new())),
                checkout_calls: Arc::new(Mutex::new(Vec::new())),
                fetch_calls: Arc::new(Mutex::new(Vec::new())),
                cloned: Arc::new(Mutex::new(HashSet::new())),
            }
        }
    }

    impl GitOperations for MockGit {
        fn clone(&self, url: &str, ref_name: &str, target_dir: &Path) -> Result<()> {
            self.clone_calls.lock().unwrap().push((
                url.to_string(),
                ref_name.to_string(),
                target_dir.to_path_buf(),
            ));
            if let Some(content) = self.manifests.get(url) {
                fs::write(target_dir.join(crate::manifest::MANIFEST_FILE), content)?;
            }
            self.cloned.lock().unwrap().insert(target_dir.to_path_buf());
            Ok(())
        }

        fn fetch(&self, workdir: &Path) -> Result<()> {
            self.fetch_calls.lock().unwrap().push(workdir.to_path_buf());
            Ok(())
        }

        fn checkout(&self, workdir: &Path, ref_name: &str) -> Result<()> {
            self.checkout_calls
                .lock()
                .unwrap()
                .push((workdir.to_path_buf(), ref_name.to_string()));
            Ok(())
        }

        fn is_repo(&self, dir: &Path) -> bool {
            self.cloned.lock().unwrap().contains(dir)
        }
    }

    fn write_root_manifest(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(crate::manifest::MANIFEST_FILE);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_root_without_manifest_has_no_dependencies() {
        let temp_dir = TempDir::new().unwrap();
        let mut resolver = Resolver::with_git(
            Workspace::new(temp_dir.path().join("_build")),
            Box::new(MockGit::new(HashMap::new())),
        );

        resolver
            .resolve_all(&temp_dir.path().join("dev-compose.yml"))
            .unwrap();
        assert!(resolver.apps().is_empty());
    }

    #[test]
    fn test_resolves_single_dependency() {
        let temp_dir = TempDir::new().unwrap();
        let root = write_root_manifest(
            temp_dir.path(),
            "repos:\n  - https://example.com/foo.git\n",
        );

        let git = MockGit::new(HashMap::from([(
            "https://example.com/foo.git".to_string(),
            "repos:\n".to_string(),
        )]));
        let mut resolver =
            Resolver::with_git(Workspace::new(temp_dir.path().join("_build")), Box::new(git));

        resolver.resolve_all(&root).unwrap();

        let apps = resolver.apps();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "foo");
        assert_eq!(apps[0].r#ref, "master");
        assert!(apps[0].path.ends_with("apps/foo"));
    }

    #[test]
    fn test_transitive_dependencies_breadth_first() {
        let temp_dir = TempDir::new().unwrap();
        let root = write_root_manifest(
            temp_dir.path(),
            "repos:\n  - https://example.com/a.git\n  - https://example.com/b.git\n",
        );

        // a depends on c; b is a leaf
        let git = MockGit::new(HashMap::from([
            (
                "https://example.com/a.git".to_string(),
                "repos:\n  - https://example.com/c.git\n".to_string(),
            ),
            ("https://example.com/b.git".to_string(), "repos:\n".to_string()),
            ("https://example.com/c.git".to_string(), "repos:\n".to_string()),
        ]));
        let mut resolver =
            Resolver::with_git(Workspace::new(temp_dir.path().join("_build")), Box::new(git));

        resolver.resolve_all(&root).unwrap();

        let names: Vec<&str> = resolver.apps().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_idempotent_resolution_shared_dependency() {
        let temp_dir = TempDir::new().unwrap();
        let root = write_root_manifest(
            temp_dir.path(),
            "repos:\n  - https://example.com/a.git\n  - https://example.com/b.git\n",
        );

        // a and b both depend on shared at the same (default) ref
        let shared_dep = "repos:\n  - https://example.com/shared.git\n";
        let git = MockGit::new(HashMap::from([
            ("https://example.com/a.git".to_string(), shared_dep.to_string()),
            ("https://example.com/b.git".to_string(), shared_dep.to_string()),
            (
                "https://example.com/shared.git".to_string(),
                "repos:\n".to_string(),
            ),
        ]));

        let clone_calls = git.clone_calls.clone();
        let mut resolver =
            Resolver::with_git(Workspace::new(temp_dir.path().join("_build")), Box::new(git));
        resolver.resolve_all(&root).unwrap();

        let shared: Vec<_> = resolver
            .apps()
            .iter()
            .filter(|a| a.name == "shared")
            .collect();
        assert_eq!(shared.len(), 1);

        // the second declaration was a no-op, not a second clone
        let shared_clones = clone_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(url, _, _)| url.ends_with("shared.git"))
            .count();
        assert_eq!(shared_clones, 1);
    }

    #[test]
    fn test_conflicting_versions_abort() {
        let temp_dir = TempDir::new().unwrap();
        let root = write_root_manifest(
            temp_dir.path(),
            "repos:\n  - https://example.com/a.git\n  - https://example.com/b.git\n",
        );

        let git = MockGit::new(HashMap::from([
            (
                "https://example.com/a.git".to_string(),
                "repos:\n  - {url: 'https://example.com/shared.git', ref: v1}\n".to_string(),
            ),
            (
                "https://example.com/b.git".to_string(),
                "repos:\n  - {url: 'https://example.com/shared.git', ref: v2}\n".to_string(),
            ),
            (
                "https://example.com/shared.git".to_string(),
                "repos:\n".to_string(),
            ),
        ]));

        let mut resolver =
            Resolver::with_git(Workspace::new(temp_dir.path().join("_build")), Box::new(git));
        let result = resolver.resolve_all(&root);

        match result {
            Err(Error::ConflictingVersion { name, ref1, ref2 }) => {
                assert_eq!(name, "shared");
                assert_eq!(ref1, "v1");
                assert_eq!(ref2, "v2");
            }
            other => panic!("expected ConflictingVersion, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_dependency_without_manifest_is_incompatible() {
        let temp_dir = TempDir::new().unwrap();
        let root = write_root_manifest(
            temp_dir.path(),
            "repos:\n  - https://example.com/legacy.git\n",
        );

        // legacy's clone produces no manifest file
        let git = MockGit::new(HashMap::new());
        let mut resolver =
            Resolver::with_git(Workspace::new(temp_dir.path().join("_build")), Box::new(git));

        let result = resolver.resolve_all(&root);
        match result {
            Err(Error::IncompatibleDependency { name }) => assert_eq!(name, "legacy"),
            other => panic!("expected IncompatibleDependency, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_cycle_terminates() {
        let temp_dir = TempDir::new().unwrap();
        let root =
            write_root_manifest(temp_dir.path(), "repos:\n  - https://example.com/a.git\n");

        // a and b depend on each other at the same refs
        let git = MockGit::new(HashMap::from([
            (
                "https://example.com/a.git".to_string(),
                "repos:\n  - https://example.com/b.git\n".to_string(),
            ),
            (
                "https://example.com/b.git".to_string(),
                "repos:\n  - https://example.com/a.git\n".to_string(),
            ),
        ]));

        let mut resolver =
            Resolver::with_git(Workspace::new(temp_dir.path().join("_build")), Box::new(git));
        resolver.resolve_all(&root).unwrap();

        let names: Vec<&str> = resolver.apps().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_spec_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let root = write_root_manifest(temp_dir.path(), "repos:\n  - 42\n");

        let mut resolver = Resolver::with_git(
            Workspace::new(temp_dir.path().join("_build")),
            Box::new(MockGit::new(HashMap::new())),
        );

        let result = resolver.resolve_all(&root);
        assert!(matches!(result, Err(Error::InvalidSpec { .. })));
    }

    #[test]
    fn test_existing_checkout_is_fetched_not_recloned() {
        let temp_dir = TempDir::new().unwrap();
        let root =
            write_root_manifest(temp_dir.path(), "repos:\n  - https://example.com/a.git\n");

        let git = MockGit::new(HashMap::from([(
            "https://example.com/a.git".to_string(),
            "repos:\n".to_string(),
        )]));
        let workspace = Workspace::new(temp_dir.path().join("_build"));

        // mark the checkout as pre-existing
        let app_dir = workspace.ensure_app_dir("a").unwrap();
        git.cloned.lock().unwrap().insert(app_dir.clone());
        fs::write(app_dir.join(crate::manifest::MANIFEST_FILE), "repos:\n").unwrap();

        let clone_calls = git.clone_calls.clone();
        let fetch_calls = git.fetch_calls.clone();
        let mut resolver = Resolver::with_git(workspace, Box::new(git));
        resolver.resolve_all(&root).unwrap();

        assert_eq!(resolver.apps().len(), 1);
        assert!(clone_calls.lock().unwrap().is_empty());
        assert_eq!(*fetch_calls.lock().unwrap(), vec![app_dir]);
    }

    #[test]
    fn test_checkout_runs_for_every_new_app() {
        let temp_dir = TempDir::new().unwrap();
        let root = write_root_manifest(
            temp_dir.path(),
            "repos:\n  - {url: 'https://example.com/a.git', ref: v3.1}\n",
        );

        let git = MockGit::new(HashMap::from([(
            "https://example.com/a.git".to_string(),
            "repos:\n".to_string(),
        )]));
        let checkout_calls = git.checkout_calls.clone();
        let mut resolver =
            Resolver::with_git(Workspace::new(temp_dir.path().join("_build")), Box::new(git));
        resolver.resolve_all(&root).unwrap();

        assert_eq!(resolver.apps()[0].r#ref, "v3.1");
        let calls = checkout_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "v3.1");
    }
}
