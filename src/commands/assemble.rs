//! Assemble command implementation
//!
//! The assemble command runs the two pipeline stages in sequence:
//! 1. Resolution: walk the manifest graph, check every reachable
//!    application out into the workspace
//! 2. Merging: fold the root's and every resolved application's compose
//!    descriptor into the aggregate file

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use dev_compose::output::{emoji, OutputConfig};

/// Arguments for the assemble command
#[derive(Args, Debug)]
pub struct AssembleArgs {
    /// Path to the root manifest file
    #[arg(short, long, value_name = "PATH", env = "DEV_COMPOSE_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Output root the apps are checked out and the aggregate is written
    /// under
    #[arg(short, long, value_name = "PATH", env = "DEV_COMPOSE_OUTPUT")]
    pub output_root: Option<PathBuf>,

    /// Show detailed progress information
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the assemble command
pub fn execute(args: AssembleArgs, output: &OutputConfig) -> Result<()> {
    use dev_compose::manifest::MANIFEST_FILE;
    use dev_compose::merger::Merger;
    use dev_compose::resolver::Resolver;
    use dev_compose::workspace::{Workspace, DEFAULT_OUTPUT_ROOT};
    use std::time::Instant;

    let start_time = Instant::now();

    let manifest_path = args.manifest.unwrap_or_else(|| PathBuf::from(MANIFEST_FILE));
    let workspace = Workspace::new(
        args.output_root
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT)),
    );

    // The root project's descriptor lives next to the root manifest
    let root_dir = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    if !args.quiet {
        println!("{} dev-compose assemble", emoji(output, "📦", "[ASSEMBLE]"));
        println!();
    }

    if !args.quiet && args.verbose {
        println!("Resolving manifest graph from: {}", manifest_path.display());
    }
    let mut resolver = Resolver::new(workspace.clone());
    resolver.resolve_all(&manifest_path)?;

    if !args.quiet && args.verbose {
        for app in resolver.apps() {
            println!("   {} @ {} -> {}", app.name, app.r#ref, app.path.display());
        }
    }

    let merger = Merger::new(workspace);
    let aggregate = merger.merge_all(&root_dir, resolver.apps())?;
    let aggregate_path = merger.write(&aggregate)?;

    if !args.quiet {
        let duration = start_time.elapsed();
        println!(
            "{} Assembled {} service(s) from {} app(s) in {:.2}s",
            emoji(output, "✅", "[OK]"),
            aggregate.services.len(),
            resolver.apps().len() + 1,
            duration.as_secs_f64()
        );
        println!();
        println!("docker-compose -f {} up", aggregate_path.display());
    }

    Ok(())
}
