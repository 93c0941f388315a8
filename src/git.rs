use std::path::Path;
use std::process::Command;

use crate::error::Error;

/// Clone a repository into `target_dir`.
///
/// This uses the system git command, which automatically handles:
/// - SSH keys from ~/.ssh/
/// - Git credential helpers
/// - Personal access tokens
/// - Any authentication configured in ~/.gitconfig
///
/// The clone is full rather than shallow: the pinned ref is checked out as a
/// separate step and may name a commit that a shallow clone would not carry.
pub fn clone(url: &str, ref_name: &str, target_dir: &Path) -> Result<(), Error> {
    let output = Command::new("git")
        .arg("clone")
        .arg(url)
        .arg(target_dir)
        .output()
        .map_err(|e| Error::GitClone {
            url: url.to_string(),
            r#ref: ref_name.to_string(),
            message: e.to_string(),
            hint: None,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Provide helpful error message for common auth failures
        let hint = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            Some(
                "Make sure you have access to the repository: SSH key added to \
                 ssh-agent, git credentials configured, or a personal access token set up"
                    .to_string(),
            )
        } else {
            None
        };

        return Err(Error::GitClone {
            url: url.to_string(),
            r#ref: ref_name.to_string(),
            message: stderr.trim_end().to_string(),
            hint,
        });
    }

    Ok(())
}

/// Fetch `origin` in an existing working copy so a ref published after the
/// original clone can still be checked out.
pub fn fetch(workdir: &Path) -> Result<(), Error> {
    run_in_repo(workdir, &["fetch", "origin"])
}

/// Check out a specific ref (branch, tag, or commit) in a working copy.
pub fn checkout(workdir: &Path, ref_name: &str) -> Result<(), Error> {
    run_in_repo(workdir, &["checkout", ref_name])
}

/// Whether `dir` already holds a git working copy.
pub fn is_repo(dir: &Path) -> bool {
    dir.join(".git").is_dir()
}

fn run_in_repo(workdir: &Path, args: &[&str]) -> Result<(), Error> {
    let output = Command::new("git")
        .arg("-C")
        .arg(workdir)
        .args(args)
        .output()
        .map_err(|e| Error::GitCommand {
            command: args.join(" "),
            path: workdir.display().to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::GitCommand {
            command: args.join(" "),
            path: workdir.display().to_string(),
            stderr: stderr.trim_end().to_string(),
        });
    }

    Ok(())
}
