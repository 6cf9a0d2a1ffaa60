//! Git provenance of ROS packages, read with the host `git` executable.

mod branch;
mod src_uri;

use std::{
    path::{Path, PathBuf},
    process::Command,
};

pub use branch::select_branch;
pub use src_uri::{format_src_uri, parse_remote};

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("could not find the git executable")]
    NotFound(#[source] which::Error),

    #[error("could not execute git")]
    Io(#[from] std::io::Error),

    #[error("`git {command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("{0} is not inside a git work tree")]
    NotARepository(PathBuf),
}

/// The host `git` executable.
#[derive(Debug, Clone)]
pub struct Git {
    executable: PathBuf,
}

impl Git {
    /// Find `git` on the `PATH`.
    pub fn find() -> Result<Self, GitError> {
        let executable = which::which("git").map_err(GitError::NotFound)?;
        tracing::debug!("using git at {}", executable.display());
        Ok(Self { executable })
    }

    fn command(&self, dir: &Path) -> Command {
        let mut command = Command::new(&self.executable);
        command.current_dir(dir);
        command
    }

    /// Run `git <args>` in `dir` and return its trimmed stdout.
    pub fn run(&self, dir: &Path, args: &[&str]) -> Result<String, GitError> {
        let output = self.command(dir).args(args).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!("`git {}` in {} failed: {stderr}", args.join(" "), dir.display());
            return Err(GitError::CommandFailed {
                command: args.join(" "),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Where the sources of a package come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitProvenance {
    /// Root of the work tree containing the package
    pub work_tree: PathBuf,
    /// The `SRC_URI` derived from the remote
    pub src_uri: Option<String>,
    pub branch: Option<String>,
    /// Hash of `HEAD`
    pub commit: Option<String>,
    /// Last path component of the work tree
    pub repository_name: Option<String>,
    /// The nearest tag reachable from `HEAD`
    pub tag: Option<String>,
}

impl GitProvenance {
    /// Inspect the repository containing `path`.
    ///
    /// Only a missing repository is an error, every other piece of
    /// information is left unset when git cannot provide it.
    pub fn discover(git: &Git, path: &Path, distro: &str) -> Result<Self, GitError> {
        let work_tree = git
            .run(path, &["rev-parse", "--show-toplevel"])
            .map(PathBuf::from)
            .map_err(|_| GitError::NotARepository(path.to_path_buf()))?;

        let src_uri = remote_url(git, &work_tree).and_then(|remote| {
            let uri = format_src_uri(&remote);
            if uri.is_none() {
                tracing::warn!("could not turn remote \"{remote}\" into a SRC_URI");
            }
            uri
        });

        let repository_name = work_tree
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        Ok(Self {
            src_uri,
            branch: current_branch(git, &work_tree, distro),
            commit: git.run(&work_tree, &["rev-parse", "HEAD"]).ok(),
            repository_name,
            tag: git
                .run(&work_tree, &["describe", "--tags", "--abbrev=0"])
                .ok(),
            work_tree,
        })
    }

    /// The path of `package_dir` relative to the work tree, `/` separated.
    pub fn package_subpath(&self, package_dir: &Path) -> String {
        let package_dir = package_dir
            .canonicalize()
            .unwrap_or_else(|_| package_dir.to_path_buf());
        let work_tree = self
            .work_tree
            .canonicalize()
            .unwrap_or_else(|_| self.work_tree.clone());

        package_dir
            .strip_prefix(&work_tree)
            .map(|relative| {
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default()
    }
}

/// The URL of `origin`, or of the first remote if there is no `origin`.
fn remote_url(git: &Git, work_tree: &Path) -> Option<String> {
    let remotes = git.run(work_tree, &["remote"]).ok()?;
    let remote = remotes
        .lines()
        .find(|remote| *remote == "origin")
        .or_else(|| remotes.lines().next())?;
    git.run(work_tree, &["remote", "get-url", remote]).ok()
}

fn current_branch(git: &Git, work_tree: &Path, distro: &str) -> Option<String> {
    if let Ok(branch) = git.run(work_tree, &["symbolic-ref", "--quiet", "--short", "HEAD"]) {
        return Some(branch);
    }

    let refs = git
        .run(
            work_tree,
            &["branch", "--all", "--contains", "HEAD", "--format=%(refname)"],
        )
        .ok()?;
    let candidates = branch::parse_refnames(&refs);
    tracing::debug!("HEAD is detached, branches containing it: {candidates:?}");
    select_branch(&candidates, distro)
}
