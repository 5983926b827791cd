use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("git clone of {url} (branch {branch}) failed: {cause}")]
    CloneFailed {
        url: String,
        branch: String,
        cause: String,
    },

    #[error("git clone of {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to prepare checkout directory: {0}")]
    Workspace(#[source] std::io::Error),
}

/// A local checkout handed to the pipeline
#[derive(Debug)]
pub enum FetchedRepo {
    /// Removed from disk when dropped
    Temporary(TempDir),
    /// An existing directory owned by someone else
    Existing(PathBuf),
}

impl FetchedRepo {
    pub fn path(&self) -> &Path {
        match self {
            Self::Temporary(dir) => dir.path(),
            Self::Existing(path) => path,
        }
    }
}

/// Acquires a checkout of exactly the requested branch
#[async_trait]
pub trait RepoFetcher: Send + Sync {
    async fn fetch(&self, url: &str, branch: &str) -> Result<FetchedRepo, FetchError>;
}

/// Shallow single-branch clone through the `git` executable
#[derive(Debug, Clone)]
pub struct GitFetcher {
    clone_timeout: Duration,
}

impl GitFetcher {
    pub fn new(clone_timeout: Duration) -> Self {
        Self { clone_timeout }
    }

    fn clone_args<'a>(url: &'a str, branch: &'a str, dest: &'a Path) -> Vec<&'a OsStr> {
        let mut args: Vec<&OsStr> = [
            "clone",
            "--quiet",
            "--depth",
            "1",
            "--single-branch",
            "--branch",
            branch,
            "--",
            url,
        ]
        .into_iter()
        .map(OsStr::new)
        .collect();
        args.push(dest.as_os_str());
        args
    }
}

#[async_trait]
impl RepoFetcher for GitFetcher {
    async fn fetch(&self, url: &str, branch: &str) -> Result<FetchedRepo, FetchError> {
        let dir = tempfile::Builder::new()
            .prefix("repolens-")
            .tempdir()
            .map_err(FetchError::Workspace)?;

        log::info!("Cloning {url} (branch {branch})");
        let child = Command::new("git")
            .args(Self::clone_args(url, branch, dir.path()))
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match timeout(self.clone_timeout, child).await {
            Ok(result) => result.map_err(FetchError::Spawn)?,
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    secs: self.clone_timeout.as_secs(),
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let cause = if stderr.is_empty() {
                format!("git exited with {}", output.status)
            } else {
                stderr
            };
            return Err(FetchError::CloneFailed {
                url: url.to_string(),
                branch: branch.to_string(),
                cause,
            });
        }

        log::debug!("Cloned {url} into {}", dir.path().display());
        Ok(FetchedRepo::Temporary(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn git(repo: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .arg("-C")
            .arg(repo)
            .args(args)
            .output()
            .await
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    async fn origin_with_branch(branch: &str) -> Option<TempDir> {
        let dir = TempDir::new().expect("tempdir");
        let repo = dir.path();
        if !git(repo, &["init", "--quiet"]).await {
            return None;
        }
        let head = format!("refs/heads/{branch}");
        assert!(git(repo, &["symbolic-ref", "HEAD", &head]).await);
        assert!(git(repo, &["config", "user.email", "test@example.com"]).await);
        assert!(git(repo, &["config", "user.name", "Test"]).await);
        tokio::fs::write(repo.join("lib.rs"), "pub fn answer() -> u32 { 42 }\n")
            .await
            .expect("write");
        assert!(git(repo, &["add", "."]).await);
        assert!(git(repo, &["commit", "--quiet", "-m", "init"]).await);
        Some(dir)
    }

    #[tokio::test]
    async fn clones_the_requested_branch() {
        let Some(origin) = origin_with_branch("trunk").await else {
            return; // git unavailable
        };
        let url = format!("file://{}", origin.path().display());

        let fetched = GitFetcher::new(Duration::from_secs(60))
            .fetch(&url, "trunk")
            .await
            .expect("clone");
        assert!(fetched.path().join("lib.rs").is_file());

        let path = fetched.path().to_path_buf();
        drop(fetched);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_branch_is_a_fetch_error() {
        let Some(origin) = origin_with_branch("trunk").await else {
            return;
        };
        let url = format!("file://{}", origin.path().display());

        let err = GitFetcher::new(Duration::from_secs(60))
            .fetch(&url, "does-not-exist")
            .await
            .expect_err("branch is missing");
        match err {
            FetchError::CloneFailed { branch, cause, .. } => {
                assert_eq!(branch, "does-not-exist");
                assert!(!cause.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn url_is_passed_after_double_dash() {
        let dest = Path::new("/tmp/out");
        let args = GitFetcher::clone_args("--upload-pack=evil", "main", dest);
        let dash = args.iter().position(|a| *a == "--").expect("separator");
        assert_eq!(args[dash + 1], "--upload-pack=evil");
        assert_eq!(args.last().copied(), Some(dest.as_os_str()));
    }
}
