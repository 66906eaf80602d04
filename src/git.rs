use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Synthetic identity configured into every sandbox so commits never depend
/// on the ambient user's `~/.gitconfig`.
pub const SANDBOX_USER_NAME: &str = "driftool";
pub const SANDBOX_USER_EMAIL: &str = "driftool@localhost";

/// Thin wrapper around `git` subprocess invocations rooted at a fixed
/// working directory (a sandbox).
///
/// Every method shells out via `std::process::Command` and checks the exit
/// code explicitly; none of them attempt to reimplement Git's own semantics.
pub struct GitCommand {
    dir: PathBuf,
    quiet: bool,
}

impl GitCommand {
    pub fn new(dir: &Path, quiet: bool) -> Self {
        Self {
            dir: dir.to_path_buf(),
            quiet,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.dir).args(args);
        cmd
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        self.command(args)
            .output()
            .with_context(|| format!("executing git {} in {}", args.join(" "), self.dir.display()))
    }

    fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("git {} failed in {}: {}", args.join(" "), self.dir.display(), stderr);
        }
        String::from_utf8(output.stdout)
            .with_context(|| format!("git {} produced non-UTF-8 output", args.join(" ")))
    }

    /// Configure the synthetic identity used for every commit this sandbox creates.
    pub fn configure_identity(&self) -> Result<()> {
        self.run_checked(&["config", "user.name", SANDBOX_USER_NAME])?;
        self.run_checked(&["config", "user.email", SANDBOX_USER_EMAIL])?;
        Ok(())
    }

    /// `git init`, used when materialising a sandbox from a plain file copy
    /// rather than from an existing `.git` directory.
    pub fn init(&self) -> Result<()> {
        let mut args = vec!["init"];
        if self.quiet {
            args.push("--quiet");
        }
        self.run_checked(&args)?;
        Ok(())
    }

    /// Raw `git branch --all` output, one ref per line.
    pub fn branch_all(&self) -> Result<String> {
        self.run_checked(&["branch", "--all"])
    }

    /// `%(committerdate:short)~%(refname:short)` per local branch, used to
    /// determine branch activity for the timeout check.
    pub fn branch_activity(&self) -> Result<String> {
        self.run_checked(&[
            "branch",
            "-a",
            "--format=%(committerdate:short)~%(refname:short)",
        ])
    }

    pub fn checkout(&self, branch: &str) -> Result<()> {
        let mut args = vec!["checkout"];
        if self.quiet {
            args.push("--quiet");
        }
        args.push(branch);
        self.run_checked(&args)?;
        Ok(())
    }

    pub fn reset_hard(&self) -> Result<()> {
        self.run_checked(&["reset", "--hard"])?;
        Ok(())
    }

    /// `git clean -f -d -x`: removes untracked files, directories, and
    /// ignored files. Required between merge attempts so stray build
    /// artifacts from one branch never leak into the next.
    pub fn clean_fdx(&self) -> Result<()> {
        self.run_checked(&["clean", "-f", "-d", "-x"])?;
        Ok(())
    }

    pub fn add_all(&self) -> Result<()> {
        self.run_checked(&["add", "--all"])?;
        Ok(())
    }

    pub fn commit(&self, message: &str) -> Result<()> {
        self.run_checked(&["commit", "--quiet", "--allow-empty", "-m", message])?;
        Ok(())
    }

    pub fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.run_checked(&["pull", remote, branch])?;
        Ok(())
    }

    /// Attempt a merge of `branch` into the current branch. Returns the raw
    /// merge output: a non-zero exit is expected when the merge conflicts
    /// and is not treated as an error here, only the textual output matters
    /// (conflict markers are counted by the caller).
    ///
    /// `--no-commit --no-ff` is load-bearing: without it, a merge that is
    /// fast-forwardable or auto-mergeable without conflict would commit (or
    /// move the branch ref) immediately, and `merge_abort` is a no-op once
    /// there is no `MERGE_HEAD` to abort. Forcing every merge attempt to
    /// stop short of a commit means `merge_abort` always has a merge in
    /// progress to undo, so the checked-out branch's ref never moves.
    pub fn merge(&self, branch: &str) -> Result<Output> {
        self.run(&["merge", "--no-edit", "--no-commit", "--no-ff", branch])
    }

    pub fn merge_abort(&self) -> Result<()> {
        self.run_checked(&["merge", "--abort"])?;
        Ok(())
    }

    /// Read the post-merge working tree content of `path`, used to scan for
    /// conflict markers. Returns `None` if the file is not valid UTF-8 (a
    /// conflicted binary or non-text file contributes zero to the count).
    pub fn read_worktree_file(&self, path: &Path) -> Option<String> {
        std::fs::read(self.dir.join(path))
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// Lists every file in the working tree, relative to `dir`, excluding `.git`.
    pub fn list_worktree_files(&self) -> Result<Vec<PathBuf>> {
        let output = self.run_checked(&["ls-files"])?;
        Ok(output.lines().map(PathBuf::from).collect())
    }
}
