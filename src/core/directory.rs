//! File-selection and plain directory-tree copying, used to materialise and
//! restrict the contents of a sandbox.

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;

/// Deletes every file under `root` (skipping `.git`) whose basename matches
/// none of `patterns`. Symbolic links are unconditionally removed — they
/// cannot be meaningfully merged once a sandbox is torn down. Returns the
/// number of files removed.
pub fn keep_whitelist(patterns: &[Regex], root: &Path) -> Result<usize> {
    visit(root, root, &mut |_path, relative, is_symlink| {
        if is_symlink {
            return true;
        }
        let name = relative.rsplit('/').next().unwrap_or(relative);
        !patterns.iter().any(|p| p.is_match(name))
    })
}

/// Deletes every file under `root` (skipping `.git`) whose root-relative
/// path matches any of `patterns`. Returns the number of files removed.
pub fn purge_blacklist(patterns: &[Regex], root: &Path) -> Result<usize> {
    visit(root, root, &mut |_path, relative, _is_symlink| {
        patterns.iter().any(|p| p.is_match(relative))
    })
}

fn visit(
    root: &Path,
    dir: &Path,
    should_delete: &mut dyn FnMut(&Path, &str, bool) -> bool,
) -> Result<usize> {
    let mut deleted = 0;
    let entries = fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.file_name().and_then(|n| n.to_str()) == Some(".git") {
            continue;
        }
        let file_type = entry.file_type()?;
        let relative = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");

        if file_type.is_symlink() {
            if should_delete(&path, &relative, true) {
                fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
                deleted += 1;
            }
        } else if file_type.is_dir() {
            deleted += visit(root, &path, should_delete)?;
        } else if should_delete(&path, &relative, false) {
            fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
            deleted += 1;
        }
    }
    Ok(deleted)
}

/// Counts regular files under `root`, skipping `.git`. Used for diagnostic
/// log lines before/after a sandbox mutation.
pub fn count_files(root: &Path) -> usize {
    let mut count = 0;
    let _ = count_visit(root, &mut count);
    count
}

fn count_visit(dir: &Path, count: &mut usize) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.file_name().and_then(|n| n.to_str()) == Some(".git") {
            continue;
        }
        if entry.file_type()?.is_dir() {
            count_visit(&path, count)?;
        } else {
            *count += 1;
        }
    }
    Ok(())
}

/// Copies `src` into `dst` (which is created if missing). Symlinks are
/// dereferenced (their target's content is copied); dangling symlinks are
/// stripped rather than copied.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).with_context(|| format!("creating directory {}", dst.display()))?;
    for entry in fs::read_dir(src).with_context(|| format!("reading directory {}", src.display()))? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let source_path = entry.path();
        let target = dst.join(entry.file_name());

        if file_type.is_symlink() {
            match fs::metadata(&source_path) {
                Ok(meta) if meta.is_dir() => copy_dir_all(&source_path, &target)?,
                Ok(_) => {
                    fs::copy(&source_path, &target).with_context(|| {
                        format!("copying {} to {}", source_path.display(), target.display())
                    })?;
                }
                Err(_) => {}
            }
        } else if file_type.is_dir() {
            copy_dir_all(&source_path, &target)?;
        } else {
            fs::copy(&source_path, &target).with_context(|| {
                format!("copying {} to {}", source_path.display(), target.display())
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_purge_blacklist_removes_matching_files() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("keep.rs"), "fn main() {}");
        write(&dir.path().join("secrets.lock"), "junk");

        let patterns = [Regex::new(r"\.lock$").unwrap()];
        let removed = purge_blacklist(&patterns, dir.path()).unwrap();

        assert_eq!(removed, 1);
        assert!(dir.path().join("keep.rs").exists());
        assert!(!dir.path().join("secrets.lock").exists());
    }

    #[test]
    fn test_keep_whitelist_retains_only_matches() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("a.rs"), "fn main() {}");
        write(&dir.path().join("b.txt"), "notes");
        write(&dir.path().join(".git/HEAD"), "ref: refs/heads/main");

        let patterns = [Regex::new(r"\.rs$").unwrap()];
        keep_whitelist(&patterns, dir.path()).unwrap();

        assert!(dir.path().join("a.rs").exists());
        assert!(!dir.path().join("b.txt").exists());
        assert!(dir.path().join(".git/HEAD").exists());
    }

    #[test]
    fn test_count_files_skips_git_dir() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("a.rs"), "x");
        write(&dir.path().join("nested/b.rs"), "y");
        write(&dir.path().join(".git/objects/pack"), "z");

        assert_eq!(count_files(dir.path()), 2);
    }

    #[test]
    fn test_copy_dir_all_copies_nested_tree() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        write(&src.path().join("nested/file.txt"), "hello");

        copy_dir_all(src.path(), dst.path()).unwrap();

        assert_eq!(
            fs::read_to_string(dst.path().join("nested/file.txt")).unwrap(),
            "hello"
        );
    }

    #[test]
    fn test_copy_dir_all_strips_dangling_symlink() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        write(&src.path().join("real.txt"), "hello");

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(src.path().join("missing.txt"), src.path().join("dangling"))
                .unwrap();
            copy_dir_all(src.path(), dst.path()).unwrap();
            assert!(!dst.path().join("dangling").exists());
            assert!(dst.path().join("real.txt").exists());
        }
    }
}
