//! Selects which Python files a run audits: either the single `--file`
//! the caller named, or every eligible `.py` file under `--repo-path`,
//! filtered by `.argusignore` and a hard-coded `legacy/` exclusion, and
//! optionally narrowed further to a git diff in `ci` mode.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::cli::args::{Cli, Mode};

pub fn select_files(cli: &Cli) -> anyhow::Result<Vec<PathBuf>> {
    if let Some(file) = &cli.file {
        return Ok(vec![file.clone()]);
    }

    let ignore = load_ignore_set(&cli.repo_path)?;
    let mut files = walk_python_files(&cli.repo_path, &ignore);

    if cli.mode == Mode::Ci {
        if let Some(base_ref) = &cli.base_ref {
            let changed = diff_against_base_ref(&cli.repo_path, base_ref)?;
            files.retain(|f| changed.contains(f));
        }
    }

    files.sort();
    Ok(files)
}

fn load_ignore_set(repo_path: &Path) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    builder.add(Glob::new("legacy/**")?);

    let ignore_path = repo_path.join(".argusignore");
    if let Ok(contents) = std::fs::read_to_string(&ignore_path) {
        for line in contents.lines() {
            let pattern = line.trim();
            if pattern.is_empty() || pattern.starts_with('#') {
                continue;
            }
            builder.add(Glob::new(pattern)?);
        }
    }

    Ok(builder.build()?)
}

fn walk_python_files(root: &Path, ignore: &GlobSet) -> Vec<PathBuf> {
    let mut results = Vec::new();
    walk_dir(root, root, ignore, &mut results);
    results
}

fn walk_dir(root: &Path, dir: &Path, ignore: &GlobSet, results: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(&path);
        if ignore.is_match(relative) {
            continue;
        }
        if path.is_dir() {
            walk_dir(root, &path, ignore, results);
        } else if path.extension().is_some_and(|ext| ext == "py") {
            results.push(path);
        }
    }
}

fn diff_against_base_ref(repo_path: &Path, base_ref: &str) -> anyhow::Result<Vec<PathBuf>> {
    let output = std::process::Command::new("git")
        .arg("diff")
        .arg("--name-only")
        .arg(format!("{base_ref}...HEAD"))
        .current_dir(repo_path)
        .output()?;

    if !output.status.success() {
        anyhow::bail!("git diff against {base_ref} failed: {}", String::from_utf8_lossy(&output.stderr));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .map(|line| repo_path.join(line.trim()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "py") && path.exists())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_py_files_and_skips_legacy_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def f(): return 1\n").unwrap();
        std::fs::create_dir(dir.path().join("legacy")).unwrap();
        std::fs::write(dir.path().join("legacy/b.py"), "def g(): return 2\n").unwrap();

        let ignore = load_ignore_set(dir.path()).unwrap();
        let files = walk_python_files(dir.path(), &ignore);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.py"));
    }

    #[test]
    fn honors_argusignore_patterns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def f(): return 1\n").unwrap();
        std::fs::write(dir.path().join("skip.py"), "def g(): return 2\n").unwrap();
        std::fs::write(dir.path().join(".argusignore"), "skip.py\n").unwrap();

        let ignore = load_ignore_set(dir.path()).unwrap();
        let files = walk_python_files(dir.path(), &ignore);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.py"));
    }
}
