//! Filesystem scanner.
//!
//! Lazily walks a project tree depth-first (entries sorted by name), skipping
//! excluded directory names and filtering files by extension. Symbolic links
//! are never followed into directories; a symlinked file is only yielded when
//! its target stays inside the scanned root.

use crate::core::error::DeployCheckError;
use rustc_hash::FxHashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute (or root-joined) path on disk.
    pub path: PathBuf,
    /// `/`-separated path relative to the scan base.
    pub relative: String,
    pub size: u64,
    pub is_dir: bool,
}

/// Render `path` relative to `base` with `/` separators.
pub fn relative_slash(path: &Path, base: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize an extension list: lowercase, no leading dot.
pub fn normalize_extensions<I, S>(exts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    exts.into_iter()
        .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            extensions.iter().any(|x| *x == e)
        })
        .unwrap_or(false)
}

fn ensure_readable_dir(dir: &Path) -> Result<(), DeployCheckError> {
    let meta = fs::metadata(dir).map_err(|e| DeployCheckError::access(dir, e))?;
    if !meta.is_dir() {
        return Err(DeployCheckError::access(dir, "not a directory"));
    }
    fs::read_dir(dir).map_err(|e| DeployCheckError::access(dir, e))?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    base: Option<PathBuf>,
    exclude: FxHashSet<String>,
    extensions: Vec<String>,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Scanner {
            root: root.into(),
            base: None,
            exclude: FxHashSet::default(),
            extensions: Vec::new(),
        }
    }

    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude
            .extend(names.into_iter().map(|n| n.as_ref().to_string()));
        self
    }

    /// Only yield files with one of these extensions. Empty means all files.
    pub fn extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = normalize_extensions(exts);
        self
    }

    /// Compute `FileRecord::relative` against `base` instead of the scan root.
    pub fn relative_to(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn iter(&self) -> Result<ScanIter, DeployCheckError> {
        ensure_readable_dir(&self.root)?;
        let canonical_root =
            fs::canonicalize(&self.root).map_err(|e| DeployCheckError::access(&self.root, e))?;
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        Ok(ScanIter {
            walker,
            root: self.root.clone(),
            canonical_root,
            base: self.base.clone().unwrap_or_else(|| self.root.clone()),
            exclude: self.exclude.clone(),
            extensions: self.extensions.clone(),
        })
    }
}

pub struct ScanIter {
    walker: walkdir::IntoIter,
    root: PathBuf,
    canonical_root: PathBuf,
    base: PathBuf,
    exclude: FxHashSet<String>,
    extensions: Vec<String>,
}

impl ScanIter {
    fn is_excluded(&self, name: &OsStr) -> bool {
        name.to_str().is_some_and(|n| self.exclude.contains(n))
    }

    fn symlink_stays_inside(&self, path: &Path) -> bool {
        match fs::canonicalize(path) {
            Ok(target) => target.is_file() && target.starts_with(&self.canonical_root),
            Err(_) => false,
        }
    }

    fn record(&self, path: &Path) -> Result<FileRecord, DeployCheckError> {
        let meta = fs::metadata(path).map_err(|e| DeployCheckError::access(path, e))?;
        Ok(FileRecord {
            path: path.to_path_buf(),
            relative: relative_slash(path, &self.base),
            size: meta.len(),
            is_dir: meta.is_dir(),
        })
    }
}

impl Iterator for ScanIter {
    type Item = Result<FileRecord, DeployCheckError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    return Some(Err(DeployCheckError::access(path, e)));
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                if entry.depth() > 0 && self.is_excluded(entry.file_name()) {
                    self.walker.skip_current_dir();
                }
                continue;
            }
            if file_type.is_symlink() && !self.symlink_stays_inside(entry.path()) {
                continue;
            }
            if !has_extension(entry.path(), &self.extensions) {
                continue;
            }
            return Some(self.record(entry.path()));
        }
    }
}

/// Immediate entries of `dir` (files and directories), sorted by name.
pub fn list_dir(dir: &Path) -> Result<Vec<FileRecord>, DeployCheckError> {
    let mut records = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| DeployCheckError::access(dir, e))? {
        let entry = entry.map_err(|e| DeployCheckError::access(dir, e))?;
        let path = entry.path();
        let meta = match fs::metadata(&path) {
            Ok(m) => m,
            // Dangling symlink.
            Err(_) => continue,
        };
        records.push(FileRecord {
            relative: entry.file_name().to_string_lossy().into_owned(),
            path,
            size: meta.len(),
            is_dir: meta.is_dir(),
        });
    }
    records.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str, body: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, body).unwrap();
    }

    fn relatives(scanner: &Scanner) -> Vec<String> {
        scanner
            .iter()
            .unwrap()
            .map(|r| r.unwrap().relative)
            .collect()
    }

    #[test]
    fn walks_depth_first_sorted_and_filters_extensions() {
        let tmp = tempdir().unwrap();
        touch(tmp.path(), "b/z.jsx", "x");
        touch(tmp.path(), "a.js", "x");
        touch(tmp.path(), "b/a.tsx", "x");
        touch(tmp.path(), "readme.md", "x");

        let scanner = Scanner::new(tmp.path()).extensions(["js", ".JSX", "tsx"]);
        assert_eq!(relatives(&scanner), vec!["a.js", "b/a.tsx", "b/z.jsx"]);
    }

    #[test]
    fn skips_excluded_directories_but_not_root() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("node_modules");
        touch(&root, "keep.js", "x");
        touch(&root, "node_modules/dep.js", "x");
        touch(&root, "app/.next/cache.js", "x");

        let scanner = Scanner::new(&root).exclude(["node_modules", ".next"]);
        assert_eq!(relatives(&scanner), vec!["keep.js"]);
    }

    #[test]
    fn missing_root_is_access_error() {
        let tmp = tempdir().unwrap();
        let err = Scanner::new(tmp.path().join("absent")).iter().err().unwrap();
        assert!(matches!(err, DeployCheckError::AccessError { .. }));
    }

    #[test]
    fn records_sizes_and_relative_base() {
        let tmp = tempdir().unwrap();
        touch(tmp.path(), "components/A.jsx", "12345");
        let scanner = Scanner::new(tmp.path().join("components")).relative_to(tmp.path());
        let records: Vec<_> = scanner.iter().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relative, "components/A.jsx");
        assert_eq!(records[0].size, 5);
        assert!(!records[0].is_dir);
    }

    #[cfg(unix)]
    #[test]
    fn does_not_follow_symlinks_out_of_root() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("root");
        touch(&root, "inside.js", "x");
        touch(tmp.path(), "outside/secret.js", "x");
        std::os::unix::fs::symlink(tmp.path().join("outside"), root.join("linked_dir")).unwrap();
        std::os::unix::fs::symlink(
            tmp.path().join("outside/secret.js"),
            root.join("linked.js"),
        )
        .unwrap();
        std::os::unix::fs::symlink(root.join("inside.js"), root.join("alias.js")).unwrap();
        // A cycle back to the root must not recurse forever.
        std::os::unix::fs::symlink(&root, root.join("loop")).unwrap();

        let scanner = Scanner::new(&root);
        assert_eq!(relatives(&scanner), vec!["alias.js", "inside.js"]);
    }

    #[test]
    fn list_dir_marks_directories() {
        let tmp = tempdir().unwrap();
        touch(tmp.path(), "b.png", "x");
        touch(tmp.path(), "a/c.png", "x");
        let entries = list_dir(tmp.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].relative, "a");
        assert!(entries[0].is_dir);
        assert_eq!(entries[1].relative, "b.png");
        assert!(!entries[1].is_dir);
    }
}
