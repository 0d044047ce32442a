//! `#include` / `#include_next` resolution.
//!
//! Search order for `#include "file"`: (1) the directory of the including
//! file, (2) each user `-I` directory, (3) each `-isystem` directory, (4)
//! built-in standard directories. `#include <file>` skips (1).
//! `#include_next` starts the search *after* the directory that supplied
//! the currently including file, using the `dir_index` recorded on the
//! include stack entry.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeForm {
    Quoted,
    Angled,
}

/// A located header, along with the index of the search directory it came
/// from (within the combined search-path list), so a later
/// `#include_next` in the same file knows where to resume.
#[derive(Debug, Clone)]
pub struct ResolvedInclude {
    pub path: PathBuf,
    pub dir_index: usize,
}

/// Concatenation of every directory we may search, in priority order:
/// index 0 is always the "directory of the including file" slot (never
/// used for `<...>` or `include_next`, but kept so `dir_index` numbering
/// is stable across both forms).
pub struct SearchDirs<'a> {
    pub including_file_dir: Option<&'a Path>,
    pub incdirs: &'a [PathBuf],
    pub isystem_dirs: &'a [PathBuf],
    pub stdlib_dirs: &'a [PathBuf],
}

impl<'a> SearchDirs<'a> {
    /// Directories to probe, in order, along with their absolute index
    /// into the combined list (stable regardless of quoted/angled form).
    fn ordered(&self, form: IncludeForm) -> Vec<(usize, &'a Path)> {
        let mut out = Vec::new();
        let mut idx = 0usize;
        if let Some(dir) = self.including_file_dir {
            if form == IncludeForm::Quoted {
                out.push((idx, dir));
            }
            idx += 1;
        }
        for d in self.incdirs {
            out.push((idx, d.as_path()));
            idx += 1;
        }
        for d in self.isystem_dirs {
            out.push((idx, d.as_path()));
            idx += 1;
        }
        for d in self.stdlib_dirs {
            out.push((idx, d.as_path()));
            idx += 1;
        }
        out
    }

    pub fn resolve(&self, name: &str, form: IncludeForm) -> Option<ResolvedInclude> {
        for (idx, dir) in self.ordered(form) {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(ResolvedInclude { path: candidate, dir_index: idx });
            }
        }
        None
    }

    /// `#include_next`: resume scanning strictly after `after_dir_index`.
    pub fn resolve_next(&self, name: &str, after_dir_index: usize) -> Option<ResolvedInclude> {
        for (idx, dir) in self.ordered(IncludeForm::Angled) {
            if idx <= after_dir_index {
                continue;
            }
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(ResolvedInclude { path: candidate, dir_index: idx });
            }
        }
        None
    }
}

/// Security: verify a resolved path stays within a sandbox root (used when
/// a project wants to restrict includes to its own tree via `sysroot`).
/// Rejects the candidate outright if it isn't actually inside the
/// canonicalized root, closing symlink/`..`-escape bypasses.
pub fn path_is_within_root(candidate: &Path, root: &Path) -> std::io::Result<bool> {
    let canonical_root = root.canonicalize()?;
    let canonical_candidate = candidate.canonicalize()?;
    Ok(canonical_candidate.starts_with(&canonical_root))
}

/// One frame on the include stack: the resolved path and the dir_index it
/// was found at, so a nested `#include_next` in that file knows where to
/// resume the search.
#[derive(Debug, Clone)]
pub struct IncludeFrame {
    pub path: PathBuf,
    pub dir_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn include_next_resumes_after_supplying_dir() {
        let dir1 = tempdir().unwrap();
        let dir2 = tempdir().unwrap();
        fs::write(dir1.path().join("foo.h"), "// first\n").unwrap();
        fs::write(dir2.path().join("foo.h"), "// second\n").unwrap();

        let incdirs = vec![dir1.path().to_path_buf(), dir2.path().to_path_buf()];
        let dirs = SearchDirs {
            including_file_dir: None,
            incdirs: &incdirs,
            isystem_dirs: &[],
            stdlib_dirs: &[],
        };
        let first = dirs.resolve("foo.h", IncludeForm::Angled).unwrap();
        assert_eq!(first.path, dir1.path().join("foo.h"));

        let next = dirs.resolve_next("foo.h", first.dir_index).unwrap();
        assert_eq!(next.path, dir2.path().join("foo.h"));
    }

    #[test]
    fn quoted_include_checks_including_file_dir_first() {
        let local = tempdir().unwrap();
        let other = tempdir().unwrap();
        fs::write(local.path().join("x.h"), "local\n").unwrap();
        fs::write(other.path().join("x.h"), "other\n").unwrap();

        let incdirs = vec![other.path().to_path_buf()];
        let dirs = SearchDirs {
            including_file_dir: Some(local.path()),
            incdirs: &incdirs,
            isystem_dirs: &[],
            stdlib_dirs: &[],
        };
        let resolved = dirs.resolve("x.h", IncludeForm::Quoted).unwrap();
        assert_eq!(resolved.path, local.path().join("x.h"));
    }

    #[test]
    fn angled_include_skips_including_file_dir() {
        let local = tempdir().unwrap();
        let other = tempdir().unwrap();
        fs::write(local.path().join("x.h"), "local\n").unwrap();
        fs::write(other.path().join("x.h"), "other\n").unwrap();

        let incdirs = vec![other.path().to_path_buf()];
        let dirs = SearchDirs {
            including_file_dir: Some(local.path()),
            incdirs: &incdirs,
            isystem_dirs: &[],
            stdlib_dirs: &[],
        };
        let resolved = dirs.resolve("x.h", IncludeForm::Angled).unwrap();
        assert_eq!(resolved.path, other.path().join("x.h"));
    }

    #[test]
    fn root_containment_rejects_escape() {
        let root = tempdir().unwrap();
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("evil.h"), "").unwrap();
        assert!(!path_is_within_root(&outside.path().join("evil.h"), root.path()).unwrap());
        fs::write(root.path().join("ok.h"), "").unwrap();
        assert!(path_is_within_root(&root.path().join("ok.h"), root.path()).unwrap());
    }
}
