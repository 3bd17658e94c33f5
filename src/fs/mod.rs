// src/fs/mod.rs

//! Filesystem access used by the coverage step and the cleanup hook.
//!
//! Coverage artifacts are located by walking the target's object root, and
//! gcov reports are written next to the coverage database. Both go through
//! [`FileSystem`] so tests can run against [`mock::MockFileSystem`].

use std::fmt::Debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Create (or truncate) `path` and write `contents`, creating parent
    /// directories as needed. The file is closed before this returns.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// True if `path` itself is a symbolic link (not followed).
    fn is_symlink(&self, path: &Path) -> bool;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Remove a directory tree. Missing paths are not an error.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        let mut file = fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        file.write_all(contents).with_context(|| format!("writing to file {:?}", path))?;
        file.flush().with_context(|| format!("flushing file {:?}", path))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        path.is_symlink()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing dir {:?}", path)),
        }
    }
}

/// Walk `root` depth-first and return the first regular file accepted by
/// `matches`.
///
/// Which match is "first" depends on directory listing order, which the
/// platform does not guarantee. A missing `root` yields `None`. Symlinked
/// directories below `root` are not entered, and a directory that cannot be
/// listed is skipped with a warning.
pub fn find_first_file<F>(fs: &dyn FileSystem, root: &Path, matches: F) -> Result<Option<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    if !fs.is_dir(root) {
        return Ok(None);
    }

    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot list directory; skipped");
                continue;
            }
        };

        for path in entries {
            if fs.is_dir(&path) {
                if fs.is_symlink(&path) {
                    debug!(dir = %path.display(), "not following directory symlink");
                } else {
                    stack.push(path);
                }
            } else if fs.is_file(&path) && matches(&path) {
                return Ok(Some(path));
            }
        }
    }

    Ok(None)
}

/// First file under `root` whose path ends with `name`, compared component by
/// component (so `App.app/App` matches `.../Debug/App.app/App` but not
/// `.../MyApp.app/App`).
pub fn find_file_ending_with(
    fs: &dyn FileSystem,
    root: &Path,
    name: &str,
) -> Result<Option<PathBuf>> {
    let suffix = Path::new(name);
    if suffix.as_os_str().is_empty() {
        return Ok(None);
    }
    find_first_file(fs, root, |path| path.ends_with(suffix))
}
