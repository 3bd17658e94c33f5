// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, bail};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // child names, in insertion order
    Symlink(PathBuf),
    /// A directory whose listing fails.
    Unreadable,
}

/// Link hops followed before giving up, like `ELOOP`.
const MAX_LINK_HOPS: usize = 8;

/// In-memory build tree for tests. Directory listings come back in insertion
/// order, which makes "first match" artifact searches deterministic.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    tree: Arc<Mutex<Tree>>,
}

#[derive(Debug, Default)]
struct Tree {
    entries: HashMap<PathBuf, MockEntry>,
}

impl Tree {
    fn put_file(&mut self, path: &Path, content: Vec<u8>) {
        self.entries
            .insert(path.to_path_buf(), MockEntry::File(content));
        self.attach(path);
    }

    fn put_dir(&mut self, path: &Path) {
        if self.entries.contains_key(path) {
            return;
        }
        self.entries
            .insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        self.attach(path);
    }

    /// Register `path` in its parent's listing, creating ancestors on the way.
    fn attach(&mut self, path: &Path) {
        let (Some(parent), Some(name)) = (parent_of(path), path.file_name()) else {
            return;
        };
        if parent == path {
            return;
        }
        self.put_dir(&parent);

        let name = name.to_string_lossy().into_owned();
        if let Some(MockEntry::Dir(children)) = self.entries.get_mut(&parent) {
            if !children.contains(&name) {
                children.push(name);
            }
        }
    }

    fn detach(&mut self, path: &Path) {
        let (Some(parent), Some(name)) = (parent_of(path), path.file_name()) else {
            return;
        };
        if let Some(MockEntry::Dir(children)) = self.entries.get_mut(&parent) {
            children.retain(|c| c.as_str() != name);
        }
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        fs.tree().put_dir(Path::new("."));
        fs
    }

    fn tree(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap()
    }

    fn entry(&self, path: &Path) -> Option<MockEntry> {
        self.tree().entries.get(path).cloned()
    }

    /// The entry at `path` with symlinks followed.
    fn resolve(&self, path: &Path) -> Option<MockEntry> {
        let mut entry = self.entry(path)?;
        for _ in 0..MAX_LINK_HOPS {
            match entry {
                MockEntry::Symlink(target) => entry = self.entry(&target)?,
                other => return Some(other),
            }
        }
        None
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.tree().put_file(path.as_ref(), content.into());
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.tree().put_dir(path.as_ref());
    }

    /// Place a symlink at `path` pointing to `target`.
    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut tree = self.tree();
        tree.entries
            .insert(path.to_path_buf(), MockEntry::Symlink(target.as_ref().to_path_buf()));
        tree.attach(path);
    }

    /// A directory that exists but cannot be listed.
    pub fn add_unreadable_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut tree = self.tree();
        tree.entries.insert(path.to_path_buf(), MockEntry::Unreadable);
        tree.attach(path);
    }

    /// All file paths currently stored under `dir` (recursively), sorted.
    pub fn files_under(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let dir = dir.as_ref();
        let mut out: Vec<PathBuf> = self
            .tree()
            .entries
            .iter()
            .filter(|(p, e)| matches!(e, MockEntry::File(_)) && p.starts_with(dir))
            .map(|(p, _)| p.clone())
            .collect();
        out.sort();
        out
    }
}

fn parent_of(path: &Path) -> Option<PathBuf> {
    path.parent().map(|parent| {
        if parent.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            parent.to_path_buf()
        }
    })
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.resolve(path) {
            Some(MockEntry::File(bytes)) => Ok(String::from_utf8(bytes)?),
            Some(_) => bail!("{} is a directory", path.display()),
            None => bail!("no such file: {}", path.display()),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.entry(path).is_some()
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.resolve(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.resolve(path), Some(MockEntry::Dir(_) | MockEntry::Unreadable))
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.entry(path), Some(MockEntry::Symlink(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self.resolve(path) {
            Some(MockEntry::Dir(children)) => Ok(children.iter().map(|c| path.join(c)).collect()),
            Some(MockEntry::Unreadable) => bail!("permission denied: {}", path.display()),
            _ => bail!("not a directory: {}", path.display()),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut tree = self.tree();
        tree.entries.retain(|p, _| !p.starts_with(path));
        tree.detach(path);
        Ok(())
    }
}
