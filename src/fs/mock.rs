use super::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { modified: f64 },
    Dir { modified: f64, children: Vec<String> },
}

impl MockEntry {
    fn modified(&self) -> f64 {
        match self {
            MockEntry::File { modified } | MockEntry::Dir { modified, .. } => *modified,
        }
    }
}

/// Scripted failures for `remove_file` on a single path.
#[derive(Debug, Clone)]
struct RemoveFailures {
    remaining: u32,
    kind: ErrorKind,
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    remove_failures: HashMap<PathBuf, RemoveFailures>,
    remove_calls: HashMap<PathBuf, u32>,
    symlinks: HashSet<PathBuf>,
}

/// In-memory filesystem with explicit modification times (seconds since the
/// epoch) and scriptable `remove_file` failures.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        // Ensure root exists
        fs.lock()
            .entries
            .insert(PathBuf::from("."), MockEntry::Dir { modified: 0.0, children: Vec::new() });
        fs
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, modified: f64) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.lock();
        state.entries.insert(path.clone(), MockEntry::File { modified });
        Self::link_to_parent(&mut state.entries, &path);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>, modified: f64) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.lock();
        state
            .entries
            .insert(path.clone(), MockEntry::Dir { modified, children: Vec::new() });
        Self::link_to_parent(&mut state.entries, &path);
    }

    /// Flag an existing entry as a symlink. Its metadata stays that of the
    /// entry it points at.
    pub fn mark_symlink(&self, path: impl AsRef<Path>) {
        self.lock().symlinks.insert(path.as_ref().to_path_buf());
    }

    /// Set the modification time of an existing entry.
    pub fn touch(&self, path: impl AsRef<Path>, modified: f64) {
        let mut state = self.lock();
        match state.entries.get_mut(path.as_ref()) {
            Some(MockEntry::File { modified: m }) | Some(MockEntry::Dir { modified: m, .. }) => {
                *m = modified;
            }
            None => panic!("touch on missing mock entry {:?}", path.as_ref()),
        }
    }

    /// Drop an entry (and, for directories, everything below it).
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.lock();
        state.entries.retain(|p, _| !p.starts_with(path));
        if let Some(parent) = Self::parent_of(path) {
            let name = path.file_name().and_then(|n| n.to_str()).map(str::to_string);
            if let (Some(MockEntry::Dir { children, .. }), Some(name)) =
                (state.entries.get_mut(parent), name)
            {
                children.retain(|c| *c != name);
            }
        }
    }

    /// Make the next `times` calls to `remove_file(path)` fail with `kind`.
    pub fn fail_removals(&self, path: impl AsRef<Path>, times: u32, kind: ErrorKind) {
        self.lock().remove_failures.insert(
            path.as_ref().to_path_buf(),
            RemoveFailures { remaining: times, kind },
        );
    }

    /// How many times `remove_file` was called for `path`.
    pub fn remove_calls(&self, path: impl AsRef<Path>) -> u32 {
        self.lock()
            .remove_calls
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }

    fn parent_of(path: &Path) -> Option<&Path> {
        path.parent().map(|parent| {
            if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            }
        })
    }

    fn link_to_parent(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = Self::parent_of(path) else {
            return;
        };
        if parent == path {
            return;
        }
        if !entries.contains_key(parent) {
            entries.insert(
                parent.to_path_buf(),
                MockEntry::Dir { modified: 0.0, children: Vec::new() },
            );
            Self::link_to_parent(entries, parent);
        }
        if let Some(MockEntry::Dir { children, .. }) = entries.get_mut(parent) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(ErrorKind::NotFound, format!("no such entry: {:?}", path))
}

fn to_system_time(secs: f64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs_f64(secs.max(0.0))
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.lock().entries.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::Dir { .. }))
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.lock().symlinks.contains(path)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        self.lock()
            .entries
            .get(path)
            .map(|e| to_system_time(e.modified()))
            .ok_or_else(|| not_found(path))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        match self.lock().entries.get(path) {
            Some(MockEntry::Dir { children, .. }) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            Some(MockEntry::File { .. }) => Err(io::Error::new(
                ErrorKind::Other,
                format!("not a directory: {:?}", path),
            )),
            None => Err(not_found(path)),
        }
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        *state.remove_calls.entry(path.to_path_buf()).or_insert(0) += 1;

        if let Some(failures) = state.remove_failures.get_mut(path) {
            if failures.remaining > 0 {
                failures.remaining -= 1;
                return Err(io::Error::new(
                    failures.kind,
                    format!("scripted failure removing {:?}", path),
                ));
            }
        }

        match state.entries.get(path) {
            Some(MockEntry::File { .. }) => {
                state.entries.remove(path);
                if let Some(parent) = Self::parent_of(path) {
                    let name = path.file_name().and_then(|n| n.to_str()).map(str::to_string);
                    if let (Some(MockEntry::Dir { children, .. }), Some(name)) =
                        (state.entries.get_mut(parent), name)
                    {
                        children.retain(|c| *c != name);
                    }
                }
                Ok(())
            }
            Some(MockEntry::Dir { .. }) => Err(io::Error::new(
                ErrorKind::Other,
                format!("is a directory: {:?}", path),
            )),
            None => Err(not_found(path)),
        }
    }
}
