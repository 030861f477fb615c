use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::device::{AudioDevice, SoundId};

/// Resolve a requested file against a default asset directory.
///
/// Tries, in order: the path as given, the path under `default_dir`, and the
/// lowercased filename under `default_dir` (assets ripped from case-insensitive
/// filesystems frequently disagree on case).
pub fn resolve(path: &str, default_dir: &Path) -> Option<PathBuf> {
    let direct = Path::new(path);
    if direct.exists() {
        return Some(direct.to_path_buf());
    }
    let prefixed = default_dir.join(path);
    if prefixed.exists() {
        return Some(prefixed);
    }
    let lower = default_dir.join(path.to_lowercase());
    if lower.exists() {
        return Some(lower);
    }
    None
}

/// Caches decoded sounds by resolved path so repeated plays of the same file
/// never load it twice. The decoded data itself is owned by the device; the
/// cache only maps paths to ids.
pub struct SoundCache {
    cache: HashMap<String, SoundId>,
}

impl SoundCache {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Load a sound through the device, returning the cached id when the path
    /// has been loaded before. Returns `None` when the device refuses the
    /// file; the failure is logged and the path is not cached.
    pub fn get_or_load<D: AudioDevice>(&mut self, device: &mut D, path: &Path) -> Option<SoundId> {
        let key = path.to_string_lossy().to_string();
        if let Some(&id) = self.cache.get(&key) {
            return Some(id);
        }
        match device.load_sound(path) {
            Ok(id) => {
                self.cache.insert(key, id);
                Some(id)
            }
            Err(e) => {
                debug!("failed to load sound {}: {e}", path.display());
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Forget every mapping. Call after the device released its resources.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl Default for SoundCache {
    fn default() -> Self {
        Self::new()
    }
}
