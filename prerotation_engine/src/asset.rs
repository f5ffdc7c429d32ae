/// AssetSource - "load bytes by logical path" capability
///
/// Shader bytecode and texture pixels are read through this trait so the backend never
/// touches the filesystem (or an APK asset manager) directly.

use std::path::{Path, PathBuf};
use std::sync::RwLock;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};

/// Logical path of the vertex shader bytecode
pub const VERTEX_SHADER_ASSET: &str = "texture.vert.spv";
/// Logical path of the fragment shader bytecode
pub const FRAGMENT_SHADER_ASSET: &str = "texture.frag.spv";
/// Logical path of the quad texture
pub const TEXTURE_ASSET: &str = "sample_tex.png";

/// Read-only byte source keyed by logical path
pub trait AssetSource: Send + Sync {
    /// Read the whole asset
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if the asset does not exist or cannot be read.
    fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// Assets stored as plain files under a root directory
pub struct DirectoryAssetSource {
    root: PathBuf,
}

impl DirectoryAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirectoryAssetSource {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.root.join(path);
        std::fs::read(&full).map_err(|e| {
            crate::engine_error!("prerotation::asset", "Failed to read {}: {}", full.display(), e);
            Error::InvalidResource(format!("Failed to read asset '{}': {}", path, e))
        })
    }
}

/// Assets held in memory
///
/// An optional fallback source is consulted for paths not inserted here, which lets a
/// host overlay a few entries (e.g. shaders compiled at build time) on top of a directory.
#[derive(Default)]
pub struct MemoryAssetSource {
    entries: RwLock<FxHashMap<String, Vec<u8>>>,
    fallback: Option<Box<dyn AssetSource>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: impl AssetSource + 'static) -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            fallback: Some(Box::new(fallback)),
        }
    }

    /// Insert or replace an entry
    pub fn insert(&self, path: impl Into<String>, bytes: Vec<u8>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(path.into(), bytes);
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(path))
            .unwrap_or(false)
    }
}

impl AssetSource for MemoryAssetSource {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let hit = self
            .entries
            .read()
            .map_err(|_| Error::BackendError("Asset table lock poisoned".to_string()))?
            .get(path)
            .cloned();

        match (hit, &self.fallback) {
            (Some(bytes), _) => Ok(bytes),
            (None, Some(fallback)) => fallback.read(path),
            (None, None) => Err(Error::InvalidResource(format!("Unknown asset '{}'", path))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "asset_tests.rs"]
mod tests;
