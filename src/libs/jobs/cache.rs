use std::fs;
use std::path::{Path, PathBuf};

use xxhash_rust::xxh3::xxh3_64;

/// Explicit algorithm version, part of every cache key. Bump whenever the
/// layout or payload semantics change.
pub const LAYOUT_VERSION: u32 = 1;

/// On-disk result cache consulted before scheduling a worker. Entries are
/// keyed by the xxh3 hash of the input bytes plus [`LAYOUT_VERSION`];
/// content format is identical to the result payload.
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn entry_path(&self, input: &[u8]) -> PathBuf {
        self.dir
            .join(format!("{:016x}-v{}.json.gz", xxh3_64(input), LAYOUT_VERSION))
    }

    /// Copy a cached payload to `dest` if one exists. Returns whether it hit.
    pub fn fetch(&self, input: &[u8], dest: &Path) -> anyhow::Result<bool> {
        let entry = self.entry_path(input);
        if entry.exists() {
            fs::copy(&entry, dest)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Store a computed payload under the input's key.
    pub fn store(&self, input: &[u8], payload: &Path) -> anyhow::Result<()> {
        fs::copy(payload, self.entry_path(input))?;
        Ok(())
    }
}
