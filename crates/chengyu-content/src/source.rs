//! Content source abstraction and hot reload
//!
//! The engine consumes questions through [`ContentSource`] so it never
//! cares whether the catalog is a fixed in-memory set (tests) or a file
//! that operators swap out underneath a running server.

use crate::catalog::{Catalog, Question};
use crate::error::Result;
use chengyu_core::{Difficulty, GameType, TargetId};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Read access to the question pool
pub trait ContentSource: Send + Sync {
    /// All questions for a `(game_type, difficulty)` pool
    fn list_targets(&self, game_type: GameType, difficulty: Difficulty) -> Result<Vec<Question>>;

    /// Look up one question by id
    fn get(&self, id: &TargetId) -> Result<Option<Question>>;
}

impl ContentSource for Catalog {
    fn list_targets(&self, game_type: GameType, difficulty: Difficulty) -> Result<Vec<Question>> {
        Ok(Catalog::list_targets(self, game_type, difficulty))
    }

    fn get(&self, id: &TargetId) -> Result<Option<Question>> {
        Ok(Catalog::get(self, id).cloned())
    }
}

/// FNV-1a over the raw file bytes; keyed change detection, not security
pub fn checksum(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(PRIME)
    })
}

struct Loaded {
    checksum: u64,
    catalog: Arc<Catalog>,
}

/// A catalog backed by a RON file that can be reloaded in place
///
/// `reload_if_changed` re-reads the file and swaps the catalog only when
/// the content checksum differs, so it is cheap to call on a timer.
pub struct ReloadingCatalog {
    path: PathBuf,
    inner: RwLock<Loaded>,
}

impl ReloadingCatalog {
    /// Load the catalog from `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let bytes = fs::read(&path)?;
        let catalog = Catalog::from_ron(&String::from_utf8_lossy(&bytes))?;
        Ok(Self {
            path,
            inner: RwLock::new(Loaded {
                checksum: checksum(&bytes),
                catalog: Arc::new(catalog),
            }),
        })
    }

    /// Re-read the file; returns `true` if a new catalog was installed
    pub fn reload_if_changed(&self) -> Result<bool> {
        let bytes = fs::read(&self.path)?;
        let sum = checksum(&bytes);
        {
            let loaded = self.inner.read().unwrap_or_else(|e| e.into_inner());
            if loaded.checksum == sum {
                return Ok(false);
            }
        }
        let catalog = Catalog::from_ron(&String::from_utf8_lossy(&bytes))?;
        let mut loaded = self.inner.write().unwrap_or_else(|e| e.into_inner());
        loaded.checksum = sum;
        loaded.catalog = Arc::new(catalog);
        Ok(true)
    }

    /// The currently-loaded catalog
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .catalog
            .clone()
    }
}

impl ContentSource for ReloadingCatalog {
    fn list_targets(&self, game_type: GameType, difficulty: Difficulty) -> Result<Vec<Question>> {
        Ok(self.snapshot().list_targets(game_type, difficulty))
    }

    fn get(&self, id: &TargetId) -> Result<Option<Question>> {
        Ok(self.snapshot().get(id).cloned())
    }
}
