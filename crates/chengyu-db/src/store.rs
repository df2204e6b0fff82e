//! Database store wrapper.

use crate::error::{Error, Result};
use crate::models::*;
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredSession>().unwrap();
    models.define::<StoredHintUsage>().unwrap();
    models.define::<StoredSeenTarget>().unwrap();
    models.define::<StoredScore>().unwrap();
    models.define::<StoredLeaderboardEntry>().unwrap();
    models.define::<StoredAchievement>().unwrap();
    models
});

/// Database store backing every engine repository trait.
pub struct Store {
    pub(crate) db: Database<'static>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }
}
