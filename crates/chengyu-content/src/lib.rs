//! Chengyu Content - versioned question catalog
//!
//! Questions (idioms and sentences) are authored in RON files and queried
//! by `(game_type, difficulty)`. A checksum-keyed reload hook lets a
//! running server pick up content updates without restarting.

mod catalog;
mod error;
mod source;

pub use catalog::{Catalog, Question};
pub use error::{Error, Result};
pub use source::{checksum, ContentSource, ReloadingCatalog};
