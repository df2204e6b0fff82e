//! Question catalog
//!
//! Questions are authored in RON files, one catalog per deployment:
//!
//! ```ron
//! (
//!     version: 3,
//!     idioms: [
//!         (
//!             id: "yi_fan_feng_shun",
//!             text: "一帆风顺",
//!             difficulty: Easy,
//!             definition: "smooth sailing",
//!             pinyin: "yī fān fēng shùn",
//!         ),
//!     ],
//!     sentences: [
//!         (
//!             id: "like_chinese",
//!             tiles: ["我", "喜欢", "中文"],
//!             roles: ["subject", "verb", "object"],
//!             grammar_pattern: "svo",
//!             difficulty: Medium,
//!         ),
//!     ],
//! )
//! ```

use crate::error::{Error, Result};
use chengyu_core::{char_tokens, Difficulty, GameType, HintMaterial, TargetId};
use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One playable question target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: TargetId,
    pub game_type: GameType,
    pub difficulty: Difficulty,
    /// The full answer text
    pub text: String,
    /// Answer tokens in target order: characters for idioms, word tiles
    /// for sentences
    pub tokens: Vec<String>,
    /// Word role per tile (sentence mode), parallel to `tokens` or empty
    pub roles: Vec<String>,
    /// Grammar rule table key (sentence mode)
    pub grammar_pattern: Option<String>,
    pub definition: Option<String>,
    pub pinyin: Option<String>,
    pub example: Option<String>,
}

impl Question {
    /// The fields hints are built from
    pub fn hint_material(&self) -> HintMaterial {
        HintMaterial {
            definition: self.definition.clone(),
            pinyin: self.pinyin.clone(),
            example: self.example.clone(),
        }
    }
}

/// An idiom entry as written in a catalog file
#[derive(Debug, Deserialize)]
struct IdiomDef {
    id: String,
    text: String,
    difficulty: Difficulty,
    #[serde(default)]
    definition: Option<String>,
    #[serde(default)]
    pinyin: Option<String>,
    #[serde(default)]
    example: Option<String>,
}

/// A sentence entry as written in a catalog file
#[derive(Debug, Deserialize)]
struct SentenceDef {
    id: String,
    tiles: Vec<String>,
    difficulty: Difficulty,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    grammar_pattern: Option<String>,
    #[serde(default)]
    definition: Option<String>,
    #[serde(default)]
    example: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: u32,
    #[serde(default)]
    idioms: Vec<IdiomDef>,
    #[serde(default)]
    sentences: Vec<SentenceDef>,
}

/// In-memory question catalog, queried by game type and difficulty
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    version: u32,
    questions: HashMap<TargetId, Question>,
}

impl Catalog {
    /// Parse a catalog from RON text
    ///
    /// Optional fields are written bare (`definition: "smooth sailing"`,
    /// not `Some(...)`), so parsing runs with the `implicit_some`
    /// extension enabled.
    pub fn from_ron(content: &str) -> Result<Self> {
        let options = ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
        let file: CatalogFile = options.from_str(content)?;
        let mut catalog = Catalog {
            version: file.version,
            questions: HashMap::new(),
        };

        for idiom in file.idioms {
            if idiom.text.chars().count() < 2 {
                return Err(Error::InvalidQuestion {
                    id: idiom.id,
                    reason: "idiom text must have at least 2 characters".to_string(),
                });
            }
            let tokens = char_tokens(&idiom.text);
            catalog.add(Question {
                id: TargetId::new(idiom.id),
                game_type: GameType::Idiom,
                difficulty: idiom.difficulty,
                text: idiom.text,
                tokens,
                roles: Vec::new(),
                grammar_pattern: None,
                definition: idiom.definition,
                pinyin: idiom.pinyin,
                example: idiom.example,
            })?;
        }

        for sentence in file.sentences {
            if sentence.tiles.is_empty() {
                return Err(Error::InvalidQuestion {
                    id: sentence.id,
                    reason: "sentence must have at least one tile".to_string(),
                });
            }
            if !sentence.roles.is_empty() && sentence.roles.len() != sentence.tiles.len() {
                return Err(Error::InvalidQuestion {
                    id: sentence.id,
                    reason: "roles must be parallel to tiles".to_string(),
                });
            }
            let text = sentence.tiles.concat();
            catalog.add(Question {
                id: TargetId::new(sentence.id),
                game_type: GameType::Sentence,
                difficulty: sentence.difficulty,
                text,
                tokens: sentence.tiles,
                roles: sentence.roles,
                grammar_pattern: sentence.grammar_pattern,
                definition: sentence.definition,
                pinyin: None,
                example: sentence.example,
            })?;
        }

        Ok(catalog)
    }

    /// Load a catalog from a RON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    fn add(&mut self, question: Question) -> Result<()> {
        if self.questions.contains_key(&question.id) {
            return Err(Error::DuplicateQuestion(question.id.to_string()));
        }
        self.questions.insert(question.id.clone(), question);
        Ok(())
    }

    /// Content version as declared in the file
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of questions
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the catalog holds no questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Look up one question
    pub fn get(&self, id: &TargetId) -> Option<&Question> {
        self.questions.get(id)
    }

    /// All questions in a `(game_type, difficulty)` pool, in a stable order
    pub fn list_targets(&self, game_type: GameType, difficulty: Difficulty) -> Vec<Question> {
        let mut pool: Vec<Question> = self
            .questions
            .values()
            .filter(|q| q.game_type == game_type && q.difficulty == difficulty)
            .cloned()
            .collect();
        pool.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        pool
    }
}
