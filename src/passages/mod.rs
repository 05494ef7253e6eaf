use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::from_str;
use std::path::Path;

use crate::error::PassageError;

static PASSAGE_DIR: Dir = include_dir!("src/passages");

/// Passage packs compiled into the binary.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum BuiltinPack {
    #[default]
    Classic,
    Pangrams,
}

impl BuiltinPack {
    pub fn file_name(&self) -> String {
        format!("{}.json", self.to_string().to_lowercase())
    }

    /// Looks a pack up by its lowercase name, as stored in the config file.
    pub fn from_name(name: &str) -> Result<Self, PassageError> {
        <Self as ValueEnum>::from_str(name, true)
            .map_err(|_| PassageError::UnknownPack(name.to_string()))
    }
}

#[derive(Deserialize, Clone, Debug)]
struct PassagePack {
    name: String,
    passages: Vec<String>,
}

/// A validated, non-empty list of passages a session can draw from.
#[derive(Debug, Clone, PartialEq)]
pub struct PassageBook {
    name: String,
    passages: Vec<String>,
}

impl PassageBook {
    pub fn new(name: impl Into<String>, passages: Vec<String>) -> Result<Self, PassageError> {
        let name = name.into();
        if passages.is_empty() {
            return Err(PassageError::Empty(name));
        }
        for (index, passage) in passages.iter().enumerate() {
            if let Some(reason) = untypeable_reason(passage) {
                return Err(PassageError::Untypeable { index, reason });
            }
        }
        Ok(Self { name, passages })
    }

    /// A book holding exactly one passage, e.g. a prompt given on the command line.
    pub fn single(passage: impl Into<String>) -> Result<Self, PassageError> {
        Self::new("custom", vec![passage.into()])
    }

    pub fn builtin(pack: BuiltinPack) -> Result<Self, PassageError> {
        let file = PASSAGE_DIR
            .get_file(pack.file_name())
            .ok_or_else(|| PassageError::UnknownPack(pack.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| PassageError::UnknownPack(pack.to_string()))?;
        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self, PassageError> {
        let pack: PassagePack = from_str(json)?;
        Self::new(pack.name, pack.passages)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PassageError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn passages(&self) -> &[String] {
        &self.passages
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Picks one passage uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        self.passages
            .choose(rng)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// A passage is typeable when a session can reproduce it exactly: spaces are
/// refused at the start of the input and next to another space, and control
/// characters never reach the session.
fn untypeable_reason(passage: &str) -> Option<&'static str> {
    if passage.is_empty() {
        Some("is empty")
    } else if passage.starts_with(' ') {
        Some("starts with a space")
    } else if passage.contains("  ") {
        Some("contains consecutive spaces")
    } else if passage.chars().any(char::is_control) {
        Some("contains control characters")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    #[test]
    fn test_builtin_classic() {
        let book = PassageBook::builtin(BuiltinPack::Classic).unwrap();

        assert_eq!(book.name(), "classic");
        assert_eq!(book.len(), 5);
        assert_eq!(book.passages()[0], "Hello World");
    }

    #[test]
    fn test_builtin_pangrams() {
        let book = PassageBook::builtin(BuiltinPack::Pangrams).unwrap();

        assert_eq!(book.name(), "pangrams");
        assert!(!book.is_empty());
    }

    #[test]
    fn test_builtin_pack_file_name() {
        assert_eq!(BuiltinPack::Classic.file_name(), "classic.json");
        assert_eq!(BuiltinPack::Pangrams.file_name(), "pangrams.json");
    }

    #[test]
    fn test_builtin_pack_from_name() {
        assert_eq!(BuiltinPack::from_name("classic").unwrap(), BuiltinPack::Classic);
        assert_eq!(BuiltinPack::from_name("Pangrams").unwrap(), BuiltinPack::Pangrams);
        assert_matches!(
            BuiltinPack::from_name("klingon"),
            Err(PassageError::UnknownPack(name)) if name == "klingon"
        );
    }

    #[test]
    fn test_empty_book_rejected() {
        assert_matches!(PassageBook::new("none", vec![]), Err(PassageError::Empty(_)));
    }

    #[test]
    fn test_untypeable_passages_rejected() {
        assert_matches!(
            PassageBook::single(" leading"),
            Err(PassageError::Untypeable { index: 0, .. })
        );
        assert_matches!(
            PassageBook::new("x", vec!["fine".into(), "two  spaces".into()]),
            Err(PassageError::Untypeable { index: 1, .. })
        );
        assert_matches!(
            PassageBook::single("line\nbreak"),
            Err(PassageError::Untypeable { .. })
        );
        assert_matches!(PassageBook::single(""), Err(PassageError::Untypeable { .. }));
    }

    #[test]
    fn test_trailing_space_is_typeable() {
        assert!(PassageBook::single("ends with space ").is_ok());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{ "name": "test", "passages": ["one two", "three"] }"#;
        let book = PassageBook::from_json(json).unwrap();

        assert_eq!(book.name(), "test");
        assert_eq!(book.passages(), &["one two".to_string(), "three".to_string()]);
    }

    #[test]
    fn test_from_json_malformed() {
        assert_matches!(PassageBook::from_json("{"), Err(PassageError::Json(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "name": "mine", "passages": ["typed from a file"] }}"#).unwrap();

        let book = PassageBook::from_file(file.path()).unwrap();
        assert_eq!(book.name(), "mine");
        assert_eq!(book.passages()[0], "typed from a file");
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = PassageBook::from_file(dir.path().join("missing.json"));
        assert_matches!(result, Err(PassageError::Io(_)));
    }

    #[test]
    fn test_choose_covers_every_passage() {
        let book = PassageBook::new("abc", vec!["a".into(), "b".into(), "c".into()]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();

        for _ in 0..200 {
            seen.insert(book.choose(&mut rng).to_string());
        }

        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_choose_single() {
        let book = PassageBook::single("only").unwrap();
        assert_eq!(book.choose(&mut rand::thread_rng()), "only");
    }
}
