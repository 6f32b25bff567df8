//! 語彙デッキの生成と修正

pub mod enrich;
pub mod repair;
pub mod stats;

use crate::error::{Result, StudyDeckError};
use std::path::Path;
use study_deck_common::{DeckFile, Lexicon, VOCAB_FIELD_COUNT};
use tracing::debug;

/// カードテンプレート用CSS
pub const CARD_TEMPLATE_CSS: &str = include_str!("card_template.css");

pub const CSS_FILE_NAME: &str = "card_template.css";

/// テキストファイルを読み込み（無ければ FileNotFound）
pub fn read_text(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(StudyDeckError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// 6列の語彙デッキを読み込み
pub fn read_deck(path: &Path) -> Result<DeckFile> {
    let deck = DeckFile::parse(&read_text(path)?, VOCAB_FIELD_COUNT);
    debug!(
        path = %path.display(),
        rows = deck.row_count(),
        malformed = deck.malformed_count(),
        "デッキ読み込み"
    );
    Ok(deck)
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    crate::export::ensure_parent(path)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// 組み込み辞書に追加辞書をマージ
pub fn load_lexicon(extra: Option<&Path>) -> Result<Lexicon> {
    let mut lexicon = Lexicon::builtin()?;
    if let Some(path) = extra {
        let user = Lexicon::from_file(path)?;
        debug!(path = %path.display(), entries = user.len(), "追加辞書をマージ");
        lexicon.merge(&user);
    }
    Ok(lexicon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_deck_missing_file() {
        let result = read_deck(Path::new("/nonexistent/deck.tsv"));
        assert!(matches!(result, Err(StudyDeckError::FileNotFound(_))));
    }

    #[test]
    fn test_user_lexicon_overrides_builtin() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("user.json");
        std::fs::write(
            &path,
            r#"{"entries": {"ambush": {"meanings": ["奇襲"], "examples": ["x"], "etymology": "語源：テスト"}}}"#,
        )
        .unwrap();

        let builtin = Lexicon::builtin().unwrap();
        let merged = load_lexicon(Some(&path)).unwrap();
        assert_eq!(merged.len(), builtin.len());
        assert_eq!(merged.get("ambush").unwrap().meanings, vec!["奇襲"]);
    }

    #[test]
    fn test_css_styles_every_field() {
        for class in [".card", ".word", ".definition", ".examples", ".etymology"] {
            assert!(CARD_TEMPLATE_CSS.contains(class), "{} missing", class);
        }
    }
}
