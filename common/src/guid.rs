//! GUID生成
//!
//! 単語から決定的にGUIDを導出する。同じ単語は常に同じGUIDになるため、
//! Ankiへの再インポート時に既存ノートが更新される。

use sha1::{Digest, Sha1};

/// GUIDの桁数（16進）
pub const GUID_LENGTH: usize = 16;

/// 単語ベースのGUIDを生成
///
/// 前後の空白を除去して小文字化した単語のSHA-1を16桁に切り詰める。
pub fn word_guid(word: &str) -> String {
    let normalized = word.trim().to_lowercase();
    let digest = Sha1::digest(normalized.as_bytes());
    let mut guid = hex::encode(digest);
    guid.truncate(GUID_LENGTH);
    guid
}

/// Anki既定形式のGUIDらしいか判定
///
/// 元デッキのGUIDは10〜12文字。HTMLが紛れ込んだ列（`<`始まり）は除外する。
pub fn looks_like_anki_guid(value: &str) -> bool {
    let len = value.chars().count();
    (10..=12).contains(&len) && !value.starts_with('<')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_guid_known_value() {
        let guid = word_guid("ambush");
        assert_eq!(guid, "e12c96821956a8f3");
        assert_eq!(guid.len(), GUID_LENGTH);
        assert!(guid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_word_guid_deterministic() {
        assert_eq!(word_guid("predecessor"), word_guid("predecessor"));
    }

    #[test]
    fn test_word_guid_normalizes_case_and_whitespace() {
        assert_eq!(word_guid("  Crane "), word_guid("crane"));
        assert_eq!(word_guid("SEA ANEMONE"), word_guid("sea anemone"));
    }

    #[test]
    fn test_word_guid_differs_between_words() {
        assert_ne!(word_guid("inhale"), word_guid("exhale"));
    }

    #[test]
    fn test_word_guid_sha1_prefix() {
        // sha1("abc") = a9993e364706816aba3e25717850c26c9cd0d89d
        assert_eq!(word_guid("abc"), "a9993e364706816a");
    }

    #[test]
    fn test_looks_like_anki_guid() {
        assert!(looks_like_anki_guid("b/Lp{4Xw!s"));
        assert!(looks_like_anki_guid("abcdefghijkl"));
        assert!(!looks_like_anki_guid("short"));
        assert!(!looks_like_anki_guid("<div>abcde"));
        assert!(!looks_like_anki_guid("a9993e364706816a"));
    }
}
