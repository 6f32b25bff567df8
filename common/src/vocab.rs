//! 語彙カード
//!
//! 6列（GUID | Word | Definition | Examples | Etymology | Tags）のHTMLフィールドを組み立てる。

use crate::guid::word_guid;
use crate::lexicon::{is_placeholder_etymology, Lexicon};
use crate::tsv::{field_value, VOCAB_FIELD_COUNT};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 既定のタグ
pub const DEFAULT_VOCAB_TAGS: &str = "toefl rank3 enhanced";

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r#"<div class="word">([^<]+)</div>"#).unwrap();
    static ref LEGACY_EXAMPLE_RE: Regex =
        Regex::new(r#"<div class="example">（(\d+)）([^<]+)</div>"#).unwrap();
    static ref ETYMOLOGY_INNER_RE: Regex =
        Regex::new(r#"(?s)^<div class="etymology">(.*)</div>$"#).unwrap();
}

/// 英語スタイルの語源と判定するキーワード
const ENGLISH_ETYMOLOGY_MARKERS: &[&str] = &[
    "From Latin",
    "From Greek",
    "From Old",
    "From French",
    "From Middle",
    "From Anglo",
    "From Germanic",
    "compound word",
    "Etymology: Derived from historical linguistic roots",
];

/// 語彙カード1枚分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabCard {
    pub guid: String,
    pub word: String,
    pub meanings: Vec<String>,
    pub examples: Vec<String>,
    pub etymology: String,
    pub tags: String,
    /// 辞書に無く仮の内容で埋めたか
    #[serde(default)]
    pub placeholder: bool,
}

impl VocabCard {
    /// 辞書を引いてカードを作成
    pub fn from_lexicon(word: &str, lexicon: &Lexicon, tags: &str) -> Self {
        let word = word.trim();
        let enrichment = lexicon.resolve(word);
        Self {
            guid: word_guid(word),
            word: word.to_string(),
            meanings: enrichment.meanings,
            examples: enrichment.examples,
            etymology: enrichment.etymology,
            tags: tags.to_string(),
            placeholder: enrichment.is_placeholder,
        }
    }

    /// TSV用の6フィールドに変換（辞書の値に含まれるタブ・改行は除去）
    pub fn to_fields(&self) -> [String; VOCAB_FIELD_COUNT] {
        [
            self.guid.clone(),
            word_html(&self.word),
            definition_html(&self.meanings),
            examples_html(&self.examples),
            etymology_html(&self.etymology),
            self.tags.clone(),
        ]
        .map(|f| field_value(&f))
    }

    /// TSVの1行
    pub fn to_tsv_line(&self) -> String {
        self.to_fields().join("\t")
    }
}

pub fn word_html(word: &str) -> String {
    format!(r#"<div class="word">{}</div>"#, word)
}

pub fn definition_html(meanings: &[String]) -> String {
    format!("<div class='definition'><strong>{}</strong></div>", meanings.join("、"))
}

/// 例文を番号付きで `<br>` 区切りにする
pub fn examples_html(examples: &[String]) -> String {
    let body = examples
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{}. {}", i + 1, e.trim()))
        .collect::<Vec<_>>()
        .join("<br>");
    format!(r#"<div class="examples">{}</div>"#, body)
}

pub fn etymology_html(note: &str) -> String {
    format!(r#"<div class="etymology">{}</div>"#, note)
}

/// Wordフィールドから単語を取り出す
pub fn extract_word(word_field: &str) -> Option<&str> {
    WORD_RE
        .captures(word_field)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|w| !w.is_empty())
}

/// Etymologyフィールドの中身（divを外した本文）
pub fn etymology_text(field: &str) -> &str {
    ETYMOLOGY_INNER_RE
        .captures(field)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(field)
}

/// 旧形式の例文（`<div class="example">（1）…</div>`）を新形式に変換
///
/// 旧形式でなければそのまま返す。
pub fn unify_examples(field: &str) -> String {
    if !field.contains(r#"<div class="example">"#) {
        return field.to_string();
    }

    let items: Vec<String> = LEGACY_EXAMPLE_RE
        .captures_iter(field)
        .map(|c| format!("{}. {}", &c[1], c[2].trim()))
        .collect();

    if items.is_empty() {
        return field.to_string();
    }

    format!(r#"<div class="examples">{}</div>"#, items.join("<br>"))
}

/// 英語テンプレートの語源
pub fn english_etymology_template(word: &str) -> String {
    etymology_html(&format!(
        "Etymology: Derived from historical linguistic roots. Related to {} and associated vocabulary in academic contexts.",
        word
    ))
}

/// 語源メモの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EtymologyStyle {
    /// 仮の語源メモ
    Placeholder,
    /// 日本語の語源メモ（`語源：`）
    Japanese,
    /// 英語の語源メモ
    English,
    /// どちらでもない
    Other,
}

impl EtymologyStyle {
    pub fn label(&self) -> &'static str {
        match self {
            EtymologyStyle::Placeholder => "仮データ",
            EtymologyStyle::Japanese => "日本語",
            EtymologyStyle::English => "英語",
            EtymologyStyle::Other => "その他",
        }
    }
}

/// 語源メモを分類
pub fn classify_etymology(text: &str) -> EtymologyStyle {
    if is_placeholder_etymology(text) {
        EtymologyStyle::Placeholder
    } else if text.contains("語源：") {
        EtymologyStyle::Japanese
    } else if ENGLISH_ETYMOLOGY_MARKERS.iter().any(|m| text.contains(m)) {
        EtymologyStyle::English
    } else {
        EtymologyStyle::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Lexicon {
        Lexicon::from_json(
            r#"{"entries": {"inhale": {
                "meanings": ["吸い込む", "吸入する"],
                "examples": ["Please inhale deeply.", "Don't inhale the fumes."],
                "etymology": "語源：ラテン語「inhalare」"
            }}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_card_fields() {
        let card = VocabCard::from_lexicon("inhale", &lexicon(), DEFAULT_VOCAB_TAGS);
        let fields = card.to_fields();
        assert_eq!(fields[0], word_guid("inhale"));
        assert_eq!(fields[1], r#"<div class="word">inhale</div>"#);
        assert_eq!(fields[2], "<div class='definition'><strong>吸い込む、吸入する</strong></div>");
        assert_eq!(
            fields[3],
            r#"<div class="examples">1. Please inhale deeply.<br>2. Don't inhale the fumes.</div>"#
        );
        assert_eq!(fields[4], r#"<div class="etymology">語源：ラテン語「inhalare」</div>"#);
        assert_eq!(fields[5], DEFAULT_VOCAB_TAGS);
        assert!(!card.placeholder);
    }

    #[test]
    fn test_tsv_line_has_six_fields() {
        let card = VocabCard::from_lexicon("unknownword", &lexicon(), DEFAULT_VOCAB_TAGS);
        assert!(card.placeholder);
        assert_eq!(card.to_tsv_line().split('\t').count(), VOCAB_FIELD_COUNT);
    }

    #[test]
    fn test_lexicon_separators_stay_inside_fields() {
        let lexicon = Lexicon::from_json(
            r#"{"entries": {"endure": {
                "meanings": ["耐える\t我慢する"],
                "examples": ["line1\nline2"],
                "etymology": "語源：ラテン語\r\n「indurare」"
            }}}"#,
        )
        .unwrap();
        let line = VocabCard::from_lexicon("endure", &lexicon, DEFAULT_VOCAB_TAGS).to_tsv_line();
        assert_eq!(line.split('\t').count(), VOCAB_FIELD_COUNT);
        assert!(!line.contains('\n'));
        assert!(line.contains("耐える 我慢する"));
        assert!(line.contains("line1<br>line2"));
    }

    #[test]
    fn test_extract_word() {
        assert_eq!(extract_word(r#"<div class="word">sea anemone</div>"#), Some("sea anemone"));
        assert_eq!(extract_word("plain"), None);
        assert_eq!(extract_word(r#"<div class="word"></div>"#), None);
    }

    #[test]
    fn test_unify_examples_legacy() {
        let legacy = r#"<div class="examples"><div class="example">（1）First one.</div><div class="example">（2）Second one. </div></div>"#;
        assert_eq!(
            unify_examples(legacy),
            r#"<div class="examples">1. First one.<br>2. Second one.</div>"#
        );
    }

    #[test]
    fn test_unify_examples_already_new() {
        let current = r#"<div class="examples">1. Done.</div>"#;
        assert_eq!(unify_examples(current), current);
        assert_eq!(unify_examples(&unify_examples(current)), current);
    }

    #[test]
    fn test_classify_etymology() {
        assert_eq!(classify_etymology("語源：ラテン語"), EtymologyStyle::Japanese);
        assert_eq!(classify_etymology("From Latin inhalare"), EtymologyStyle::English);
        assert_eq!(
            classify_etymology(&english_etymology_template("crane")),
            EtymologyStyle::English
        );
        assert_eq!(
            classify_etymology(&crate::lexicon::placeholder_etymology("crane")),
            EtymologyStyle::Placeholder
        );
        assert_eq!(classify_etymology("memo"), EtymologyStyle::Other);
    }

    #[test]
    fn test_etymology_text() {
        assert_eq!(etymology_text(r#"<div class="etymology">語源：x<br>y</div>"#), "語源：x<br>y");
        assert_eq!(etymology_text("raw"), "raw");
    }
}
