//! Anki用TSVの読み書き
//!
//! - `#` で始まるヘッダー行、空行、列数の合わない行はそのまま保持する
//! - 列数が一致する行だけを編集対象として扱い、変更のない行は元の文字列で書き戻す

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// 語彙デッキの列数（GUID | Word | Definition | Examples | Etymology | Tags）
pub const VOCAB_FIELD_COUNT: usize = 6;

/// 語彙デッキの列名
pub const VOCAB_FIELD_NAMES: [&str; VOCAB_FIELD_COUNT] =
    ["GUID", "Word", "Definition", "Examples", "Etymology", "Tags"];

/// 列インデックス
pub mod column {
    pub const GUID: usize = 0;
    pub const WORD: usize = 1;
    pub const DEFINITION: usize = 2;
    pub const EXAMPLES: usize = 3;
    pub const ETYMOLOGY: usize = 4;
    pub const TAGS: usize = 5;
}

/// TSVの1行
#[derive(Debug, Clone, PartialEq)]
pub enum DeckLine {
    /// `#` で始まる行
    Comment(String),
    /// 空行
    Blank(String),
    /// 列数が想定と異なる行
    Malformed(String),
    /// 編集対象の行
    Row(DeckRow),
}

impl DeckLine {
    /// 書き出し用の文字列
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            DeckLine::Comment(s) | DeckLine::Blank(s) | DeckLine::Malformed(s) => Cow::Borrowed(s),
            DeckLine::Row(row) => row.render(),
        }
    }
}

/// 列数が一致したデータ行
#[derive(Debug, Clone, PartialEq)]
pub struct DeckRow {
    original: String,
    fields: Vec<String>,
    modified: bool,
}

impl DeckRow {
    fn new(line: &str) -> Self {
        Self {
            original: line.to_string(),
            fields: line.split('\t').map(str::to_string).collect(),
            modified: false,
        }
    }

    /// フィールドから行を作成（新規行）
    pub fn from_fields(fields: Vec<String>) -> Self {
        let original = fields.join("\t");
        Self { original, fields, modified: false }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// フィールドを書き換える。値が変わった場合のみ true
    ///
    /// タブ・改行は `field_value` で置き換えてから格納する。
    pub fn set_field(&mut self, index: usize, value: impl Into<String>) -> bool {
        let value = field_value(&value.into());
        match self.fields.get_mut(index) {
            Some(current) if *current != value => {
                *current = value;
                self.modified = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn render(&self) -> Cow<'_, str> {
        if self.modified {
            Cow::Owned(self.fields.join("\t"))
        } else {
            Cow::Borrowed(&self.original)
        }
    }
}

/// 行単位で保持したTSVファイル
#[derive(Debug, Clone, PartialEq)]
pub struct DeckFile {
    lines: Vec<DeckLine>,
    expected_fields: usize,
}

impl DeckFile {
    /// テキストを行ごとに分類
    pub fn parse(text: &str, expected_fields: usize) -> Self {
        let lines = text
            .lines()
            .map(|line| {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    DeckLine::Blank(line.to_string())
                } else if trimmed.starts_with('#') {
                    DeckLine::Comment(line.to_string())
                } else if line.split('\t').count() == expected_fields {
                    DeckLine::Row(DeckRow::new(line))
                } else {
                    DeckLine::Malformed(line.to_string())
                }
            })
            .collect();

        Self { lines, expected_fields }
    }

    pub fn expected_fields(&self) -> usize {
        self.expected_fields
    }

    pub fn lines(&self) -> &[DeckLine] {
        &self.lines
    }

    pub fn rows(&self) -> impl Iterator<Item = &DeckRow> {
        self.lines.iter().filter_map(|l| match l {
            DeckLine::Row(row) => Some(row),
            _ => None,
        })
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut DeckRow> {
        self.lines.iter_mut().filter_map(|l| match l {
            DeckLine::Row(row) => Some(row),
            _ => None,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows().count()
    }

    pub fn malformed_count(&self) -> usize {
        self.lines.iter().filter(|l| matches!(l, DeckLine::Malformed(_))).count()
    }

    pub fn modified_count(&self) -> usize {
        self.rows().filter(|r| r.is_modified()).count()
    }

    /// 全行を改行区切りで書き出す
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.render());
            out.push('\n');
        }
        out
    }
}

/// Ankiインポート用ヘッダーブロック
#[derive(Debug, Clone)]
pub struct AnkiHeader {
    pub title: String,
    pub note_type: String,
    pub deck: String,
    pub guid_column: usize,
    pub tags_column: usize,
    pub field_names: Vec<String>,
}

impl AnkiHeader {
    /// 語彙デッキ用ヘッダー
    pub fn vocabulary(note_type: &str, deck: &str) -> Self {
        Self {
            title: "Enhanced TOEFL Vocabulary Import File".to_string(),
            note_type: note_type.to_string(),
            deck: deck.to_string(),
            guid_column: column::GUID + 1,
            tags_column: column::TAGS + 1,
            field_names: VOCAB_FIELD_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n", self.title));
        out.push_str("# Generated by study-deck\n");
        out.push_str("#separator:tab\n");
        out.push_str("#html:true\n");
        out.push_str(&format!("#notetype:{}\n", self.note_type));
        out.push_str(&format!("#deck:{}\n", self.deck));
        out.push_str(&format!("#guid column:{}\n", self.guid_column));
        out.push_str(&format!("#tags column:{}\n", self.tags_column));
        out.push_str(&format!("# Field mapping: {}\n", self.field_names.join(" | ")));
        out.push_str("#\n");
        out
    }
}

/// 元デッキ（TOEFL 3800形式）の1語
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// 元デッキのGUID
    pub guid: String,
    /// ノートタイプ（2列目）
    pub note_type: String,
    /// デッキ名（3列目）
    pub deck: String,
    /// 英単語（4列目）
    pub word: String,
    /// 元の意味（5列目、無い場合は空）
    pub meaning: String,
}

/// 元デッキを読み込む
///
/// コメント行と空行は読み飛ばし、4列以上ある行だけを採用する。
pub fn parse_source_deck(text: &str) -> Vec<SourceEntry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() < 4 {
                return None;
            }
            Some(SourceEntry {
                guid: parts[0].to_string(),
                note_type: parts[1].trim().to_string(),
                deck: parts[2].trim().to_string(),
                word: parts[3].trim().to_string(),
                meaning: parts.get(4).map(|s| s.to_string()).unwrap_or_default(),
            })
        })
        .collect()
}

/// 1フィールドに収まる値にする（改行は `<br>`、タブは空白）
pub fn field_value(value: &str) -> String {
    if !value.contains(['\t', '\n', '\r']) {
        return value.to_string();
    }
    value
        .replace("\r\n", "<br>")
        .replace(['\r', '\n'], "<br>")
        .replace('\t', " ")
}

/// マッピングファイル用にタブと改行をエスケープ
pub fn escape_field(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\t', "\\t").replace('\n', "\\n")
}

/// `escape_field` の逆変換
pub fn unescape_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
