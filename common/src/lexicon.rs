//! 語彙辞書モジュール
//!
//! 単語ごとの意味・例文・語源メモをJSONデータとして保持する。
//! 組み込み辞書にユーザー辞書をマージして使う。

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 組み込み辞書データ
const BUILTIN_LEXICON: &str = include_str!("../data/lexicon.json");

/// 辞書の1エントリ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LexiconEntry {
    /// 日本語の意味（複数可）
    #[serde(default)]
    pub meanings: Vec<String>,
    /// 英語例文
    #[serde(default)]
    pub examples: Vec<String>,
    /// 語源・記憶法（`<br>` 区切りのHTML）
    #[serde(default)]
    pub etymology: String,
}

/// 語彙辞書
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lexicon {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub entries: BTreeMap<String, LexiconEntry>,
}

/// 1語分の補完結果
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub meanings: Vec<String>,
    pub examples: Vec<String>,
    pub etymology: String,
    /// 辞書に無く、仮の内容で埋めた場合 true
    pub is_placeholder: bool,
}

impl Lexicon {
    /// 組み込み辞書を読み込み
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_LEXICON)
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let lexicon: Self = serde_json::from_str(json)?;
        Ok(lexicon)
    }

    /// 辞書をマージ（後から追加した辞書が優先）
    pub fn merge(&mut self, other: &Lexicon) {
        self.entries.extend(other.entries.clone());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 単語を検索（完全一致を優先し、次に小文字で照合）
    pub fn get(&self, word: &str) -> Option<&LexiconEntry> {
        let word = word.trim();
        self.entries
            .get(word)
            .or_else(|| self.entries.get(&word.to_lowercase()))
    }

    /// 語源メモのみ取得
    pub fn etymology_for(&self, word: &str) -> Option<&str> {
        self.get(word)
            .map(|e| e.etymology.as_str())
            .filter(|s| !s.is_empty())
    }

    /// 単語の補完内容を決定
    ///
    /// 辞書に無い単語、または欠けているフィールドは仮の内容で埋める。
    pub fn resolve(&self, word: &str) -> Enrichment {
        let word = word.trim();
        match self.get(word) {
            Some(entry) => Enrichment {
                meanings: if entry.meanings.is_empty() {
                    vec![placeholder_meaning(word)]
                } else {
                    entry.meanings.clone()
                },
                examples: if entry.examples.is_empty() {
                    placeholder_examples(word)
                } else {
                    entry.examples.clone()
                },
                etymology: if entry.etymology.is_empty() {
                    placeholder_etymology(word)
                } else {
                    entry.etymology.clone()
                },
                is_placeholder: false,
            },
            None => Enrichment {
                meanings: vec![placeholder_meaning(word)],
                examples: placeholder_examples(word),
                etymology: placeholder_etymology(word),
                is_placeholder: true,
            },
        }
    }
}

pub fn placeholder_meaning(word: &str) -> String {
    format!("{}（高品質定義生成中）", word)
}

pub fn placeholder_examples(word: &str) -> Vec<String> {
    vec![
        format!("The word '{}' appears frequently in academic texts.", word),
        format!("Understanding '{}' is crucial for TOEFL success.", word),
        format!("Many students find '{}' challenging to remember.", word),
    ]
}

pub fn placeholder_etymology(word: &str) -> String {
    format!(
        "語源：{}の詳細な語源分析<br>関連語との繋がりで記憶を強化<br>TOEFL頻出語として重要度高",
        word
    )
}

/// 仮の語源メモかどうか
pub fn is_placeholder_etymology(text: &str) -> bool {
    text.contains("の詳細な語源分析")
}
