//! デッキ修正パス（GUID・例文フォーマット・語源）
//!
//! どのパスもコメント行・空行・列数異常の行には触れず、
//! 値が変わった行だけを書き換える。

use std::collections::BTreeMap;
use study_deck_common::tsv::{column, escape_field, unescape_field};
use study_deck_common::vocab::{english_etymology_template, etymology_html, unify_examples};
use study_deck_common::{
    extract_word, looks_like_anki_guid, word_guid, DeckFile, Lexicon, SourceEntry,
};

/// 単語 → GUID
pub type GuidMap = BTreeMap<String, String>;

/// 単語 → 語源フィールド（divを含むHTML）
pub type EtymologyMap = BTreeMap<String, String>;

/// 元デッキから取り出した正常なGUID
#[derive(Debug, Clone, Default)]
pub struct CleanGuids {
    /// (GUID, 単語) を元デッキの順で保持
    pub pairs: Vec<(String, String)>,
    /// GUIDが異常で除外した行数
    pub rejected: usize,
}

impl CleanGuids {
    pub fn from_source(entries: &[SourceEntry]) -> Self {
        let mut clean = Self::default();
        for entry in entries {
            if looks_like_anki_guid(&entry.guid) && !entry.word.is_empty() {
                clean.pairs.push((entry.guid.clone(), entry.word.clone()));
            } else {
                clean.rejected += 1;
            }
        }
        clean
    }

    /// 2回以上出現した単語
    pub fn duplicates(&self) -> Vec<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for (_, word) in &self.pairs {
            *counts.entry(word.as_str()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(w, _)| w.to_string())
            .collect()
    }

    /// 重複時は後の行が優先
    pub fn to_map(&self) -> GuidMap {
        self.pairs
            .iter()
            .map(|(guid, word)| (word.clone(), guid.clone()))
            .collect()
    }

    /// `GUID<TAB>単語` の対応表
    pub fn to_tsv(&self) -> String {
        self.pairs
            .iter()
            .map(|(guid, word)| format!("{}\t{}\n", guid, word))
            .collect()
    }
}

/// `GUID<TAB>単語` の対応表を読み込む
pub fn parse_guid_mapping(text: &str) -> GuidMap {
    text.lines()
        .filter_map(|line| line.trim().split_once('\t'))
        .map(|(guid, word)| (word.trim().to_string(), guid.trim().to_string()))
        .filter(|(word, guid)| !word.is_empty() && !guid.is_empty())
        .collect()
}

/// GUIDの取得元
#[derive(Debug, Clone, Copy)]
pub enum GuidSource<'a> {
    /// 対応表にある単語だけ修正
    Mapping(&'a GuidMap),
    /// 単語から再生成
    Regenerate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixReport {
    pub fixed: usize,
    pub unchanged: usize,
    /// 対応表に無い単語
    pub unmapped: Vec<String>,
    /// 単語を取り出せなかった行
    pub no_word: usize,
}

/// 単語で引く（完全一致を優先し、次に小文字で照合）
fn lookup<'a>(map: &'a BTreeMap<String, String>, word: &str) -> Option<&'a String> {
    map.get(word).or_else(|| map.get(&word.to_lowercase()))
}

pub fn fix_guids(deck: &mut DeckFile, source: GuidSource<'_>) -> FixReport {
    let mut report = FixReport::default();

    for row in deck.rows_mut() {
        let word = match row.field(column::WORD).and_then(extract_word) {
            Some(w) => w.to_string(),
            None => {
                report.no_word += 1;
                continue;
            }
        };

        let correct = match source {
            GuidSource::Mapping(map) => match lookup(map, &word) {
                Some(guid) => guid.clone(),
                None => {
                    report.unmapped.push(word);
                    continue;
                }
            },
            GuidSource::Regenerate => word_guid(&word),
        };

        if row.set_field(column::GUID, correct) {
            report.fixed += 1;
        } else {
            report.unchanged += 1;
        }
    }

    report
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifyReport {
    pub examples_converted: usize,
    pub etymology_converted: usize,
}

/// 旧形式の例文を統一。`english_etymology` なら日本語の語源を英語テンプレートに置換
pub fn unify(deck: &mut DeckFile, english_etymology: bool) -> UnifyReport {
    let mut report = UnifyReport::default();

    for row in deck.rows_mut() {
        let examples = row.field(column::EXAMPLES).map(unify_examples);
        if let Some(examples) = examples {
            if row.set_field(column::EXAMPLES, examples) {
                report.examples_converted += 1;
            }
        }

        if !english_etymology {
            continue;
        }
        let is_japanese = row
            .field(column::ETYMOLOGY)
            .map(|e| e.contains("語源："))
            .unwrap_or(false);
        let word = row.field(column::WORD).and_then(extract_word).map(str::to_string);
        if let (true, Some(word)) = (is_japanese, word) {
            if row.set_field(column::ETYMOLOGY, english_etymology_template(&word)) {
                report.etymology_converted += 1;
            }
        }
    }

    report
}

/// 参照デッキから日本語の語源（`語源：` を含むもの）を集める
pub fn etymology_from_deck(deck: &DeckFile) -> EtymologyMap {
    deck.rows()
        .filter_map(|row| {
            let word = row.field(column::WORD).and_then(extract_word)?;
            let etymology = row.field(column::ETYMOLOGY)?;
            etymology
                .contains("語源：")
                .then(|| (word.to_string(), etymology.to_string()))
        })
        .collect()
}

/// 辞書の語源メモをフィールド形式で集める
pub fn etymology_from_lexicon(lexicon: &Lexicon) -> EtymologyMap {
    lexicon
        .entries
        .iter()
        .filter(|(_, entry)| !entry.etymology.is_empty())
        .map(|(word, entry)| (word.clone(), etymology_html(&entry.etymology)))
        .collect()
}

/// `単語<TAB>語源` の対応表（タブ・改行はエスケープ）
pub fn render_etymology_mapping(map: &EtymologyMap) -> String {
    map.iter()
        .map(|(word, etymology)| format!("{}\t{}\n", word, escape_field(etymology)))
        .collect()
}

pub fn parse_etymology_mapping(text: &str) -> EtymologyMap {
    text.lines()
        .filter_map(|line| line.split_once('\t'))
        .filter(|(word, _)| !word.trim().is_empty())
        .map(|(word, etymology)| (word.trim().to_string(), unescape_field(etymology)))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreReport {
    pub restored: usize,
    pub unchanged: usize,
    pub not_found: usize,
}

pub fn restore_etymology(deck: &mut DeckFile, map: &EtymologyMap) -> RestoreReport {
    let mut report = RestoreReport::default();

    for row in deck.rows_mut() {
        let etymology = row
            .field(column::WORD)
            .and_then(extract_word)
            .and_then(|w| lookup(map, w))
            .cloned();

        match etymology {
            Some(e) => {
                if row.set_field(column::ETYMOLOGY, e) {
                    report.restored += 1;
                } else {
                    report.unchanged += 1;
                }
            }
            None => report.not_found += 1,
        }
    }

    report
}
