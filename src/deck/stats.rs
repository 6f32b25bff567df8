//! デッキ統計

use std::collections::BTreeMap;
use study_deck_common::tsv::column;
use study_deck_common::vocab::etymology_text;
use study_deck_common::{classify_etymology, extract_word, word_guid, DeckFile, EtymologyStyle};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeckStats {
    pub rows: usize,
    pub malformed: usize,
    /// 単語を取り出せなかった行
    pub missing_word: usize,
    /// 2回以上出現した単語
    pub duplicate_words: Vec<String>,
    /// 単語から生成したGUIDと一致しない行
    pub guid_mismatches: usize,
    pub etymology_styles: BTreeMap<EtymologyStyle, usize>,
}

impl DeckStats {
    pub fn collect(deck: &DeckFile) -> Self {
        let mut stats = Self {
            rows: deck.row_count(),
            malformed: deck.malformed_count(),
            ..Default::default()
        };
        let mut word_counts: BTreeMap<&str, usize> = BTreeMap::new();

        for row in deck.rows() {
            let etymology = row.field(column::ETYMOLOGY).map(etymology_text).unwrap_or("");
            *stats
                .etymology_styles
                .entry(classify_etymology(etymology))
                .or_insert(0) += 1;

            let Some(word) = row.field(column::WORD).and_then(extract_word) else {
                stats.missing_word += 1;
                continue;
            };
            *word_counts.entry(word).or_insert(0) += 1;

            if row.field(column::GUID) != Some(word_guid(word).as_str()) {
                stats.guid_mismatches += 1;
            }
        }

        stats.duplicate_words = word_counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(w, _)| w.to_string())
            .collect();

        stats
    }

    pub fn style_count(&self, style: EtymologyStyle) -> usize {
        self.etymology_styles.get(&style).copied().unwrap_or(0)
    }

    /// 日本語の語源メモの割合（%）
    pub fn japanese_ratio(&self) -> f64 {
        if self.rows == 0 {
            return 0.0;
        }
        self.style_count(EtymologyStyle::Japanese) as f64 / self.rows as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_deck_common::VOCAB_FIELD_COUNT;

    #[test]
    fn test_collect() {
        let good = word_guid("ambush");
        let text = format!(
            "#deck:x\n\
{good}\t<div class=\"word\">ambush</div>\td\te\t<div class=\"etymology\">語源：古フランス語</div>\tt\n\
bad\t<div class=\"word\">ambush</div>\td\te\t<div class=\"etymology\">From Latin</div>\tt\n\
bad\t<div class=\"word\">tan</div>\td\te\t<div class=\"etymology\">語源：tanの詳細な語源分析</div>\tt\n\
short\trow\n"
        );
        let stats = DeckStats::collect(&DeckFile::parse(&text, VOCAB_FIELD_COUNT));

        assert_eq!(stats.rows, 3);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.duplicate_words, vec!["ambush"]);
        assert_eq!(stats.guid_mismatches, 2);
        assert_eq!(stats.style_count(EtymologyStyle::Japanese), 1);
        assert_eq!(stats.style_count(EtymologyStyle::English), 1);
        assert_eq!(stats.style_count(EtymologyStyle::Placeholder), 1);
        assert!((stats.japanese_ratio() - 100.0 / 3.0).abs() < 1e-9);
    }
}
