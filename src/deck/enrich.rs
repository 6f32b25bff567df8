//! 元デッキ → 補完済みAnki TSV

use super::{write_text, CARD_TEMPLATE_CSS};
use crate::error::Result;
use crate::progress;
use std::path::Path;
use study_deck_common::tsv::parse_source_deck;
use study_deck_common::{AnkiHeader, Lexicon, SourceEntry, VocabCard};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub note_type: String,
    pub deck: String,
    pub tags: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct EnrichReport {
    pub cards: Vec<VocabCard>,
    /// 辞書に無く仮データで埋めた語
    pub placeholders: Vec<String>,
}

/// 単語ごとにカードを作成
pub fn build_cards(entries: &[SourceEntry], lexicon: &Lexicon, opts: &EnrichOptions) -> EnrichReport {
    let words: Vec<&str> = entries
        .iter()
        .map(|e| e.word.as_str())
        .filter(|w| !w.is_empty())
        .take(opts.limit.unwrap_or(usize::MAX))
        .collect();

    let pb = progress::bar(words.len());
    let mut report = EnrichReport::default();

    for word in words {
        pb.set_message(word.to_string());
        let card = VocabCard::from_lexicon(word, lexicon, &opts.tags);
        if card.placeholder {
            debug!(word, "辞書に無い語");
            report.placeholders.push(card.word.clone());
        }
        report.cards.push(card);
        pb.inc(1);
    }
    pb.finish_and_clear();

    report
}

/// ヘッダーブロック＋カード行
pub fn render_deck(header: &AnkiHeader, cards: &[VocabCard]) -> String {
    let mut out = header.render();
    for card in cards {
        out.push_str(&card.to_tsv_line());
        out.push('\n');
    }
    out
}

/// 元デッキを読み込み、TSVとCSSを書き出す
pub fn enrich_file(
    input: &Path,
    output: &Path,
    css: &Path,
    lexicon: &Lexicon,
    opts: &EnrichOptions,
) -> Result<EnrichReport> {
    let entries = parse_source_deck(&super::read_text(input)?);
    let report = build_cards(&entries, lexicon, opts);

    let header = AnkiHeader::vocabulary(&opts.note_type, &opts.deck);
    write_text(output, &render_deck(&header, &report.cards))?;
    write_text(css, CARD_TEMPLATE_CSS)?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_deck_common::{DeckFile, VOCAB_FIELD_COUNT};

    fn options(limit: Option<usize>) -> EnrichOptions {
        EnrichOptions {
            note_type: "Enhanced TOEFL Vocabulary".into(),
            deck: "toefl3800-enhanced".into(),
            tags: "toefl".into(),
            limit,
        }
    }

    fn entries(words: &[&str]) -> Vec<SourceEntry> {
        words
            .iter()
            .map(|w| SourceEntry { guid: "abcdefghij".into(), word: w.to_string(), ..Default::default() })
            .collect()
    }

    #[test]
    fn test_build_cards_limit_and_placeholders() {
        let lexicon = Lexicon::builtin().unwrap();
        let report = build_cards(&entries(&["ambush", "zzqxword", "crane"]), &lexicon, &options(Some(2)));
        assert_eq!(report.cards.len(), 2);
        assert_eq!(report.placeholders, vec!["zzqxword"]);
    }

    #[test]
    fn test_rendered_deck_rows_have_six_fields() {
        let lexicon = Lexicon::builtin().unwrap();
        let report = build_cards(&entries(&["ambush", "zzqxword"]), &lexicon, &options(None));
        let header = AnkiHeader::vocabulary("Enhanced TOEFL Vocabulary", "toefl3800-enhanced");
        let text = render_deck(&header, &report.cards);

        let deck = DeckFile::parse(&text, VOCAB_FIELD_COUNT);
        assert_eq!(deck.row_count(), 2);
        assert_eq!(deck.malformed_count(), 0);
        assert!(text.starts_with("# Enhanced TOEFL Vocabulary Import File\n"));
        assert!(text.contains("#deck:toefl3800-enhanced\n"));
    }
}
