//! OCR問題 → Ankiカード（TSV・JSON・品質レポート）

use super::{ensure_parent, tsv_writer, write_json};
use crate::error::Result;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use study_deck_common::card::{CARD_CHOICES, MAX_QUALITY_SCORE, OCR_CARD_TAGS};
use study_deck_common::{PracticeQuestion, QuestionCard, CARD_TSV_HEADERS};

pub const CARDS_TSV_NAME: &str = "cc_anki_cards.tsv";
pub const CARDS_JSON_NAME: &str = "cc_anki_cards.json";
pub const REPORT_NAME: &str = "quality_report.md";

/// 高品質とみなすスコア
pub const HIGH_QUALITY_SCORE: u8 = 5;
/// 中品質の下限
pub const MEDIUM_QUALITY_SCORE: u8 = 3;
/// 失敗ファイル一覧のテキスト抜粋
const RAW_PREVIEW_LEN: usize = 100;

/// 解析済みの問題だけをカードにする（IDは1から連番）
pub fn build_cards(questions: &[PracticeQuestion]) -> Vec<QuestionCard> {
    questions
        .iter()
        .filter(|q| q.parsed)
        .enumerate()
        .filter_map(|(i, q)| QuestionCard::from_question(i + 1, q, OCR_CARD_TAGS))
        .collect()
}

/// スコア別の枚数（添字 = スコア）
pub fn score_distribution(cards: &[QuestionCard]) -> Vec<usize> {
    let mut dist = vec![0; MAX_QUALITY_SCORE as usize + 1];
    for card in cards {
        dist[card.quality_score.min(MAX_QUALITY_SCORE) as usize] += 1;
    }
    dist
}

pub fn high_quality_count(cards: &[QuestionCard]) -> usize {
    cards.iter().filter(|c| c.quality_score >= HIGH_QUALITY_SCORE).count()
}

/// 品質区分（高: 5点以上 / 中: 3〜4点 / 低: 3点未満）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityTier {
    High,
    Medium,
    Low,
}

impl QualityTier {
    pub fn of(card: &QuestionCard) -> Self {
        match card.quality_score {
            s if s >= HIGH_QUALITY_SCORE => Self::High,
            s if s >= MEDIUM_QUALITY_SCORE => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "高品質",
            Self::Medium => "中品質",
            Self::Low => "要確認",
        }
    }
}

/// 減点の理由
pub fn card_issues(card: &QuestionCard) -> Vec<String> {
    let mut issues = Vec::new();
    if card.question.chars().count() <= 15 {
        issues.push("問題文が短い".to_string());
    }
    let filled = card.choices.iter().filter(|c| !c.is_empty()).count();
    if filled < CARD_CHOICES {
        issues.push(format!("選択肢が{}つ", filled));
    }
    if card.correct_answer.is_empty() {
        issues.push("正解なし".to_string());
    }
    if card.explanation.chars().count() <= 10 {
        issues.push("解説なし".to_string());
    }
    issues
}

fn preview(text: &str, len: usize) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").chars().take(len).collect()
}

fn flag(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Markdownの品質レポート
///
/// `questions` は元のOCR結果。未解析のファイルを一覧にする。
pub fn quality_report(cards: &[QuestionCard], questions: &[PracticeQuestion]) -> String {
    let total = cards.len();
    let high = high_quality_count(cards);
    let manual: Vec<&QuestionCard> = cards.iter().filter(|c| c.manual_fixed).collect();

    let mut out = String::new();
    let _ = writeln!(out, "# CC練習問題 Ankiデッキ品質レポート\n");
    let _ = writeln!(out, "## サマリー");
    let _ = writeln!(out, "- **総カード数**: {}枚", total);
    let _ = writeln!(
        out,
        "- **高品質カード ({}-{}点)**: {}枚 ({:.1}%)",
        HIGH_QUALITY_SCORE,
        MAX_QUALITY_SCORE,
        high,
        percent(high, total)
    );
    let _ = writeln!(out, "- **手動修正適用**: {}枚", manual.len());
    let _ = writeln!(out, "- **自動処理**: {}枚\n", total - manual.len());

    let _ = writeln!(out, "## 品質スコア分布");
    let dist = score_distribution(cards);
    for score in (0..=MAX_QUALITY_SCORE).rev() {
        let count = dist[score as usize];
        let _ = writeln!(
            out,
            "- **{}点** {}: {}枚 ({:.1}%)",
            score,
            "⭐".repeat(score as usize),
            count,
            percent(count, total)
        );
    }

    let _ = writeln!(out, "\n## 品質区分");
    for tier in [QualityTier::High, QualityTier::Medium, QualityTier::Low] {
        let count = cards.iter().filter(|c| QualityTier::of(c) == tier).count();
        let _ = writeln!(out, "- **{}**: {}枚 ({:.1}%)", tier.label(), count, percent(count, total));
    }

    let _ = writeln!(out, "\n## 手動修正適用済みカード");
    if manual.is_empty() {
        let _ = writeln!(out, "- なし");
    }
    for card in manual {
        let _ = writeln!(out, "- {}: {}...", card.file_name, preview(&card.question, 60));
    }

    let _ = writeln!(out, "\n## 要確認カード（{}点未満）", MEDIUM_QUALITY_SCORE);
    let low: Vec<&QuestionCard> = cards.iter().filter(|c| QualityTier::of(c) == QualityTier::Low).collect();
    if low.is_empty() {
        let _ = writeln!(out, "- なし");
    }
    for card in low {
        let _ = writeln!(
            out,
            "- {} ({}点): {} [{}]",
            card.file_name,
            card.quality_score,
            preview(&card.question, 60),
            card_issues(card).join(", ")
        );
    }

    let failed: Vec<&PracticeQuestion> = questions.iter().filter(|q| !q.parsed).collect();
    let _ = writeln!(out, "\n## 未解析ファイル ({}件)", failed.len());
    if failed.is_empty() {
        let _ = writeln!(out, "- なし");
    }
    for q in failed {
        let _ = writeln!(
            out,
            "- **{}** 問題文{} 選択肢{}",
            q.file_name,
            flag(q.has_question()),
            flag(q.filled_choices() > 0)
        );
        if let Some(err) = &q.error {
            let _ = writeln!(out, "  - エラー: {}", err);
        }
        if !q.raw_text.is_empty() {
            let _ = writeln!(out, "  - テキスト: {}", preview(&q.raw_text, RAW_PREVIEW_LEN));
        }
    }

    out
}

#[derive(Debug, Clone)]
pub struct CardOutputs {
    pub tsv: PathBuf,
    pub json: PathBuf,
    pub report: PathBuf,
}

/// TSV・JSON・レポートを書き出す
pub fn write_outputs(
    output_dir: &Path,
    cards: &[QuestionCard],
    questions: &[PracticeQuestion],
) -> Result<CardOutputs> {
    let tsv = output_dir.join(CARDS_TSV_NAME);
    let mut writer = tsv_writer(&tsv, &CARD_TSV_HEADERS)?;
    for card in cards {
        writer.write_record(card.to_record())?;
    }
    writer.flush()?;

    let json = output_dir.join(CARDS_JSON_NAME);
    write_json(&json, cards)?;

    let report = output_dir.join(REPORT_NAME);
    ensure_parent(&report)?;
    std::fs::write(&report, quality_report(cards, questions))?;

    Ok(CardOutputs { tsv, json, report })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(file: &str, manual: bool) -> PracticeQuestion {
        let mut q = PracticeQuestion {
            file_name: file.into(),
            question: "Which of the following best describes a firewall?".into(),
            choices: vec![
                "A network filter".into(),
                "A backup tool".into(),
                "An audit log".into(),
                "A password".into(),
            ],
            correct_answer: "A network filter".into(),
            explanation: "Firewalls filter traffic between networks.".into(),
            manual_fixed: manual,
            ..Default::default()
        };
        q.refresh_parsed();
        q
    }

    #[test]
    fn test_build_cards_only_parsed() {
        let questions = vec![
            parsed("a.png", false),
            PracticeQuestion::failed("b.png", "error"),
            parsed("c.png", true),
        ];
        let cards = build_cards(&questions);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].card_id, 1);
        assert_eq!(cards[1].card_id, 2);
        assert_eq!(cards[1].file_name, "c.png");
    }

    #[test]
    fn test_quality_report_lists_manual_fixes() {
        let cards = build_cards(&[parsed("a.png", false), parsed("c.png", true)]);
        let report = quality_report(&cards, &[]);
        assert!(report.contains("**総カード数**: 2枚"));
        assert!(report.contains("- c.png: Which of the following"));
        assert_eq!(score_distribution(&cards).iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_quality_report_empty() {
        let report = quality_report(&[], &[]);
        assert!(report.contains("0枚 (0.0%)"));
    }

    #[test]
    fn test_quality_tiers_and_low_quality_list() {
        let mut weak = PracticeQuestion {
            file_name: "weak.png".into(),
            question: "Why?".into(),
            choices: vec!["Allow traffic".into(), "Deny traffic".into()],
            ..Default::default()
        };
        weak.refresh_parsed();
        let cards = build_cards(&[parsed("a.png", false), weak]);
        assert_eq!(QualityTier::of(&cards[0]), QualityTier::High);
        assert_eq!(QualityTier::of(&cards[1]), QualityTier::Low);

        let issues = card_issues(&cards[1]);
        assert!(issues.contains(&"問題文が短い".to_string()));
        assert!(issues.contains(&"選択肢が2つ".to_string()));
        assert!(issues.contains(&"解説なし".to_string()));
        assert!(!issues.contains(&"正解なし".to_string()));
        assert!(card_issues(&cards[0]).is_empty());

        let report = quality_report(&cards, &[]);
        assert!(report.contains("- **高品質**: 1枚 (50.0%)"));
        assert!(report.contains("- **要確認**: 1枚 (50.0%)"));
        assert!(report.contains("- weak.png (2点): Why? [問題文が短い, 選択肢が2つ, 解説なし]"));
    }

    #[test]
    fn test_quality_report_lists_unparsed_files() {
        let mut no_choices = PracticeQuestion {
            file_name: "partial.png".into(),
            raw_text: "Which concept does this task demonstrate?\nScroll down".into(),
            question: "Which concept does this task demonstrate?".into(),
            ..Default::default()
        };
        no_choices.refresh_parsed();
        let questions = vec![
            parsed("a.png", false),
            no_choices,
            PracticeQuestion::failed("broken.png", "OCRがタイムアウトしました（60秒）"),
        ];
        let cards = build_cards(&questions);
        let report = quality_report(&cards, &questions);

        assert!(report.contains("## 未解析ファイル (2件)"));
        assert!(report.contains("- **partial.png** 問題文✓ 選択肢✗"));
        assert!(report.contains("  - テキスト: Which concept does this task demonstrate? Scroll down"));
        assert!(report.contains("- **broken.png** 問題文✗ 選択肢✗"));
        assert!(report.contains("  - エラー: OCRがタイムアウトしました（60秒）"));
        assert!(!report.contains("**a.png**"));
    }
}
