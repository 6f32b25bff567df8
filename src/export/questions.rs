//! OCR結果の出力（JSON・構造化テキスト）

use super::{ensure_parent, write_json};
use crate::error::Result;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use study_deck_common::PracticeQuestion;

pub const RESULTS_FILE_NAME: &str = "ocr_results.json";
pub const STRUCTURED_FILE_NAME: &str = "cc_questions.txt";

/// 解析済みの問題を読みやすいテキストに整形
pub fn structured_text(questions: &[PracticeQuestion]) -> String {
    let rule = "=".repeat(80);
    let mut out = String::new();
    let _ = writeln!(out, "ISC2 Certificate in Cybersecurity (CC) 練習問題集");
    let _ = writeln!(out, "{}\n", rule);

    for (num, q) in questions.iter().filter(|q| q.parsed).enumerate() {
        let _ = writeln!(out, "【問題 {}】 {}", num + 1, q.file_name);
        let _ = writeln!(out, "{}", "-".repeat(60));
        let _ = writeln!(out, "問題: {}\n", q.question);

        let _ = writeln!(out, "選択肢:");
        for (i, choice) in q.choices.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, choice);
        }
        out.push('\n');

        if !q.correct_answer.is_empty() {
            let _ = writeln!(out, "正解: {}", q.correct_answer);
        }
        if !q.explanation.is_empty() {
            let _ = writeln!(out, "解説: {}", q.explanation);
        }
        if !q.attempt_info.is_empty() {
            let _ = writeln!(out, "情報: {}", q.attempt_info);
        }
        if let Some(score) = q.score {
            let _ = writeln!(out, "スコア: {}", score);
        }
        if q.manual_fixed {
            let _ = writeln!(out, "（手動修正済み）");
        }

        let _ = writeln!(out, "\n{}\n", rule);
    }

    out
}

/// `ocr_results.json` と `cc_questions.txt` を書き出し、パスを返す
pub fn write_outputs(output_dir: &Path, questions: &[PracticeQuestion]) -> Result<(PathBuf, PathBuf)> {
    let json_path = output_dir.join(RESULTS_FILE_NAME);
    write_json(&json_path, questions)?;

    let text_path = output_dir.join(STRUCTURED_FILE_NAME);
    ensure_parent(&text_path)?;
    std::fs::write(&text_path, structured_text(questions))?;

    Ok((json_path, text_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_text_skips_unparsed() {
        let questions = vec![
            PracticeQuestion {
                file_name: "a.png".into(),
                question: "Which of the following is a preventive control?".into(),
                choices: vec!["Firewall".into(), "Audit log".into()],
                correct_answer: "Firewall".into(),
                parsed: true,
                ..Default::default()
            },
            PracticeQuestion::failed("b.png", "OCR実行エラー"),
        ];

        let text = structured_text(&questions);
        assert!(text.contains("【問題 1】 a.png"));
        assert!(text.contains("  2. Audit log"));
        assert!(text.contains("正解: Firewall"));
        assert!(!text.contains("b.png"));
    }
}
