//! 手入力問題集（OCRを通さずに完全な問題を登録）

use crate::error::{Result, StudyDeckError};
use dialoguer::{Input, Select};
use std::path::Path;
use study_deck_common::question::MANUAL_CHOICE_COUNT;
use study_deck_common::{ManualQuestion, QuestionBank};
use tracing::info;

/// 問題集を読み込み（ファイルが無ければ組み込みの問題集）
pub fn load_bank(path: &Path) -> Result<QuestionBank> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        Ok(QuestionBank::from_json(&content)?)
    } else {
        info!(path = %path.display(), "問題集が無いため組み込みデータを使用");
        Ok(QuestionBank::builtin()?)
    }
}

pub fn save_bank(path: &Path, bank: &QuestionBank) -> Result<()> {
    crate::export::ensure_parent(path)?;
    std::fs::write(path, bank.to_json()?)?;
    Ok(())
}

/// 一覧表示用の1行
pub fn summary_line(q: &ManualQuestion) -> String {
    let preview: String = q.question.chars().take(60).collect();
    format!("Q{:>3}: {} → {}", q.number, preview, q.correct_answer)
}

fn prompt_text(prompt: &str, allow_empty: bool) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(allow_empty)
        .interact_text()
        .map_err(|e| StudyDeckError::Prompt(e.to_string()))
}

/// 対話形式で1問入力
pub fn prompt_question(number: u32) -> Result<ManualQuestion> {
    println!("📝 Q{} を入力します", number);

    let situation = prompt_text("状況説明（省略可）", true)?;
    let question = prompt_text("問題文", false)?;

    let mut choices = Vec::with_capacity(MANUAL_CHOICE_COUNT);
    for i in 0..MANUAL_CHOICE_COUNT {
        let letter = study_deck_common::question::choice_letter(i);
        choices.push(prompt_text(&format!("選択肢{}", letter), false)?);
    }

    let correct = Select::new()
        .with_prompt("正解を選択")
        .items(&choices)
        .default(0)
        .interact()
        .map_err(|e| StudyDeckError::Prompt(e.to_string()))?;

    let explanation = prompt_text("解説", true)?;

    let correct_answer = choices[correct].clone();
    Ok(ManualQuestion::new(
        number,
        situation,
        question,
        choices,
        correct_answer,
        explanation,
    )?)
}
