//! 手入力問題集 → Anki TSV（クローズ形式）

use super::tsv_writer;
use crate::error::Result;
use std::path::Path;
use study_deck_common::card::{manual_front, manual_tags};
use study_deck_common::{QuestionBank, MANUAL_TSV_HEADERS};

/// 1問分のレコード（Front, Back, Tags）
pub fn manual_record(
    question: &study_deck_common::ManualQuestion,
    with_choices: bool,
) -> [String; 3] {
    [
        manual_front(question, with_choices),
        String::new(),
        manual_tags(with_choices),
    ]
}

/// 問題集をTSVに書き出し、枚数を返す
pub fn write_manual_tsv(path: &Path, bank: &QuestionBank, with_choices: bool) -> Result<usize> {
    let mut writer = tsv_writer(path, &MANUAL_TSV_HEADERS)?;
    for q in &bank.questions {
        writer.write_record(manual_record(q, with_choices))?;
    }
    writer.flush()?;
    Ok(bank.len())
}
