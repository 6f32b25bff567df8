//! 練習問題の型定義
//!
//! - `PracticeQuestion`: スクリーンショットのOCR結果から抽出した問題（不完全なことがある）
//! - `ManualQuestion`: 手入力した完全な問題（常に4択・正解付き）
//! - `QuestionOverride`: ファイル名単位でOCR結果を差し替える手動修正

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 解析成功とみなす最小の選択肢数
pub const MIN_CHOICES: usize = 2;
/// OCR結果に保持する最大の選択肢数
pub const MAX_CHOICES: usize = 6;
/// 手入力問題の選択肢数
pub const MANUAL_CHOICE_COUNT: usize = 4;

/// 組み込み問題集
const BUILTIN_BANK: &str = include_str!("../data/cc_questions.json");

/// OCRから抽出した練習問題
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PracticeQuestion {
    /// 元のスクリーンショットファイル名
    #[serde(alias = "filename")]
    pub file_name: String,
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    /// 「Attempt taken」等の受験情報
    #[serde(default)]
    pub attempt_info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    /// 問題文と選択肢が揃っているか
    #[serde(default)]
    pub parsed: bool,
    /// 手動修正を適用したか
    #[serde(default)]
    pub manual_fixed: bool,
    /// 処理エラー（OCR失敗など）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PracticeQuestion {
    /// 処理に失敗したファイルの記録
    pub fn failed(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            error: Some(error.into()),
            parsed: false,
            ..Default::default()
        }
    }

    pub fn has_question(&self) -> bool {
        !self.question.trim().is_empty()
    }

    /// 空でない選択肢の数
    pub fn filled_choices(&self) -> usize {
        self.choices.iter().filter(|c| !c.trim().is_empty()).count()
    }

    /// `parsed` フラグを現在の内容から再計算
    ///
    /// 問題文が空、または選択肢がすべて空なら必ず false。
    pub fn refresh_parsed(&mut self) {
        self.parsed =
            self.error.is_none() && self.has_question() && self.filled_choices() >= MIN_CHOICES;
    }

    /// 手動修正で内容を差し替える
    pub fn apply_override(&mut self, fix: &QuestionOverride) {
        self.question = fix.question.clone();
        self.choices = fix.choices.clone();
        self.correct_answer = fix.correct_answer.clone();
        self.explanation = fix.explanation.clone();
        self.manual_fixed = true;
        self.error = None;
        self.refresh_parsed();
    }
}

/// 手入力の練習問題
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualQuestion {
    pub number: u32,
    /// 問題の前提となる状況説明（無い場合は空）
    #[serde(default)]
    pub situation: String,
    pub question: String,
    pub choices: Vec<String>,
    #[serde(alias = "correct")]
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}

impl ManualQuestion {
    /// 検証付きで作成
    pub fn new(
        number: u32,
        situation: impl Into<String>,
        question: impl Into<String>,
        choices: Vec<String>,
        correct_answer: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Result<Self> {
        let q = Self {
            number,
            situation: situation.into().trim().to_string(),
            question: question.into().trim().to_string(),
            choices: choices.into_iter().map(|c| c.trim().to_string()).collect(),
            correct_answer: correct_answer.into().trim().to_string(),
            explanation: explanation.into().trim().to_string(),
        };
        q.validate()?;
        Ok(q)
    }

    /// 問題文・4つの選択肢・正解が揃っているか検証
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(Error::Validation(format!("Q{}: 問題文が空です", self.number)));
        }
        if self.choices.len() != MANUAL_CHOICE_COUNT {
            return Err(Error::Validation(format!(
                "Q{}: 選択肢は{}つ必要です（{}つ）",
                self.number,
                MANUAL_CHOICE_COUNT,
                self.choices.len()
            )));
        }
        if self.choices.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::Validation(format!("Q{}: 空の選択肢があります", self.number)));
        }
        if self.correct_index().is_none() {
            return Err(Error::Validation(format!(
                "Q{}: 正解「{}」が選択肢にありません",
                self.number, self.correct_answer
            )));
        }
        Ok(())
    }

    pub fn correct_index(&self) -> Option<usize> {
        self.choices.iter().position(|c| c == &self.correct_answer)
    }

    /// 正解の記号（A〜D）
    pub fn correct_letter(&self) -> Option<char> {
        self.correct_index().map(choice_letter)
    }

    /// 状況説明と問題文をつなげた本文
    pub fn full_question(&self) -> String {
        if self.situation.is_empty() {
            self.question.clone()
        } else {
            format!("{}\n\n{}", self.situation, self.question)
        }
    }

    /// OCR結果と同じ形式に変換
    pub fn to_practice(&self) -> PracticeQuestion {
        let mut q = PracticeQuestion {
            file_name: format!("manual-{:03}", self.number),
            question: self.full_question(),
            choices: self.choices.clone(),
            correct_answer: self.correct_answer.clone(),
            explanation: self.explanation.clone(),
            manual_fixed: true,
            ..Default::default()
        };
        q.refresh_parsed();
        q
    }
}

/// 0始まりの番号を選択肢記号に変換
pub fn choice_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// 手入力問題集
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionBank {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub questions: Vec<ManualQuestion>,
}

impl QuestionBank {
    const CURRENT_VERSION: u32 = 1;

    /// 組み込みの問題集
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_BANK)
    }

    /// JSON文字列から読み込み、全問題を検証
    pub fn from_json(json: &str) -> Result<Self> {
        let bank: Self = serde_json::from_str(json)?;
        for q in &bank.questions {
            q.validate()?;
        }
        Ok(bank)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 次に使う問題番号
    pub fn next_number(&self) -> u32 {
        self.questions.iter().map(|q| q.number).max().unwrap_or(0) + 1
    }

    /// 検証済みの問題を追加
    pub fn push(&mut self, question: ManualQuestion) -> Result<()> {
        question.validate()?;
        if self.questions.iter().any(|q| q.number == question.number) {
            return Err(Error::Validation(format!("Q{} は既に登録されています", question.number)));
        }
        self.version = Self::CURRENT_VERSION;
        self.questions.push(question);
        self.questions.sort_by_key(|q| q.number);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// OCR結果の手動修正データ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOverride {
    pub question: String,
    pub choices: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}

/// ファイル名 → 手動修正
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManualOverrides {
    pub entries: BTreeMap<String, QuestionOverride>,
}

impl ManualOverrides {
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: Self = serde_json::from_str(json)?;
        Ok(overrides)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 該当ファイルに手動修正を適用し、適用件数を返す
    pub fn apply(&self, questions: &mut [PracticeQuestion]) -> usize {
        let mut applied = 0;
        for q in questions.iter_mut() {
            if let Some(fix) = self.entries.get(&q.file_name) {
                q.apply_override(fix);
                applied += 1;
            }
        }
        applied
    }
}
