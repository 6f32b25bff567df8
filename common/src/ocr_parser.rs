//! OCRテキストの問題分解
//!
//! スクリーンショットから得たテキストを問題文・選択肢・正解・解説に分ける。
//! 経験則による抽出なので、結果は `parsed` フラグで成否を判断する。
//!
//! 抽出順:
//! 1. スコア・受験情報
//! 2. 記号付き選択肢（`A)` `B.` など、チェックマークで正解）
//! 3. 問題文（疑問詞を含む行・`?` で終わる行のうち最長のもの）
//! 4. 記号なし選択肢（問題文と解説の間の行から推定）
//! 5. 正解（`Correct Answer` の次行、チェックマーク行）
//! 6. 解説（`Explanation` 見出し以降）

use crate::question::{PracticeQuestion, MAX_CHOICES, MIN_CHOICES};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref SPACES_RE: Regex = Regex::new(r"[ \t]+").unwrap();
    static ref SPACE_AROUND_NEWLINE_RE: Regex = Regex::new(r" *\n *").unwrap();
    static ref BLANK_RUN_RE: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref SCORE_RE: Regex = Regex::new(r"Score\s*(\d+)").unwrap();
    static ref LABELED_CHOICE_RE: Regex = Regex::new(r"^\(?([A-F])[).:]\s*(.+)$").unwrap();
    static ref CHECK_MARK_RE: Regex = Regex::new(r"[✓✔☑]").unwrap();
    static ref CHOICE_MARKER_RE: Regex = Regex::new(r"^(?:[A-Fa-f]|\d{1,2})[).:]\s+").unwrap();
    static ref CORRECT_LABEL_RE: Regex = Regex::new(r"(?i)correct answers?").unwrap();
    static ref CORRECT_AFTER_HEADER_RE: Regex =
        Regex::new(r"Correct Answers?[ \t]*\n\s*([^\n]+)").unwrap();
    static ref CHECKED_LINE_RE: Regex = Regex::new(r"[✓✔]\s*([^\n]+)").unwrap();
}

/// 問題文の書き出し
pub const QUESTION_STARTERS: &[&str] = &[
    "For which of the following",
    "Which of the following",
    "Of the following",
    "What",
    "Which",
    "How",
    "Where",
    "When",
    "Why",
];

/// 選択肢ではない行に含まれる語（小文字で照合）
const EXCLUDE_KEYWORDS: &[&str] = &[
    "progress",
    "accuracy",
    "answers",
    "cyder",
    "chess",
    "usage",
    "isc2",
    "obrizum",
    "google",
    "anki",
    "attempt taken",
    "score",
    "seconds",
    "explanation",
    "correct answer",
    "http",
    "@",
    "www",
    ".com",
    ".io",
];

/// 選択肢らしさを判断する用語
const TECH_TERMS: &[&str] = &[
    "system", "data", "access", "control", "security", "network", "password", "encryption",
    "firewall", "malware", "virus", "threat", "risk", "asset", "policy", "procedure", "medical",
    "streaming", "retail", "records", "camera", "patient",
];

const QUESTION_MIN_LEN: usize = 15;
const QUESTION_MAX_LEN: usize = 300;
const CHOICE_MIN_LEN: usize = 5;
const CHOICE_MAX_LEN: usize = 150;
const EXPLANATION_MAX_LINES: usize = 5;
const EXPLANATION_MIN_LINE_LEN: usize = 15;

/// OCRテキストの空白・改行を整える
pub fn clean_ocr_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = SPACES_RE.replace_all(&text, " ");
    let text = SPACE_AROUND_NEWLINE_RE.replace_all(&text, "\n");
    let text = BLANK_RUN_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// OCRテキストを問題に分解
pub fn segment(raw_text: &str, file_name: &str) -> PracticeQuestion {
    let text = clean_ocr_text(raw_text);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let mut q = PracticeQuestion {
        file_name: file_name.to_string(),
        raw_text: text.clone(),
        ..Default::default()
    };

    // 1. スコア・受験情報
    q.score = SCORE_RE
        .captures(&text)
        .and_then(|c| c[1].parse().ok());
    q.attempt_info = lines
        .iter()
        .find(|l| l.to_lowercase().contains("attempt taken"))
        .map(|l| l.to_string())
        .unwrap_or_default();

    // 2. 記号付き選択肢
    let labeled = labeled_choices(&lines);

    // 3. 問題文
    let question_index = detect_question(&lines);
    if let Some(idx) = question_index {
        q.question = lines[idx].to_string();
    }

    // 4. 選択肢
    if labeled.len() >= MIN_CHOICES {
        q.choices = labeled.iter().map(|(text, _)| text.clone()).collect();
        if let Some((text, _)) = labeled.iter().find(|(_, checked)| *checked) {
            q.correct_answer = text.clone();
        }
    } else {
        q.choices = unlabeled_choices(&lines, question_index);
    }
    q.choices.truncate(MAX_CHOICES);

    // 5. 正解
    if q.correct_answer.is_empty() {
        q.correct_answer = detect_correct_answer(&text, &lines);
    }

    // 6. 解説
    q.explanation = detect_explanation(&lines);

    q.refresh_parsed();
    q
}

fn starts_with_question(line: &str) -> bool {
    QUESTION_STARTERS.iter().any(|s| line.starts_with(s))
}

fn is_explanation_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower == "explanation" || lower.starts_with("explanation:")
}

/// `A) ...` 形式の選択肢（本文, チェック有無）
fn labeled_choices(lines: &[&str]) -> Vec<(String, bool)> {
    let mut seen = HashSet::new();
    lines
        .iter()
        .filter_map(|line| {
            let caps = LABELED_CHOICE_RE.captures(line)?;
            let checked = CHECK_MARK_RE.is_match(line);
            let body = CHECK_MARK_RE.replace_all(&caps[2], "").trim().to_string();
            if body.is_empty() || !seen.insert(caps[1].to_string()) {
                return None;
            }
            Some((body, checked))
        })
        .collect()
}

/// 問題文の行番号を推定（候補のうち最長）
fn detect_question(lines: &[&str]) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !LABELED_CHOICE_RE.is_match(line))
        .filter(|(_, line)| {
            let len = line.chars().count();
            let has_starter = QUESTION_STARTERS.iter().any(|s| line.contains(s))
                && (QUESTION_MIN_LEN..=QUESTION_MAX_LEN).contains(&len);
            let ends_with_mark = line.ends_with('?') && len > 20;
            has_starter || ends_with_mark
        })
        .max_by_key(|(idx, line)| (line.chars().count(), std::cmp::Reverse(*idx)))
        .map(|(idx, _)| idx)
}

/// 記号なし選択肢を推定
///
/// 問題文が見つかっていれば、問題文の後から解説見出しの前までを対象にする。
fn unlabeled_choices(lines: &[&str], question_index: Option<usize>) -> Vec<String> {
    let start = question_index.map(|i| i + 1).unwrap_or(0);
    let end = lines
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, l)| is_explanation_header(l))
        .map(|(i, _)| i)
        .unwrap_or(lines.len());

    let mut seen = HashSet::new();
    let mut choices = Vec::new();

    for line in &lines[start..end] {
        let lower = line.to_lowercase();
        if EXCLUDE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }
        if line.ends_with('?') {
            continue;
        }

        let cleaned = CHECK_MARK_RE.replace_all(line, "");
        let cleaned = CHOICE_MARKER_RE.replace(cleaned.trim(), "");
        let cleaned = CORRECT_LABEL_RE.replace_all(&cleaned, "").trim().to_string();
        let len = cleaned.chars().count();
        if !(CHOICE_MIN_LEN..=CHOICE_MAX_LEN).contains(&len) {
            continue;
        }

        let first_upper = cleaned.chars().next().is_some_and(|c| c.is_uppercase() || c.is_ascii_digit());
        let has_term = TECH_TERMS.iter().any(|t| lower.contains(t));
        if !((first_upper && cleaned.contains(' ')) || has_term) {
            continue;
        }

        let key: String = cleaned.to_lowercase().split_whitespace().collect();
        if seen.insert(key) {
            choices.push(cleaned);
        }
    }

    choices
}

/// 正解を推定
fn detect_correct_answer(text: &str, lines: &[&str]) -> String {
    for re in [&*CORRECT_AFTER_HEADER_RE, &*CHECKED_LINE_RE] {
        if let Some(caps) = re.captures(text) {
            let answer = CHECK_MARK_RE.replace_all(&caps[1], "");
            let answer = CHOICE_MARKER_RE.replace(answer.trim(), "").trim().to_string();
            if !answer.is_empty() && !is_explanation_header(&answer) {
                return answer;
            }
        }
    }

    // 見出しの直後が使えない場合は数行先まで探す
    if let Some(idx) = lines.iter().position(|l| l.to_lowercase().contains("correct answer")) {
        for candidate in lines.iter().skip(idx + 1).take(4) {
            if candidate.chars().count() < 100
                && !is_explanation_header(candidate)
                && !starts_with_question(candidate)
            {
                return candidate.to_string();
            }
        }
    }

    String::new()
}

/// 解説を抽出
fn detect_explanation(lines: &[&str]) -> String {
    let Some(idx) = lines.iter().position(|l| is_explanation_header(l)) else {
        return String::new();
    };

    let mut collected = Vec::new();

    // `Explanation: 本文` 形式
    if let Some((_, rest)) = lines[idx].split_once(':') {
        let rest = rest.trim();
        if !rest.is_empty() {
            collected.push(rest.to_string());
        }
    }

    for line in &lines[idx + 1..] {
        if starts_with_question(line) || collected.len() >= EXPLANATION_MAX_LINES {
            break;
        }
        if line.chars().count() > EXPLANATION_MIN_LINE_LEN {
            collected.push(line.to_string());
        }
    }

    collected.join(" ")
}
