//! 練習問題からAnkiカードを生成
//!
//! OCR結果は選択肢の絞り込み・正解照合を行い、品質スコア（0〜6点）を付ける。
//! 手入力問題はそのままクローズ形式のカードにする。

use crate::question::{choice_letter, ManualQuestion, PracticeQuestion};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// カードに載せる選択肢の数
pub const CARD_CHOICES: usize = 4;
/// 品質スコアの最大値
pub const MAX_QUALITY_SCORE: u8 = 6;
/// OCRカードの既定タグ
pub const OCR_CARD_TAGS: &str = "CC ISC2 Cybersecurity Security+";
/// 手入力カードの既定タグ
pub const MANUAL_CARD_TAGS: &str = "cc-practice security-plus";

/// OCRカードTSVのヘッダー
pub const CARD_TSV_HEADERS: [&str; 11] = [
    "問題文", "選択肢A", "選択肢B", "選択肢C", "選択肢D", "正解", "解説", "Text", "タグ", "品質スコア",
    "手動修正",
];

/// 手入力カードTSVのヘッダー
pub const MANUAL_TSV_HEADERS: [&str; 3] = ["Front", "Back", "Tags"];

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref SHORT_PAREN_RE: Regex = Regex::new(r"\([^)]{0,3}\)").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref WORD_RE: Regex = Regex::new(r"\b\w+\b").unwrap();
    static ref EXCLUDE_CHOICE_RE: Regex = Regex::new(
        r"(?i)^(correct|score|seconds|attempt|taken|explanation)|^[0-9]+$|https?://|@"
    )
    .unwrap();
}

/// 選択肢と判断する用語（小文字）
const CHOICE_TERMS: &[&str] = &[
    "access control", "authentication", "authorization", "encryption", "firewall", "malware",
    "virus", "security", "data", "network", "system", "password", "user", "administrative",
    "physical", "technical", "policy", "procedure", "risk", "threat", "asset",
    "confidentiality", "integrity", "availability", "medical", "privacy", "gdpr", "regulation",
    "biometric", "multifactor", "non-repudiation", "siem", "ids", "ips", "vpn", "certificate",
    "acceptance", "avoidance", "mitigation", "transference", "control", "management",
    "protection",
];

/// カード用のテキスト整形
///
/// HTMLタグ除去、引用符・ダッシュの統一、記号除去、空白の正規化。
pub fn clean_card_text(text: &str) -> String {
    let text = TAG_RE.replace_all(text, "");
    let text: String = text
        .chars()
        .filter_map(|c| match c {
            '“' | '”' | '„' => Some('"'),
            '‘' | '’' | '‚' => Some('\''),
            '—' | '–' => Some('-'),
            '©' | '®' | '™' => None,
            other => Some(other),
        })
        .collect();
    let text = SHORT_PAREN_RE.replace_all(&text, "");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// OCRで拾った選択肢候補を絞り込む（最大4つ）
pub fn filter_choices(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|c| clean_card_text(c))
        .filter(|c| !EXCLUDE_CHOICE_RE.is_match(c))
        .filter(|c| (5..=100).contains(&c.chars().count()))
        .filter(|c| {
            let lower = c.to_lowercase();
            CHOICE_TERMS.iter().any(|t| lower.contains(t))
                || lower.starts_with("a ")
                || lower.starts_with("an ")
                || lower.starts_with("the ")
                || c.chars().next().is_some_and(|ch| ch.is_uppercase() || ch.is_ascii_digit())
        })
        .filter(|c| seen.insert(c.to_lowercase().replace(' ', "")))
        .take(CARD_CHOICES)
        .collect()
}

/// 正解の選択肢と記号を決定
///
/// 部分一致 → 単語の重なりが最大の選択肢 → 先頭の選択肢、の順に判定する。
pub fn match_correct_choice(correct_raw: &str, choices: &[String]) -> (String, char) {
    let Some(first) = choices.first() else {
        return (clean_card_text(correct_raw), 'A');
    };

    let correct = clean_card_text(correct_raw);
    if correct.is_empty() {
        return (first.clone(), 'A');
    }

    let correct_lower = correct.to_lowercase();
    for (i, choice) in choices.iter().enumerate() {
        let choice_lower = choice.to_lowercase();
        if choice_lower == correct_lower {
            return (choice.clone(), choice_letter(i));
        }
    }
    for (i, choice) in choices.iter().enumerate() {
        let choice_lower = choice.to_lowercase();
        if correct_lower.contains(&choice_lower) || choice_lower.contains(&correct_lower) {
            return (choice.clone(), choice_letter(i));
        }
    }

    let correct_words = word_set(&correct_lower);
    let best = choices
        .iter()
        .enumerate()
        .map(|(i, c)| (i, word_set(&c.to_lowercase()).intersection(&correct_words).count()))
        .filter(|(_, overlap)| *overlap > 0)
        .max_by_key(|(i, overlap)| (*overlap, std::cmp::Reverse(*i)));

    match best {
        Some((i, _)) => (choices[i].clone(), choice_letter(i)),
        None => (first.clone(), 'A'),
    }
}

fn word_set(text: &str) -> HashSet<&str> {
    WORD_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// クローズ削除の書式
pub fn cloze(answer: &str) -> String {
    format!("{{{{c1::{}}}}}", answer)
}

/// OCR問題のAnkiカード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionCard {
    pub card_id: usize,
    pub question: String,
    /// 常に4要素（足りない分は空文字）
    pub choices: Vec<String>,
    pub correct_answer: String,
    pub correct_letter: char,
    pub explanation: String,
    pub cloze_text: String,
    pub file_name: String,
    pub manual_fixed: bool,
    pub tags: String,
    pub quality_score: u8,
}

impl QuestionCard {
    /// 解析済みの問題からカードを作る。未解析なら None
    pub fn from_question(card_id: usize, q: &PracticeQuestion, tags: &str) -> Option<Self> {
        if !q.parsed {
            return None;
        }

        let mut choices = if q.manual_fixed {
            q.choices.iter().map(|c| clean_card_text(c)).collect()
        } else {
            filter_choices(&q.choices)
        };

        // 正解はカードに載る A〜D から選ぶ
        choices.truncate(CARD_CHOICES);
        let (correct_answer, correct_letter) = match_correct_choice(&q.correct_answer, &choices);
        choices.resize(CARD_CHOICES, String::new());

        let mut card = Self {
            card_id,
            question: clean_card_text(&q.question),
            choices,
            cloze_text: cloze(&correct_answer),
            correct_answer,
            correct_letter,
            explanation: clean_card_text(&q.explanation),
            file_name: q.file_name.clone(),
            manual_fixed: q.manual_fixed,
            tags: tags.to_string(),
            quality_score: 0,
        };
        card.quality_score = card.compute_quality_score();
        Some(card)
    }

    /// 品質スコア（0〜6点）
    ///
    /// 問題文 2点、選択肢 2点、正解 1点、解説 1点。
    pub fn compute_quality_score(&self) -> u8 {
        let mut score = 0;

        let question_len = self.question.chars().count();
        if question_len > 15 {
            score += 2;
        } else if question_len > 5 {
            score += 1;
        }

        let filled = self.choices.iter().filter(|c| !c.is_empty()).count();
        if filled >= 4 {
            score += 2;
        } else if filled >= 2 {
            score += 1;
        }

        if !self.correct_answer.is_empty() {
            score += 1;
        }

        if self.explanation.chars().count() > 10 {
            score += 1;
        }

        score
    }

    /// TSVの1行分（`CARD_TSV_HEADERS` の順）
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![self.question.clone()];
        record.extend(self.choices.iter().cloned());
        record.push(self.correct_answer.clone());
        record.push(self.explanation.clone());
        record.push(self.cloze_text.clone());
        record.push(self.tags.clone());
        record.push(self.quality_score.to_string());
        record.push(if self.manual_fixed { "✓".to_string() } else { String::new() });
        record
    }
}

/// 手入力問題のクローズ形式Front
///
/// `with_choices` の場合は `A. 選択肢` の一覧を含める。
pub fn manual_front(q: &ManualQuestion, with_choices: bool) -> String {
    let situation = if q.situation.is_empty() {
        String::new()
    } else {
        format!("{}\n\n", q.situation)
    };

    let choices = if with_choices {
        let list: String = q
            .choices
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. {}\n", choice_letter(i), c))
            .collect();
        format!("{}\n", list)
    } else {
        String::new()
    };

    format!(
        "Q{}: {}{}\n\n{}正解: {}\n\n解説: {}",
        q.number,
        situation,
        q.question,
        choices,
        cloze(&q.correct_answer),
        q.explanation
    )
}

/// 手入力カードのタグ
pub fn manual_tags(with_choices: bool) -> String {
    if with_choices {
        format!("{} choices-included", MANUAL_CARD_TAGS)
    } else {
        MANUAL_CARD_TAGS.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_card_text() {
        assert_eq!(
            clean_card_text("<b>It’s</b>  “quoted” — fine™ (a) end"),
            "It's \"quoted\" - fine end"
        );
    }

    #[test]
    fn test_filter_choices() {
        let raw = strings(&[
            "Correct Answers",
            "Physical control",
            "physical control",
            "12345",
            "http://example.com",
            "Administrative",
            "Technical",
            "Nuanced approach",
            "Extra choice here",
        ]);
        let filtered = filter_choices(&raw);
        assert_eq!(
            filtered,
            strings(&["Physical control", "Administrative", "Technical", "Nuanced approach"])
        );
    }

    #[test]
    fn test_match_correct_exact_and_substring() {
        let choices = strings(&["Availability", "Confidentiality", "Confirmation", "Integrity"]);
        assert_eq!(match_correct_choice("Integrity", &choices), ("Integrity".into(), 'D'));
        assert_eq!(
            match_correct_choice("✓ Confidentiality", &choices),
            ("Confidentiality".into(), 'B')
        );
    }

    #[test]
    fn test_match_correct_keyword_overlap() {
        let choices = strings(&[
            "Data should be archived",
            "Old records must be destroyed",
            "Encrypt everything",
        ]);
        let (answer, letter) = match_correct_choice("records destroyed", &choices);
        assert_eq!(answer, "Old records must be destroyed");
        assert_eq!(letter, 'B');
    }

    #[test]
    fn test_match_correct_fallback() {
        let choices = strings(&["Alpha", "Beta"]);
        assert_eq!(match_correct_choice("", &choices), ("Alpha".into(), 'A'));
        assert_eq!(match_correct_choice("zzz", &choices), ("Alpha".into(), 'A'));
        assert_eq!(match_correct_choice("Gamma", &[]), ("Gamma".into(), 'A'));
    }

    #[test]
    fn test_card_from_unparsed_is_none() {
        let q = PracticeQuestion::failed("a.png", "error");
        assert!(QuestionCard::from_question(1, &q, OCR_CARD_TAGS).is_none());
    }

    #[test]
    fn test_card_quality_full_score() {
        let mut q = PracticeQuestion {
            file_name: "a.png".into(),
            question: "Which concept does this task demonstrate?".into(),
            choices: strings(&["Availability", "Confidentiality", "Confirmation", "Integrity"]),
            correct_answer: "Integrity".into(),
            explanation: "Preventing unauthorized modification is integrity.".into(),
            ..Default::default()
        };
        q.refresh_parsed();
        let card = QuestionCard::from_question(1, &q, OCR_CARD_TAGS).unwrap();
        assert_eq!(card.quality_score, MAX_QUALITY_SCORE);
        assert_eq!(card.correct_letter, 'D');
        assert_eq!(card.cloze_text, "{{c1::Integrity}}");
        assert_eq!(card.to_record().len(), CARD_TSV_HEADERS.len());
    }

    #[test]
    fn test_card_pads_choices() {
        let mut q = PracticeQuestion {
            file_name: "b.png".into(),
            question: "Short?".into(),
            choices: strings(&["Physical control", "Technical control"]),
            ..Default::default()
        };
        q.refresh_parsed();
        let card = QuestionCard::from_question(2, &q, OCR_CARD_TAGS).unwrap();
        assert_eq!(card.choices.len(), CARD_CHOICES);
        assert_eq!(card.choices[3], "");
        // 問題文6文字(1) + 選択肢2つ(1) + 正解は先頭にフォールバック(1)
        assert_eq!(card.quality_score, 3);
    }

    #[test]
    fn test_correct_letter_stays_on_card() {
        let mut q = PracticeQuestion {
            file_name: "six.png".into(),
            question: "Which phonetic word is fifth in the list?".into(),
            choices: strings(&["Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot"]),
            correct_answer: "Echo".into(),
            manual_fixed: true,
            ..Default::default()
        };
        q.refresh_parsed();
        let card = QuestionCard::from_question(3, &q, OCR_CARD_TAGS).unwrap();
        assert_eq!(card.choices.len(), CARD_CHOICES);
        assert!(('A'..='D').contains(&card.correct_letter));
        assert!(card.choices.contains(&card.correct_answer));
    }

    #[test]
    fn test_manual_front() {
        let q = ManualQuestion::new(
            2,
            "Chad is a security practitioner.",
            "Which concept does this task demonstrate?",
            strings(&["Availability", "Confidentiality", "Confirmation", "Integrity"]),
            "Integrity",
            "Preventing unauthorized modification is the definition of integrity.",
        )
        .unwrap();

        let plain = manual_front(&q, false);
        assert_eq!(
            plain,
            "Q2: Chad is a security practitioner.\n\nWhich concept does this task demonstrate?\n\n正解: {{c1::Integrity}}\n\n解説: Preventing unauthorized modification is the definition of integrity."
        );

        let with_choices = manual_front(&q, true);
        assert!(with_choices.contains("A. Availability\nB. Confidentiality\nC. Confirmation\nD. Integrity\n\n正解:"));
        assert_eq!(manual_tags(true), "cc-practice security-plus choices-included");
    }
}
