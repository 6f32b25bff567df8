//! TOEFL学習記録（日次の学習時間・語彙ランク進捗・模試結果）
//!
//! 記録ファイルは毎回まるごと読み込み、変更後にまるごと書き戻す。

use crate::error::Result;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// サマリーで合計する直近の日次記録数
pub const RECENT_DAYS: usize = 7;
/// サマリーに表示する直近の模試数
pub const RECENT_MOCKS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeBreakdown {
    pub reading: u32,
    pub listening: u32,
    pub speaking: u32,
    pub writing: u32,
    pub total: u32,
}

impl TimeBreakdown {
    pub fn new(reading: u32, listening: u32, speaking: u32, writing: u32) -> Self {
        Self {
            reading,
            listening,
            speaking,
            writing,
            total: reading
                .saturating_add(listening)
                .saturating_add(speaking)
                .saturating_add(writing),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub vocab_count: u32,
    pub time_breakdown: TimeBreakdown,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockTest {
    pub date: NaiveDate,
    /// 各セクションのスコアと合計（構造は学習時間と同じ）
    pub scores: TimeBreakdown,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabProgress {
    pub completion: u32,
    pub updated_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyLog {
    #[serde(default)]
    pub daily_records: Vec<DailyRecord>,
    /// `rank_N` → 進捗
    #[serde(default)]
    pub vocab_progress: BTreeMap<String, VocabProgress>,
    #[serde(default)]
    pub mock_tests: Vec<MockTest>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl StudyLog {
    /// 記録を読み込み（無ければ空）
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::export::write_json(path, self)
    }

    /// 全記録数（日次・模試・語彙ランク）
    pub fn record_count(&self) -> usize {
        self.daily_records.len() + self.mock_tests.len() + self.vocab_progress.len()
    }

    pub fn log_study(&mut self, vocab_count: u32, time: TimeBreakdown, notes: &str) -> &DailyRecord {
        self.daily_records.push(DailyRecord {
            date: today(),
            vocab_count,
            time_breakdown: time,
            notes: notes.to_string(),
        });
        &self.daily_records[self.daily_records.len() - 1]
    }

    /// ランクの完了率を更新（同じランクは上書き）
    pub fn update_vocab(&mut self, rank: u32, completion: u32) {
        self.vocab_progress.insert(
            format!("rank_{}", rank),
            VocabProgress { completion, updated_date: today() },
        );
    }

    pub fn add_mock(&mut self, scores: TimeBreakdown, notes: &str) -> &MockTest {
        self.mock_tests.push(MockTest {
            date: today(),
            scores,
            notes: notes.to_string(),
        });
        &self.mock_tests[self.mock_tests.len() - 1]
    }

    /// 直近7件の学習時間合計（分）
    pub fn recent_minutes(&self) -> u32 {
        self.daily_records
            .iter()
            .rev()
            .take(RECENT_DAYS)
            .fold(0u32, |acc, r| acc.saturating_add(r.time_breakdown.total))
    }

    /// 直近3回の模試（古い順）
    pub fn recent_mocks(&self) -> &[MockTest] {
        let start = self.mock_tests.len().saturating_sub(RECENT_MOCKS);
        &self.mock_tests[start..]
    }

    /// 進捗サマリー
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(50);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "🚀 TOEFL学習進捗サマリー");
        let _ = writeln!(out, "{}", rule);

        let _ = writeln!(out, "📚 語彙進捗 (TOEFL3800):");
        for (rank, progress) in &self.vocab_progress {
            let label = rank.replacen("rank_", "Rank ", 1);
            let _ = writeln!(out, "  {}: {}%", label, progress.completion);
        }

        if !self.daily_records.is_empty() {
            let _ = writeln!(out, "📊 直近{}日間の学習時間: {}分", RECENT_DAYS, self.recent_minutes());
        }

        if !self.mock_tests.is_empty() {
            let _ = writeln!(out, "🎯 模試結果推移:");
            for test in self.recent_mocks() {
                let s = &test.scores;
                let _ = writeln!(
                    out,
                    "  {}: 合計{}点 (R{} L{} S{} W{})",
                    test.date, s.total, s.reading, s.listening, s.speaking, s.writing
                );
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_breakdown_total() {
        assert_eq!(TimeBreakdown::new(30, 15, 20, 15).total, 80);
    }

    #[test]
    fn test_time_breakdown_total_saturates() {
        let t = TimeBreakdown::new(4_000_000_000, 4_000_000_000, 0, 0);
        assert_eq!(t.total, u32::MAX);

        let mut log = StudyLog::default();
        log.log_study(0, t, "");
        log.log_study(0, TimeBreakdown::new(10, 0, 0, 0), "");
        assert_eq!(log.recent_minutes(), u32::MAX);
    }

    #[test]
    fn test_recent_minutes_uses_last_seven() {
        let mut log = StudyLog::default();
        for _ in 0..9 {
            log.log_study(10, TimeBreakdown::new(10, 0, 0, 0), "");
        }
        assert_eq!(log.recent_minutes(), 70);
    }

    #[test]
    fn test_vocab_progress_overwrites_rank() {
        let mut log = StudyLog::default();
        log.update_vocab(3, 40);
        log.update_vocab(3, 85);
        assert_eq!(log.vocab_progress.len(), 1);
        assert_eq!(log.vocab_progress["rank_3"].completion, 85);
    }

    #[test]
    fn test_summary_shows_last_three_mocks() {
        let mut log = StudyLog::default();
        for total in [10, 20, 30, 40] {
            log.add_mock(TimeBreakdown::new(total, 0, 0, 0), "");
        }
        log.update_vocab(3, 85);

        let summary = log.summary();
        assert!(summary.contains("Rank 3: 85%"));
        assert!(!summary.contains("合計10点"));
        assert!(summary.contains("合計40点 (R40 L0 S0 W0)"));
    }

    #[test]
    fn test_reads_legacy_file() {
        let json = r#"{
            "daily_records": [{"date": "2025-01-05", "vocab_count": 50,
                "time_breakdown": {"reading": 30, "listening": 15, "speaking": 20, "writing": 15, "total": 80},
                "notes": "Rank3単語50語"}],
            "vocab_progress": {"rank_3": {"completion": 85, "updated_date": "2025-01-05"}},
            "mock_tests": []
        }"#;
        let log: StudyLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.daily_records[0].time_breakdown.total, 80);
        assert_eq!(log.record_count(), 2);
    }
}
