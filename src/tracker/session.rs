//! バッチ処理セッションの進捗管理
//!
//! `session_progress.json` をまるごと読み書きし、セッションごとのログと
//! 次セッションへの引き継ぎドキュメントを生成する。

use crate::error::Result;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use study_deck_common::SourceEntry;
use tracing::debug;

pub const PROGRESS_FILE_NAME: &str = "session_progress.json";
pub const LOGS_DIR_NAME: &str = "session_logs";
pub const HANDOFF_DIR_NAME: &str = "session_handoff";
pub const HANDOFF_FILE_NAME: &str = "current_session_state.md";

/// complete で進めるバッチ幅
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// mark で中間保存する間隔
pub const SAVE_EVERY: usize = 5;
/// 既定の総単語数（TOEFL 3800 Rank3）
pub const DEFAULT_TOTAL_WORDS: usize = 1159;

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub strategy: String,
    pub start_date: NaiveDateTime,
    pub total_words: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentStatus {
    pub completed_words: usize,
    pub current_session: u32,
    pub current_batch_start: usize,
    pub current_batch_end: usize,
    #[serde(default)]
    pub last_processed_word: String,
    #[serde(default)]
    pub session_strategy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: u32,
    pub date: NaiveDateTime,
    pub words_processed: usize,
    pub word_range: String,
    pub status: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub project_info: ProjectInfo,
    pub current_status: CurrentStatus,
    #[serde(default)]
    pub completed_words_list: Vec<String>,
    #[serde(default)]
    pub session_history: Vec<SessionRecord>,
    /// 品質指標など、このツールが扱わない項目もそのまま保持する
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for SessionProgress {
    fn default() -> Self {
        Self {
            project_info: ProjectInfo {
                name: "TOEFL 3800 Rank3 Anki Deck Generator".into(),
                strategy: "Session-based batch processing".into(),
                start_date: now(),
                total_words: DEFAULT_TOTAL_WORDS,
            },
            current_status: CurrentStatus {
                completed_words: 0,
                current_session: 1,
                current_batch_start: 1,
                current_batch_end: DEFAULT_BATCH_SIZE.min(DEFAULT_TOTAL_WORDS),
                last_processed_word: String::new(),
                session_strategy: "direct-generation".into(),
            },
            completed_words_list: Vec::new(),
            session_history: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// 開始したセッションの情報
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub session_id: u32,
    pub date: NaiveDateTime,
    pub start: usize,
    pub end: usize,
    pub target_words: Vec<String>,
}

impl SessionInfo {
    pub fn word_range(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }

    /// `session_NNN.log` の内容
    pub fn log_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Session {} Log", self.session_id);
        let _ = writeln!(out, "Date: {}", self.date.format("%Y-%m-%dT%H:%M:%S"));
        let _ = writeln!(out, "Word Range: {}", self.word_range());
        let _ = writeln!(out, "Target Count: {}", self.target_words.len());
        let _ = writeln!(out, "Status: in_progress\n");
        let _ = writeln!(out, "## Target Words:");
        for (i, word) in self.target_words.iter().enumerate() {
            let _ = writeln!(out, "{:3}. {}", i + 1, word);
        }
        out
    }
}

/// 元デッキの start..=end 番目（1始まり）の単語
pub fn words_in_range(entries: &[SourceEntry], start: usize, end: usize) -> Vec<String> {
    if start == 0 || end < start {
        return Vec::new();
    }
    entries
        .iter()
        .skip(start - 1)
        .take(end - start + 1)
        .map(|e| e.word.clone())
        .collect()
}

pub struct SessionManager {
    root: PathBuf,
    pub progress: SessionProgress,
}

impl SessionManager {
    /// 進捗を読み込み（無ければ初期状態）
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(PROGRESS_FILE_NAME);
        let progress = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            SessionProgress::default()
        };
        Ok(Self { root: root.to_path_buf(), progress })
    }

    pub fn progress_path(&self) -> PathBuf {
        self.root.join(PROGRESS_FILE_NAME)
    }

    pub fn log_path(&self, session_id: u32) -> PathBuf {
        self.root.join(LOGS_DIR_NAME).join(format!("session_{:03}.log", session_id))
    }

    pub fn handoff_path(&self) -> PathBuf {
        self.root.join(HANDOFF_DIR_NAME).join(HANDOFF_FILE_NAME)
    }

    pub fn save(&self) -> Result<()> {
        crate::export::write_json(&self.progress_path(), &self.progress)
    }

    /// 次のバッチ範囲（終端は総単語数で打ち切り）
    pub fn next_batch(&self, batch_size: usize) -> (usize, usize) {
        let start = self.progress.current_status.current_batch_start;
        let end = start
            .saturating_add(batch_size.max(1) - 1)
            .min(self.progress.project_info.total_words);
        (start, end)
    }

    /// 新しいセッションを開始してログを作成
    pub fn start_session(&mut self, batch_size: usize, entries: &[SourceEntry]) -> Result<SessionInfo> {
        let (start, end) = self.next_batch(batch_size);
        let info = SessionInfo {
            session_id: self.progress.current_status.current_session,
            date: now(),
            start,
            end,
            target_words: words_in_range(entries, start, end),
        };

        let log_path = self.log_path(info.session_id);
        crate::export::ensure_parent(&log_path)?;
        std::fs::write(&log_path, info.log_text())?;
        debug!(path = %log_path.display(), "セッションログ作成");

        self.progress.current_status.current_batch_end = end;
        self.save()?;
        Ok(info)
    }

    /// 単語の完了を記録。5語ごとに保存し、保存したら true
    pub fn mark(&mut self, word: &str, position: usize) -> Result<bool> {
        let word = word.trim();
        if !self.progress.completed_words_list.iter().any(|w| w == word) {
            self.progress.completed_words_list.push(word.to_string());
        }

        let status = &mut self.progress.current_status;
        status.completed_words = self.progress.completed_words_list.len();
        status.last_processed_word = word.to_string();

        if position % SAVE_EVERY == 0 {
            self.save()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// セッションを完了し、次のバッチへ進める
    pub fn complete_session(&mut self, words_processed: usize) -> Result<SessionRecord> {
        let total = self.progress.project_info.total_words;
        let status = &mut self.progress.current_status;

        let record = SessionRecord {
            session_id: status.current_session,
            date: now(),
            words_processed,
            word_range: format!("{}-{}", status.current_batch_start, status.current_batch_end),
            status: "completed".into(),
            notes: format!("Processed {} words successfully", words_processed),
        };

        status.current_session += 1;
        status.current_batch_start = status.current_batch_end + 1;
        status.current_batch_end = (status.current_batch_start + DEFAULT_BATCH_SIZE - 1).min(total);

        self.progress.session_history.push(record.clone());
        self.save()?;
        Ok(record)
    }

    /// 全単語を処理済みか
    pub fn is_finished(&self) -> bool {
        self.progress.current_status.current_batch_start > self.progress.project_info.total_words
    }

    pub fn status_text(&self) -> String {
        let p = &self.progress;
        let s = &p.current_status;
        let mut out = String::new();
        let _ = writeln!(out, "📊 進捗: {}/{}語", s.completed_words, p.project_info.total_words);
        let _ = writeln!(out, "  セッション: {}", s.current_session);
        if self.is_finished() {
            let _ = writeln!(out, "  次のバッチ: なし（全単語処理済み）");
        } else {
            let _ = writeln!(out, "  次のバッチ: {}-{}", s.current_batch_start, s.current_batch_end);
        }
        if !s.last_processed_word.is_empty() {
            let _ = writeln!(out, "  最後に処理した単語: {}", s.last_processed_word);
        }
        let _ = writeln!(out, "  完了セッション数: {}", p.session_history.len());
        out
    }

    /// 引き継ぎドキュメント（Markdown）
    pub fn handoff_text(&self) -> String {
        let p = &self.progress;
        let s = &p.current_status;
        let remaining = (s.current_batch_end + 1).saturating_sub(s.current_batch_start);
        let recent_start = p.completed_words_list.len().saturating_sub(5);

        let mut out = String::new();
        let _ = writeln!(out, "# Session Handoff Document");
        let _ = writeln!(out, "Generated: {}\n", now().format("%Y-%m-%dT%H:%M:%S"));
        let _ = writeln!(out, "## Current Progress");
        let _ = writeln!(out, "- **Total Words**: {}", p.project_info.total_words);
        let _ = writeln!(out, "- **Completed**: {} words", s.completed_words);
        let _ = writeln!(out, "- **Current Session**: {}", s.current_session);
        let _ = writeln!(out, "- **Next Batch**: Words {}-{}", s.current_batch_start, s.current_batch_end);
        let _ = writeln!(out, "- **Last Processed**: {}\n", s.last_processed_word);
        let _ = writeln!(out, "## Recently Completed Words");
        for word in &p.completed_words_list[recent_start..] {
            let _ = writeln!(out, "- {}", word);
        }
        let _ = writeln!(out, "\n## Next Session Plan");
        let _ = writeln!(out, "- **Words to Process**: {}", remaining);
        let _ = writeln!(out, "- **Strategy**: {}", p.project_info.strategy);
        let _ = writeln!(out, "- **Expected Output**: Enhanced TSV with CSS styling\n");
        let _ = writeln!(out, "## File Locations");
        let _ = writeln!(out, "- Progress: `{}`", self.progress_path().display());
        let _ = writeln!(out, "- Session logs: `{}`", self.root.join(LOGS_DIR_NAME).display());
        out
    }

    pub fn write_handoff(&self) -> Result<PathBuf> {
        let path = self.handoff_path();
        crate::export::ensure_parent(&path)?;
        std::fs::write(&path, self.handoff_text())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entries(n: usize) -> Vec<SourceEntry> {
        (1..=n)
            .map(|i| SourceEntry { guid: format!("guid{:06}", i), word: format!("word{}", i), ..Default::default() })
            .collect()
    }

    #[test]
    fn test_words_in_range() {
        let words = words_in_range(&entries(10), 3, 5);
        assert_eq!(words, vec!["word3", "word4", "word5"]);
        assert!(words_in_range(&entries(10), 0, 5).is_empty());
        assert_eq!(words_in_range(&entries(10), 9, 20).len(), 2);
    }

    #[test]
    fn test_huge_batch_size_is_clamped() {
        let dir = tempdir().expect("Failed to create temp dir");
        let manager = SessionManager::open(dir.path()).unwrap();
        assert_eq!(manager.next_batch(usize::MAX), (1, DEFAULT_TOTAL_WORDS));
    }

    #[test]
    fn test_batch_end_clamped_to_total() {
        let dir = tempdir().expect("Failed to create temp dir");
        let mut manager = SessionManager::open(dir.path()).unwrap();
        manager.progress.project_info.total_words = 150;
        manager.progress.current_status.current_batch_start = 101;

        assert_eq!(manager.next_batch(100), (101, 150));
    }

    #[test]
    fn test_mark_deduplicates_and_saves_every_fifth() {
        let dir = tempdir().expect("Failed to create temp dir");
        let mut manager = SessionManager::open(dir.path()).unwrap();

        assert!(!manager.mark("ambush", 1).unwrap());
        assert!(!manager.mark("ambush", 2).unwrap());
        assert!(!manager.progress_path().exists());
        assert!(manager.mark("crane", 5).unwrap());
        assert!(manager.progress_path().exists());

        let reloaded = SessionManager::open(dir.path()).unwrap();
        assert_eq!(reloaded.progress.completed_words_list, vec!["ambush", "crane"]);
        assert_eq!(reloaded.progress.current_status.completed_words, 2);
        assert_eq!(reloaded.progress.current_status.last_processed_word, "crane");
    }

    #[test]
    fn test_start_then_complete_advances_batch() {
        let dir = tempdir().expect("Failed to create temp dir");
        let mut manager = SessionManager::open(dir.path()).unwrap();

        let info = manager.start_session(100, &entries(120)).unwrap();
        assert_eq!(info.word_range(), "1-100");
        assert_eq!(info.target_words.len(), 100);

        let log = std::fs::read_to_string(manager.log_path(1)).unwrap();
        assert!(log.starts_with("# Session 1 Log\n"));
        assert!(log.contains("  1. word1\n"));

        let record = manager.complete_session(100).unwrap();
        assert_eq!(record.word_range, "1-100");

        let status = &manager.progress.current_status;
        assert_eq!(status.current_session, 2);
        assert_eq!(status.current_batch_start, 101);
        assert_eq!(status.current_batch_end, 200);
        assert_eq!(manager.progress.session_history.len(), 1);
    }

    #[test]
    fn test_unknown_fields_survive_rewrite() {
        let dir = tempdir().expect("Failed to create temp dir");
        let mut progress = SessionProgress::default();
        progress
            .extra
            .insert("quality_metrics".into(), serde_json::json!({"avg_examples_count": 3}));
        std::fs::write(
            dir.path().join(PROGRESS_FILE_NAME),
            serde_json::to_string(&progress).unwrap(),
        )
        .unwrap();

        let manager = SessionManager::open(dir.path()).unwrap();
        manager.save().unwrap();

        let content = std::fs::read_to_string(manager.progress_path()).unwrap();
        assert!(content.contains("avg_examples_count"));
    }

    #[test]
    fn test_handoff_lists_recent_words() {
        let dir = tempdir().expect("Failed to create temp dir");
        let mut manager = SessionManager::open(dir.path()).unwrap();
        for (i, w) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
            manager.mark(w, i + 1).unwrap();
        }

        let path = manager.write_handoff().unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("- **Completed**: 6 words"));
        assert!(text.contains("- f\n"));
        assert!(!text.contains("- a\n"));
    }
}
