//! 学習記録・セッション管理のファイル永続化テスト

use study_deck::tracker::{SessionManager, StudyLog, TimeBreakdown};
use study_deck_common::SourceEntry;
use tempfile::tempdir;

/// 追記は1件だけ増え、既存の記録は残る
#[test]
fn test_study_log_append_preserves_existing() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("progress_data.json");

    let mut log = StudyLog::load(&path).unwrap();
    log.log_study(40, TimeBreakdown::new(30, 20, 0, 10), "first");
    log.update_vocab(3, 25);
    log.save(&path).unwrap();

    let mut log = StudyLog::load(&path).unwrap();
    let before = log.record_count();
    log.log_study(55, TimeBreakdown::new(0, 45, 15, 0), "");
    log.save(&path).unwrap();

    let reloaded = StudyLog::load(&path).unwrap();
    assert_eq!(reloaded.record_count(), before + 1);
    assert_eq!(reloaded.daily_records.len(), 2);
    assert_eq!(reloaded.daily_records[0].notes, "first");
    assert_eq!(reloaded.daily_records[1].time_breakdown.total, 60);
    assert_eq!(reloaded.vocab_progress["rank_3"].completion, 25);
}

/// 模試の追記
#[test]
fn test_mock_test_persisted() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("progress_data.json");

    let mut log = StudyLog::load(&path).unwrap();
    log.add_mock(TimeBreakdown::new(24, 22, 20, 23), "practice set 1");
    log.save(&path).unwrap();

    let reloaded = StudyLog::load(&path).unwrap();
    assert_eq!(reloaded.mock_tests.len(), 1);
    assert_eq!(reloaded.mock_tests[0].scores.total, 89);
    assert!(reloaded.summary().contains("89"));
}

/// セッションの開始から完了までを別プロセス相当で再オープンしながら進める
#[test]
fn test_session_cycle_across_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");
    let entries: Vec<SourceEntry> = ["abandon", "abate", "abbreviate", "abdicate"]
        .iter()
        .map(|w| SourceEntry { guid: "Ab12Cd34Ef".into(), word: w.to_string(), ..Default::default() })
        .collect();

    let mut manager = SessionManager::open(dir.path()).unwrap();
    let info = manager.start_session(2, &entries).unwrap();
    assert_eq!(info.session_id, 1);
    assert_eq!(info.target_words, vec!["abandon", "abate"]);
    assert!(manager.log_path(1).exists());

    for (i, word) in info.target_words.iter().enumerate() {
        let mut manager = SessionManager::open(dir.path()).unwrap();
        if !manager.mark(word, i + 1).unwrap() {
            manager.save().unwrap();
        }
    }

    let mut manager = SessionManager::open(dir.path()).unwrap();
    assert_eq!(manager.progress.current_status.completed_words, 2);
    assert_eq!(manager.progress.current_status.last_processed_word, "abate");

    let record = manager.complete_session(2).unwrap();
    assert_eq!(record.word_range, "1-2");

    let manager = SessionManager::open(dir.path()).unwrap();
    assert_eq!(manager.progress.current_status.current_session, 2);
    assert_eq!(manager.progress.current_status.current_batch_start, 3);
    assert_eq!(manager.progress.session_history.len(), 1);

    let handoff = manager.write_handoff().unwrap();
    let text = std::fs::read_to_string(handoff).unwrap();
    assert!(text.contains("abate"));
}
