//! 手入力問題集テスト

use study_deck::export::manual::write_manual_tsv;
use study_deck::manual::{load_bank, save_bank};
use study_deck_common::ManualQuestion;
use tempfile::tempdir;

fn choices(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// 追加した問題が保存され、出力にも含まれる
#[test]
fn test_add_save_and_export() {
    let dir = tempdir().expect("Failed to create temp dir");
    let bank_path = dir.path().join("cc_questions.json");

    let mut bank = load_bank(&bank_path).unwrap();
    let builtin = bank.len();
    let number = bank.next_number();

    let q = ManualQuestion::new(
        number,
        "",
        "Which protocol encrypts web traffic?",
        choices(&["HTTP", "HTTPS", "FTP", "Telnet"]),
        "HTTPS",
        "HTTPS wraps HTTP in TLS.",
    )
    .unwrap();
    bank.push(q).unwrap();
    save_bank(&bank_path, &bank).unwrap();

    let reloaded = load_bank(&bank_path).unwrap();
    assert_eq!(reloaded.len(), builtin + 1);
    assert_eq!(reloaded.next_number(), number + 1);

    let tsv_path = dir.path().join("cc_manual_cards.tsv");
    let count = write_manual_tsv(&tsv_path, &reloaded, true).unwrap();
    assert_eq!(count, builtin + 1);

    let content = std::fs::read_to_string(&tsv_path).unwrap();
    assert!(content.contains("Which protocol encrypts web traffic?"));
}

/// 不完全な問題は作れない
#[test]
fn test_incomplete_question_rejected() {
    let result = ManualQuestion::new(1, "", "Q?", choices(&["A", "B", "C"]), "A", "");
    assert!(result.is_err());

    let result = ManualQuestion::new(1, "", "Q?", choices(&["A", "B", "C", "D"]), "E", "");
    assert!(result.is_err());
}
