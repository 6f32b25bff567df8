//! Study Deck Common Library
//!
//! 語彙デッキ・練習問題・用語集の型とテキスト処理（ファイルI/Oを持たない部分）

pub mod card;
pub mod error;
pub mod guid;
pub mod lexicon;
pub mod ocr_parser;
pub mod question;
pub mod terms;
pub mod tsv;
pub mod vocab;

pub use card::{QuestionCard, CARD_TSV_HEADERS, MANUAL_TSV_HEADERS};
pub use error::{Error, Result};
pub use guid::{looks_like_anki_guid, word_guid};
pub use lexicon::{Enrichment, Lexicon, LexiconEntry};
pub use ocr_parser::{clean_ocr_text, segment};
pub use question::{ManualOverrides, ManualQuestion, PracticeQuestion, QuestionBank};
pub use terms::{SecurityTerm, TERM_TSV_HEADERS};
pub use tsv::{AnkiHeader, DeckFile, DeckLine, DeckRow, SourceEntry, VOCAB_FIELD_COUNT};
pub use vocab::{classify_etymology, extract_word, EtymologyStyle, VocabCard};
