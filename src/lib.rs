//! study-deck
//!
//! 学習用Ankiデッキの生成・修正、スクリーンショットからの練習問題抽出、
//! 学習進捗の記録を行うCLIの本体。

pub mod cli;
pub mod config;
pub mod deck;
pub mod error;
pub mod export;
pub mod manual;
pub mod ocr;
pub mod progress;
pub mod scanner;
pub mod tracker;
