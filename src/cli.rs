use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "study-deck")]
#[command(about = "学習用Ankiデッキ生成・OCR問題抽出・学習進捗記録ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 元デッキの単語を辞書で補完し、Anki用TSVとCSSを生成
    Enrich {
        /// 元デッキ（TOEFL 3800形式のTSV）
        #[arg(required = true)]
        input: PathBuf,

        /// 出力TSV
        #[arg(short, long, default_value = "enhanced_deck.tsv")]
        output: PathBuf,

        /// CSS出力先（省略時は出力TSVと同じフォルダの card_template.css）
        #[arg(long)]
        css: Option<PathBuf>,

        /// 先頭からN語だけ処理
        #[arg(short, long)]
        limit: Option<usize>,

        /// 追加の辞書JSON（組み込み辞書にマージ）
        #[arg(long)]
        lexicon: Option<PathBuf>,

        /// デッキ名（省略時は設定値）
        #[arg(long)]
        deck: Option<String>,

        /// ノートタイプ（省略時は設定値）
        #[arg(long)]
        note_type: Option<String>,
    },

    /// デッキのGUIDを修正
    FixGuids {
        /// 修正対象のTSV
        #[arg(required = true)]
        input: PathBuf,

        /// 元デッキ（指定時はそのGUIDを使用、省略時は単語から再生成）
        #[arg(short, long, conflicts_with = "mapping")]
        source: Option<PathBuf>,

        /// extract-guids で作成した対応表
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// 出力先（省略時は上書き）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 元デッキから単語→GUID対応表を抽出
    ExtractGuids {
        /// 元デッキ
        #[arg(required = true)]
        source: PathBuf,

        /// 出力TSV
        #[arg(short, long, default_value = "guid_mapping.tsv")]
        output: PathBuf,
    },

    /// 例文フォーマットを統一
    Unify {
        /// 対象のTSV
        #[arg(required = true)]
        input: PathBuf,

        /// 出力先（省略時は上書き）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 日本語の語源メモを英語テンプレートに置き換える
        #[arg(long)]
        english_etymology: bool,
    },

    /// 日本語の語源メモを復元
    RestoreEtymology {
        /// 対象のTSV
        #[arg(required = true)]
        input: PathBuf,

        /// 語源の取得元デッキ（日本語の語源メモだけを採用）
        #[arg(long, conflicts_with_all = ["lexicon", "mapping"])]
        from: Option<PathBuf>,

        /// 語源の取得元辞書JSON
        #[arg(long, conflicts_with = "mapping")]
        lexicon: Option<PathBuf>,

        /// 語源の対応表（単語<TAB>語源）
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// 取得した語源を対応表として保存
        #[arg(long)]
        save_mapping: Option<PathBuf>,

        /// 出力先（省略時は上書き）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// デッキの統計を表示
    DeckStats {
        /// 対象のTSV
        #[arg(required = true)]
        input: PathBuf,
    },

    /// Security+用語集をAnki用TSVに変換
    Terms {
        /// 用語集テキスト
        #[arg(required = true)]
        input: PathBuf,

        /// 出力TSV
        #[arg(short, long, default_value = "security_plus_terms.tsv")]
        output: PathBuf,
    },

    /// スクリーンショットをOCRして問題を抽出
    Ocr {
        /// スクリーンショットのフォルダ
        #[arg(required = true)]
        folder: PathBuf,

        /// 出力フォルダ（省略時は入力フォルダ）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 手動修正JSON（ファイル名 → 問題）
        #[arg(long)]
        overrides: Option<PathBuf>,

        /// キャッシュを使用（再OCRをスキップ）
        #[arg(long)]
        use_cache: bool,

        /// 前回の結果JSONを指定し、解析失敗分だけ再処理
        #[arg(long)]
        reprocess_failed: Option<PathBuf>,
    },

    /// OCR結果からAnkiカードを生成
    Cards {
        /// OCR結果JSON
        #[arg(required = true)]
        input: PathBuf,

        /// 出力フォルダ（省略時は入力JSONと同じフォルダ）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 手入力の問題集
    Manual {
        #[command(subcommand)]
        action: ManualAction,
    },

    /// 学習記録
    Log {
        #[command(subcommand)]
        action: Option<LogAction>,
    },

    /// バッチ処理セッション管理
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// 設定を表示/編集
    Config {
        /// tesseractコマンドを設定
        #[arg(long)]
        set_tesseract: Option<String>,

        /// 既定の追加辞書を設定
        #[arg(long)]
        set_lexicon: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// OCRキャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 対象フォルダ（省略時はカレント）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}

#[derive(Subcommand)]
pub enum ManualAction {
    /// 対話形式で問題を追加
    Add,

    /// 問題一覧を表示
    List,

    /// Anki用TSVを出力
    Export {
        /// 出力TSV
        #[arg(short, long, default_value = "cc_manual_cards.tsv")]
        output: PathBuf,

        /// 選択肢をカードに含めない
        #[arg(long)]
        without_choices: bool,
    },
}

#[derive(Subcommand)]
pub enum LogAction {
    /// 日次の学習時間を記録（分単位）
    Study {
        vocab: u32,
        #[arg(value_parser = minutes())]
        reading: u32,
        #[arg(value_parser = minutes())]
        listening: u32,
        #[arg(value_parser = minutes())]
        speaking: u32,
        #[arg(value_parser = minutes())]
        writing: u32,
        notes: Option<String>,
    },

    /// 語彙ランクの完了率を記録
    Vocab {
        rank: u32,
        /// 完了率（%）
        #[arg(value_parser = clap::value_parser!(u32).range(0..=100))]
        percent: u32,
    },

    /// 模試の結果を記録
    Mock {
        reading: u32,
        listening: u32,
        speaking: u32,
        writing: u32,
        notes: Option<String>,
    },

    /// 進捗サマリーを表示
    Summary,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// 現在の進捗を表示
    Status,

    /// 新しいセッションを開始
    Start {
        /// 対象単語を取り出す元デッキ（省略時は範囲のみ記録）
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// バッチサイズ
        #[arg(short, long, default_value = "100")]
        batch_size: usize,
    },

    /// 単語の処理完了を記録
    Mark {
        word: String,
        /// セッション内の位置（1始まり）
        position: usize,
    },

    /// セッションを完了
    Complete {
        /// 処理した単語数
        words: usize,
    },

    /// 引き継ぎドキュメントを作成
    Handoff,
}

/// 1日分の学習時間（分）
fn minutes() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(0..=24 * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_study_parses() {
        let cli = Cli::try_parse_from(["study-deck", "log", "study", "40", "30", "20", "0", "10", "memo"]).unwrap();
        match cli.command {
            Commands::Log { action: Some(LogAction::Study { vocab, reading, notes, .. }) } => {
                assert_eq!(vocab, 40);
                assert_eq!(reading, 30);
                assert_eq!(notes.as_deref(), Some("memo"));
            }
            _ => panic!("log study として解析されない"),
        }
    }

    #[test]
    fn test_log_study_rejects_impossible_minutes() {
        let result = Cli::try_parse_from(["study-deck", "log", "study", "0", "4000000000", "4000000000", "0", "0"]);
        assert!(result.is_err());
    }
}
