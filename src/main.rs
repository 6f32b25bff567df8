use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use study_deck::cli::{Cli, Commands, LogAction, ManualAction, SessionAction};
use study_deck::config::Config;
use study_deck::deck::{self, enrich, repair, stats::DeckStats};
use study_deck::error::StudyDeckError;
use study_deck::ocr::{self, OcrCache, TesseractCli};
use study_deck::tracker::{SessionManager, StudyLog, TimeBreakdown};
use study_deck::{export, manual, scanner};
use study_deck_common::terms::{parse_terms, sort_terms};
use study_deck_common::tsv::parse_source_deck;
use study_deck_common::{EtymologyStyle, ManualOverrides};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();
}

/// 出力先の指定が無ければ入力ファイルを上書き
fn output_or_input<'a>(output: &'a Option<PathBuf>, input: &'a Path) -> &'a Path {
    output.as_deref().unwrap_or(input)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load().context("設定ファイルを読み込めません")?;

    match cli.command {
        Commands::Enrich { input, output, css, limit, lexicon, deck: deck_name, note_type } => {
            println!("📚 study-deck - 語彙デッキ生成\n");

            println!("[1/3] 辞書を読み込み中...");
            let lexicon_path = lexicon.or_else(|| config.lexicon_path.clone());
            let lexicon = deck::load_lexicon(lexicon_path.as_deref())
                .with_context(|| format!("辞書を読み込めません: {:?}", lexicon_path))?;
            println!("✔ {}語の辞書\n", lexicon.len());

            println!("[2/3] カードを生成中...");
            let opts = enrich::EnrichOptions {
                note_type: note_type.unwrap_or_else(|| config.note_type.clone()),
                deck: deck_name.unwrap_or_else(|| config.deck_name.clone()),
                tags: config.vocab_tags.clone(),
                limit,
            };
            let css_path = css.unwrap_or_else(|| parent_dir(&output).join(deck::CSS_FILE_NAME));
            let report = enrich::enrich_file(&input, &output, &css_path, &lexicon, &opts)
                .with_context(|| format!("デッキを生成できません: {}", input.display()))?;
            println!("✔ {}枚のカードを生成", report.cards.len());
            if !report.placeholders.is_empty() {
                println!("⚠ 辞書に無い語: {}語（仮データで補完）", report.placeholders.len());
                if cli.verbose {
                    println!("  {}", report.placeholders.join(", "));
                }
            }
            println!();

            println!("[3/3] 出力");
            println!("✔ TSV: {}", output.display());
            println!("✔ CSS: {}", css_path.display());
            println!("  ノートタイプ: {} / デッキ: {}", opts.note_type, opts.deck);

            println!("\n✅ 完了");
        }

        Commands::FixGuids { input, source, mapping, output } => {
            println!("🔧 study-deck - GUID修正\n");

            let map = match (&source, &mapping) {
                (Some(src), _) => {
                    let entries = parse_source_deck(&deck::read_text(src)?);
                    Some(repair::CleanGuids::from_source(&entries).to_map())
                }
                (None, Some(path)) => Some(repair::parse_guid_mapping(&deck::read_text(path)?)),
                (None, None) => None,
            };
            let guid_source = match &map {
                Some(m) => {
                    println!("- GUID対応表: {}件", m.len());
                    repair::GuidSource::Mapping(m)
                }
                None => {
                    println!("- 単語からGUIDを再生成");
                    repair::GuidSource::Regenerate
                }
            };

            let mut deck_file = deck::read_deck(&input)
                .with_context(|| format!("デッキを読み込めません: {}", input.display()))?;
            let report = repair::fix_guids(&mut deck_file, guid_source);

            let dest = output_or_input(&output, &input);
            deck::write_text(dest, &deck_file.render())?;

            println!("✔ 修正: {}件 / 変更なし: {}件", report.fixed, report.unchanged);
            if !report.unmapped.is_empty() {
                println!("⚠ 対応表に無い単語: {}件", report.unmapped.len());
                if cli.verbose {
                    println!("  {}", report.unmapped.join(", "));
                }
            }
            if report.no_word > 0 {
                println!("⚠ 単語を取り出せない行: {}件", report.no_word);
            }
            println!("✔ 保存: {}", dest.display());
        }

        Commands::ExtractGuids { source, output } => {
            let entries = parse_source_deck(
                &deck::read_text(&source).with_context(|| format!("元デッキ: {}", source.display()))?,
            );
            let clean = repair::CleanGuids::from_source(&entries);
            deck::write_text(&output, &clean.to_tsv())?;

            println!("✔ 正常なGUID: {}件（除外: {}件）", clean.pairs.len(), clean.rejected);
            let duplicates = clean.duplicates();
            if duplicates.is_empty() {
                println!("✔ 全ての単語がユニークです");
            } else {
                println!("⚠ 重複した単語: {}", duplicates.join(", "));
            }
            println!("✔ 保存: {}", output.display());
        }

        Commands::Unify { input, output, english_etymology } => {
            let mut deck_file = deck::read_deck(&input)
                .with_context(|| format!("デッキを読み込めません: {}", input.display()))?;
            let report = repair::unify(&mut deck_file, english_etymology);

            let dest = output_or_input(&output, &input);
            deck::write_text(dest, &deck_file.render())?;

            println!("✔ 例文を統一: {}件", report.examples_converted);
            if english_etymology {
                println!("✔ 語源を英語テンプレートに変換: {}件", report.etymology_converted);
            }
            println!("✔ 保存: {}", dest.display());
        }

        Commands::RestoreEtymology { input, from, lexicon, mapping, save_mapping, output } => {
            let etymologies = if let Some(reference) = &from {
                repair::etymology_from_deck(&deck::read_deck(reference)?)
            } else if let Some(path) = &mapping {
                repair::parse_etymology_mapping(&deck::read_text(path)?)
            } else {
                let lexicon = match &lexicon {
                    Some(path) => study_deck_common::Lexicon::from_file(path)
                        .map_err(StudyDeckError::from)
                        .with_context(|| format!("辞書を読み込めません: {}", path.display()))?,
                    None => deck::load_lexicon(config.lexicon_path.as_deref())?,
                };
                repair::etymology_from_lexicon(&lexicon)
            };
            println!("- 語源メモ: {}件", etymologies.len());

            if let Some(path) = &save_mapping {
                deck::write_text(path, &repair::render_etymology_mapping(&etymologies))?;
                println!("✔ 対応表を保存: {}", path.display());
            }

            let mut deck_file = deck::read_deck(&input)
                .with_context(|| format!("デッキを読み込めません: {}", input.display()))?;
            let report = repair::restore_etymology(&mut deck_file, &etymologies);

            let dest = output_or_input(&output, &input);
            deck::write_text(dest, &deck_file.render())?;

            println!("✔ 復元: {}件 / 変更なし: {}件 / 見つからない: {}件",
                report.restored, report.unchanged, report.not_found);
            println!("✔ 保存: {}", dest.display());
        }

        Commands::DeckStats { input } => {
            let deck_file = deck::read_deck(&input)
                .with_context(|| format!("デッキを読み込めません: {}", input.display()))?;
            let stats = DeckStats::collect(&deck_file);

            println!("📊 {}", input.display());
            println!("  カード数: {}", stats.rows);
            println!("  列数異常の行: {}", stats.malformed);
            println!("  単語を取り出せない行: {}", stats.missing_word);
            println!("  重複単語: {}", stats.duplicate_words.len());
            println!("  GUID不一致: {}", stats.guid_mismatches);
            println!("  語源メモ:");
            for style in [
                EtymologyStyle::Japanese,
                EtymologyStyle::English,
                EtymologyStyle::Placeholder,
                EtymologyStyle::Other,
            ] {
                println!("    {}: {}", style.label(), stats.style_count(style));
            }
            println!("  日本語率: {:.1}%", stats.japanese_ratio());
            if cli.verbose && !stats.duplicate_words.is_empty() {
                println!("  重複: {}", stats.duplicate_words.join(", "));
            }
        }

        Commands::Terms { input, output } => {
            println!("🔐 study-deck - Security+用語変換\n");

            let text = deck::read_text(&input)?;
            let mut report = parse_terms(&text);
            sort_terms(&mut report.terms);
            export::terms::write_terms_tsv(&output, &report.terms)
                .with_context(|| format!("TSVを書き込めません: {}", output.display()))?;

            println!("✔ 変換: {}/{}件", report.terms.len(), report.total());
            if !report.skipped.is_empty() {
                println!("⚠ 解析できない行: {}件", report.skipped.len());
            }
            for line in &report.skipped {
                tracing::warn!(line = %line, "解析できない行");
            }
            println!("カテゴリ別:");
            for (category, count) in report.category_counts() {
                println!("  {}: {}件", category, count);
            }
            println!("✔ 保存: {}", output.display());
        }

        Commands::Ocr { folder, output, overrides, use_cache, reprocess_failed } => {
            println!("🔍 study-deck - スクリーンショットOCR\n");

            println!("[1/3] スクリーンショットをスキャン中...");
            let mut images = scanner::scan_folder(&folder)?;
            println!("✔ {}枚を検出", images.len());
            if images.is_empty() {
                return Err(StudyDeckError::NoImagesFound(folder.display().to_string()).into());
            }

            let previous = match &reprocess_failed {
                Some(path) => {
                    let previous = ocr::load_results(path)
                        .with_context(|| format!("前回の結果を読み込めません: {}", path.display()))?;
                    let failed = ocr::failed_file_names(&previous);
                    images.retain(|img| failed.contains(&img.file_name));
                    println!("✔ 再処理対象: {}枚", images.len());
                    Some(previous)
                }
                None => None,
            };
            println!();

            println!("[2/3] OCR中...{}", if use_cache { " (キャッシュ有効)" } else { "" });
            let engine = TesseractCli::from_config(&config);
            let mut cache = use_cache.then(|| OcrCache::load(&folder));
            let run = ocr::process_screenshots(&images, &engine, cache.as_mut()).await;
            if let Some(cache) = &cache {
                cache.save(&folder)?;
            }

            let mut questions = match previous {
                Some(previous) => ocr::merge_reprocessed(previous, run.questions),
                None => run.questions,
            };
            if let Some(path) = &overrides {
                let fixes = ManualOverrides::from_file(path)
                    .map_err(StudyDeckError::from)
                    .with_context(|| format!("手動修正を読み込めません: {}", path.display()))?;
                let applied = fixes.apply(&mut questions);
                println!("✔ 手動修正を適用: {}件", applied);
            }
            println!("✔ OCR完了\n");

            println!("[3/3] 結果を保存中...");
            let output_dir = output.unwrap_or_else(|| folder.clone());
            let (json_path, text_path) = export::questions::write_outputs(&output_dir, &questions)?;
            println!("✔ {}", json_path.display());
            println!("✔ {}", text_path.display());

            let stats = &run.stats;
            let parsed = questions.iter().filter(|q| q.parsed).count();
            println!("\n処理サマリー:");
            println!("  処理ファイル数: {}", stats.total);
            println!("  キャッシュ使用: {}", stats.from_cache);
            println!("  エラー: {}", stats.failed);
            println!("  OCR成功率: {:.1}%", stats.success_rate());
            println!("  問題として解析成功: {}/{}", parsed, questions.len());

            println!("\n✅ 完了");
        }

        Commands::Cards { input, output } => {
            println!("🃏 study-deck - Ankiカード生成\n");

            let questions = ocr::load_results(&input)
                .with_context(|| format!("OCR結果を読み込めません: {}", input.display()))?;
            let cards = export::cards::build_cards(&questions);
            let output_dir = output.unwrap_or_else(|| parent_dir(&input));
            let outputs = export::cards::write_outputs(&output_dir, &cards, &questions)?;

            let high = export::cards::high_quality_count(&cards);
            println!("✔ カード数: {}/{}問", cards.len(), questions.len());
            println!("✔ 高品質 ({}点以上): {}枚", export::cards::HIGH_QUALITY_SCORE, high);
            println!("✔ 手動修正: {}枚", cards.iter().filter(|c| c.manual_fixed).count());
            println!("\n出力:");
            println!("  {}", outputs.tsv.display());
            println!("  {}", outputs.json.display());
            println!("  {}", outputs.report.display());
        }

        Commands::Manual { action } => {
            let bank_path = config.manual_bank_file()?;
            let mut bank = manual::load_bank(&bank_path)
                .with_context(|| format!("問題集を読み込めません: {}", bank_path.display()))?;

            match action {
                ManualAction::Add => {
                    let question = manual::prompt_question(bank.next_number())?;
                    let number = question.number;
                    bank.push(question).map_err(StudyDeckError::from)?;
                    manual::save_bank(&bank_path, &bank)?;
                    println!("✔ Q{} を追加しました（全{}問）", number, bank.len());
                }
                ManualAction::List => {
                    for q in &bank.questions {
                        println!("{}", manual::summary_line(q));
                    }
                    println!("\n全{}問: {}", bank.len(), bank_path.display());
                }
                ManualAction::Export { output, without_choices } => {
                    let count = export::manual::write_manual_tsv(&output, &bank, !without_choices)?;
                    println!("✔ {}枚を出力: {}", count, output.display());
                }
            }
        }

        Commands::Log { action } => {
            let log_path = config.study_log_file()?;
            let mut log = StudyLog::load(&log_path)
                .with_context(|| format!("学習記録を読み込めません: {}", log_path.display()))?;

            match action.unwrap_or(LogAction::Summary) {
                LogAction::Study { vocab, reading, listening, speaking, writing, notes } => {
                    let time = TimeBreakdown::new(reading, listening, speaking, writing);
                    let record = log.log_study(vocab, time, notes.as_deref().unwrap_or("")).clone();
                    log.save(&log_path)?;
                    println!("✅ {}の学習記録を保存しました", record.date);
                    println!("📚 語彙: {}語, ⏱️ 総学習時間: {}分", record.vocab_count, record.time_breakdown.total);
                }
                LogAction::Vocab { rank, percent } => {
                    log.update_vocab(rank, percent);
                    log.save(&log_path)?;
                    println!("📖 TOEFL3800 Rank{}: {}%完了", rank, percent);
                }
                LogAction::Mock { reading, listening, speaking, writing, notes } => {
                    let scores = TimeBreakdown::new(reading, listening, speaking, writing);
                    log.add_mock(scores, notes.as_deref().unwrap_or(""));
                    log.save(&log_path)?;
                    println!(
                        "🎯 模試結果記録: R{} L{} S{} W{} (合計{})",
                        reading, listening, speaking, writing, scores.total
                    );
                }
                LogAction::Summary => {
                    print!("{}", log.summary());
                }
            }
        }

        Commands::Session { action } => {
            let root = config.session_dir()?;
            let mut manager = SessionManager::open(&root)
                .with_context(|| format!("セッション進捗を読み込めません: {}", root.display()))?;

            match action {
                SessionAction::Status => {
                    print!("{}", manager.status_text());
                }
                SessionAction::Start { source, batch_size } => {
                    if manager.is_finished() {
                        println!("✅ 全単語の処理が完了しています");
                        return Ok(());
                    }
                    let entries = match &source {
                        Some(path) => parse_source_deck(&deck::read_text(path)?),
                        None => Vec::new(),
                    };
                    let info = manager.start_session(batch_size, &entries)?;
                    println!("🚀 セッション {} を開始", info.session_id);
                    println!("📝 対象: {} ({}語)", info.word_range(), info.target_words.len());
                    if !info.target_words.is_empty() {
                        let head: Vec<&str> = info.target_words.iter().take(5).map(String::as_str).collect();
                        println!("📋 最初の5語: {}", head.join(", "));
                    }
                    println!("✔ ログ: {}", manager.log_path(info.session_id).display());
                }
                SessionAction::Mark { word, position } => {
                    if manager.mark(&word, position)? {
                        println!("📊 進捗更新: {}語処理済み", position);
                    } else {
                        manager.save()?;
                    }
                    println!("✔ {} ({}語完了)", word.trim(), manager.progress.current_status.completed_words);
                }
                SessionAction::Complete { words } => {
                    let record = manager.complete_session(words)?;
                    println!("✅ セッション {} を完了 ({})", record.session_id, record.word_range);
                    println!(
                        "📊 全体の進捗: {}/{}語",
                        manager.progress.current_status.completed_words,
                        manager.progress.project_info.total_words
                    );
                }
                SessionAction::Handoff => {
                    let path = manager.write_handoff()?;
                    println!("📋 引き継ぎドキュメントを作成: {}", path.display());
                }
            }
        }

        Commands::Config { set_tesseract, set_lexicon, show } => {
            let mut config = config;

            if let Some(command) = set_tesseract {
                config.set_tesseract(command)?;
                println!("✔ tesseractコマンドを設定しました");
            }

            if let Some(path) = set_lexicon {
                config.set_lexicon(path)?;
                println!("✔ 追加辞書を設定しました");
            }

            if show {
                println!("設定: {}", Config::config_path()?.display());
                println!("  tesseract: {} (--psm {}, -l {})", config.tesseract_command, config.tesseract_psm, config.tesseract_lang);
                println!("  OCRタイムアウト: {}秒", config.ocr_timeout_seconds);
                println!("  前処理: {}", if config.preprocess_images { "有効" } else { "無効" });
                println!("  デッキ名: {}", config.deck_name);
                println!("  ノートタイプ: {}", config.note_type);
                println!("  タグ: {}", config.vocab_tags);
                println!(
                    "  追加辞書: {}",
                    config.lexicon_path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "未設定".into())
                );
                println!("  問題集: {}", config.manual_bank_file()?.display());
                println!("  学習記録: {}", config.study_log_file()?.display());
                println!("  セッション: {}", config.session_dir()?.display());
            }
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));
            let cache_path = OcrCache::cache_path(&target);

            if info || !clear {
                if cache_path.exists() {
                    let cache = OcrCache::load(&target);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match OcrCache::clear(&target) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }
    }

    Ok(())
}
