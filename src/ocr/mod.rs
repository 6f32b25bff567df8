//! スクリーンショットOCRパイプライン
//!
//! 1枚ずつ OCR → 問題の切り出し を行う。
//! 1枚の失敗はエラー付きの結果として残し、処理は止めない。

pub mod cache;
pub mod preprocess;
pub mod tesseract;

pub use cache::OcrCache;
pub use tesseract::TesseractCli;

use crate::error::Result;
use crate::progress;
use crate::scanner::ImageInfo;
use std::collections::HashSet;
use std::path::Path;
use study_deck_common::{segment, PracticeQuestion};
use tracing::{debug, warn};

/// OCRエンジン
#[allow(async_fn_in_trait)]
pub trait OcrEngine {
    /// 画像からテキストを抽出
    async fn extract(&self, path: &Path) -> Result<String>;
}

/// 処理件数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrStats {
    pub total: usize,
    pub from_cache: usize,
    pub failed: usize,
    pub parsed: usize,
}

impl OcrStats {
    /// OCR自体が成功した割合（%）
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.total - self.failed) as f64 / self.total as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct OcrRun {
    pub questions: Vec<PracticeQuestion>,
    pub stats: OcrStats,
}

/// スクリーンショットを順に処理
pub async fn process_screenshots<E: OcrEngine>(
    images: &[ImageInfo],
    engine: &E,
    mut cache: Option<&mut OcrCache>,
) -> OcrRun {
    let mut run = OcrRun {
        stats: OcrStats { total: images.len(), ..Default::default() },
        ..Default::default()
    };

    let pb = progress::bar(images.len());

    for img in images {
        pb.set_message(img.file_name.clone());

        let hash = match cache.as_deref() {
            Some(_) => cache::compute_file_hash(&img.path).ok(),
            None => None,
        };

        let cached = match (cache.as_deref(), &hash) {
            (Some(c), Some((h, _))) => c.get(h).map(str::to_string),
            _ => None,
        };

        let raw_text = match cached {
            Some(text) => {
                debug!(file = %img.file_name, "キャッシュヒット");
                run.stats.from_cache += 1;
                Ok(text)
            }
            None => engine.extract(&img.path).await,
        };

        let question = match raw_text {
            Ok(text) => {
                if let (Some(c), Some((h, size))) = (cache.as_deref_mut(), &hash) {
                    c.insert(h.clone(), img.file_name.clone(), *size, text.clone());
                }
                segment(&text, &img.file_name)
            }
            Err(e) => {
                pb.println(format!("  ✗ {}: {}", img.file_name, e));
                warn!(file = %img.file_name, error = %e, "OCR失敗");
                run.stats.failed += 1;
                PracticeQuestion::failed(&img.file_name, e.to_string())
            }
        };

        run.questions.push(question);
        pb.inc(1);
    }
    pb.finish_and_clear();

    run.stats.parsed = run.questions.iter().filter(|q| q.parsed).count();

    run
}

/// 前回の結果のうち未解析のファイル名
pub fn failed_file_names(previous: &[PracticeQuestion]) -> HashSet<String> {
    previous
        .iter()
        .filter(|q| !q.parsed)
        .map(|q| q.file_name.clone())
        .collect()
}

/// 前回の解析成功分と再処理分をマージ（ファイル名順）
///
/// 再処理の結果が前回の同名エントリを置き換える。
pub fn merge_reprocessed(
    previous: Vec<PracticeQuestion>,
    reprocessed: Vec<PracticeQuestion>,
) -> Vec<PracticeQuestion> {
    let replaced: HashSet<&str> = reprocessed.iter().map(|q| q.file_name.as_str()).collect();

    let mut merged: Vec<PracticeQuestion> = previous
        .into_iter()
        .filter(|q| !replaced.contains(q.file_name.as_str()))
        .collect();
    merged.extend(reprocessed);
    merged.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    merged
}

/// 前回の結果JSONを読み込み
pub fn load_results(path: &Path) -> Result<Vec<PracticeQuestion>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
