//! OCR前処理（グレースケール化＋大津の二値化）

use crate::error::{Result, StudyDeckError};
use image::{GrayImage, Luma};
use std::path::{Path, PathBuf};

/// 大津の方法で二値化の閾値を求める
pub fn otsu_threshold(img: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in img.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 127;
    }
    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut background_weight = 0u64;
    let mut background_sum = 0f64;
    let mut best_threshold = 0u8;
    let mut best_variance = 0f64;

    for (t, &count) in histogram.iter().enumerate() {
        background_weight += count;
        if background_weight == 0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0 {
            break;
        }

        background_sum += t as f64 * count as f64;
        let mean_bg = background_sum / background_weight as f64;
        let mean_fg = (weighted_sum - background_sum) / foreground_weight as f64;
        let variance =
            background_weight as f64 * foreground_weight as f64 * (mean_bg - mean_fg).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

/// 閾値以下を黒、それ以外を白にする
pub fn binarize(img: &GrayImage) -> GrayImage {
    let threshold = otsu_threshold(img);
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        *pixel = if pixel[0] > threshold { Luma([255]) } else { Luma([0]) };
    }
    out
}

/// 二値化した画像を一時PNGとして書き出し、そのパスを返す
pub fn binarize_to_temp(path: &Path) -> Result<PathBuf> {
    let img = image::open(path)
        .map_err(|e| StudyDeckError::ImageLoad(format!("{}: {}", path.display(), e)))?
        .to_luma8();

    let temp_dir = std::env::temp_dir().join("study-deck-ocr");
    std::fs::create_dir_all(&temp_dir)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "screenshot".to_string());
    let dest = temp_dir.join(format!("{}-{}.png", stem, std::process::id()));

    binarize(&img)
        .save(&dest)
        .map_err(|e| StudyDeckError::ImageLoad(format!("{}: {}", dest.display(), e)))?;

    Ok(dest)
}
