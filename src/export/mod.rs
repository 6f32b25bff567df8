//! ファイル出力（TSV / JSON / テキスト / Markdown）

pub mod cards;
pub mod manual;
pub mod questions;
pub mod terms;

use crate::error::Result;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// タブ区切りのライター（1行目はヘッダー）
pub fn tsv_writer<H: AsRef<[u8]>>(path: &Path, headers: &[H]) -> Result<csv::Writer<File>> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;
    writer.write_record(headers)?;
    Ok(writer)
}

/// 整形済みJSONで書き出し
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}

/// 親フォルダが無ければ作成
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
