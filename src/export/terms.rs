//! Security+用語 → Anki TSV

use super::tsv_writer;
use crate::error::Result;
use std::path::Path;
use study_deck_common::{SecurityTerm, TERM_TSV_HEADERS};

pub fn write_terms_tsv(path: &Path, terms: &[SecurityTerm]) -> Result<()> {
    let mut writer = tsv_writer(path, &TERM_TSV_HEADERS)?;
    for term in terms {
        writer.write_record(term.to_record())?;
    }
    writer.flush()?;
    Ok(())
}
