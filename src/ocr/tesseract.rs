//! tesseract CLI連携

use super::{preprocess, OcrEngine};
use crate::config::Config;
use crate::error::{Result, StudyDeckError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TesseractCli {
    pub command: String,
    pub psm: u8,
    pub lang: String,
    pub timeout: Duration,
    pub preprocess: bool,
}

impl TesseractCli {
    pub fn from_config(config: &Config) -> Self {
        Self {
            command: config.tesseract_command.clone(),
            psm: config.tesseract_psm,
            lang: config.tesseract_lang.clone(),
            timeout: Duration::from_secs(config.ocr_timeout_seconds),
            preprocess: config.preprocess_images,
        }
    }

    /// `tesseract <image> stdout --psm N -l LANG`
    fn build_args(&self, image: &Path) -> Vec<String> {
        vec![
            image.display().to_string(),
            "stdout".to_string(),
            "--psm".to_string(),
            self.psm.to_string(),
            "-l".to_string(),
            self.lang.clone(),
        ]
    }

    async fn run(&self, image: &Path) -> Result<String> {
        let args = self.build_args(image);
        debug!(command = %self.command, ?args, "tesseract実行");

        let child = Command::new(&self.command)
            .args(&args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| StudyDeckError::OcrTimeout(self.timeout.as_secs()))?
            .map_err(|e| StudyDeckError::OcrExecution(format!("{}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StudyDeckError::OcrExecution(format!(
                "tesseract failed (code {:?}): {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl OcrEngine for TesseractCli {
    async fn extract(&self, path: &Path) -> Result<String> {
        if !self.preprocess {
            return self.run(path).await;
        }

        let prepared: PathBuf = preprocess::binarize_to_temp(path)?;
        let result = self.run(&prepared).await;
        std::fs::remove_file(&prepared).ok();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(command: &str) -> TesseractCli {
        TesseractCli {
            command: command.to_string(),
            psm: 6,
            lang: "eng".to_string(),
            timeout: Duration::from_secs(5),
            preprocess: false,
        }
    }

    #[test]
    fn test_build_args() {
        let args = engine("tesseract").build_args(Path::new("shot.png"));
        assert_eq!(args, vec!["shot.png", "stdout", "--psm", "6", "-l", "eng"]);
    }

    #[tokio::test]
    async fn test_missing_command_is_execution_error() {
        let result = engine("study-deck-no-such-ocr-binary")
            .extract(Path::new("shot.png"))
            .await;
        assert!(matches!(result, Err(StudyDeckError::OcrExecution(_))));
    }
}
