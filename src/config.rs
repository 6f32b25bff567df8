use crate::error::{Result, StudyDeckError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// tesseract実行ファイル
    pub tesseract_command: String,
    /// ページ分割モード（--psm）
    pub tesseract_psm: u8,
    /// 認識言語（-l）
    pub tesseract_lang: String,
    pub ocr_timeout_seconds: u64,
    /// OCR前に二値化するか
    pub preprocess_images: bool,
    pub deck_name: String,
    pub note_type: String,
    pub vocab_tags: String,
    /// 組み込み辞書にマージするユーザー辞書
    pub lexicon_path: Option<PathBuf>,
    pub manual_bank_path: Option<PathBuf>,
    pub study_log_path: Option<PathBuf>,
    pub session_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// 設定・データの保存先（~/.config/study-deck）
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| StudyDeckError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("study-deck"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            tesseract_command: "tesseract".into(),
            tesseract_psm: 6,
            tesseract_lang: "eng".into(),
            ocr_timeout_seconds: 60,
            preprocess_images: true,
            deck_name: "toefl3800-enhanced".into(),
            note_type: "Enhanced TOEFL Vocabulary".into(),
            vocab_tags: study_deck_common::vocab::DEFAULT_VOCAB_TAGS.into(),
            lexicon_path: None,
            manual_bank_path: None,
            study_log_path: None,
            session_root: None,
        }
    }

    /// 手入力問題集のパス
    pub fn manual_bank_file(&self) -> Result<PathBuf> {
        match &self.manual_bank_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("cc_questions.json")),
        }
    }

    /// 学習記録のパス
    pub fn study_log_file(&self) -> Result<PathBuf> {
        match &self.study_log_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("progress_data.json")),
        }
    }

    /// セッション管理のルート
    pub fn session_dir(&self) -> Result<PathBuf> {
        match &self.session_root {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("session")),
        }
    }

    pub fn set_tesseract(&mut self, command: String) -> Result<()> {
        self.tesseract_command = command;
        self.save()
    }

    pub fn set_lexicon(&mut self, path: PathBuf) -> Result<()> {
        self.lexicon_path = Some(path);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tesseract_command, "tesseract");
        assert_eq!(config.tesseract_psm, 6);
        assert!(config.preprocess_images);
        assert!(config.lexicon_path.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"tesseract_psm": 4}"#).unwrap();
        assert_eq!(config.tesseract_psm, 4);
        assert_eq!(config.tesseract_command, "tesseract");
        assert_eq!(config.deck_name, "toefl3800-enhanced");
    }

    #[test]
    fn test_explicit_paths_win() {
        let config = Config {
            study_log_path: Some(PathBuf::from("/tmp/log.json")),
            ..Config::default()
        };
        assert_eq!(config.study_log_file().unwrap(), PathBuf::from("/tmp/log.json"));
    }
}
