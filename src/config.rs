use crate::error::{Result, ValidatorError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// APIのベースURLを上書きする環境変数
pub const API_URL_ENV: &str = "RECORD_VALIDATOR_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub timeout_seconds: u64,
    /// 分類の温度（UIからは変更しない）
    pub temperature: f64,
    /// リクエストの source 欄
    pub source: String,
    pub demo_path: PathBuf,
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

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ValidatorError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("record-validator").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            api_url: None,
            timeout_seconds: 60,
            temperature: 0.7,
            source: "cli".into(),
            demo_path: PathBuf::from("test_data/demo_bdoc_1.json"),
        }
    }

    /// ベースURL（環境変数を優先）
    pub fn api_url(&self) -> Result<String> {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                return Ok(url.trim().to_string());
            }
        }

        self.api_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(ValidatorError::MissingApiUrl)
    }

    /// 検証エンドポイント `<base>/validate`
    pub fn validate_endpoint(&self) -> Result<String> {
        let base = self.api_url()?;
        Ok(format!("{}/validate", base.trim_end_matches('/')))
    }

    pub fn set_api_url(&mut self, url: String) -> Result<()> {
        self.api_url = Some(url);
        self.save()
    }
}
