use crate::error::{Result, WardrobeError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const API_KEY_VARS: &[&str] = &["GOOGLE_GENERATIVE_AI_API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    /// 衣類解析・顔検証モデル
    pub classify_model: String,
    /// コーデ画像生成モデル
    pub image_model: String,
    /// 画像とレコードの保存先（省略時は ~/.local/share/wardrobe）
    pub data_dir: Option<PathBuf>,
    /// 保存画像の公開URLプレフィックス（省略時は file:// URL）
    pub public_base_url: Option<String>,
    /// 認証済みユーザーID
    pub owner_id: String,
    pub timeout_seconds: u64,
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
            .ok_or_else(|| WardrobeError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("wardrobe").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            api_key: None,
            classify_model: "gemini-2.0-flash".into(),
            image_model: "gemini-2.5-flash-image".into(),
            data_dir: None,
            public_base_url: None,
            owner_id: "local".into(),
            timeout_seconds: 120,
        }
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        for var in API_KEY_VARS {
            if let Ok(key) = std::env::var(var) {
                if !key.trim().is_empty() {
                    return Ok(key);
                }
            }
        }

        self.api_key.clone().ok_or(WardrobeError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_dir()
            .ok_or_else(|| WardrobeError::Config("data directory not found".into()))?;
        Ok(base.join("wardrobe"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models() {
        let config = Config::default();
        assert_eq!(config.classify_model, "gemini-2.0-flash");
        assert_eq!(config.image_model, "gemini-2.5-flash-image");
        assert_eq!(config.owner_id, "local");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"owner_id": "user-42"}"#).unwrap();
        assert_eq!(config.owner_id, "user-42");
        assert_eq!(config.timeout_seconds, 120);
    }

    #[test]
    fn test_explicit_data_dir() {
        let config = Config {
            data_dir: Some(PathBuf::from("/tmp/wardrobe-test")),
            ..Config::default()
        };
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/wardrobe-test"));
    }
}
