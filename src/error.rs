use thiserror::Error;

pub const ANALYZE_CLOTHING_FAILED: &str = "Failed to analyze clothing image. Please try again.";
pub const ANALYZE_FACE_FAILED: &str = "Failed to analyze face image. Please try again.";
pub const GENERATE_OUTFIT_FAILED: &str = "Failed to generate outfit image";
pub const SAVE_PROFILE_FAILED: &str = "Failed to save profile. Please try again.";

#[derive(Error, Debug)]
pub enum WardrobeError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing GOOGLE_GENERATIVE_AI_API_KEY API key. Set it with `wardrobe config --set-api-key YOUR_KEY`")]
    MissingApiKey,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("API call failed: {0}")]
    ApiCall(String),

    #[error("Rate limit exceeded. Enable billing at https://aistudio.google.com/apikey")]
    RateLimited,

    #[error("Failed to parse API response: {0}")]
    ApiParse(String),

    #[error("Upload failed: {0}")]
    Storage(String),

    #[error("Failed to save: {0}")]
    Persistence(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] wardrobe_common::Error),
}

impl WardrobeError {
    /// 同じ操作の再実行で回復しうる失敗か（通信・サービス側の失敗）
    pub fn is_retryable(&self) -> bool {
        match self {
            WardrobeError::ApiCall(_)
            | WardrobeError::RateLimited
            | WardrobeError::ApiParse(_)
            | WardrobeError::Storage(_)
            | WardrobeError::Persistence(_)
            | WardrobeError::Http(_)
            | WardrobeError::Io(_) => true,
            WardrobeError::Common(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// 画面に出すメッセージ
    ///
    /// 通信・サービス側の失敗は詳細をログに残し、`generic` を返す。
    /// レート制限とそれ以外（検証・状態エラー）はそのまま表示する。
    pub fn user_message(&self, generic: &str) -> String {
        match self {
            WardrobeError::RateLimited => self.to_string(),
            err if err.is_retryable() => generic.to_string(),
            err => err.to_string(),
        }
    }

    /// 入力検証エラーか
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            WardrobeError::Common(wardrobe_common::Error::Validation(_))
        )
    }
}

impl From<wardrobe_common::ValidationError> for WardrobeError {
    fn from(err: wardrobe_common::ValidationError) -> Self {
        WardrobeError::Common(err.into())
    }
}

pub type Result<T> = std::result::Result<T, WardrobeError>;
