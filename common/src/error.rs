//! エラー型定義

use crate::types::ClothingCategory;
use thiserror::Error;

/// 入力検証エラー
///
/// 外部呼び出しの前に検出され、自動リトライはしない
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: String,
        max: String,
    },

    #[error("No image provided")]
    NoFile,

    #[error("Only one image can be uploaded at a time")]
    TooManyFiles,

    #[error("Only PNG and JPG images are allowed (got {0})")]
    UnsupportedContentType(String),

    #[error("File size must be less than 10MB")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Category is required for clothing uploads")]
    MissingCategory,

    #[error("Please complete all steps before submitting")]
    Incomplete,

    #[error("Please upload a profile picture first")]
    NoProfilePicture,

    #[error("Please select at least one clothing item")]
    NoItemsSelected,
}

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 解析サービスは成功したが画像が不適合
    #[error("{0}")]
    Rejected(String),

    /// 提出時に検出した不整合（ウィザードは初期化される）
    #[error("Missing required data. Please start over. ({0})")]
    StateCorrupted(String),

    #[error("The {0} slot is still analyzing")]
    SlotBusy(ClothingCategory),

    #[error("The face slot is still analyzing")]
    FaceSlotBusy,

    #[error("Submission already in progress")]
    SubmissionInProgress,

    #[error("Outfit generation already in progress")]
    GenerationInProgress,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 同じ操作を再実行すれば回復しうるか
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Parse(_) | Error::Json(_))
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::NoProfilePicture.to_string(),
            "Please upload a profile picture first"
        );
        assert_eq!(
            ValidationError::NoItemsSelected.to_string(),
            "Please select at least one clothing item"
        );
        let err = ValidationError::UnsupportedContentType("image/gif".into());
        assert!(err.to_string().contains("image/gif"));
    }

    #[test]
    fn test_validation_is_transparent() {
        let err: Error = ValidationError::Incomplete.into();
        assert_eq!(err.to_string(), "Please complete all steps before submitting");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_state_corrupted_display() {
        let err = Error::StateCorrupted("top slot".into());
        assert!(err.to_string().starts_with("Missing required data"));
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
        assert!(error.is_retryable());
    }
}
