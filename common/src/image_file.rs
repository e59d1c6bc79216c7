//! アップロード画像ファイル
//!
//! スロットに載る「バイナリ」本体と、外部呼び出し前の検証
//! （PNG/JPEGのみ、10MB以下）を扱う。

use crate::error::ValidationError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

/// アップロード上限（10MB）
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// 受け付けるContent-Type
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg"];

/// ユーザーが選択した画像ファイル
///
/// 本体は `Arc` で共有するため、アップロード中にスロットを借用し続ける必要はない。
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    name: String,
    content_type: String,
    bytes: Arc<[u8]>,
}

impl ImageFile {
    /// バイト列からContent-Typeを判定して作成
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let bytes: Vec<u8> = bytes.into();
        let content_type = sniff_content_type(&name, &bytes);
        Self {
            name,
            content_type,
            bytes: bytes.into(),
        }
    }

    /// 申告されたContent-Typeをそのまま使う
    pub fn with_content_type(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// アップロード可能か検証（ネットワーク呼び出し前に行う）
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !ALLOWED_CONTENT_TYPES.contains(&self.content_type.as_str()) {
            return Err(ValidationError::UnsupportedContentType(
                self.content_type.clone(),
            ));
        }
        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ValidationError::FileTooLarge {
                size: self.bytes.len(),
                limit: MAX_UPLOAD_BYTES,
            });
        }
        Ok(())
    }

    /// "data:image/png;base64,..." 形式
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.to_base64())
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// ドロップされたファイル群から1枚だけを取り出す
pub fn single_file(mut files: Vec<ImageFile>) -> Result<ImageFile, ValidationError> {
    match files.len() {
        0 => Err(ValidationError::NoFile),
        1 => Ok(files.remove(0)),
        _ => Err(ValidationError::TooManyFiles),
    }
}

/// マジックバイトでContent-Typeを判定し、判定できなければ拡張子を見る
pub fn sniff_content_type(name: &str, bytes: &[u8]) -> String {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type().to_string();
    }

    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
    .to_string()
}
