//! ローカル画像ファイルの読み込み

use crate::error::{Result, WardrobeError};
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use wardrobe_common::{single_file, ImageFile};

/// パスから画像を読み込む（形式判定は内容優先）
pub async fn load_image(path: &Path) -> Result<ImageFile> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => WardrobeError::FileNotFound(path.display().to_string()),
        _ => WardrobeError::Io(e),
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    Ok(ImageFile::new(name, bytes))
}

/// スロットへのドロップとして読み込む（1枚だけ受け付ける）
pub async fn load_dropped(paths: &[PathBuf]) -> Result<ImageFile> {
    let files = try_join_all(paths.iter().map(|path| load_image(path))).await?;
    Ok(single_file(files)?)
}
