//! ローカルオブジェクトストア
//!
//! 画像をデータディレクトリ配下に保存し、公開URLまたは file:// URL を返す。

use super::{ObjectStore, StoredObject, UploadKind};
use crate::error::{Result, WardrobeError};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use wardrobe_common::ImageFile;

const OBJECTS_DIR: &str = "objects";

/// キーに使えない文字を `_` に置換
fn sanitize_segment(raw: &str) -> String {
    lazy_static::lazy_static! {
        static ref UNSAFE: Regex = Regex::new(r"[^a-zA-Z0-9.-]").unwrap();
    }
    let sanitized = UNSAFE.replace_all(raw, "_").into_owned();
    if sanitized.chars().all(|c| c == '.') {
        // "" / "." / ".." はパスとして解釈されるため置換
        return "_".repeat(sanitized.len().max(1));
    }
    sanitized
}

/// 保存キーを組み立てる
///
/// - プロフィール: `profile/<owner>/<ts>-<name>`
/// - 衣類: `clothing/<category>/<owner>/<ts>-<name>`
pub fn object_key(kind: UploadKind, owner_id: &str, timestamp_ms: i64, file_name: &str) -> String {
    let owner = sanitize_segment(owner_id);
    let name = sanitize_segment(file_name);
    match kind {
        UploadKind::Profile => format!("profile/{}/{}-{}", owner, timestamp_ms, name),
        UploadKind::Clothing(category) => format!(
            "clothing/{}/{}/{}-{}",
            category.dir_name(),
            owner,
            timestamp_ms,
            name
        ),
    }
}

/// データディレクトリ上のオブジェクトストア
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalObjectStore {
    pub fn new(data_dir: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            root: data_dir.into().join(OBJECTS_DIR),
            public_base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn url_for(&self, key: &str, path: &Path) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!("file://{}", path.display()),
        }
    }
}

#[async_trait(?Send)]
impl ObjectStore for LocalObjectStore {
    async fn store(
        &self,
        file: &ImageFile,
        owner_id: &str,
        kind: UploadKind,
    ) -> Result<StoredObject> {
        // I/Oの前に検証
        file.validate()?;

        let key = object_key(kind, owner_id, chrono::Utc::now().timestamp_millis(), file.name());
        let path = self.root.join(&key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| WardrobeError::Storage(format!("{}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&path, file.bytes())
            .await
            .map_err(|e| WardrobeError::Storage(format!("{}: {}", path.display(), e)))?;

        let path = tokio::fs::canonicalize(&path).await.unwrap_or(path);
        let url = self.url_for(&key, &path);
        info!(%key, size = file.len(), "storage: object stored");
        debug!(%url, "storage: object url");

        Ok(StoredObject { url, key })
    }
}
