//! JSONレコードストア
//!
//! データディレクトリの `wardrobe.json` にプロフィールと衣類を保存する。
//! 書き込みは一時ファイル + rename で行い、途中状態を残さない。

use super::ProfileStore;
use crate::error::{Result, WardrobeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};
use wardrobe_common::{ClothingRecord, ProfileRecord, SavedItem};

const RECORD_FILE_NAME: &str = "wardrobe.json";

/// レコードファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordFile {
    /// バージョン（互換性チェック用）
    version: u32,
    /// 次に払い出すアイテムID
    next_id: u64,
    /// オーナーID → プロフィール
    profiles: BTreeMap<String, ProfileRecord>,
    clothing: Vec<OwnedItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnedItem {
    owner_id: String,
    #[serde(flatten)]
    item: SavedItem,
}

impl Default for RecordFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            next_id: 1,
            profiles: BTreeMap::new(),
            clothing: Vec::new(),
        }
    }
}

impl RecordFile {
    const CURRENT_VERSION: u32 = 1;

    fn push_item(&mut self, owner_id: &str, record: &ClothingRecord) -> SavedItem {
        let item = SavedItem {
            id: self.next_id.to_string(),
            name: record.name.clone(),
            description: record.description.clone(),
            category: record.category,
            image_url: record.image_url.clone(),
            color: Some(record.color.clone()).filter(|c| !c.is_empty()),
            brand: record.brand.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.next_id += 1;
        self.clothing.push(OwnedItem {
            owner_id: owner_id.to_string(),
            item: item.clone(),
        });
        item
    }
}

/// `wardrobe.json` ベースのプロフィールストア
pub struct JsonProfileStore {
    path: PathBuf,
    /// 読み込み → 更新 → 書き込み を直列化する
    lock: Mutex<()>,
}

impl JsonProfileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(RECORD_FILE_NAME),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<RecordFile> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RecordFile::default()),
            Err(e) => return Err(e.into()),
        };

        let file: RecordFile = serde_json::from_str(&content)
            .map_err(|e| WardrobeError::Persistence(format!("{}: {}", self.path.display(), e)))?;

        // バージョンチェック（保存データは破棄しない）
        if file.version != RecordFile::CURRENT_VERSION {
            return Err(WardrobeError::Persistence(format!(
                "unsupported record file version {} (expected {})",
                file.version,
                RecordFile::CURRENT_VERSION
            )));
        }
        Ok(file)
    }

    async fn save(&self, file: &RecordFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");

        let write = async {
            tokio::fs::write(&tmp, content).await?;
            tokio::fs::rename(&tmp, &self.path).await
        };
        write
            .await
            .map_err(|e| WardrobeError::Persistence(format!("{}: {}", self.path.display(), e)))?;
        debug!(path = %self.path.display(), "records: saved");
        Ok(())
    }
}

#[async_trait(?Send)]
impl ProfileStore for JsonProfileStore {
    async fn save_profile_and_clothing(
        &self,
        profile: &ProfileRecord,
        top: &ClothingRecord,
        bottom: &ClothingRecord,
    ) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;

        let mut profile = profile.clone();
        if profile.profile_pic.is_none() {
            // 既存の顔写真は引き継ぐ
            profile.profile_pic = file
                .profiles
                .get(&profile.owner_id)
                .and_then(|p| p.profile_pic.clone());
        }
        let owner_id = profile.owner_id.clone();
        file.profiles.insert(owner_id.clone(), profile);
        file.push_item(&owner_id, top);
        file.push_item(&owner_id, bottom);

        self.save(&file).await?;
        info!(owner = %owner_id, "records: profile and clothing saved");
        Ok(())
    }

    async fn load_profile(&self, owner_id: &str) -> Result<Option<ProfileRecord>> {
        let file = self.load().await?;
        Ok(file.profiles.get(owner_id).cloned())
    }

    async fn list_clothing(&self, owner_id: &str) -> Result<Vec<SavedItem>> {
        let file = self.load().await?;
        // 新しい順
        Ok(file
            .clothing
            .into_iter()
            .rev()
            .filter(|owned| owned.owner_id == owner_id)
            .map(|owned| owned.item)
            .collect())
    }

    async fn add_clothing(&self, owner_id: &str, record: &ClothingRecord) -> Result<SavedItem> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let item = file.push_item(owner_id, record);
        self.save(&file).await?;
        info!(owner = %owner_id, id = %item.id, "records: clothing added");
        Ok(item)
    }

    async fn set_profile_pic(&self, owner_id: &str, url: &str) -> Result<ProfileRecord> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let profile = file
            .profiles
            .get_mut(owner_id)
            .ok_or_else(|| WardrobeError::ItemNotFound(format!("profile for {}", owner_id)))?;
        profile.profile_pic = Some(url.to_string());
        let updated = profile.clone();
        self.save(&file).await?;
        info!(owner = %owner_id, "records: profile picture updated");
        Ok(updated)
    }
}
