//! 外部サービスとの境界
//!
//! 解析・保存・生成はすべてトレイト越しに呼び出す。
//! セッションは単一タスクで駆動するため `Send` は要求しない。

mod gemini;
mod records;
mod storage;

pub use gemini::{decode_data_url, GeminiClient};
pub use records::JsonProfileStore;
pub use storage::{object_key, LocalObjectStore};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wardrobe_common::{
    ClothingCategory, ClothingRecord, ClothingReport, FaceReport, GenerationRequest, ImageFile,
    ProfileRecord, SavedItem,
};

/// 衣類画像の解析
#[async_trait(?Send)]
pub trait Classifier {
    async fn classify(
        &self,
        file: &ImageFile,
        expected: Option<ClothingCategory>,
    ) -> Result<ClothingReport>;
}

/// 顔写真の検証
#[async_trait(?Send)]
pub trait FaceVerifier {
    async fn verify_face(&self, file: &ImageFile) -> Result<FaceReport>;
}

/// アップロード種別（保存先キーの決定に使う）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Profile,
    Clothing(ClothingCategory),
}

/// 保存済みオブジェクト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub url: String,
    pub key: String,
}

/// 画像オブジェクトの保存先
#[async_trait(?Send)]
pub trait ObjectStore {
    /// 種別・形式・サイズを検証してから保存する
    async fn store(&self, file: &ImageFile, owner_id: &str, kind: UploadKind)
        -> Result<StoredObject>;
}

/// プロフィールと衣類レコードの保存先
#[async_trait(?Send)]
pub trait ProfileStore {
    /// プロフィールと上下2件の衣類をまとめて保存する（全件成功か全件失敗）
    async fn save_profile_and_clothing(
        &self,
        profile: &ProfileRecord,
        top: &ClothingRecord,
        bottom: &ClothingRecord,
    ) -> Result<()>;

    async fn load_profile(&self, owner_id: &str) -> Result<Option<ProfileRecord>>;

    async fn list_clothing(&self, owner_id: &str) -> Result<Vec<SavedItem>>;

    async fn add_clothing(&self, owner_id: &str, record: &ClothingRecord) -> Result<SavedItem>;

    async fn set_profile_pic(&self, owner_id: &str, url: &str) -> Result<ProfileRecord>;
}

/// 生成されたコーデ画像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOutfit {
    /// `data:<mime>;base64,...` 形式
    pub image_data_url: String,
}

/// コーデ画像の生成
#[async_trait(?Send)]
pub trait OutfitGenerator {
    async fn generate_outfit(&self, request: &GenerationRequest) -> Result<GeneratedOutfit>;
}
