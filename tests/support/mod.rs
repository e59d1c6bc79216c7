//! テスト用のフェイク実装
//!
//! 呼び出し回数の記録、失敗の注入、oneshotによる完了順序の制御を行う。

#![allow(dead_code)]

use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use tokio::sync::oneshot;
use wardrobe::error::{Result, WardrobeError};
use wardrobe::services::{
    object_key, Classifier, FaceVerifier, GeneratedOutfit, ObjectStore, OutfitGenerator,
    ProfileStore, StoredObject, UploadKind,
};
use wardrobe_common::{
    ClothingCategory, ClothingRecord, ClothingReport, DressingStyle, FaceQuality, FaceReport,
    GenerationRequest, ImageFile, ProfileRecord, SavedItem,
};

pub const OWNER: &str = "user-1";

pub fn png(name: &str) -> ImageFile {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(name.as_bytes());
    ImageFile::new(name, bytes)
}

pub fn jpeg(name: &str) -> ImageFile {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend_from_slice(name.as_bytes());
    ImageFile::new(name, bytes)
}

pub fn gif(name: &str) -> ImageFile {
    ImageFile::new(name, b"GIF89a\x01\x00\x01\x00".to_vec())
}

pub fn clothing_report(name: &str, category: ClothingCategory) -> ClothingReport {
    ClothingReport {
        is_clothing: true,
        name: name.into(),
        description: format!("{} description", name),
        category,
        color: "navy".into(),
        brand: Some(String::new()),
    }
}

pub fn saved_item(id: &str, name: &str, category: ClothingCategory) -> SavedItem {
    SavedItem {
        id: id.into(),
        name: name.into(),
        description: String::new(),
        category,
        image_url: format!("mem://clothing/{}", id),
        color: Some("black".into()),
        brand: None,
        created_at: "2024-01-01T00:00:00Z".into(),
    }
}

pub fn profile_record(profile_pic: Option<&str>) -> ProfileRecord {
    ProfileRecord {
        owner_id: OWNER.into(),
        height: 175.0,
        weight: 70.0,
        age: 28,
        dressing_style: DressingStyle::Streetwear,
        profile_pic: profile_pic.map(str::to_string),
    }
}

// =============================================
// 解析
// =============================================

/// ファイル名ごとに結果を決められる解析サービス
///
/// 未登録のファイルは期待カテゴリの衣類として返す。
#[derive(Default)]
pub struct FakeClassifier {
    pub calls: Cell<usize>,
    reports: RefCell<HashMap<String, ClothingReport>>,
    failures: RefCell<HashMap<String, String>>,
    gates: RefCell<HashMap<String, oneshot::Receiver<()>>>,
}

impl FakeClassifier {
    pub fn with_report(self, file_name: &str, report: ClothingReport) -> Self {
        self.reports.borrow_mut().insert(file_name.into(), report);
        self
    }

    pub fn failing(self, file_name: &str, message: &str) -> Self {
        self.failures
            .borrow_mut()
            .insert(file_name.into(), message.into());
        self
    }

    /// 送信されるまで該当ファイルの解析を止める
    pub fn gate(&self, file_name: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().insert(file_name.into(), rx);
        tx
    }
}

#[async_trait(?Send)]
impl Classifier for FakeClassifier {
    async fn classify(
        &self,
        file: &ImageFile,
        expected: Option<ClothingCategory>,
    ) -> Result<ClothingReport> {
        self.calls.set(self.calls.get() + 1);
        let gate = self.gates.borrow_mut().remove(file.name());
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(message) = self.failures.borrow().get(file.name()) {
            return Err(WardrobeError::ApiCall(message.clone()));
        }
        let report = self.reports.borrow().get(file.name()).cloned();
        Ok(report.unwrap_or_else(|| {
            clothing_report(file.name(), expected.unwrap_or(ClothingCategory::Top))
        }))
    }
}

/// 固定の結果を返す顔検証
pub struct FakeVerifier {
    pub calls: Cell<usize>,
    report: FaceReport,
}

impl FakeVerifier {
    pub fn new(quality: FaceQuality, issues: &[&str]) -> Self {
        Self {
            calls: Cell::new(0),
            report: FaceReport {
                is_face: true,
                quality,
                issues: issues.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    pub fn no_face() -> Self {
        let mut verifier = Self::new(FaceQuality::Poor, &[]);
        verifier.report.is_face = false;
        verifier
    }
}

#[async_trait(?Send)]
impl FaceVerifier for FakeVerifier {
    async fn verify_face(&self, _file: &ImageFile) -> Result<FaceReport> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.report.clone())
    }
}

// =============================================
// 保存
// =============================================

/// メモリ上のオブジェクトストア
#[derive(Default)]
pub struct FakeObjectStore {
    pub uploads: RefCell<Vec<(String, UploadKind)>>,
    failures: RefCell<HashMap<String, String>>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl FakeObjectStore {
    /// 指定ファイルのアップロードを失敗させる
    pub fn fail_file(&self, file_name: &str, message: &str) {
        self.failures
            .borrow_mut()
            .insert(file_name.into(), message.into());
    }

    pub fn clear_failures(&self) {
        self.failures.borrow_mut().clear();
    }

    /// 送信されるまで次のアップロードを止める
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.borrow_mut() = Some(rx);
        tx
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.borrow().len()
    }
}

#[async_trait(?Send)]
impl ObjectStore for FakeObjectStore {
    async fn store(
        &self,
        file: &ImageFile,
        owner_id: &str,
        kind: UploadKind,
    ) -> Result<StoredObject> {
        file.validate()?;
        self.uploads
            .borrow_mut()
            .push((file.name().to_string(), kind));

        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(message) = self.failures.borrow().get(file.name()) {
            return Err(WardrobeError::Storage(message.clone()));
        }

        let key = object_key(kind, owner_id, 1, file.name());
        Ok(StoredObject {
            url: format!("mem://{}", key),
            key,
        })
    }
}

/// メモリ上のレコードストア
#[derive(Default)]
pub struct FakeProfileStore {
    pub save_calls: Cell<usize>,
    fail_saves: Cell<usize>,
    profile: RefCell<Option<ProfileRecord>>,
    items: RefCell<Vec<SavedItem>>,
}

impl FakeProfileStore {
    pub fn seeded(profile: Option<ProfileRecord>, items: Vec<SavedItem>) -> Self {
        Self {
            profile: RefCell::new(profile),
            items: RefCell::new(items),
            ..Default::default()
        }
    }

    /// 次のn回の保存を失敗させる
    pub fn fail_next_saves(&self, n: usize) {
        self.fail_saves.set(n);
    }

    pub fn stored_profile(&self) -> Option<ProfileRecord> {
        self.profile.borrow().clone()
    }

    pub fn stored_items(&self) -> Vec<SavedItem> {
        self.items.borrow().clone()
    }

    fn push(&self, record: &ClothingRecord) -> SavedItem {
        let mut items = self.items.borrow_mut();
        let item = SavedItem {
            id: format!("item-{}", items.len() + 1),
            name: record.name.clone(),
            description: record.description.clone(),
            category: record.category,
            image_url: record.image_url.clone(),
            color: Some(record.color.clone()),
            brand: record.brand.clone(),
            created_at: "2024-01-01T00:00:00Z".into(),
        };
        items.push(item.clone());
        item
    }
}

#[async_trait(?Send)]
impl ProfileStore for FakeProfileStore {
    async fn save_profile_and_clothing(
        &self,
        profile: &ProfileRecord,
        top: &ClothingRecord,
        bottom: &ClothingRecord,
    ) -> Result<()> {
        self.save_calls.set(self.save_calls.get() + 1);
        if self.fail_saves.get() > 0 {
            self.fail_saves.set(self.fail_saves.get() - 1);
            return Err(WardrobeError::Persistence("database unavailable".into()));
        }
        *self.profile.borrow_mut() = Some(profile.clone());
        self.push(top);
        self.push(bottom);
        Ok(())
    }

    async fn load_profile(&self, _owner_id: &str) -> Result<Option<ProfileRecord>> {
        Ok(self.profile.borrow().clone())
    }

    async fn list_clothing(&self, _owner_id: &str) -> Result<Vec<SavedItem>> {
        Ok(self.items.borrow().clone())
    }

    async fn add_clothing(&self, _owner_id: &str, record: &ClothingRecord) -> Result<SavedItem> {
        Ok(self.push(record))
    }

    async fn set_profile_pic(&self, owner_id: &str, url: &str) -> Result<ProfileRecord> {
        let mut profile = self.profile.borrow_mut();
        let profile = profile
            .as_mut()
            .ok_or_else(|| WardrobeError::ItemNotFound(format!("profile for {}", owner_id)))?;
        profile.profile_pic = Some(url.to_string());
        Ok(profile.clone())
    }
}

// =============================================
// 生成
// =============================================

/// 結果を順番に返す生成サービス（尽きたら成功を返す）
#[derive(Default)]
pub struct FakeGenerator {
    pub calls: Cell<usize>,
    pub last_request: RefCell<Option<GenerationRequest>>,
    outcomes: RefCell<VecDeque<std::result::Result<String, String>>>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl FakeGenerator {
    pub fn then_fail(self, message: &str) -> Self {
        self.outcomes.borrow_mut().push_back(Err(message.into()));
        self
    }

    pub fn then_succeed(self, image: &str) -> Self {
        self.outcomes.borrow_mut().push_back(Ok(image.into()));
        self
    }

    pub fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.borrow_mut() = Some(rx);
        tx
    }
}

#[async_trait(?Send)]
impl OutfitGenerator for FakeGenerator {
    async fn generate_outfit(&self, request: &GenerationRequest) -> Result<GeneratedOutfit> {
        self.calls.set(self.calls.get() + 1);
        *self.last_request.borrow_mut() = Some(request.clone());

        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let outcome = self.outcomes.borrow_mut().pop_front();
        match outcome {
            Some(Err(message)) => Err(WardrobeError::ApiCall(message)),
            Some(Ok(image)) => Ok(GeneratedOutfit {
                image_data_url: image,
            }),
            None => Ok(GeneratedOutfit {
                image_data_url: "data:image/png;base64,AQID".into(),
            }),
        }
    }
}
