//! ダッシュボード
//!
//! 保存済みアイテムの一覧・選択、衣類の追加、顔写真の登録、
//! コーデ画像の生成をまとめたセッション。

use crate::error::{
    Result, WardrobeError, ANALYZE_CLOTHING_FAILED, ANALYZE_FACE_FAILED, GENERATE_OUTFIT_FAILED,
};
use crate::services::{
    Classifier, FaceVerifier, ObjectStore, OutfitGenerator, ProfileStore, UploadKind,
};
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use tracing::{debug, info, warn};
use wardrobe_common::{
    judge_clothing, judge_face, ClassificationResult, ClothingCategory, ClothingRecord,
    DropRejected, Error as CommonError, FaceVerification, GenerationRequest, ImageFile,
    OutfitState, PreviewRegistry, ProfileRecord, SavedItem, SelectionSet, SlotState, UploadSlot,
    ValidationError,
};

/// ダッシュボードの状態
#[derive(Debug)]
pub struct Dashboard {
    owner_id: String,
    items: Vec<SavedItem>,
    profile: Option<ProfileRecord>,
    selection: SelectionSet,
    outfit: OutfitState,
    face: UploadSlot<FaceVerification>,
    clothing: UploadSlot<ClassificationResult>,
    clothing_category: Option<ClothingCategory>,
    previews: PreviewRegistry,
}

impl Dashboard {
    pub fn new(owner_id: impl Into<String>, previews: PreviewRegistry) -> Self {
        Self {
            owner_id: owner_id.into(),
            items: Vec::new(),
            profile: None,
            selection: SelectionSet::new(),
            outfit: OutfitState::default(),
            face: UploadSlot::new(),
            clothing: UploadSlot::new(),
            clothing_category: None,
            previews,
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn items(&self) -> &[SavedItem] {
        &self.items
    }

    pub fn items_in(&self, category: ClothingCategory) -> impl Iterator<Item = &SavedItem> {
        self.items.iter().filter(move |item| item.category == category)
    }

    pub fn find_item(&self, id: &str) -> Option<&SavedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn profile(&self) -> Option<&ProfileRecord> {
        self.profile.as_ref()
    }

    pub fn profile_pic(&self) -> Option<&str> {
        self.profile.as_ref().and_then(|p| p.profile_pic.as_deref())
    }

    /// プロフィールと上下1着ずつが揃っているか
    pub fn has_profile(&self) -> bool {
        self.profile.is_some()
            && self.items_in(ClothingCategory::Top).next().is_some()
            && self.items_in(ClothingCategory::Bottom).next().is_some()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn outfit(&self) -> &OutfitState {
        &self.outfit
    }

    pub fn face_slot(&self) -> &UploadSlot<FaceVerification> {
        &self.face
    }

    pub fn clothing_slot(&self) -> &UploadSlot<ClassificationResult> {
        &self.clothing
    }

    pub fn clothing_category(&self) -> Option<ClothingCategory> {
        self.clothing_category
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// IDで選択を切り替える
    pub fn toggle(&mut self, item_id: &str) -> Result<()> {
        let item = self
            .find_item(item_id)
            .cloned()
            .ok_or_else(|| WardrobeError::ItemNotFound(item_id.to_string()))?;
        self.selection.toggle(&item);
        debug!(id = item_id, selected = self.selection.is_selected(&item), "dashboard: toggle");
        Ok(())
    }

    /// 未選択なら選択する（選択済みは変化しない）
    pub fn select(&mut self, item_id: &str) -> Result<()> {
        let selected = self
            .find_item(item_id)
            .is_some_and(|item| self.selection.is_selected(item));
        if selected {
            return Ok(());
        }
        self.toggle(item_id)
    }

    /// 生成リクエストを組み立てる（外部呼び出し前の検証）
    pub fn generation_request(&self) -> Result<GenerationRequest> {
        Ok(GenerationRequest::assemble(
            self.profile_pic(),
            &self.selection,
            self.profile.as_ref(),
        )?)
    }

    fn replace_items(&mut self, items: Vec<SavedItem>) {
        self.items = items;
        self.selection.retain_known(&self.items);
    }

    /// 衣類追加ダイアログを閉じる
    pub fn close_clothing_dialog(&mut self) {
        self.clothing.remove();
        self.clothing_category = None;
    }

    pub fn remove_face(&mut self) {
        self.face.remove();
    }
}

/// ダッシュボードのセッション
#[derive(Clone)]
pub struct DashboardSession {
    state: Rc<RefCell<Dashboard>>,
}

impl DashboardSession {
    pub fn new(owner_id: impl Into<String>, previews: PreviewRegistry) -> Self {
        Self {
            state: Rc::new(RefCell::new(Dashboard::new(owner_id, previews))),
        }
    }

    /// 保存済みアイテムとプロフィールを読み込んだセッションを作る
    pub async fn load(
        records: &dyn ProfileStore,
        owner_id: &str,
        previews: PreviewRegistry,
    ) -> Result<Self> {
        let session = Self::new(owner_id, previews);
        session.refresh(records).await?;
        Ok(session)
    }

    pub fn state(&self) -> Ref<'_, Dashboard> {
        self.state.borrow()
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut Dashboard) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    fn owner_id(&self) -> String {
        self.state.borrow().owner_id.clone()
    }

    /// 一覧とプロフィールを再取得
    pub async fn refresh(&self, records: &dyn ProfileStore) -> Result<()> {
        let owner_id = self.owner_id();
        let (items, profile) = futures::join!(
            records.list_clothing(&owner_id),
            records.load_profile(&owner_id),
        );
        let (items, profile) = (items?, profile?);
        debug!(owner = %owner_id, count = items.len(), "dashboard: loaded");

        let mut state = self.state.borrow_mut();
        state.replace_items(items);
        state.profile = profile;
        Ok(())
    }

    // =============================================
    // 顔写真
    // =============================================

    /// 顔写真をドロップして検証する
    pub async fn drop_face(&self, file: ImageFile, verifier: &dyn FaceVerifier) -> Result<bool> {
        let ticket = {
            let mut state = self.state.borrow_mut();
            let previews = state.previews.clone();
            state.face.begin(file.clone(), &previews).map_err(|rejected| match rejected {
                DropRejected::Invalid(err) => CommonError::Validation(err),
                DropRejected::Busy => CommonError::FaceSlotBusy,
            })?
        };

        let outcome = match verifier.verify_face(&file).await {
            Ok(report) => judge_face(report).map_err(|rejection| {
                warn!(%rejection, "dashboard: face rejected");
                rejection.to_string()
            }),
            Err(e) => {
                warn!(error = %e, "dashboard: face verification failed");
                Err(e.user_message(ANALYZE_FACE_FAILED))
            }
        };

        Ok(self.state.borrow_mut().face.finish(ticket, outcome))
    }

    /// 検証済みの顔写真を保存してプロフィール写真に設定する
    pub async fn save_face(
        &self,
        store: &dyn ObjectStore,
        records: &dyn ProfileStore,
    ) -> Result<ProfileRecord> {
        let owner_id = self.owner_id();
        let file = {
            let state = self.state.borrow();
            ready_file(&state.face, CommonError::FaceSlotBusy)?
        };

        let stored = store.store(&file, &owner_id, UploadKind::Profile).await?;
        let profile = records.set_profile_pic(&owner_id, &stored.url).await?;
        info!(owner = %owner_id, key = %stored.key, "dashboard: profile picture saved");

        let mut state = self.state.borrow_mut();
        state.profile = Some(profile.clone());
        state.face.remove();
        Ok(profile)
    }

    // =============================================
    // 衣類追加
    // =============================================

    /// 指定カテゴリの衣類をドロップして解析する
    pub async fn drop_clothing(
        &self,
        category: ClothingCategory,
        file: ImageFile,
        classifier: &dyn Classifier,
    ) -> Result<bool> {
        let ticket = {
            let mut state = self.state.borrow_mut();
            let previews = state.previews.clone();
            let ticket = state
                .clothing
                .begin(file.clone(), &previews)
                .map_err(|rejected| match rejected {
                    DropRejected::Invalid(err) => CommonError::Validation(err),
                    DropRejected::Busy => {
                        CommonError::SlotBusy(state.clothing_category.unwrap_or(category))
                    }
                })?;
            state.clothing_category = Some(category);
            ticket
        };

        let outcome = match classifier.classify(&file, Some(category)).await {
            Ok(report) => judge_clothing(report, Some(category)).map_err(|rejection| {
                warn!(%rejection, "dashboard: clothing rejected");
                rejection.to_string()
            }),
            Err(e) => {
                warn!(error = %e, "dashboard: classification failed");
                Err(e.user_message(ANALYZE_CLOTHING_FAILED))
            }
        };

        Ok(self.state.borrow_mut().clothing.finish(ticket, outcome))
    }

    /// 解析済みの衣類を保存し、一覧を再取得する
    pub async fn save_clothing(
        &self,
        store: &dyn ObjectStore,
        records: &dyn ProfileStore,
    ) -> Result<SavedItem> {
        let owner_id = self.owner_id();
        let (file, analysis) = {
            let state = self.state.borrow();
            let category = state
                .clothing_category
                .ok_or(ValidationError::MissingCategory)?;
            let file = ready_file(&state.clothing, CommonError::SlotBusy(category))?;
            let analysis = state
                .clothing
                .analysis()
                .cloned()
                .ok_or(ValidationError::NoFile)?;
            (file, analysis)
        };

        let stored = store
            .store(&file, &owner_id, UploadKind::Clothing(analysis.category))
            .await?;
        let record = ClothingRecord::from_analysis(&analysis, stored.url);
        let item = records.add_clothing(&owner_id, &record).await?;
        info!(owner = %owner_id, id = %item.id, "dashboard: clothing saved");

        self.state.borrow_mut().close_clothing_dialog();
        self.refresh(records).await?;
        Ok(item)
    }

    // =============================================
    // コーデ生成
    // =============================================

    /// コーデ画像を生成する
    ///
    /// 検証に失敗した場合は生成サービスを呼ばない。生成中の再実行は拒否する。
    pub async fn generate(&self, generator: &dyn OutfitGenerator) -> Result<String> {
        let request = {
            let mut state = self.state.borrow_mut();
            let request = state.generation_request()?;
            state.outfit.begin()?;
            request
        };
        debug!(items = request.item_images().len(), "dashboard: generating outfit");

        let result = generator.generate_outfit(&request).await;

        let mut state = self.state.borrow_mut();
        match result {
            Ok(outfit) => {
                state.outfit.finish(Ok(outfit.image_data_url.clone()));
                info!("dashboard: outfit generated");
                Ok(outfit.image_data_url)
            }
            Err(e) => {
                warn!(error = %e, "dashboard: generation failed");
                state.outfit.finish(Err(e.user_message(GENERATE_OUTFIT_FAILED)));
                Err(e)
            }
        }
    }

    /// 同じ選択で再生成する（直前の画像は成功するまで残る）
    pub async fn regenerate(&self, generator: &dyn OutfitGenerator) -> Result<String> {
        debug!(
            has_previous = self.state.borrow().outfit.image_data_url().is_some(),
            "dashboard: regenerate"
        );
        self.generate(generator).await
    }
}

/// 解析済みスロットのファイルを取り出す
fn ready_file<A>(slot: &UploadSlot<A>, busy: CommonError) -> Result<ImageFile> {
    match slot.state() {
        SlotState::Analyzed { file, .. } => Ok(file.clone()),
        SlotState::Analyzing { .. } => Err(busy.into()),
        SlotState::Failed { error, .. } => Err(CommonError::Rejected(error.clone()).into()),
        SlotState::Empty => Err(ValidationError::NoFile.into()),
    }
}
