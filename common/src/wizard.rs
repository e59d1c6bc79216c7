//! プロフィール設定ウィザード
//!
//! ステップ位置・プロフィール項目・上下2つのアップロードスロットを1つの状態として持つ。
//! `can_advance` / `is_complete` / `progress_fraction` はキャッシュせず、毎回現在の状態から計算する。

use crate::analysis::{judge_clothing, ClothingReport};
use crate::error::{Error, Result, ValidationError};
use crate::image_file::ImageFile;
use crate::preview::PreviewRegistry;
use crate::profile::{ProfileFields, ProfileUpdate};
use crate::slot::{AnalysisTicket, DropRejected, SlotState, UploadSlot};
use crate::step::{SetupStep, StepSequencer};
use crate::types::{ClassificationResult, ClothingCategory, DressingStyle, ProfileRecord};
use tracing::{debug, warn};

/// 衣類スロット
pub type ClothingSlot = UploadSlot<ClassificationResult>;

/// ウィザードが持つスロット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardSlot {
    Top,
    Bottom,
}

impl WizardSlot {
    pub fn category(&self) -> ClothingCategory {
        match self {
            WizardSlot::Top => ClothingCategory::Top,
            WizardSlot::Bottom => ClothingCategory::Bottom,
        }
    }
}

/// 提出に必要な値を取り出したもの
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionSnapshot {
    pub height: f64,
    pub weight: f64,
    pub age: u32,
    pub dressing_style: DressingStyle,
    pub top: PendingUpload,
    pub bottom: PendingUpload,
}

impl SubmissionSnapshot {
    pub fn profile_record(&self, owner_id: &str) -> ProfileRecord {
        ProfileRecord {
            owner_id: owner_id.to_string(),
            height: self.height,
            weight: self.weight,
            age: self.age,
            dressing_style: self.dressing_style,
            profile_pic: None,
        }
    }
}

/// アップロード待ちのファイルと解析結果
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpload {
    pub file: ImageFile,
    pub analysis: ClassificationResult,
}

/// ウィザードの状態
#[derive(Debug)]
pub struct SetupWizard {
    steps: StepSequencer,
    profile: ProfileFields,
    top: ClothingSlot,
    bottom: ClothingSlot,
    previews: PreviewRegistry,
    submitting: bool,
    last_error: Option<String>,
}

impl Default for SetupWizard {
    fn default() -> Self {
        Self::new(PreviewRegistry::new())
    }
}

impl SetupWizard {
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            steps: StepSequencer::new(),
            profile: ProfileFields::default(),
            top: ClothingSlot::new(),
            bottom: ClothingSlot::new(),
            previews,
            submitting: false,
            last_error: None,
        }
    }

    // =============================================
    // ナビゲーション
    // =============================================

    pub fn current_step(&self) -> SetupStep {
        self.steps.current()
    }

    pub fn steps(&self) -> &StepSequencer {
        &self.steps
    }

    pub fn advance(&mut self) {
        self.steps.advance();
        debug!(step = ?self.steps.current(), "wizard: advance");
    }

    pub fn retreat(&mut self) {
        self.steps.retreat();
        debug!(step = ?self.steps.current(), "wizard: retreat");
    }

    pub fn can_retreat(&self) -> bool {
        self.steps.can_retreat()
    }

    /// 現在のステップから次へ進めるか
    pub fn can_advance(&self) -> bool {
        match self.steps.current() {
            SetupStep::Height => self.profile.height_valid(),
            SetupStep::Weight => self.profile.weight_valid(),
            SetupStep::Age => self.profile.age_valid(),
            SetupStep::DressingStyle => true,
            SetupStep::UploadTop => slot_ready(&self.top),
            SetupStep::UploadBottom => slot_ready(&self.bottom),
            SetupStep::Review => true,
        }
    }

    pub fn progress_fraction(&self) -> f64 {
        self.steps.progress_fraction()
    }

    // =============================================
    // プロフィール項目
    // =============================================

    pub fn profile(&self) -> &ProfileFields {
        &self.profile
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) {
        self.profile.apply(update);
    }

    pub fn set_profile(&mut self, profile: ProfileFields) {
        self.profile = profile;
    }

    // =============================================
    // スロット
    // =============================================

    pub fn slot(&self, which: WizardSlot) -> &ClothingSlot {
        match which {
            WizardSlot::Top => &self.top,
            WizardSlot::Bottom => &self.bottom,
        }
    }

    fn slot_mut(&mut self, which: WizardSlot) -> &mut ClothingSlot {
        match which {
            WizardSlot::Top => &mut self.top,
            WizardSlot::Bottom => &mut self.bottom,
        }
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// ファイルをドロップし、解析チケットを受け取る
    pub fn drop_file(&mut self, which: WizardSlot, file: ImageFile) -> Result<AnalysisTicket> {
        let previews = self.previews.clone();
        self.slot_mut(which)
            .begin(file, &previews)
            .map_err(|rejected| match rejected {
                DropRejected::Invalid(err) => Error::Validation(err),
                DropRejected::Busy => Error::SlotBusy(which.category()),
            })
    }

    /// 解析サービスの結果を反映する
    ///
    /// `Err` はサービス呼び出しの失敗メッセージ。反映されたら `true`。
    pub fn apply_report(
        &mut self,
        which: WizardSlot,
        ticket: AnalysisTicket,
        report: std::result::Result<ClothingReport, String>,
    ) -> bool {
        let outcome = report.and_then(|report| {
            judge_clothing(report, Some(which.category())).map_err(|rejection| {
                warn!(slot = ?which, %rejection, "clothing rejected");
                rejection.to_string()
            })
        });
        self.slot_mut(which).finish(ticket, outcome)
    }

    pub fn remove_file(&mut self, which: WizardSlot) {
        self.slot_mut(which).remove();
    }

    // =============================================
    // 完了判定と提出
    // =============================================

    /// 提出可能な状態か
    pub fn is_complete(&self) -> bool {
        self.profile.is_complete() && slot_complete(&self.top) && slot_complete(&self.bottom)
    }

    /// 提出用の値を取り出す
    ///
    /// 構造的な不整合（スロットに別カテゴリの結果が載っている等）があれば
    /// ウィザード全体を初期化して `StateCorrupted` を返す。
    pub fn prepare_submission(&mut self) -> Result<SubmissionSnapshot> {
        if let Some(problem) = self.structural_problem() {
            warn!(%problem, "wizard: state corrupted, resetting");
            self.reset();
            return Err(Error::StateCorrupted(problem));
        }

        if !self.is_complete() {
            return Err(ValidationError::Incomplete.into());
        }

        let snapshot = (|| {
            Some(SubmissionSnapshot {
                height: self.profile.height?,
                weight: self.profile.weight?,
                age: self.profile.age?,
                dressing_style: self.profile.dressing_style,
                top: pending_upload(&self.top)?,
                bottom: pending_upload(&self.bottom)?,
            })
        })();

        match snapshot {
            Some(snapshot) => Ok(snapshot),
            None => {
                self.reset();
                Err(Error::StateCorrupted("required data missing".into()))
            }
        }
    }

    fn structural_problem(&self) -> Option<String> {
        [WizardSlot::Top, WizardSlot::Bottom]
            .into_iter()
            .find_map(|which| {
                let analysis = self.slot(which).analysis()?;
                (analysis.category != which.category()).then(|| {
                    format!(
                        "{} slot holds a {} item",
                        which.category(),
                        analysis.category
                    )
                })
            })
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_last_error(&mut self, error: Option<String>) {
        self.last_error = error;
    }

    /// 初期状態に戻す（スロットのプレビューも解放される）
    pub fn reset(&mut self) {
        self.steps.reset();
        self.profile = ProfileFields::default();
        self.top.remove();
        self.bottom.remove();
        self.submitting = false;
        self.last_error = None;
    }

    #[cfg(test)]
    fn force_slot_result(&mut self, which: WizardSlot, file: ImageFile, result: ClassificationResult) {
        let previews = self.previews.clone();
        let slot = self.slot_mut(which);
        slot.remove();
        if let Ok(ticket) = slot.begin(file, &previews) {
            slot.finish(ticket, Ok(result));
        }
    }
}

fn slot_ready(slot: &ClothingSlot) -> bool {
    slot.analysis().is_some() && !slot.is_analyzing()
}

fn slot_complete(slot: &ClothingSlot) -> bool {
    matches!(slot.state(), SlotState::Analyzed { .. })
}

fn pending_upload(slot: &ClothingSlot) -> Option<PendingUpload> {
    match slot.state() {
        SlotState::Analyzed { file, result, .. } => Some(PendingUpload {
            file: file.clone(),
            analysis: result.clone(),
        }),
        _ => None,
    }
}
