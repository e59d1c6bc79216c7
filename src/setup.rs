//! プロフィール設定セッション
//!
//! `SetupWizard`（純粋な状態）を共有し、解析・アップロード・保存の
//! 非同期呼び出しを駆動する。`RefCell` の借用は `.await` をまたがない。

use crate::error::{Result, WardrobeError, ANALYZE_CLOTHING_FAILED, SAVE_PROFILE_FAILED};
use crate::input::load_image;
use crate::progress::spinner;
use crate::services::{Classifier, ObjectStore, ProfileStore, StoredObject, UploadKind};
use dialoguer::{Confirm, Input, Select};
use std::cell::{Ref, RefCell};
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;
use tracing::{debug, info, warn};
use wardrobe_common::{
    check_range, ClothingCategory, ClothingRecord, DressingStyle, Error as CommonError, ImageFile,
    PreviewRegistry, ProfileRecord, ProfileUpdate, SetupStep, SetupWizard, SlotState,
    SubmissionSnapshot, WizardSlot, AGE_RANGE, HEIGHT_RANGE, WEIGHT_RANGE,
};

/// 提出成功時の控え
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub profile: ProfileRecord,
    pub top: ClothingRecord,
    pub bottom: ClothingRecord,
}

/// ウィザードのセッション
#[derive(Clone, Default)]
pub struct SetupSession {
    wizard: Rc<RefCell<SetupWizard>>,
}

/// 提出中フラグを必ず下ろす
struct SubmittingGuard<'a> {
    wizard: &'a RefCell<SetupWizard>,
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        match self.wizard.try_borrow_mut() {
            Ok(mut wizard) => wizard.set_submitting(false),
            Err(_) => warn!("setup: wizard still borrowed, submitting flag left set"),
        }
    }
}

impl SetupSession {
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            wizard: Rc::new(RefCell::new(SetupWizard::new(previews))),
        }
    }

    /// 現在の状態を読む（借用は `.await` の前に手放すこと）
    pub fn wizard(&self) -> Ref<'_, SetupWizard> {
        self.wizard.borrow()
    }

    /// 同期的な状態変更
    pub fn update<R>(&self, f: impl FnOnce(&mut SetupWizard) -> R) -> R {
        f(&mut self.wizard.borrow_mut())
    }

    /// ファイルをドロップして解析する
    ///
    /// 検証エラー・解析中は即座に `Err`。解析の成否はスロットに記録され、
    /// 結果が反映されたら `Ok(true)`（削除・差し替え済みなら `Ok(false)`）。
    pub async fn drop_file(
        &self,
        which: WizardSlot,
        file: ImageFile,
        classifier: &dyn Classifier,
    ) -> Result<bool> {
        let ticket = self.wizard.borrow_mut().drop_file(which, file.clone())?;

        let report = classifier
            .classify(&file, Some(which.category()))
            .await
            .map_err(|e| {
                warn!(slot = ?which, error = %e, "setup: classification failed");
                e.user_message(ANALYZE_CLOTHING_FAILED)
            });

        let applied = self.wizard.borrow_mut().apply_report(which, ticket, report);
        debug!(slot = ?which, applied, "setup: analysis finished");
        Ok(applied)
    }

    /// プロフィールと上下の衣類を保存する
    ///
    /// 上下の画像を同時にアップロードし、両方成功した場合のみ1回の保存を行う。
    /// 失敗してもウィザードの入力は残り、再提出では両方を再アップロードする。
    /// 呼び出し中に `wizard()` の借用を保持しないこと（提出中フラグが下りなくなる）。
    pub async fn submit(
        &self,
        store: &dyn ObjectStore,
        records: &dyn ProfileStore,
        owner_id: &str,
    ) -> Result<SubmissionReceipt> {
        let snapshot = {
            let mut wizard = self.wizard.borrow_mut();
            if wizard.is_submitting() {
                return Err(CommonError::SubmissionInProgress.into());
            }
            match wizard.prepare_submission() {
                Ok(snapshot) => {
                    wizard.set_submitting(true);
                    wizard.set_last_error(None);
                    snapshot
                }
                Err(e) => {
                    wizard.set_last_error(Some(e.to_string()));
                    return Err(e.into());
                }
            }
        };

        let guard = SubmittingGuard {
            wizard: &self.wizard,
        };
        let result = upload_and_persist(snapshot, store, records, owner_id).await;
        drop(guard);

        if let Err(e) = &result {
            warn!(error = %e, "setup: submission failed");
            let message = match e {
                WardrobeError::Storage(msg) => msg.clone(),
                other => other.user_message(SAVE_PROFILE_FAILED),
            };
            self.wizard.borrow_mut().set_last_error(Some(message));
        }
        result
    }
}

async fn upload_and_persist(
    snapshot: SubmissionSnapshot,
    store: &dyn ObjectStore,
    records: &dyn ProfileStore,
    owner_id: &str,
) -> Result<SubmissionReceipt> {
    let (top, bottom) = futures::join!(
        upload(store, &snapshot.top.file, owner_id, ClothingCategory::Top),
        upload(store, &snapshot.bottom.file, owner_id, ClothingCategory::Bottom),
    );
    // 上の失敗を先に報告
    let top = top?;
    let bottom = bottom?;

    let profile = snapshot.profile_record(owner_id);
    let top = ClothingRecord::from_analysis(&snapshot.top.analysis, top.url);
    let bottom = ClothingRecord::from_analysis(&snapshot.bottom.analysis, bottom.url);

    records
        .save_profile_and_clothing(&profile, &top, &bottom)
        .await?;
    info!(owner = owner_id, "setup: profile saved");

    Ok(SubmissionReceipt {
        profile,
        top,
        bottom,
    })
}

async fn upload(
    store: &dyn ObjectStore,
    file: &ImageFile,
    owner_id: &str,
    category: ClothingCategory,
) -> Result<StoredObject> {
    store
        .store(file, owner_id, UploadKind::Clothing(category))
        .await
        .map_err(|e| {
            warn!(%category, error = %e, "setup: upload failed");
            match e {
                WardrobeError::Storage(_) => WardrobeError::Storage(format!(
                    "Failed to upload {} image. Please try again.",
                    category
                )),
                other => other,
            }
        })
}

// =============================================
// 対話モード
// =============================================

const BACK: &str = "<";

fn prompt_text(prompt: &str, initial: Option<String>) -> Result<String> {
    let mut input = Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true);
    if let Some(initial) = initial {
        input = input.with_initial_text(initial);
    }
    input
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(|e| WardrobeError::Prompt(e.to_string()))
}

/// 入力ステップの結果
#[derive(Debug, PartialEq)]
enum StepInput<T> {
    Back,
    /// 入力誤り。現在の値を変えない
    Keep,
    Value(Option<T>),
}

fn prompt_number<T>(
    field: &'static str,
    unit: &str,
    range: &RangeInclusive<T>,
    current: Option<T>,
) -> Result<StepInput<T>>
where
    T: FromStr + PartialOrd + Display,
{
    let prompt = format!("{} ({}{}-{})", field, unit, range.start(), range.end());
    let text = prompt_text(&prompt, current.map(|v| v.to_string()))?;
    Ok(parse_number_input(field, &text, range))
}

/// 数値入力を解釈する（空欄は未入力、`<` は戻る）
fn parse_number_input<T>(field: &'static str, text: &str, range: &RangeInclusive<T>) -> StepInput<T>
where
    T: FromStr + PartialOrd + Display,
{
    if text == BACK {
        return StepInput::Back;
    }
    if text.is_empty() {
        return StepInput::Value(None);
    }
    let Ok(value) = text.parse::<T>() else {
        println!("  Please enter a number.");
        return StepInput::Keep;
    };
    match check_range(field, value, range) {
        Ok(value) => StepInput::Value(Some(value)),
        Err(e) => {
            println!("  {}", e);
            StepInput::Keep
        }
    }
}

fn print_progress(wizard: &SetupWizard) {
    let step = wizard.current_step();
    println!(
        "\n[{}/7] {} ({:.0}%)",
        step.index() + 1,
        step.title(),
        wizard.progress_fraction() * 100.0
    );
}

fn print_slot(wizard: &SetupWizard, which: WizardSlot) {
    match wizard.slot(which).state() {
        SlotState::Empty => println!("  (no image)"),
        SlotState::Analyzing { file, .. } => println!("  {} - analyzing...", file.name()),
        SlotState::Analyzed { file, result, .. } => {
            println!("  ✔ {} - {} ({})", file.name(), result.name, result.color);
            if let Some(brand) = &result.brand {
                println!("    brand: {}", brand);
            }
        }
        SlotState::Failed { file, error, .. } => println!("  ✖ {} - {}", file.name(), error),
    }
}

fn print_review(wizard: &SetupWizard) {
    let profile = wizard.profile();
    let fmt = |v: Option<String>| v.unwrap_or_else(|| "-".into());
    println!("  Height: {} cm", fmt(profile.height.map(|v| v.to_string())));
    println!("  Weight: {} kg", fmt(profile.weight.map(|v| v.to_string())));
    println!("  Age:    {}", fmt(profile.age.map(|v| v.to_string())));
    println!("  Style:  {}", profile.dressing_style.label());
    println!("  Top:");
    print_slot(wizard, WizardSlot::Top);
    println!("  Bottom:");
    print_slot(wizard, WizardSlot::Bottom);
}

/// 対話形式でウィザードを進め、提出まで行う
///
/// 各入力で `<` を入力すると前のステップに戻る。
pub async fn run_interactive(
    session: &SetupSession,
    classifier: &dyn Classifier,
    store: &dyn ObjectStore,
    records: &dyn ProfileStore,
    owner_id: &str,
) -> Result<Option<SubmissionReceipt>> {
    println!("Let's set up your profile. Enter '{}' to go back.", BACK);

    loop {
        print_progress(&session.wizard());
        let step = session.wizard().current_step();

        let back = match step {
            SetupStep::Height => {
                let current = session.wizard().profile().height;
                match prompt_number("Height", "cm, ", &HEIGHT_RANGE, current)? {
                    StepInput::Back => true,
                    StepInput::Keep => continue,
                    StepInput::Value(v) => {
                        session.update(|w| w.update_profile(ProfileUpdate::height(v)));
                        false
                    }
                }
            }
            SetupStep::Weight => {
                let current = session.wizard().profile().weight;
                match prompt_number("Weight", "kg, ", &WEIGHT_RANGE, current)? {
                    StepInput::Back => true,
                    StepInput::Keep => continue,
                    StepInput::Value(v) => {
                        session.update(|w| w.update_profile(ProfileUpdate::weight(v)));
                        false
                    }
                }
            }
            SetupStep::Age => {
                let current = session.wizard().profile().age;
                match prompt_number("Age", "", &AGE_RANGE, current)? {
                    StepInput::Back => true,
                    StepInput::Keep => continue,
                    StepInput::Value(v) => {
                        session.update(|w| w.update_profile(ProfileUpdate::age(v)));
                        false
                    }
                }
            }
            SetupStep::DressingStyle => {
                let mut items: Vec<String> = DressingStyle::ALL
                    .iter()
                    .map(|s| format!("{} - {}", s.label(), s.description()))
                    .collect();
                items.push("< Back".into());
                let current = session.wizard().profile().dressing_style;
                let default = DressingStyle::ALL
                    .iter()
                    .position(|s| *s == current)
                    .unwrap_or(0);
                let choice = Select::new()
                    .with_prompt("Choose a style")
                    .items(&items)
                    .default(default)
                    .interact()
                    .map_err(|e| WardrobeError::Prompt(e.to_string()))?;
                match DressingStyle::ALL.get(choice) {
                    Some(style) => {
                        session.update(|w| w.update_profile(ProfileUpdate::dressing_style(*style)));
                        false
                    }
                    None => true,
                }
            }
            SetupStep::UploadTop | SetupStep::UploadBottom => {
                let which = if step == SetupStep::UploadTop {
                    WizardSlot::Top
                } else {
                    WizardSlot::Bottom
                };
                print_slot(&session.wizard(), which);
                let text = prompt_text("Image path (empty to keep, 'x' to remove)", None)?;
                match text.as_str() {
                    BACK => true,
                    "" => false,
                    "x" => {
                        session.update(|w| w.remove_file(which));
                        false
                    }
                    path => {
                        match load_image(Path::new(path)).await {
                            Ok(file) => {
                                let pb = spinner("Analyzing...");
                                let outcome = session.drop_file(which, file, classifier).await;
                                pb.finish_and_clear();
                                if let Err(e) = outcome {
                                    println!("  ✖ {}", e);
                                }
                                print_slot(&session.wizard(), which);
                            }
                            Err(e) => println!("  ✖ {}", e),
                        }
                        false
                    }
                }
            }
            SetupStep::Review => {
                print_review(&session.wizard());
                if !session.wizard().is_complete() {
                    println!("  Please complete all steps before submitting");
                }
                let submit = Confirm::new()
                    .with_prompt("Submit your profile?")
                    .default(true)
                    .interact()
                    .map_err(|e| WardrobeError::Prompt(e.to_string()))?;
                if !submit {
                    let quit = Confirm::new()
                        .with_prompt("Quit without saving?")
                        .default(false)
                        .interact()
                        .map_err(|e| WardrobeError::Prompt(e.to_string()))?;
                    if quit {
                        return Ok(None);
                    }
                    true
                } else {
                    let pb = spinner("Saving your profile...");
                    let result = session.submit(store, records, owner_id).await;
                    pb.finish_and_clear();
                    match result {
                        Ok(receipt) => return Ok(Some(receipt)),
                        Err(e) => {
                            let message = session
                                .wizard()
                                .last_error()
                                .map(str::to_string)
                                .unwrap_or_else(|| e.to_string());
                            println!("  ✖ {}", message);
                            false
                        }
                    }
                }
            }
        };

        if back {
            session.update(|w| w.retreat());
            continue;
        }

        // Review以外は条件を満たしたときだけ進む
        if step != SetupStep::Review {
            let can_advance = session.wizard().can_advance();
            if can_advance {
                session.update(|w| w.advance());
            } else {
                println!("  Please provide a valid value to continue.");
            }
        }
    }
}
