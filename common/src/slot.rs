//! アップロードスロット
//!
//! カテゴリごとに1枚の画像と、その非同期解析の結果を保持する状態機械。
//!
//! ```text
//! Empty ──drop──▶ Analyzing ──ok──▶ Analyzed
//!   ▲                 │
//!   │                 └──err──▶ Failed
//!   └──────── remove（どの状態からでも）
//! ```
//!
//! ドロップは同期的に `Analyzing` まで進み、`AnalysisTicket` を返す。
//! 呼び出し側はスロットを借用せずに外部解析を待ち、結果をチケット付きで `finish` に渡す。
//! 解析中の再ドロップは拒否する。削除・差し替え後に届いた古いチケットの結果は捨てる。

use crate::error::ValidationError;
use crate::image_file::ImageFile;
use crate::preview::{PreviewHandle, PreviewRegistry};
use tracing::debug;

/// 1回の解析リクエストを識別するチケット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket {
    generation: u64,
}

/// スロットの状態
#[derive(Debug, PartialEq)]
pub enum SlotState<A> {
    Empty,
    Analyzing {
        file: ImageFile,
        preview: PreviewHandle,
    },
    Analyzed {
        file: ImageFile,
        preview: PreviewHandle,
        result: A,
    },
    Failed {
        file: ImageFile,
        preview: PreviewHandle,
        error: String,
    },
}

impl<A> SlotState<A> {
    pub fn name(&self) -> &'static str {
        match self {
            SlotState::Empty => "empty",
            SlotState::Analyzing { .. } => "analyzing",
            SlotState::Analyzed { .. } => "analyzed",
            SlotState::Failed { .. } => "failed",
        }
    }
}

/// ドロップが受け付けられなかった理由
#[derive(Debug, Clone, PartialEq)]
pub enum DropRejected {
    Invalid(ValidationError),
    Busy,
}

impl From<ValidationError> for DropRejected {
    fn from(err: ValidationError) -> Self {
        DropRejected::Invalid(err)
    }
}

/// アップロードスロット本体
#[derive(Debug)]
pub struct UploadSlot<A> {
    state: SlotState<A>,
    generation: u64,
}

impl<A> Default for UploadSlot<A> {
    fn default() -> Self {
        Self {
            state: SlotState::Empty,
            generation: 0,
        }
    }
}

/// 状態だけを比較する（チケット世代は含めない）
impl<A: PartialEq> PartialEq for UploadSlot<A> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl<A> UploadSlot<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SlotState<A> {
        &self.state
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, SlotState::Empty)
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self.state, SlotState::Analyzing { .. })
    }

    pub fn file(&self) -> Option<&ImageFile> {
        match &self.state {
            SlotState::Empty => None,
            SlotState::Analyzing { file, .. }
            | SlotState::Analyzed { file, .. }
            | SlotState::Failed { file, .. } => Some(file),
        }
    }

    pub fn preview_url(&self) -> Option<&str> {
        match &self.state {
            SlotState::Empty => None,
            SlotState::Analyzing { preview, .. }
            | SlotState::Analyzed { preview, .. }
            | SlotState::Failed { preview, .. } => Some(preview.url()),
        }
    }

    pub fn analysis(&self) -> Option<&A> {
        match &self.state {
            SlotState::Analyzed { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SlotState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// ファイルをドロップして解析待ちにする
    ///
    /// 検証に失敗した場合や解析中の場合、スロットは変化しない。
    /// 解析済み・失敗状態からの差し替えでは古いプレビューを先に解放する。
    pub fn begin(
        &mut self,
        file: ImageFile,
        previews: &PreviewRegistry,
    ) -> Result<AnalysisTicket, DropRejected> {
        if self.is_analyzing() {
            return Err(DropRejected::Busy);
        }
        file.validate()?;

        self.remove();
        let preview = previews.acquire(&file);
        debug!(file = file.name(), preview = preview.url(), "slot: analyzing");
        self.state = SlotState::Analyzing { file, preview };
        Ok(AnalysisTicket {
            generation: self.generation,
        })
    }

    /// 解析結果を反映する
    ///
    /// チケットが古い（削除・差し替え済み）場合は何もせず `false` を返す。
    pub fn finish(&mut self, ticket: AnalysisTicket, outcome: Result<A, String>) -> bool {
        if ticket.generation != self.generation || !self.is_analyzing() {
            debug!("slot: stale analysis outcome discarded");
            return false;
        }

        let SlotState::Analyzing { file, preview } =
            std::mem::replace(&mut self.state, SlotState::Empty)
        else {
            return false;
        };

        self.state = match outcome {
            Ok(result) => {
                debug!(file = file.name(), "slot: analyzed");
                SlotState::Analyzed {
                    file,
                    preview,
                    result,
                }
            }
            Err(error) => {
                debug!(file = file.name(), %error, "slot: failed");
                SlotState::Failed {
                    file,
                    preview,
                    error,
                }
            }
        };
        true
    }

    /// 空に戻す（プレビューはここで解放される）
    pub fn remove(&mut self) {
        self.generation += 1;
        self.state = SlotState::Empty;
    }
}
