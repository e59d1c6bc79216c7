//! ウィザードのステップ順序
//!
//! `StepSequencer` は位置を持つだけで、遷移の可否は判定しない。
//! `advance` は常に1つ進む（端では何もしない）。進めてよいかは
//! `SetupWizard::can_advance` を見た呼び出し側が決める。

use serde::{Deserialize, Serialize};

/// ウィザードのステップ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SetupStep {
    Height,
    Weight,
    Age,
    DressingStyle,
    UploadTop,
    UploadBottom,
    Review,
}

/// ステップの固定順序
pub const STEP_ORDER: [SetupStep; 7] = [
    SetupStep::Height,
    SetupStep::Weight,
    SetupStep::Age,
    SetupStep::DressingStyle,
    SetupStep::UploadTop,
    SetupStep::UploadBottom,
    SetupStep::Review,
];

impl SetupStep {
    pub fn index(&self) -> usize {
        match self {
            SetupStep::Height => 0,
            SetupStep::Weight => 1,
            SetupStep::Age => 2,
            SetupStep::DressingStyle => 3,
            SetupStep::UploadTop => 4,
            SetupStep::UploadBottom => 5,
            SetupStep::Review => 6,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SetupStep::Height => "What's your height?",
            SetupStep::Weight => "What's your weight?",
            SetupStep::Age => "How old are you?",
            SetupStep::DressingStyle => "What's your style?",
            SetupStep::UploadTop => "Upload a Top",
            SetupStep::UploadBottom => "Upload a Bottom",
            SetupStep::Review => "Review your profile",
        }
    }
}

/// 現在位置のトラッカー
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSequencer {
    index: usize,
}

impl StepSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SetupStep {
        STEP_ORDER[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index == STEP_ORDER.len() - 1
    }

    /// 次へ（最後のステップでは何もしない）
    pub fn advance(&mut self) {
        if !self.is_last() {
            self.index += 1;
        }
    }

    /// 前へ（最初のステップでは何もしない）
    pub fn retreat(&mut self) {
        if !self.is_first() {
            self.index -= 1;
        }
    }

    pub fn can_retreat(&self) -> bool {
        !self.is_first()
    }

    /// (index + 1) / 総数。(0, 1] の範囲
    pub fn progress_fraction(&self) -> f64 {
        (self.index + 1) as f64 / STEP_ORDER.len() as f64
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress_fraction() * 100.0
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order_matches_index() {
        for (i, step) in STEP_ORDER.iter().enumerate() {
            assert_eq!(step.index(), i);
        }
    }

    #[test]
    fn test_starts_at_height() {
        let seq = StepSequencer::new();
        assert_eq!(seq.current(), SetupStep::Height);
        assert!(!seq.can_retreat());
    }

    #[test]
    fn test_advance_stops_at_end() {
        let mut seq = StepSequencer::new();
        for _ in 0..20 {
            seq.advance();
        }
        assert_eq!(seq.current(), SetupStep::Review);
        assert!(seq.is_last());
    }

    #[test]
    fn test_retreat_stops_at_start() {
        let mut seq = StepSequencer::new();
        seq.retreat();
        assert_eq!(seq.current(), SetupStep::Height);
    }

    #[test]
    fn test_round_trip_from_every_position() {
        for start in 0..STEP_ORDER.len() {
            let mut seq = StepSequencer::new();
            for _ in 0..start {
                seq.advance();
            }
            let original = seq;

            if seq.can_retreat() {
                seq.retreat();
                seq.advance();
                assert_eq!(seq, original);
            }
            if !seq.is_last() {
                seq.advance();
                seq.retreat();
                assert_eq!(seq, original);
            }
        }
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut seq = StepSequencer::new();
        let mut last = 0.0;
        for _ in 0..STEP_ORDER.len() {
            let p = seq.progress_fraction();
            assert!(p > last && p <= 1.0);
            last = p;
            seq.advance();
        }
        assert_eq!(seq.progress_fraction(), 1.0);
        assert!((StepSequencer::new().progress_percent() - 100.0 / 7.0).abs() < 1e-9);
    }
}
