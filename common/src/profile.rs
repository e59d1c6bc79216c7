//! プロフィール項目（身長・体重・年齢・服装スタイル）

use crate::error::ValidationError;
use crate::types::DressingStyle;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::RangeInclusive;

/// セッション中のプロフィール入力
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub age: Option<u32>,
    #[serde(default)]
    pub dressing_style: DressingStyle,
}

/// 部分更新（`None` の項目は変更しない）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub height: Option<Option<f64>>,
    pub weight: Option<Option<f64>>,
    pub age: Option<Option<u32>>,
    pub dressing_style: Option<DressingStyle>,
}

impl ProfileUpdate {
    pub fn height(value: Option<f64>) -> Self {
        Self {
            height: Some(value),
            ..Default::default()
        }
    }

    pub fn weight(value: Option<f64>) -> Self {
        Self {
            weight: Some(value),
            ..Default::default()
        }
    }

    pub fn age(value: Option<u32>) -> Self {
        Self {
            age: Some(value),
            ..Default::default()
        }
    }

    pub fn dressing_style(style: DressingStyle) -> Self {
        Self {
            dressing_style: Some(style),
            ..Default::default()
        }
    }
}

impl ProfileFields {
    /// 部分更新を適用
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(height) = update.height {
            self.height = height;
        }
        if let Some(weight) = update.weight {
            self.weight = weight;
        }
        if let Some(age) = update.age {
            self.age = age;
        }
        if let Some(style) = update.dressing_style {
            self.dressing_style = style;
        }
    }

    pub fn height_valid(&self) -> bool {
        is_positive(self.height)
    }

    pub fn weight_valid(&self) -> bool {
        is_positive(self.weight)
    }

    pub fn age_valid(&self) -> bool {
        self.age.is_some_and(|age| age > 0)
    }

    /// 全項目が揃っているか（スタイルは常に有効）
    pub fn is_complete(&self) -> bool {
        self.height_valid() && self.weight_valid() && self.age_valid()
    }
}

fn is_positive(value: Option<f64>) -> bool {
    value.is_some_and(|v| v.is_finite() && v > 0.0)
}

/// 入力フォームの目安範囲（cm）
pub const HEIGHT_RANGE: RangeInclusive<f64> = 50.0..=250.0;
/// 入力フォームの目安範囲（kg）
pub const WEIGHT_RANGE: RangeInclusive<f64> = 20.0..=300.0;
/// 入力フォームの目安範囲（歳）
pub const AGE_RANGE: RangeInclusive<u32> = 13..=120;

/// 入力値がフォームの範囲内か確認する
///
/// `can_advance` は正の値かどうかしか見ないので、範囲はここで入力時に弾く。
pub fn check_range<T: PartialOrd + Display>(
    field: &'static str,
    value: T,
    range: &RangeInclusive<T>,
) -> Result<T, ValidationError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min: range.start().to_string(),
            max: range.end().to_string(),
        })
    }
}
