//! ワードローブの型定義
//!
//! CLIと各フロントエンドで共有される型:
//! - ClothingCategory / DressingStyle: 列挙値（大文字でシリアライズ）
//! - ClassificationResult: 衣類解析の確定結果
//! - FaceVerification: 顔写真検証の確定結果
//! - ClothingRecord / SavedItem / ProfileRecord: 永続化レコード

use serde::{Deserialize, Serialize};
use std::fmt;

/// 衣類カテゴリ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClothingCategory {
    Head,
    Top,
    Bottom,
}

impl ClothingCategory {
    /// 表示順（頭 → 上 → 下）
    pub const ALL: [ClothingCategory; 3] = [Self::Head, Self::Top, Self::Bottom];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClothingCategory::Head => "HEAD",
            ClothingCategory::Top => "TOP",
            ClothingCategory::Bottom => "BOTTOM",
        }
    }

    /// ストレージキー用の小文字ディレクトリ名
    pub fn dir_name(&self) -> &'static str {
        match self {
            ClothingCategory::Head => "head",
            ClothingCategory::Top => "top",
            ClothingCategory::Bottom => "bottom",
        }
    }
}

impl fmt::Display for ClothingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl std::str::FromStr for ClothingCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "head" | "hat" => Ok(ClothingCategory::Head),
            "top" => Ok(ClothingCategory::Top),
            "bottom" => Ok(ClothingCategory::Bottom),
            _ => Err(format!("Unknown category: {}. Use head, top, or bottom", s)),
        }
    }
}

/// 服装スタイル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DressingStyle {
    #[default]
    Casual,
    Formal,
    Sporty,
    Streetwear,
    Minimalist,
}

impl DressingStyle {
    pub const ALL: [DressingStyle; 5] = [
        Self::Casual,
        Self::Formal,
        Self::Sporty,
        Self::Streetwear,
        Self::Minimalist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DressingStyle::Casual => "CASUAL",
            DressingStyle::Formal => "FORMAL",
            DressingStyle::Sporty => "SPORTY",
            DressingStyle::Streetwear => "STREETWEAR",
            DressingStyle::Minimalist => "MINIMALIST",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DressingStyle::Casual => "Casual",
            DressingStyle::Formal => "Formal",
            DressingStyle::Sporty => "Sporty",
            DressingStyle::Streetwear => "Streetwear",
            DressingStyle::Minimalist => "Minimalist",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DressingStyle::Casual => "Relaxed and comfortable everyday wear",
            DressingStyle::Formal => "Professional and polished attire",
            DressingStyle::Sporty => "Athletic and active lifestyle clothing",
            DressingStyle::Streetwear => "Urban and trendy fashion",
            DressingStyle::Minimalist => "Simple and clean aesthetic",
        }
    }
}

impl fmt::Display for DressingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 衣類解析の確定結果（スロットに載った後は不変）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub name: String,
    pub description: String,
    pub category: ClothingCategory,
    pub color: String,
    #[serde(default)]
    pub brand: Option<String>,
}

/// 顔写真の品質
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceQuality {
    Good,
    Acceptable,
    Poor,
}

/// 顔写真検証の確定結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceVerification {
    pub quality: FaceQuality,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// 保存前の衣類レコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClothingRecord {
    pub name: String,
    pub description: String,
    pub category: ClothingCategory,
    pub color: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub image_url: String,
}

impl ClothingRecord {
    pub fn from_analysis(analysis: &ClassificationResult, image_url: impl Into<String>) -> Self {
        Self {
            name: analysis.name.clone(),
            description: analysis.description.clone(),
            category: analysis.category,
            color: analysis.color.clone(),
            brand: analysis.brand.clone(),
            image_url: image_url.into(),
        }
    }
}

/// 保存済みの衣類アイテム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ClothingCategory,
    pub image_url: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    /// 作成日時（RFC3339）
    #[serde(default)]
    pub created_at: String,
}

/// 保存済みプロフィール
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub owner_id: String,
    pub height: f64,
    pub weight: f64,
    pub age: u32,
    pub dressing_style: DressingStyle,
    #[serde(default)]
    pub profile_pic: Option<String>,
}
