//! 解析レポートの判定
//!
//! 外部の解析サービスは「呼び出し自体は成功したが画像が不適合」という結果を返しうる。
//! ここでレポートを確定結果か却下理由（`Rejection`）に振り分ける。

use crate::types::{ClassificationResult, ClothingCategory, FaceQuality, FaceVerification};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 衣類解析サービスの生レポート
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClothingReport {
    pub is_clothing: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ClothingCategory,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub brand: Option<String>,
}

/// 顔写真検証サービスの生レポート
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceReport {
    pub is_face: bool,
    pub quality: FaceQuality,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// 却下理由
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    NotClothing,
    CategoryMismatch {
        detected: ClothingCategory,
        expected: ClothingCategory,
    },
    NoFace,
    PoorQuality { issues: Vec<String> },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotClothing => write!(
                f,
                "This doesn't appear to be a clothing item. Please upload a clear image of clothing."
            ),
            Rejection::CategoryMismatch { detected, expected } => write!(
                f,
                "This appears to be a {} item, but we need a {} item. Please upload the correct type of clothing.",
                detected, expected
            ),
            Rejection::NoFace => write!(
                f,
                "This doesn't appear to contain a clear face. Please upload a photo of yourself."
            ),
            Rejection::PoorQuality { issues } => write!(
                f,
                "Photo quality is too low. Issues: {}. Please upload a clearer photo.",
                issues.join(", ")
            ),
        }
    }
}

impl std::error::Error for Rejection {}

/// 衣類レポートを判定
///
/// `expected` が指定されていればカテゴリ一致も確認する。
pub fn judge_clothing(
    report: ClothingReport,
    expected: Option<ClothingCategory>,
) -> Result<ClassificationResult, Rejection> {
    if !report.is_clothing {
        return Err(Rejection::NotClothing);
    }

    if let Some(expected) = expected {
        if report.category != expected {
            return Err(Rejection::CategoryMismatch {
                detected: report.category,
                expected,
            });
        }
    }

    Ok(ClassificationResult {
        name: report.name,
        description: report.description,
        category: report.category,
        color: report.color,
        brand: report.brand.filter(|b| !b.trim().is_empty()),
    })
}

/// 顔レポートを判定（品質 poor は呼び出し成功でも却下）
pub fn judge_face(report: FaceReport) -> Result<FaceVerification, Rejection> {
    if !report.is_face {
        return Err(Rejection::NoFace);
    }
    if report.quality == FaceQuality::Poor {
        return Err(Rejection::PoorQuality {
            issues: report.issues,
        });
    }
    Ok(FaceVerification {
        quality: report.quality,
        issues: report.issues,
    })
}
