//! コーデ画像生成リクエストの組み立て
//!
//! プロフィール写真と選択アイテムの参照を1つのリクエストにまとめる。
//! 検証はここで済ませ、外部サービスには不正なリクエストを送らない。

use crate::error::{Error, Result, ValidationError};
use crate::selection::SelectionSet;
use crate::types::{ClothingCategory, DressingStyle, ProfileRecord};
use serde::{Deserialize, Serialize};

/// 生成時の補足情報
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personalization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dressing_style: Option<DressingStyle>,
}

impl From<&ProfileRecord> for Personalization {
    fn from(profile: &ProfileRecord) -> Self {
        Self {
            height: Some(profile.height),
            weight: Some(profile.weight),
            age: Some(profile.age),
            dressing_style: Some(profile.dressing_style),
        }
    }
}

/// 生成リクエスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub profile_pic_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom_image_url: Option<String>,
    #[serde(flatten)]
    pub personalization: Personalization,
}

impl GenerationRequest {
    /// 選択状態とプロフィールから組み立てる
    ///
    /// プロフィール写真 → アイテム選択 の順に検証する。
    pub fn assemble(
        profile_pic_url: Option<&str>,
        selection: &SelectionSet,
        profile: Option<&ProfileRecord>,
    ) -> std::result::Result<Self, ValidationError> {
        let profile_pic_url = profile_pic_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ValidationError::NoProfilePicture)?;

        if selection.is_empty() {
            return Err(ValidationError::NoItemsSelected);
        }

        let image = |category| selection.get(category).map(|item| item.image_url.clone());

        Ok(Self {
            profile_pic_url: profile_pic_url.to_string(),
            head_image_url: image(ClothingCategory::Head),
            top_image_url: image(ClothingCategory::Top),
            bottom_image_url: image(ClothingCategory::Bottom),
            personalization: profile.map(Personalization::from).unwrap_or_default(),
        })
    }

    /// カテゴリと画像参照の組（頭 → 上 → 下）
    pub fn item_images(&self) -> Vec<(ClothingCategory, &str)> {
        [
            (ClothingCategory::Head, &self.head_image_url),
            (ClothingCategory::Top, &self.top_image_url),
            (ClothingCategory::Bottom, &self.bottom_image_url),
        ]
        .into_iter()
        .filter_map(|(category, url)| url.as_deref().map(|url| (category, url)))
        .collect()
    }
}

/// 生成処理の状態（同時に1件まで）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutfitState {
    generating: bool,
    image_data_url: Option<String>,
    error: Option<String>,
}

impl OutfitState {
    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn image_data_url(&self) -> Option<&str> {
        self.image_data_url.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 生成開始。実行中なら拒否する（キューには積まない）
    pub fn begin(&mut self) -> Result<()> {
        if self.generating {
            return Err(Error::GenerationInProgress);
        }
        self.generating = true;
        self.error = None;
        Ok(())
    }

    /// 結果を反映。失敗時は直前の画像を残す
    pub fn finish(&mut self, outcome: std::result::Result<String, String>) {
        self.generating = false;
        match outcome {
            Ok(image) => {
                self.image_data_url = Some(image);
                self.error = None;
            }
            Err(error) => self.error = Some(error),
        }
    }
}
