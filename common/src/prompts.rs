//! プロンプト生成モジュール
//!
//! 解析・生成サービスに渡すプロンプト:
//! - build_clothing_prompt: 衣類解析（期待カテゴリ付き）
//! - build_face_prompt: プロフィール写真の検証
//! - build_outfit_prompt: コーデ画像生成

use crate::generation::GenerationRequest;
use crate::types::ClothingCategory;

/// 衣類解析プロンプト生成
///
/// # Arguments
/// * `expected` - ユーザーが期待しているカテゴリ（ヒントとして伝えるのみ。判定は受信側）
pub fn build_clothing_prompt(expected: Option<ClothingCategory>) -> String {
    let hint = expected
        .map(|c| format!(" The user expects this to be a {} item.", c.as_str()))
        .unwrap_or_default();

    format!(
        r#"Analyze this image and determine if it contains a clothing item. If it does, provide details about the clothing including its name, description, category (HEAD for hats/caps/beanies, TOP for shirts/jackets/hoodies/sweaters, BOTTOM for pants/shorts/skirts), color, and brand if visible. If the image does not contain a clear clothing item, set isClothing to false.{hint}

Respond with ONLY a JSON object in exactly this shape:
{{
  "isClothing": true/false,
  "name": "Short name, e.g. 'Black Hoodie', 'Blue Jeans'",
  "description": "Brief description of the clothing item",
  "category": "HEAD" | "TOP" | "BOTTOM",
  "color": "Primary color",
  "brand": "Brand name if visible, otherwise null"
}}"#
    )
}

/// 顔写真検証プロンプト生成
pub fn build_face_prompt() -> String {
    r#"Analyze this image to verify it's suitable for a profile picture. Check if:
1. It contains a clear human face
2. The face is centered and visible
3. The quality is good (not blurry, well-lit, not too dark)
4. There's only one face in the image
5. The face is not obscured

Respond with ONLY a JSON object in exactly this shape:
{
  "isFace": true/false,
  "quality": "good" | "acceptable" | "poor",
  "issues": ["blurry", "too dark", "multiple faces", "face not centered", ...]
}"#
    .to_string()
}

/// コーデ画像生成プロンプト
///
/// 画像は「顔写真 → 選択アイテム（頭 → 上 → 下）」の順で添付する前提。
pub fn build_outfit_prompt(request: &GenerationRequest) -> String {
    let p = &request.personalization;
    let mut user_info = Vec::new();
    if let Some(height) = p.height {
        user_info.push(format!("{}cm tall", height));
    }
    if let Some(weight) = p.weight {
        user_info.push(format!("{}kg", weight));
    }
    if let Some(age) = p.age {
        user_info.push(format!("{} years old", age));
    }
    if let Some(style) = p.dressing_style {
        user_info.push(format!("prefers {} style", style.as_str()));
    }
    let user_context = if user_info.is_empty() {
        String::new()
    } else {
        format!(" The person is {}.", user_info.join(", "))
    };

    let clothing = request
        .item_images()
        .into_iter()
        .map(|(category, _)| match category {
            ClothingCategory::Head => "the hat/headwear",
            ClothingCategory::Top => "the top/shirt",
            ClothingCategory::Bottom => "the pants/bottom",
        })
        .collect::<Vec<_>>()
        .join(" and ");

    format!(
        r#"Generate a full-body fashion photo of this person wearing {clothing} from the reference images.{user_context}

The first image is the person's face - maintain their exact facial features.
The following images are clothing items to dress them in.
Create a natural, realistic fashion photo with professional lighting."#
    )
}
