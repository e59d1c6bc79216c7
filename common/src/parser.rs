//! APIレスポンスパーサー
//!
//! 解析サービスのテキスト応答からJSONを抽出し、
//! 衣類レポート・顔レポートにパースする

use crate::analysis::{ClothingReport, FaceReport};
use crate::error::{Error, Result};

/// APIレスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクト
/// 3. エラー
///
/// # Examples
/// ```
/// use wardrobe_common::extract_json;
///
/// let response = "Sure! {\"isFace\": true}";
/// let json = extract_json(response).unwrap();
/// assert_eq!(json, "{\"isFace\": true}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + "```json".len();
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("JSON object not found".into()))
}

/// 衣類解析レスポンスをパース
pub fn parse_clothing_response(response: &str) -> Result<ClothingReport> {
    let json_str = extract_json(response)?;
    serde_json::from_str(json_str.trim())
        .map_err(|e| Error::Parse(format!("clothing analysis: {}", e)))
}

/// 顔検証レスポンスをパース
pub fn parse_face_response(response: &str) -> Result<FaceReport> {
    let json_str = extract_json(response)?;
    serde_json::from_str(json_str.trim()).map_err(|e| Error::Parse(format!("face analysis: {}", e)))
}
