//! Gemini API連携
//!
//! 衣類解析・顔検証はJSON応答、コーデ生成は画像応答で呼び出す。

use super::{Classifier, FaceVerifier, GeneratedOutfit, OutfitGenerator};
use crate::config::Config;
use crate::error::{Result, WardrobeError};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use wardrobe_common::{
    build_clothing_prompt, build_face_prompt, build_outfit_prompt, parse_clothing_response,
    parse_face_response, ClothingCategory, ClothingReport, FaceReport, GenerationRequest,
    ImageFile,
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize, Default)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(rename = "responseModalities", skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

impl GenerationConfig {
    fn json() -> Self {
        Self {
            temperature: Some(0.1),
            response_mime_type: Some("application/json".into()),
            ..Default::default()
        }
    }

    fn image() -> Self {
        Self {
            response_modalities: Some(vec!["IMAGE".into(), "TEXT".into()]),
            ..Default::default()
        }
    }
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "inlineData", alias = "inline_data", default)]
    inline_data: Option<ResponseInlineData>,
}

#[derive(Deserialize)]
struct ResponseInlineData {
    #[serde(rename = "mimeType", alias = "mime_type", default)]
    mime_type: Option<String>,
    data: String,
}

impl GeminiResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    /// テキスト部分を連結
    fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        (!text.is_empty()).then_some(text)
    }

    /// 最初の画像部分をData URLにする
    fn image_data_url(&self) -> Option<String> {
        self.parts().find_map(|p| {
            p.inline_data.as_ref().map(|img| {
                let mime = img.mime_type.as_deref().unwrap_or("image/png");
                format!("data:{};base64,{}", mime, img.data)
            })
        })
    }
}

/// Gemini APIクライアント
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    classify_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        classify_model: impl Into<String>,
        image_model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            classify_model: classify_model.into(),
            image_model: image_model.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.get_api_key()?,
            config.classify_model.clone(),
            config.image_model.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Gemini API呼び出し（共通処理）
    async fn call_gemini_api(&self, model: &str, request: &GeminiRequest) -> Result<GeminiResponse> {
        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, model);
        debug!(model, "gemini: request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!(model, "gemini: rate limited");
            return Err(WardrobeError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(model, %status, "gemini: request failed");
            return Err(WardrobeError::ApiCall(format!("API error {}: {}", status, body)));
        }

        Ok(response.json().await?)
    }

    /// プロンプト + 1枚の画像でJSON応答を得る
    async fn ask_json(&self, prompt: String, file: &ImageFile) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part::Text { text: prompt }, inline_part(file)],
            }],
            generation_config: GenerationConfig::json(),
        };

        let response = self.call_gemini_api(&self.classify_model, &request).await?;
        response
            .text()
            .ok_or_else(|| WardrobeError::ApiParse("Empty response".into()))
    }

    /// 画像参照（file:// / data: / http(s)）を読み込む
    async fn fetch_image(&self, url: &str) -> Result<InlineData> {
        if let Some(rest) = url.strip_prefix("data:") {
            let (meta, data) = rest
                .split_once(',')
                .ok_or_else(|| WardrobeError::ApiCall(format!("Invalid data URL: {}", url)))?;
            let mime_type = meta.split(';').next().unwrap_or("image/jpeg");
            return Ok(InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            });
        }

        let (name, bytes) = if let Some(path) = url.strip_prefix("file://") {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|_| WardrobeError::FileNotFound(path.to_string()))?;
            (path.to_string(), bytes)
        } else {
            let response = self.http.get(url).send().await?;
            if !response.status().is_success() {
                return Err(WardrobeError::ApiCall(format!(
                    "Failed to fetch image from {}",
                    url
                )));
            }
            (url.to_string(), response.bytes().await?.to_vec())
        };

        let file = ImageFile::new(name, bytes);
        Ok(InlineData {
            mime_type: file.content_type().to_string(),
            data: file.to_base64(),
        })
    }
}

fn inline_part(file: &ImageFile) -> Part {
    Part::InlineData {
        inline_data: InlineData {
            mime_type: file.content_type().to_string(),
            data: file.to_base64(),
        },
    }
}

#[async_trait(?Send)]
impl Classifier for GeminiClient {
    async fn classify(
        &self,
        file: &ImageFile,
        expected: Option<ClothingCategory>,
    ) -> Result<ClothingReport> {
        let text = self.ask_json(build_clothing_prompt(expected), file).await?;
        let report = parse_clothing_response(&text)?;
        debug!(name = %report.name, category = %report.category, "gemini: clothing analyzed");
        Ok(report)
    }
}

#[async_trait(?Send)]
impl FaceVerifier for GeminiClient {
    async fn verify_face(&self, file: &ImageFile) -> Result<FaceReport> {
        let text = self.ask_json(build_face_prompt(), file).await?;
        Ok(parse_face_response(&text)?)
    }
}

#[async_trait(?Send)]
impl OutfitGenerator for GeminiClient {
    async fn generate_outfit(&self, request: &GenerationRequest) -> Result<GeneratedOutfit> {
        // 顔写真を先頭に、続けてアイテム画像（頭 → 上 → 下）
        let mut urls = vec![request.profile_pic_url.as_str()];
        urls.extend(request.item_images().into_iter().map(|(_, url)| url));

        let images =
            futures::future::try_join_all(urls.iter().map(|url| self.fetch_image(url))).await?;
        debug!(count = images.len(), "gemini: reference images loaded");

        let mut parts = vec![Part::Text {
            text: build_outfit_prompt(request),
        }];
        parts.extend(
            images
                .into_iter()
                .map(|inline_data| Part::InlineData { inline_data }),
        );

        let gemini_request = GeminiRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig::image(),
        };

        let response = self.call_gemini_api(&self.image_model, &gemini_request).await?;
        match response.image_data_url() {
            Some(image_data_url) => {
                info!("gemini: outfit generated");
                Ok(GeneratedOutfit { image_data_url })
            }
            None => {
                let text = response.text().unwrap_or_default();
                warn!(%text, "gemini: no image in response");
                Err(WardrobeError::ApiCall(
                    "Failed to generate image. The model did not return an image.".into(),
                ))
            }
        }
    }
}

/// Data URLから画像バイト列を取り出す
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>)> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| WardrobeError::ApiParse("not a data URL".into()))?;
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| WardrobeError::ApiParse("not a data URL".into()))?;
    let mime = meta.split(';').next().unwrap_or("image/png").to_string();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| WardrobeError::ApiParse(format!("invalid base64: {}", e)))?;
    Ok((mime, bytes))
}
