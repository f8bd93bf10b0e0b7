use anyhow::{Context, Result};
use serde_json::{json, Value};

use super::{AiExtraction, AiExtractor};

/// Token-cost optimized extraction prompt. The model is told to answer with
/// bare JSON; we still salvage JSON out of fenced or chatty replies.
const EXTRACTION_PROMPT: &str = "\
คุณเป็น JSON extractor สำหรับการขายของสด
จากข้อความนี้ ดึง item_code (รหัสสินค้า), price (ราคาเป็นบาท) และ size ออกมา
ตอบเฉพาะ JSON เท่านั้น ห้ามมีข้อความอื่น ถ้าไม่พบให้ใส่ null

ข้อความ: \"{text}\"

ตอบ: {\"item_code\": <int|null>, \"price\": <int|null>, \"size\": <string|null>}";

/// Gemini `generateContent` client for field extraction.
pub struct GeminiExtractor {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiExtractor {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait::async_trait]
impl AiExtractor for GeminiExtractor {
    async fn extract(&self, text: &str) -> Result<Option<AiExtraction>> {
        let prompt = EXTRACTION_PROMPT.replace("{text}", text);

        let url = format!("{}?key={}", self.endpoint, self.api_key);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.0, "maxOutputTokens": 100 }
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Gemini request failed")?
            .error_for_status()
            .context("Gemini returned an error status")?;

        let payload: Value = response
            .json()
            .await
            .context("Gemini response was not JSON")?;

        let raw = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default();

        Ok(parse_extraction(raw))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Salvage a JSON object from possibly-fenced, possibly-chatty model output.
fn parse_extraction(raw: &str) -> Option<AiExtraction> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }

    let value: Value = serde_json::from_str(&raw[start..=end]).ok()?;

    let extraction = AiExtraction {
        item_id: value["item_code"].as_u64().map(|n| n as u32),
        price: value["price"].as_u64().map(|n| n as u32),
        size: value["size"].as_str().map(|s| s.to_string()),
    };

    if extraction.item_id.is_none() && extraction.price.is_none() && extraction.size.is_none() {
        return None;
    }
    Some(extraction)
}

#[cfg(test)]
mod tests {
    use super::parse_extraction;

    #[test]
    fn parses_bare_json() {
        let result = parse_extraction(r#"{"item_code": 12, "price": 90, "size": null}"#).unwrap();
        assert_eq!(result.item_id, Some(12));
        assert_eq!(result.price, Some(90));
        assert_eq!(result.size, None);
    }

    #[test]
    fn salvages_fenced_json() {
        let raw = "```json\n{\"item_code\": 5, \"price\": null, \"size\": \"XL\"}\n```";
        let result = parse_extraction(raw).unwrap();
        assert_eq!(result.item_id, Some(5));
        assert_eq!(result.size.as_deref(), Some("XL"));
    }

    #[test]
    fn rejects_empty_result() {
        assert!(parse_extraction(r#"{"item_code": null, "price": null}"#).is_none());
        assert!(parse_extraction("no json here").is_none());
    }
}
