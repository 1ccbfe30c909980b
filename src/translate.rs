//! Machine translation client
//!
//! Thin stateless wrapper over the remote translation endpoint. The contract
//! is deliberately forgiving: failures of any kind surface as an empty string
//! with a logged diagnostic, so callers treat "empty result" as "translation
//! unavailable" and carry on.

use async_trait::async_trait;

/// Default translation endpoint base URL
const DEFAULT_BASE_URL: &str = "https://api.mymemory.translated.net";

/// Response envelope from the translation endpoint
#[derive(serde::Deserialize)]
struct TranslateResponse {
    #[serde(rename = "responseData")]
    response_data: Option<ResponseData>,
}

#[derive(serde::Deserialize)]
struct ResponseData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

/// Translates text between two-letter language codes
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `from` to `to`
    ///
    /// Returns the translated text, or an empty string when the input is
    /// blank or the endpoint is unavailable.
    async fn translate(&self, text: &str, from: &str, to: &str) -> String;
}

/// Client for the MyMemory translation endpoint
pub struct MyMemoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl MyMemoryClient {
    /// Create a client against the public endpoint
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn request(&self, text: &str, from: &str, to: &str) -> crate::Result<String> {
        let url = format!(
            "{}/get?q={}&langpair={}|{}",
            self.base_url,
            urlencoding::encode(text),
            from,
            to
        );

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(crate::Error::Translation(format!(
                "endpoint returned {status}"
            )));
        }

        let body: TranslateResponse = response.json().await?;
        body.response_data
            .and_then(|d| d.translated_text)
            .ok_or_else(|| crate::Error::Translation("missing translatedText field".to_string()))
    }
}

impl Default for MyMemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for MyMemoryClient {
    async fn translate(&self, text: &str, from: &str, to: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        match self.request(trimmed, from, to).await {
            Ok(translated) => {
                tracing::debug!(from, to, chars = translated.len(), "translated segment");
                translated
            }
            Err(e) => {
                tracing::warn!(from, to, error = %e, "translation failed, degrading to empty");
                String::new()
            }
        }
    }
}
