//! Google Translate v2 provider
//!
//! Talks to the v2 REST API: `POST {base}` for batch translation and
//! `POST {base}/languages` for the language catalogue. The API key comes from
//! configuration and is sent in the `X-goog-api-key` header.
//!
//! # Example
//!
//! ```ignore
//! use i18n_autotranslate::mt::{GoogleTranslateProvider, MachineTranslator};
//!
//! let provider = GoogleTranslateProvider::new(api_key)?;
//! let texts = vec!["Hello ___PLACEHOLDER_0___".to_string()];
//! let translated = provider.translate_batch(&texts, "en", "fr").await?;
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{
    LanguageInfo, MachineTranslator, normalize_locale, validate_locale,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Texts per request accepted by the v2 endpoint
const REQUEST_LIMIT: usize = 128;

/// Longest single text the endpoint accepts, in bytes
const TEXT_LIMIT: usize = 30_000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Google Translate API v2 provider
///
/// A pipeline batch larger than [`REQUEST_LIMIT`] is split into several
/// requests and the answers are concatenated in order.
#[derive(Clone)]
pub struct GoogleTranslateProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslateProvider {
    /// # Returns
    ///
    /// * `Err(MtError::ConfigError)` - If the key is blank
    /// * `Err(MtError::NetworkError)` - If the HTTP client cannot be built
    pub fn new(api_key: impl Into<String>) -> MtResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(MtError::ConfigError("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MtError::NetworkError(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the provider at a different endpoint (proxies, regional hosts)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn post(&self, url: &str, body: &Value) -> MtResult<Value> {
        let response = self
            .client
            .post(url)
            .header("X-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| MtError::TranslationError(format!("Unreadable API response: {}", e)));
        }

        let detail = response.text().await.unwrap_or_default();
        // 4xx: bad key, quota, unsupported pair. Retrying will not help.
        Err(if status.is_client_error() {
            MtError::ConfigError(format!("API rejected request ({}): {}", status, detail))
        } else {
            MtError::TranslationError(format!("API failure ({}): {}", status, detail))
        })
    }
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Request body for one translate call
fn translate_request(texts: &[String], source_locale: &str, target_locale: &str) -> Value {
    json!({
        "q": texts,
        "source": normalize_locale(source_locale),
        "target": normalize_locale(target_locale),
        "format": "text"
    })
}

/// `data.translations[].translatedText`, in request order
fn parse_translations(response: &Value) -> MtResult<Vec<String>> {
    let entries = response["data"]["translations"].as_array().ok_or_else(|| {
        MtError::TranslationError("response has no data.translations".to_string())
    })?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            entry["translatedText"]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| {
                    MtError::TranslationError(format!("translation {} has no translatedText", i))
                })
        })
        .collect()
}

/// `data.languages[]`; entries without a code are ignored
fn parse_languages(response: &Value) -> MtResult<Vec<LanguageInfo>> {
    let entries = response["data"]["languages"].as_array().ok_or_else(|| {
        MtError::TranslationError("response has no data.languages".to_string())
    })?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let code = entry["language"].as_str()?;
            Some(LanguageInfo {
                code: code.to_string(),
                name: entry["name"].as_str().unwrap_or(code).to_string(),
            })
        })
        .collect())
}

/// Reject texts the endpoint would refuse, before spending a request
fn check_lengths(texts: &[String]) -> MtResult<()> {
    match texts.iter().position(|text| text.len() > TEXT_LIMIT) {
        Some(index) => Err(MtError::TranslationError(format!(
            "text {} is longer than {} bytes",
            index, TEXT_LIMIT
        ))),
        None => Ok(()),
    }
}

#[async_trait]
impl MachineTranslator for GoogleTranslateProvider {
    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;
        check_lengths(texts)?;

        let mut translated = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(REQUEST_LIMIT) {
            let body = translate_request(chunk, source_locale, target_locale);
            let response = self.post(&self.base_url, &body).await?;
            let answers = parse_translations(&response)?;
            if answers.len() != chunk.len() {
                return Err(MtError::LengthMismatch {
                    expected: chunk.len(),
                    actual: answers.len(),
                });
            }
            translated.extend(answers);
        }
        Ok(translated)
    }

    async fn supported_languages(&self, display_locale: &str) -> MtResult<Vec<LanguageInfo>> {
        validate_locale(display_locale)?;

        let url = format!("{}/languages", self.base_url);
        let body = json!({ "target": normalize_locale(display_locale) });
        parse_languages(&self.post(&url, &body).await?)
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}
