//! Microsoft Translator (v3) backed translator implementation.
//! One request carries a whole batch; the first translation of each item is kept.

use super::{LanguagePair, Translator};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Public endpoint of the global Translator resource.
pub const DEFAULT_ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com";

const API_VERSION: &str = "3.0";

/// Connection settings for the Translator service.
#[derive(Debug, Clone)]
pub struct AzureConfig {
    pub key: String,
    pub endpoint: String,
    /// Required by regional and multi-service resources.
    pub region: Option<String>,
    pub languages: LanguagePair,
}

/// Translator that delegates to the Microsoft Translator REST API.
#[derive(Debug, Clone)]
pub struct AzureTranslator {
    client: Client,
    config: AzureConfig,
}

#[derive(Serialize)]
struct RequestItem<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ResponseItem {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl AzureTranslator {
    /// Create a new translator. A missing or empty key is rejected up front.
    pub fn new(
        key: Option<String>,
        endpoint: &str,
        region: Option<String>,
        languages: LanguagePair,
    ) -> Result<Self> {
        let key = key
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::CredentialMissing)?;
        Ok(Self {
            client: Client::new(),
            config: AzureConfig {
                key,
                endpoint: endpoint.trim_end_matches('/').to_string(),
                region,
                languages,
            },
        })
    }

    pub fn config(&self) -> &AzureConfig {
        &self.config
    }

    /// Send the batch and return the raw response items.
    async fn post_translate(&self, texts: &[String]) -> Result<Vec<ResponseItem>> {
        let body: Vec<RequestItem<'_>> = texts.iter().map(|t| RequestItem { text: t }).collect();
        let mut request = self
            .client
            .post(format!("{}/translate", self.config.endpoint))
            .query(&[
                ("api-version", API_VERSION),
                ("from", self.config.languages.source.as_str()),
                ("to", self.config.languages.target.as_str()),
            ])
            .header("Ocp-Apim-Subscription-Key", &self.config.key)
            .json(&body);
        if let Some(region) = &self.config.region {
            request = request.header("Ocp-Apim-Subscription-Region", region);
        }
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            return Err(Error::Remote(error_message(status, &raw)));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl Translator for AzureTranslator {
    async fn translate(&self, texts: &[String]) -> Result<Vec<String>> {
        trace!("translate count={}", texts.len());
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let items = self.post_translate(texts).await?;
        if items.len() != texts.len() {
            return Err(Error::Remote(format!(
                "expected {} translations, got {}",
                texts.len(),
                items.len()
            )));
        }
        let out = items
            .into_iter()
            .map(|item| {
                item.translations
                    .into_iter()
                    .next()
                    .map(|t| t.text)
                    .ok_or_else(|| Error::Remote("response item without translations".into()))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!("translated {} texts", out.len());
        Ok(out)
    }
}

/// Pull the human readable message out of an error payload.
fn error_message(status: reqwest::StatusCode, raw: &str) -> String {
    match serde_json::from_str::<ErrorBody>(raw) {
        Ok(body) => body.error.message,
        Err(_) if raw.trim().is_empty() => status.to_string(),
        Err(_) => format!("{status}: {}", raw.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn translator(server: &MockServer, region: Option<&str>) -> AzureTranslator {
        AzureTranslator::new(
            Some("secret".into()),
            &server.base_url(),
            region.map(str::to_string),
            "en:fr".parse().unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn sends_batch_and_keeps_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/translate")
                    .query_param("api-version", "3.0")
                    .query_param("from", "en")
                    .query_param("to", "fr")
                    .header("ocp-apim-subscription-key", "secret")
                    .json_body(json!([{"text": "Hello"}, {"text": "Good night"}]));
                then.status(200).json_body(json!([
                    {"translations": [{"text": "Bonjour", "to": "fr"}]},
                    {"translations": [{"text": "Bonne nuit", "to": "fr"}, {"text": "ignored", "to": "fr"}]}
                ]));
            })
            .await;
        let out = translator(&server, None)
            .translate(&["Hello".to_string(), "Good night".to_string()])
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(out, vec!["Bonjour".to_string(), "Bonne nuit".to_string()]);
    }

    #[tokio::test]
    async fn sends_region_header_when_configured() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/translate")
                    .header("ocp-apim-subscription-region", "westeurope");
                then.status(200)
                    .json_body(json!([{"translations": [{"text": "Salut"}]}]));
            })
            .await;
        let out = translator(&server, Some("westeurope"))
            .translate(&["Hi".to_string()])
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(out, vec!["Salut".to_string()]);
    }

    #[tokio::test]
    async fn empty_input_makes_no_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/translate");
                then.status(200).json_body(json!([]));
            })
            .await;
        let out = translator(&server, None).translate(&[]).await.unwrap();
        assert!(out.is_empty());
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn surfaces_api_error_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/translate");
                then.status(401).json_body(json!({
                    "error": {"code": 401000, "message": "The request is not authorized because credentials are missing or invalid."}
                }));
            })
            .await;
        let err = translator(&server, None)
            .translate(&["Hi".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 20);
        assert_eq!(
            err.to_string(),
            "API error: The request is not authorized because credentials are missing or invalid."
        );
    }

    #[tokio::test]
    async fn rejects_short_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/translate");
                then.status(200)
                    .json_body(json!([{"translations": [{"text": "un"}]}]));
            })
            .await;
        let err = translator(&server, None)
            .translate(&["one".to_string(), "two".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
    }

    #[test]
    fn missing_key_is_credential_error() {
        let err = AzureTranslator::new(None, DEFAULT_ENDPOINT, None, "en:de".parse().unwrap()).unwrap_err();
        assert!(matches!(err, Error::CredentialMissing));
        let err = AzureTranslator::new(Some("  ".into()), DEFAULT_ENDPOINT, None, "en:de".parse().unwrap())
            .unwrap_err();
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn falls_back_to_status_for_unstructured_errors() {
        assert_eq!(
            error_message(reqwest::StatusCode::BAD_GATEWAY, ""),
            "502 Bad Gateway"
        );
        assert_eq!(
            error_message(reqwest::StatusCode::BAD_GATEWAY, "upstream down\n"),
            "502 Bad Gateway: upstream down"
        );
    }
}
