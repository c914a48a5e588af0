use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{Geocoder, PlaceSearch, SearchQuery};
use crate::TravelRankError;
use crate::config::SearchConfig;
use crate::models::Center;

/// Kakao Local REST API client (category and address search)
pub struct KakaoLocalClient {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
}

/// `documents` envelope shared by Kakao search endpoints
#[derive(Debug, Deserialize)]
struct DocumentsResponse<T> {
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
}

/// Address search hit; Kakao sends x = longitude, y = latitude as strings
#[derive(Debug, Deserialize)]
struct AddressDocument {
    x: String,
    y: String,
}

impl KakaoLocalClient {
    /// Create a new client. Fails without an API key.
    pub fn new(config: &SearchConfig) -> crate::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TravelRankError::config("Kakao REST API key is not configured"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("TravelRank/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TravelRankError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn category_url(&self) -> String {
        format!("{}/v2/local/search/category.json", self.base_url)
    }

    fn address_url(&self) -> String {
        format!("{}/v2/local/search/address.json", self.base_url)
    }

    fn authorization(&self) -> String {
        format!("KakaoAK {}", self.api_key)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> crate::Result<T> {
        let url = reqwest::Url::parse_with_params(url, params)
            .map_err(|e| TravelRankError::config(format!("Invalid Kakao URL {url}: {e}")))?;
        let response = self
            .client
            .get(url)
            .header("Authorization", self.authorization())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return match status.as_u16() {
                401 | 403 => Err(TravelRankError::config(
                    "Kakao rejected the configured REST API key",
                )),
                429 => Err(TravelRankError::transport("Kakao API rate limit exceeded")),
                _ => Err(TravelRankError::transport(format!(
                    "Kakao API error {status}: {error_text}"
                ))),
            };
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TravelRankError::malformed(format!("Failed to parse Kakao response: {e}")))
    }
}

/// Merge pages from several category codes into one distance-ordered list.
///
/// Repeated ids keep their first occurrence. The sort is stable and records
/// without a readable `distance` go last.
fn merge_code_pages(pages: Vec<Vec<Value>>) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut records: Vec<Value> = pages
        .into_iter()
        .flatten()
        .filter(|doc| match record_id(doc) {
            Some(id) => seen.insert(id),
            None => true,
        })
        .collect();
    records.sort_by(|a, b| match (record_distance(a), record_distance(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    records
}

fn record_id(doc: &Value) -> Option<String> {
    match doc.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Kakao sends `distance` as a string, empty when no center was given
fn record_distance(doc: &Value) -> Option<f64> {
    let distance: f64 = match doc.get("distance")? {
        Value::String(s) => s.trim().parse().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    distance.is_finite().then_some(distance)
}

#[async_trait]
impl PlaceSearch for KakaoLocalClient {
    #[instrument(skip(self), fields(category = %query.category))]
    async fn search(&self, query: &SearchQuery) -> crate::Result<Vec<Value>> {
        let url = self.category_url();
        let mut pages = Vec::with_capacity(query.codes.len());

        for code in &query.codes {
            let params = [
                ("category_group_code", code.clone()),
                ("x", query.center.lng.to_string()),
                ("y", query.center.lat.to_string()),
                ("radius", query.radius_meters.to_string()),
                ("size", query.page_size.to_string()),
                ("sort", "distance".to_string()),
            ];
            let page: DocumentsResponse<Value> = self.get_json(&url, &params).await?;
            debug!(code = %code, found = page.documents.len(), "Kakao category page");
            pages.push(page.documents);
        }

        let records = merge_code_pages(pages);
        info!("Found {} raw places for {}", records.len(), query.category);
        Ok(records)
    }

    fn provider_name(&self) -> &str {
        "kakao"
    }
}

#[async_trait]
impl Geocoder for KakaoLocalClient {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> crate::Result<Option<Center>> {
        let params = [("query", query.to_string())];
        let response: DocumentsResponse<AddressDocument> =
            self.get_json(&self.address_url(), &params).await?;

        let Some(doc) = response.documents.into_iter().next() else {
            return Ok(None);
        };
        let (Ok(lat), Ok(lng)) = (doc.y.trim().parse::<f64>(), doc.x.trim().parse::<f64>()) else {
            return Err(TravelRankError::malformed(format!(
                "Kakao returned unparsable coordinates x={} y={}",
                doc.x, doc.y
            )));
        };
        Center::new(lat, lng).map(Some)
    }
}
