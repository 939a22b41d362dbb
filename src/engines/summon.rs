//! Summon search backend
//!
//! Uses the Summon JSON API. Every request is signed: the values of the
//! Accept, x-summon-date, Host, Version and Query headers are joined (each
//! followed by a newline), digested with HMAC-SHA1 under the application
//! secret, and sent as `Authorization: Summon <appId>;<digest>`.

use super::traits::*;
use crate::config::BackendSettings;
use crate::results::{Record, ResultSet};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Default API version path
pub const DEFAULT_VERSION: &str = "/2.0.0/search";

/// Highlight wrappers Summon puts around matched terms
static HIGHLIGHT_MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?h>").expect("highlight pattern is valid"));

/// Signed-JSON discovery backend
pub struct Summon;

impl Summon {
    pub fn new() -> Self {
        Self
    }

    /// Build the signed request for a given protocol date
    pub fn signed_request(
        &self,
        settings: &BackendSettings,
        query: &str,
        date: &str,
    ) -> Result<EngineRequest, BackendFailure> {
        let app_id = required(&settings.app_id, "appid")?;
        let app_secret = required(&settings.app_secret, "appsecret")?;

        let host = settings
            .endpoint
            .trim()
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .trim_end_matches('/');
        if host.is_empty() {
            return Err(BackendFailure::Request("no endpoint configured".to_string()));
        }

        let version = settings
            .version
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_VERSION);

        let headers = [
            ("Accept", "application/json".to_string()),
            ("x-summon-date", date.to_string()),
            ("Host", host.to_string()),
            ("Version", version.to_string()),
            ("Query", format!("s.q={}", query)),
        ];

        let digest = sign(app_secret, &signing_string(&headers))?;

        let url = format!(
            "http://{}{}?s.q={}",
            host,
            version,
            urlencoding::encode(query)
        );

        let request = headers
            .into_iter()
            .fold(EngineRequest::get(url), |request, (key, value)| {
                request.header(key, value)
            })
            .header("Authorization", format!("Summon {};{}", app_id, digest));

        Ok(request)
    }

    /// Parse the JSON search response
    fn parse_json_response(body: &str) -> Result<ResultSet, BackendFailure> {
        let response: SummonResponse = serde_json::from_str(body)
            .map_err(|e| BackendFailure::Parse(format!("invalid JSON: {}", e)))?;

        let total = response
            .record_count
            .as_ref()
            .and_then(|count| match count {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .ok_or_else(|| {
                BackendFailure::Parse("missing or invalid required field recordCount".to_string())
            })?;

        let records = response
            .documents
            .unwrap_or_default()
            .into_iter()
            // Entries that are not document objects are skipped
            .filter_map(|doc| serde_json::from_value::<SummonDocument>(doc).ok())
            .map(SummonDocument::into_record)
            .collect();

        Ok(ResultSet::new(total, records))
    }
}

impl Default for Summon {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for Summon {
    fn name(&self) -> &str {
        "summon"
    }

    fn display_name(&self) -> &str {
        "Summon"
    }

    fn failure_code(&self) -> u16 {
        400
    }

    fn request(
        &self,
        settings: &BackendSettings,
        query: &str,
    ) -> Result<EngineRequest, BackendFailure> {
        self.signed_request(settings, query, &summon_date(chrono::Utc::now()))
    }

    fn response(&self, response: EngineResponse) -> Result<ResultSet, BackendFailure> {
        if !response.is_success() {
            return Err(BackendFailure::Status(response.status));
        }

        Self::parse_json_response(&response.text)
    }
}

/// RFC 1123 date in GMT, as expected in `x-summon-date`
pub fn summon_date(now: chrono::DateTime<chrono::Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Header values in order, each terminated by a newline
fn signing_string(headers: &[(&str, String)]) -> String {
    headers.iter().map(|(_, value)| format!("{}\n", value)).collect()
}

/// Base64 HMAC-SHA1 digest
fn sign(secret: &str, message: &str) -> Result<String, BackendFailure> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| BackendFailure::Request(format!("invalid app secret: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, BackendFailure> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BackendFailure::Request(format!("missing {}", field)))
}

/// Remove highlight markup from a text field
pub fn clean_up_value(value: &str) -> String {
    HIGHLIGHT_MARKUP.replace_all(value, "").into_owned()
}

/// Top level of a search reply. `recordCount` is required, everything else optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummonResponse {
    #[serde(default)]
    record_count: Option<Value>,
    #[serde(default)]
    documents: Option<Vec<Value>>,
}

/// One document. Summon wraps most scalars in single-element arrays.
#[derive(Debug, Default, Deserialize)]
struct SummonDocument {
    #[serde(rename = "Title", default, deserialize_with = "first_text")]
    title: Option<String>,
    #[serde(rename = "Publisher_xml", default, deserialize_with = "first_name")]
    publisher: Option<String>,
    #[serde(rename = "PublicationDate", default, deserialize_with = "first_text")]
    publication_date: Option<String>,
    #[serde(default, deserialize_with = "first_text")]
    link: Option<String>,
    #[serde(rename = "ContentType", default, deserialize_with = "first_text")]
    content_type: Option<String>,
    #[serde(rename = "thumbnail_s", default, deserialize_with = "first_text")]
    thumbnail: Option<String>,
    #[serde(rename = "PublicationPlace", default, deserialize_with = "first_text")]
    publication_place: Option<String>,
}

impl SummonDocument {
    fn into_record(self) -> Record {
        Record::builder()
            .title(self.title)
            .author(self.publisher)
            .publication_date(self.publication_date)
            .link(self.link)
            .content_type(self.content_type)
            .thumbnail_url(self.thumbnail)
            .publication_place(self.publication_place)
            .branch(None)
            .build()
    }
}

/// First element of an array, or the value itself
fn first(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        Value::Null => None,
        other => Some(other),
    }
}

fn first_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(first)
        .and_then(|v| v.as_str())
        .map(clean_up_value))
}

fn first_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(first)
        .and_then(|v| v.get("name"))
        .and_then(|v| v.as_str())
        .map(clean_up_value))
}
