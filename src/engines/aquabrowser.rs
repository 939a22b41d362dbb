//! Aquabrowser search backend
//!
//! Queries an SRU (search/retrieve via URL) endpoint and reads Dublin Core
//! records out of the XML reply.

use super::traits::*;
use super::xml::{self, XmlElement};
use crate::config::BackendSettings;
use crate::results::{Record, ResultSet};

/// Maximum number of records requested from the SRU endpoint
pub const MAXIMUM_RECORDS: u32 = 20;

/// SRU/XML catalogue backend
pub struct Aquabrowser;

impl Aquabrowser {
    pub fn new() -> Self {
        Self
    }

    /// Build the searchRetrieve URL for an endpoint that may or may not end in `?`
    fn search_url(endpoint: &str, query: &str) -> String {
        let separator = if endpoint.ends_with('?') || endpoint.ends_with('&') {
            ""
        } else if endpoint.contains('?') {
            "&"
        } else {
            "?"
        };

        format!(
            "{}{}operation=searchRetrieve&version=1.1&query={}&maximumRecords={}&recordSchema=dc",
            endpoint,
            separator,
            urlencoding::encode(query),
            MAXIMUM_RECORDS
        )
    }

    /// Parse a searchRetrieveResponse document
    fn parse_sru_response(body: &str) -> Result<ResultSet, BackendFailure> {
        let root = xml::parse(body.trim()).map_err(BackendFailure::Parse)?;

        if root.name != "searchRetrieveResponse" {
            return Err(BackendFailure::Parse(format!(
                "unexpected root element <{}>",
                root.name
            )));
        }

        let total = match root.child("numberOfRecords").and_then(|n| n.text()) {
            Some(count) => count.parse::<u64>().map_err(|_| {
                BackendFailure::Parse(format!("invalid numberOfRecords: {}", count))
            })?,
            None => 0,
        };

        let records = root
            .child("records")
            .map(|records| {
                records
                    .children_named("record")
                    .filter(|record| !Self::is_error(record))
                    .filter_map(Self::parse_record)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ResultSet::new(total, records))
    }

    /// Entries flagged by the source as errors are skipped
    fn is_error(record: &XmlElement) -> bool {
        record.attribute("error").is_some() || record.child("error").is_some()
    }

    /// A record without `recordData` is malformed and yields `None`
    fn parse_record(record: &XmlElement) -> Option<Record> {
        let data = record.child("recordData")?;
        let extra = record.child("extraRecordData");

        let dc = |name: &str| data.find(name).and_then(|e| e.text());
        let extra_field = |name: &str| extra.and_then(|e| e.child(name)).and_then(|e| e.text());

        // Multiple creators are common in Dublin Core
        let mut creators = Vec::new();
        data.find_all("creator", &mut creators);
        let names: Vec<String> = creators.iter().filter_map(|c| c.text()).collect();
        let author = if names.is_empty() {
            None
        } else {
            Some(names.join("; "))
        };

        let record = Record::builder()
            .title(dc("title"))
            .author(author)
            .publication_date(dc("date"))
            .link(extra_field("recordURL"))
            .content_type(dc("format"))
            .thumbnail_url(Some(extra_field("coverimageurl").unwrap_or_default()))
            .publication_place(None)
            .branch(extra_field("branch"))
            .build();

        Some(record)
    }
}

impl Default for Aquabrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for Aquabrowser {
    fn name(&self) -> &str {
        "aquabrowser"
    }

    fn display_name(&self) -> &str {
        "Aquabrowser"
    }

    fn failure_code(&self) -> u16 {
        500
    }

    fn request(
        &self,
        settings: &BackendSettings,
        query: &str,
    ) -> Result<EngineRequest, BackendFailure> {
        if settings.endpoint.trim().is_empty() {
            return Err(BackendFailure::Request("no endpoint configured".to_string()));
        }

        let url = Self::search_url(settings.endpoint.trim(), query);
        url::Url::parse(&url).map_err(|e| {
            BackendFailure::Request(format!("invalid endpoint {}: {}", settings.endpoint, e))
        })?;

        Ok(EngineRequest::get(url))
    }

    fn response(&self, response: EngineResponse) -> Result<ResultSet, BackendFailure> {
        if !response.is_success() {
            return Err(BackendFailure::Status(response.status));
        }

        Self::parse_sru_response(&response.text)
    }
}
