//! Fetch configuration
//!
//! `FetchConfig` describes one HTTP source: where it lives, how to page
//! through it and where the records sit in each response. It arrives from
//! the session/config collaborator as camelCase JSON (or YAML when loaded
//! from disk) and must pass [`FetchConfig::validate`] before any request is
//! issued.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Method, StringMap};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Parameter names treated as "the same thing" as a pagination parameter.
/// When the configured URL already carries one of these, no pagination
/// parameter is added on top of it.
pub const DEFAULT_PAGINATION_SYNONYMS: &[&str] = &["page", "pageNum", "pageIndex", "offset", "start"];

// ============================================================================
// Pagination Type
// ============================================================================

/// How the pagination counter is interpreted by the target API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationType {
    /// Counter is a page number (1, 2, 3, ...)
    #[default]
    Page,
    /// Counter is a record offset (0, 100, 200, ...)
    Offset,
}

// ============================================================================
// Fetch Config
// ============================================================================

/// Configuration for a single fetch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchConfig {
    /// Endpoint URL, possibly with fixed query parameters embedded
    pub api_url: String,

    /// HTTP method
    #[serde(default)]
    pub method: Method,

    /// Request headers
    #[serde(default)]
    pub headers: StringMap,

    /// Extra query parameters, merged with those already in `api_url`
    #[serde(default)]
    pub query_params: StringMap,

    /// JSON body sent with POST/PUT/PATCH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<JsonValue>,

    /// Walk pages until exhausted instead of issuing a single request
    #[serde(default)]
    pub enable_pagination: bool,

    /// Page number or offset pagination
    #[serde(default)]
    pub pagination_type: PaginationType,

    /// Name of the pagination parameter the API expects
    #[serde(default)]
    pub page_field: Option<String>,

    /// Initial page number (1 when unset); ignored for offset pagination
    #[serde(default)]
    pub page_field_start_value: Option<u64>,

    /// Last counter value to request, inclusive
    #[serde(default)]
    pub end_page: Option<u64>,

    /// Dotted path to the grand total in the response body
    #[serde(default)]
    pub total_field: Option<String>,

    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound accepted for `page_size`
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Name of the page-size parameter; `None` sends no size parameter
    #[serde(default = "default_size_field")]
    pub size_field: Option<String>,

    /// Counter increment per page
    #[serde(default)]
    pub step_size: Option<u64>,

    /// Path to the record array inside the response body
    #[serde(default)]
    pub data_path: Option<String>,

    /// Parameter names that count as an existing pagination parameter
    #[serde(default = "default_pagination_synonyms")]
    pub pagination_synonyms: Vec<String>,

    /// Pause between consecutive page requests
    #[serde(default = "default_inter_page_delay_ms")]
    pub inter_page_delay_ms: u64,

    /// Hard cap on the number of page requests per run
    #[serde(default = "default_max_pages")]
    pub max_pages: u64,
}

fn default_page_size() -> u32 {
    100
}

fn default_max_page_size() -> u32 {
    1000
}

#[allow(clippy::unnecessary_wraps)]
fn default_size_field() -> Option<String> {
    Some("limit".to_string())
}

fn default_pagination_synonyms() -> Vec<String> {
    DEFAULT_PAGINATION_SYNONYMS
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_inter_page_delay_ms() -> u64 {
    100
}

fn default_max_pages() -> u64 {
    10_000
}

impl FetchConfig {
    /// Create a single-request config for the given URL
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            method: Method::default(),
            headers: StringMap::new(),
            query_params: StringMap::new(),
            body: None,
            enable_pagination: false,
            pagination_type: PaginationType::default(),
            page_field: None,
            page_field_start_value: None,
            end_page: None,
            total_field: None,
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            size_field: default_size_field(),
            step_size: None,
            data_path: None,
            pagination_synonyms: default_pagination_synonyms(),
            inter_page_delay_ms: default_inter_page_delay_ms(),
            max_pages: default_max_pages(),
        }
    }

    /// Parse a config from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a config from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Set the HTTP method
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a request header
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Set the JSON request body
    #[must_use]
    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Enable page-number pagination
    #[must_use]
    pub fn with_page_pagination(mut self, page_field: impl Into<String>, start: u64) -> Self {
        self.enable_pagination = true;
        self.pagination_type = PaginationType::Page;
        self.page_field = Some(page_field.into());
        self.page_field_start_value = Some(start);
        self
    }

    /// Enable offset pagination
    #[must_use]
    pub fn with_offset_pagination(mut self, offset_field: impl Into<String>) -> Self {
        self.enable_pagination = true;
        self.pagination_type = PaginationType::Offset;
        self.page_field = Some(offset_field.into());
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Set the page-size parameter name (`None` disables it)
    #[must_use]
    pub fn with_size_field(mut self, field: Option<&str>) -> Self {
        self.size_field = field.map(ToString::to_string);
        self
    }

    /// Set the counter increment
    #[must_use]
    pub fn with_step_size(mut self, step: u64) -> Self {
        self.step_size = Some(step);
        self
    }

    /// Set an explicit last page
    #[must_use]
    pub fn with_end_page(mut self, end: u64) -> Self {
        self.end_page = Some(end);
        self
    }

    /// Set the response field carrying the grand total
    #[must_use]
    pub fn with_total_field(mut self, path: impl Into<String>) -> Self {
        self.total_field = Some(path.into());
        self
    }

    /// Set the record array path
    #[must_use]
    pub fn with_data_path(mut self, path: impl Into<String>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    /// Replace the pagination synonym allowlist
    #[must_use]
    pub fn with_pagination_synonyms<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pagination_synonyms = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the pause between pages
    #[must_use]
    pub fn with_inter_page_delay(mut self, delay: Duration) -> Self {
        self.inter_page_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the page request cap
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u64) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Initial pagination counter.
    ///
    /// Offsets always start at 0; `pageFieldStartValue` only applies to page
    /// numbers.
    pub fn start_value(&self) -> u64 {
        match self.pagination_type {
            PaginationType::Page => self.page_field_start_value.unwrap_or(1),
            PaginationType::Offset => 0,
        }
    }

    /// Counter increment per page
    pub fn step(&self) -> u64 {
        self.step_size.unwrap_or(match self.pagination_type {
            PaginationType::Page => 1,
            PaginationType::Offset => u64::from(self.page_size),
        })
    }

    /// Configured pagination field, ignoring blanks
    pub fn page_field(&self) -> Option<&str> {
        self.page_field
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    /// Configured size field, ignoring blanks
    pub fn size_field(&self) -> Option<&str> {
        self.size_field
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    /// Pause between pages
    pub fn inter_page_delay(&self) -> Duration {
        Duration::from_millis(self.inter_page_delay_ms)
    }

    /// Parse `api_url`
    pub fn parsed_url(&self) -> Result<Url> {
        if self.api_url.trim().is_empty() {
            return Err(Error::missing_field("apiUrl"));
        }
        let url = Url::parse(self.api_url.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "apiUrl",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if url.host_str().is_none() {
            return Err(Error::invalid_value("apiUrl", "URL has no host"));
        }
        Ok(url)
    }

    /// Check the config before any network activity
    pub fn validate(&self) -> Result<()> {
        self.parsed_url()?;

        if self.enable_pagination && self.page_field().is_none() {
            return Err(Error::missing_field("pageField"));
        }

        if self.max_page_size == 0 {
            return Err(Error::invalid_value("maxPageSize", "must be positive"));
        }
        if self.page_size == 0 || self.page_size > self.max_page_size {
            return Err(Error::invalid_value(
                "pageSize",
                format!("must be between 1 and {}", self.max_page_size),
            ));
        }
        if self.step_size == Some(0) {
            return Err(Error::invalid_value("stepSize", "must be positive"));
        }
        if let Some(end) = self.end_page {
            if end < self.start_value() {
                return Err(Error::invalid_value(
                    "endPage",
                    format!("{end} is before the start value {}", self.start_value()),
                ));
            }
        }
        if self.max_pages == 0 {
            return Err(Error::invalid_value("maxPages", "must be positive"));
        }

        Ok(())
    }
}

/// Load a fetch config from a file.
///
/// `.yaml`/`.yml` files are parsed as YAML, everything else as JSON.
pub fn load_fetch_config(path: impl AsRef<Path>) -> Result<FetchConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read config file '{}': {e}",
            path.display()
        ))
    })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        FetchConfig::from_yaml_str(&content)
    } else {
        FetchConfig::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_parse_camel_case_json() {
        let json = r#"{
            "apiUrl": "https://api.example.com/items?userId=1",
            "method": "GET",
            "headers": {"Accept": "application/json"},
            "enablePagination": true,
            "paginationType": "offset",
            "pageField": "offset",
            "pageSize": 50,
            "totalField": "meta.total",
            "dataPath": "data.items"
        }"#;

        let config = FetchConfig::from_json_str(json).unwrap();
        assert_eq!(config.api_url, "https://api.example.com/items?userId=1");
        assert_eq!(config.pagination_type, PaginationType::Offset);
        assert_eq!(config.page_field(), Some("offset"));
        assert_eq!(config.page_size, 50);
        assert_eq!(config.total_field.as_deref(), Some("meta.total"));
        assert_eq!(config.data_path.as_deref(), Some("data.items"));
        assert_eq!(config.headers.get("Accept").map(String::as_str), Some("application/json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = FetchConfig::from_json_str(r#"{"apiUrl": "https://x.test/"}"#).unwrap();
        assert_eq!(config.method, Method::GET);
        assert!(!config.enable_pagination);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_page_size, 1000);
        assert_eq!(config.size_field(), Some("limit"));
        assert_eq!(config.inter_page_delay(), Duration::from_millis(100));
        assert_eq!(config.pagination_synonyms.len(), 5);
        assert_eq!(config.start_value(), 1);
        assert_eq!(config.step(), 1);
    }

    #[test]
    fn test_null_size_field_disables_size_param() {
        let config =
            FetchConfig::from_json_str(r#"{"apiUrl": "https://x.test/", "sizeField": null}"#)
                .unwrap();
        assert_eq!(config.size_field(), None);
    }

    #[test]
    fn test_offset_defaults() {
        let config = FetchConfig::new("https://x.test/")
            .with_offset_pagination("offset")
            .with_page_size(25);
        assert_eq!(config.start_value(), 0);
        assert_eq!(config.step(), 25);

        let config = config.with_step_size(10);
        assert_eq!(config.step(), 10);
    }

    #[test]
    fn test_offset_ignores_page_start_value() {
        let json = r#"{
            "apiUrl": "https://x.test/",
            "enablePagination": true,
            "paginationType": "offset",
            "pageField": "offset",
            "pageFieldStartValue": 1,
            "endPage": 0
        }"#;
        let config = FetchConfig::from_json_str(json).unwrap();
        assert_eq!(config.start_value(), 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r"
apiUrl: https://api.example.com/list
enablePagination: true
pageField: page
pageFieldStartValue: 0
endPage: 4
paginationSynonyms: [page, p]
";
        let config = FetchConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.start_value(), 0);
        assert_eq!(config.end_page, Some(4));
        assert_eq!(config.pagination_synonyms, vec!["page", "p"]);
    }

    #[test]
    fn test_validate_missing_page_field() {
        let mut config = FetchConfig::new("https://x.test/");
        config.enable_pagination = true;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "pageField"));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        config.page_field = Some("   ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_url_is_configuration_error() {
        let err = FetchConfig::new("not a url").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = FetchConfig::new("ftp://files.test/x").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));

        let err = FetchConfig::new("").validate().unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { .. }));
    }

    #[test]
    fn test_validate_page_size_bounds() {
        let config = FetchConfig::new("https://x.test/").with_page_size(0);
        assert!(config.validate().is_err());

        let config = FetchConfig::new("https://x.test/").with_page_size(5000);
        assert!(config.validate().is_err());

        let config = FetchConfig::new("https://x.test/").with_page_size(1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_end_before_start() {
        let config = FetchConfig::new("https://x.test/")
            .with_page_pagination("page", 3)
            .with_end_page(2);
        assert!(matches!(
            config.validate().unwrap_err(),
            Error::InvalidConfigValue { ref field, .. } if field == "endPage"
        ));
    }

    #[test]
    fn test_validate_zero_step() {
        let config = FetchConfig::new("https://x.test/")
            .with_page_pagination("page", 1)
            .with_step_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_fetch_config_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("source.json");
        let mut file = fs::File::create(&json_path).unwrap();
        writeln!(file, r#"{{"apiUrl": "https://x.test/a", "pageSize": 20}}"#).unwrap();
        let config = load_fetch_config(&json_path).unwrap();
        assert_eq!(config.page_size, 20);

        let yaml_path = dir.path().join("source.yml");
        fs::write(&yaml_path, "apiUrl: https://x.test/b\nmethod: post\n").unwrap();
        let config = load_fetch_config(&yaml_path).unwrap();
        assert_eq!(config.api_url, "https://x.test/b");
        assert_eq!(config.method, Method::POST);

        let err = load_fetch_config(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
