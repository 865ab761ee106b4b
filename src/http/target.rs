//! Request targets
//!
//! Splits a configured endpoint URL into its base and the query string the
//! caller embedded in it. The embedded query is kept byte-for-byte and
//! re-applied to every page request, with extra parameters appended after it.

use crate::error::Result;
use url::form_urlencoded;
use url::Url;

/// An endpoint with its caller-supplied query string preserved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    base: Url,
    raw_query: Option<String>,
    preserved: Vec<(String, String)>,
}

impl RequestTarget {
    /// Parse an endpoint URL
    pub fn parse(api_url: &str) -> Result<Self> {
        let url = Url::parse(api_url.trim())?;
        Ok(Self::from_url(url))
    }

    /// Build a target from an already parsed URL
    pub fn from_url(mut url: Url) -> Self {
        let raw_query = url.query().filter(|q| !q.is_empty()).map(ToString::to_string);
        let preserved = raw_query
            .as_deref()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        url.set_query(None);
        url.set_fragment(None);

        Self {
            base: url,
            raw_query,
            preserved,
        }
    }

    /// URL without any query string
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Parameters that were embedded in the configured URL, in order
    pub fn preserved_params(&self) -> &[(String, String)] {
        &self.preserved
    }

    /// Whether the embedded query already has `name` (case-insensitive)
    pub fn has_param(&self, name: &str) -> bool {
        self.preserved
            .iter()
            .any(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// First embedded parameter matching any of `names`
    pub fn find_any_param<'a, I>(&self, names: I) -> Option<&str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let names: Vec<&str> = names.into_iter().collect();
        self.preserved
            .iter()
            .map(|(key, _)| key.as_str())
            .find(|key| names.iter().any(|name| key.eq_ignore_ascii_case(name)))
    }

    /// Full URL: embedded query first, then `extra` appended in order
    pub fn url_with(&self, extra: &[(String, String)]) -> Url {
        let mut query = self.raw_query.clone().unwrap_or_default();

        if !extra.is_empty() {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(extra.iter())
                .finish();
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(&encoded);
        }

        let mut url = self.base.clone();
        url.set_query((!query.is_empty()).then_some(query.as_str()));
        url
    }
}
