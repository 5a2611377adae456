//! Synthetic navigation requests
//!
//! A [`Request`] is built fresh for every navigation attempt from a
//! [`RequestInit`] (or a bare URL string) and the current document URL.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use strand_router::{BaseUrl, Routable};
use url::Url;

use crate::application::{Application, OwnerSlot};
use crate::error::CoreError;
use crate::Result;

/// Caller-supplied description of a request.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub url: Option<String>,
    pub method: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl RequestInit {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl From<&str> for RequestInit {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for RequestInit {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

impl From<&String> for RequestInit {
    fn from(url: &String) -> Self {
        Self::new(url.as_str())
    }
}

#[derive(Debug)]
pub struct Request {
    url: Url,
    method: String,
    /// Header names are stored lowercased
    headers: HashMap<String, String>,
    body: Option<Value>,
    /// Hostname of the document that issued the request
    hostname: String,
    query: Option<Map<String, Value>>,
    base_url: BaseUrl,
    owner: OwnerSlot,
}

impl Request {
    /// Build a request from `init`, resolving its URL against `location`.
    pub fn create(init: impl Into<RequestInit>, location: &str) -> Result<Self> {
        let init = init.into();

        let raw = init
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| CoreError::InvalidArgument("request must have a url".to_string()))?;

        let document = Url::parse(location)
            .map_err(|e| CoreError::InvalidUrl(format!("{}: {}", location, e)))?;
        let url = document
            .join(raw.trim())
            .map_err(|e| CoreError::InvalidUrl(format!("{}: {}", raw, e)))?;

        let method = init
            .method
            .filter(|m| !m.trim().is_empty())
            .map(|m| m.trim().to_uppercase())
            .unwrap_or_else(|| "GET".to_string());

        let mut headers: HashMap<String, String> = init
            .headers
            .into_iter()
            .map(|(name, value)| (name.to_lowercase(), value))
            .collect();
        headers.remove("referrer");
        headers.insert("referer".to_string(), location.to_string());

        Ok(Self {
            url,
            method,
            headers,
            body: init.body,
            hostname: document.host_str().unwrap_or_default().to_string(),
            query: None,
            base_url: BaseUrl::default(),
            owner: OwnerSlot::default(),
        })
    }

    /// Absolute request URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Read a header case-insensitively. `referer` and `referrer` are
    /// the same header.
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        match name.as_str() {
            "referer" | "referrer" => self
                .headers
                .get("referrer")
                .or_else(|| self.headers.get("referer"))
                .map(String::as_str),
            _ => self.headers.get(&name).map(String::as_str),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.get(name)
    }

    /// Parsed query string, once the query layer has run
    pub fn query(&self) -> Option<&Map<String, Value>> {
        self.query.as_ref()
    }

    pub(crate) fn parse_query(&mut self) {
        if self.query.is_none() {
            self.query = Some(crate::fields::collect_fields(self.url.query_pairs(), true));
        }
    }

    /// Application currently dispatching this request
    pub fn app(&self) -> Option<Arc<Application>> {
        self.owner.get().upgrade()
    }

    pub fn owner_id(&self) -> Option<String> {
        self.app().map(|app| app.id().to_string())
    }

    /// Look a setting up on the owning application.
    pub fn setting(&self, key: &str) -> Option<Value> {
        self.app().and_then(|app| app.get(key))
    }

    pub(crate) fn owner_slot(&self) -> &OwnerSlot {
        &self.owner
    }
}

impl Routable for Request {
    /// Pathname of the request URL, computed on every call.
    fn path(&self) -> String {
        self.url.path().to_string()
    }

    fn base_slot(&self) -> &BaseUrl {
        &self.base_url
    }
}
