//! Request parameters and bound handler arguments.
//!
//! A [`RequestParams`] set is built once per request. It holds every query-string
//! and form parameter plus two reserved entries: `request`, the raw [`RequestInfo`], and
//! `form`, the parsed [`FormData`]. The binder selects a subset of it as the
//! [`Args`] a handler method receives.
use std::{collections::HashMap, sync::Arc};

use http::{HeaderMap, Method};

use crate::core::error::DispatchError;

/// Reserved parameter name under which the raw request is injected.
pub const REQUEST_PARAM: &str = "request";
/// Reserved parameter name under which the parsed form body is injected.
pub const FORM_PARAM: &str = "form";

/// Parsed form body, urlencoded or the text fields of a multipart body. Keeps
/// every value in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_urlencoded(body: &[u8]) -> Self {
        let fields = url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { fields }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// First value submitted for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The inbound request as seen by handlers that opt into raw access.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    form: Arc<FormData>,
}

impl RequestInfo {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        query: Option<String>,
        headers: HeaderMap,
        form: FormData,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            query,
            headers,
            form: Arc::new(form),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    /// Query-string parameters in order, repeats included.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A single injectable value.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Text(String),
    Request(Arc<RequestInfo>),
    Form(Arc<FormData>),
}

impl ParamValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// Every value a request makes available for binding.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    values: HashMap<String, ParamValue>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set for one request: query parameters, then form fields (the
    /// first value seen for a name wins), then the reserved `request` and `form`
    /// entries, which take precedence over anything of the same name.
    pub fn from_request(request: RequestInfo) -> Self {
        let mut values = HashMap::new();
        for (key, value) in request.query_pairs() {
            values.entry(key).or_insert(ParamValue::Text(value));
        }
        for (key, value) in request.form.iter() {
            values
                .entry(key.to_string())
                .or_insert_with(|| ParamValue::Text(value.to_string()));
        }
        let form = request.form.clone();
        values.insert(REQUEST_PARAM.to_string(), ParamValue::Request(Arc::new(request)));
        values.insert(FORM_PARAM.to_string(), ParamValue::Form(form));
        Self { values }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Arguments bound for one handler call.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: HashMap<String, ParamValue>,
}

impl Args {
    pub(crate) fn from_values(values: HashMap<String, ParamValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_text)
    }

    /// Text value of `name`, or a BadRequest naming it.
    pub fn require(&self, name: &str) -> Result<&str, DispatchError> {
        match self.get(name) {
            None => Err(DispatchError::bad_request(format!(
                "Parameter \"{name}\" not provided"
            ))),
            Some(value) => value.as_text().ok_or_else(|| {
                DispatchError::bad_request(format!("Parameter \"{name}\" must be a text value"))
            }),
        }
    }

    pub fn request(&self) -> Option<&RequestInfo> {
        match self.get(REQUEST_PARAM) {
            Some(ParamValue::Request(r)) => Some(r.as_ref()),
            _ => None,
        }
    }

    pub fn form(&self) -> Option<&FormData> {
        match self.get(FORM_PARAM) {
            Some(ParamValue::Form(f)) => Some(f.as_ref()),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
