//! Per-request state.
//!
//! A [`Transaction`] wraps one HTTP request together with the service root it
//! was addressed to. It owns everything the pipeline needs to know about the
//! request: the decoded path segments, query parameters and parameter
//! aliases, `Prefer` preferences and the request body. It also collects the
//! small amount of response state operations are allowed to influence
//! (applied preferences and an overriding status code).
//!
//! Transactions are shared behind `Arc` between the segments of one request
//! and never outlive it.

use crate::error::{ODataError, ODataResult};
use crate::media_type::{self, MediaType};
use http::header::{self, AsHeaderName};
use http::{Method, Request, StatusCode};
use indexmap::IndexMap;
use log::debug;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Header carrying a caller supplied request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// System query option names, without their `$` prefix
pub const SYSTEM_QUERY_OPTIONS: [&str; 17] = [
    "apply",
    "compute",
    "count",
    "deltatoken",
    "expand",
    "filter",
    "format",
    "id",
    "index",
    "levels",
    "orderby",
    "schemaversion",
    "search",
    "select",
    "skip",
    "skiptoken",
    "top",
];

/// Whether `name` (with or without `$`) is a system query option
pub fn is_system_query_option(name: &str) -> bool {
    let name = name.strip_prefix('$').unwrap_or(name);
    SYSTEM_QUERY_OPTIONS
        .iter()
        .any(|option| option.eq_ignore_ascii_case(name))
}

/// Response state written by operations during execution
#[derive(Debug, Default)]
struct ResponseState {
    applied_preferences: IndexMap<String, String>,
    status: Option<StatusCode>,
}

/// One request travelling through the pipeline.
#[derive(Debug)]
pub struct Transaction {
    request: Request<Vec<u8>>,
    service_root: String,
    request_id: String,
    path: String,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    preferences: IndexMap<String, String>,
    response: Mutex<ResponseState>,
}

impl Transaction {
    /// Wrap a request addressed below `service_root`.
    ///
    /// # Errors
    ///
    /// `BadRequest("invalid_path")` if a path segment is not valid
    /// percent-encoded UTF-8.
    pub fn new(request: Request<Vec<u8>>, service_root: &str) -> ODataResult<Self> {
        let service_root = if service_root.ends_with('/') {
            service_root.to_string()
        } else {
            format!("{service_root}/")
        };

        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let path = relative_path(request.uri().path(), &service_root);
        let segments = split_segments(&path)
            .into_iter()
            .map(|segment| {
                percent_decode_str(segment)
                    .decode_utf8()
                    .map(|decoded| decoded.into_owned())
                    .map_err(|_| {
                        ODataError::bad_request(
                            "invalid_path",
                            format!("The path segment '{segment}' is not valid UTF-8"),
                        )
                    })
            })
            .collect::<ODataResult<Vec<_>>>()?;

        let query = request
            .uri()
            .query()
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();

        let preferences = parse_preferences(&request);

        debug!(
            "Transaction created for {} '{}' with {} segment(s) (request: '{}')",
            request.method(),
            path,
            segments.len(),
            request_id
        );

        Ok(Self {
            request,
            service_root,
            request_id,
            path,
            segments,
            query,
            preferences,
            response: Mutex::new(ResponseState::default()),
        })
    }

    pub fn request(&self) -> &Request<Vec<u8>> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Service root, always ending in `/`
    pub fn service_root(&self) -> &str {
        &self.service_root
    }

    /// Resource path relative to the service root, still percent-encoded
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Absolute URL of the addressed resource
    pub fn resource_url(&self) -> String {
        format!("{}{}", self.service_root, self.path)
    }

    pub fn header(&self, name: impl AsHeaderName) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    /// First value of a query parameter
    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn query_parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.query
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// A system query option given as `$name` or bare `name`
    pub fn system_query_option(&self, name: &str) -> Option<&str> {
        self.query_parameter(&format!("${name}"))
            .or_else(|| self.query_parameter(name))
    }

    /// Resolve an `@name` token to the value of the matching query parameter
    pub fn parameter_alias(&self, token: &str) -> Option<&str> {
        if !token.starts_with('@') {
            return None;
        }
        self.query_parameter(token)
    }

    /// Value supplied for an operation argument outside the segment.
    ///
    /// `@name` is tried first; the bare `name` is only accepted if it does not
    /// collide with a system query option.
    pub fn implicit_parameter_alias(&self, name: &str) -> Option<&str> {
        self.query_parameter(&format!("@{name}")).or_else(|| {
            if is_system_query_option(name) {
                None
            } else {
                self.query_parameter(name)
            }
        })
    }

    /// Value of a `Prefer` preference, e.g. `return` -> `minimal`
    pub fn preference(&self, name: &str) -> Option<&str> {
        self.preferences
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Record that a preference was honoured
    pub fn preference_applied(&self, name: &str, value: &str) {
        self.response_state()
            .applied_preferences
            .insert(name.to_string(), value.to_string());
    }

    pub fn applied_preferences(&self) -> Vec<(String, String)> {
        self.response_state()
            .applied_preferences
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// `Preference-Applied` header value, if any preference was applied
    pub fn preference_applied_header(&self) -> Option<String> {
        let state = self.response_state();
        if state.applied_preferences.is_empty() {
            return None;
        }
        Some(
            state
                .applied_preferences
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    /// Override the success status of the response, e.g. 201 for a create
    pub fn set_response_status(&self, status: StatusCode) {
        self.response_state().status = Some(status);
    }

    pub fn response_status(&self) -> Option<StatusCode> {
        self.response_state().status
    }

    pub fn body_bytes(&self) -> &[u8] {
        self.request.body()
    }

    pub fn has_body(&self) -> bool {
        !self.request.body().trim_ascii().is_empty()
    }

    /// Decoded JSON body; an empty body is `None`
    pub fn body(&self) -> ODataResult<Option<Value>> {
        if !self.has_body() {
            return Ok(None);
        }
        serde_json::from_slice(self.request.body())
            .map(Some)
            .map_err(|e| {
                ODataError::bad_request(
                    "invalid_json",
                    format!("The request body was not valid JSON: {e}"),
                )
            })
    }

    pub fn content_type(&self) -> Option<MediaType> {
        self.header(header::CONTENT_TYPE)?.parse().ok()
    }

    pub fn assert_content_type_json(&self) -> ODataResult<()> {
        match self.content_type() {
            Some(content_type) if content_type.is_json() => Ok(()),
            _ => Err(ODataError::not_acceptable(
                "not_json",
                "Content provided was not application/json",
            )),
        }
    }

    pub fn assert_method(&self, method: Method, message: &str) -> ODataResult<()> {
        if *self.method() == method {
            Ok(())
        } else {
            Err(ODataError::method_not_allowed("invalid_method", message))
        }
    }

    /// Requested representation: `$format` beats `Accept`
    pub fn requested_media_type(&self) -> Option<String> {
        if let Some(format) = self.system_query_option("format") {
            let format = match format {
                "json" => media_type::APPLICATION_JSON,
                "xml" => media_type::APPLICATION_XML,
                other => other,
            };
            return Some(format.to_string());
        }
        self.header(header::ACCEPT).map(str::to_string)
    }

    fn response_state(&self) -> MutexGuard<'_, ResponseState> {
        self.response.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn relative_path(request_path: &str, service_root: &str) -> String {
    let root_path = url::Url::parse(service_root)
        .map(|url| url.path().to_string())
        .unwrap_or_else(|_| "/".to_string());

    let relative = request_path
        .strip_prefix(root_path.as_str())
        .or_else(|| {
            let trimmed = root_path.trim_end_matches('/');
            if request_path == trimmed {
                Some("")
            } else {
                None
            }
        })
        .unwrap_or_else(|| request_path.trim_start_matches('/'));

    relative.to_string()
}

/// Split on `/` outside parentheses and single quotes; empty segments are
/// dropped
pub fn split_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut start = 0;

    for (index, c) in path.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            _ if in_quotes => {}
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                segments.push(&path[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    segments.push(&path[start..]);

    segments.retain(|segment| !segment.is_empty());
    segments
}

fn parse_preferences(request: &Request<Vec<u8>>) -> IndexMap<String, String> {
    let mut preferences = IndexMap::new();
    for value in request.headers().get_all(header::HeaderName::from_static("prefer")) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for preference in value.split(',') {
            // parameters after ';' are not used by any preference we honour
            let token = preference.split(';').next().unwrap_or_default().trim();
            if token.is_empty() {
                continue;
            }
            let (name, value) = token.split_once('=').unwrap_or((token, ""));
            let value = value.trim().trim_matches('"');
            preferences
                .entry(name.trim().to_ascii_lowercase())
                .or_insert_with(|| value.to_string());
        }
    }
    preferences
}
