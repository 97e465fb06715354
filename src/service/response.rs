use crate::error::{ErrorResponse, ODataError, ODataResult};
use crate::media_type::APPLICATION_JSON;
use crate::transaction::REQUEST_ID_HEADER;
use http::{Response, StatusCode};
use serde_json::Value;

/// Body of a [`ServiceResponse`]
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
}

/// Outcome of handling one request, independent of any HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    status: StatusCode,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
    body: ResponseBody,
    request_id: String,
}

impl ServiceResponse {
    pub fn new(status: StatusCode, body: ResponseBody, request_id: impl Into<String>) -> Self {
        Self {
            status,
            content_type: None,
            headers: Vec::new(),
            body,
            request_id: request_id.into(),
        }
    }

    pub fn no_content(request_id: impl Into<String>) -> Self {
        Self::new(StatusCode::NO_CONTENT, ResponseBody::Empty, request_id)
    }

    /// Protocol error body with the error's status
    pub fn from_error(error: &ODataError, request_id: impl Into<String>) -> Self {
        let body = serde_json::to_value(ErrorResponse::from(error)).unwrap_or_else(|_| {
            serde_json::json!({"error": {"code": error.code(), "message": error.message()}})
        });
        Self::new(error.status(), ResponseBody::Json(body), request_id)
            .with_content_type(APPLICATION_JSON)
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// First header with this name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// The JSON body, if there is one
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The text body, if there is one
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The raw body bytes, if the body is binary
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.body {
            ResponseBody::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Convert into an `http` response for the hosting server.
    ///
    /// # Errors
    ///
    /// `InternalServerError("invalid_response")` if a header is not a valid
    /// HTTP header.
    pub fn into_http(self) -> ODataResult<Response<Vec<u8>>> {
        let mut builder = Response::builder()
            .status(self.status)
            .header(REQUEST_ID_HEADER, &self.request_id);

        if let Some(content_type) = &self.content_type {
            builder = builder.header(http::header::CONTENT_TYPE, content_type);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        let body = match self.body {
            ResponseBody::Empty => Vec::new(),
            ResponseBody::Json(value) => value.to_string().into_bytes(),
            ResponseBody::Text(text) => text.into_bytes(),
            ResponseBody::Binary(bytes) => bytes,
        };

        builder
            .body(body)
            .map_err(|e| ODataError::internal("invalid_response", e.to_string()))
    }
}
