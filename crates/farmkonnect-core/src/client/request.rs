//! Request building and the blocking libcurl transfer.

use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use super::error::ApiError;

/// Path prefix under which tRPC procedures are mounted.
pub const TRPC_PREFIX: &str = "/api/trpc/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

/// `{base}/api/trpc/{procedure}?{params}`; keeps any path prefix of `base`.
pub fn procedure_url(base: &str, procedure: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
    let mut url = Url::parse(base).map_err(ApiError::Url)?;
    let path = format!(
        "{}{}{}",
        url.path().trim_end_matches('/'),
        TRPC_PREFIX,
        procedure.trim_start_matches('/')
    );
    url.set_path(&path);
    url.set_query(None);
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

/// A fully built request, cheap to reuse across attempts.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    /// Header lines in `Name: value` form.
    pub headers: Vec<String>,
    pub body: Option<Vec<u8>>,
}

impl PreparedRequest {
    pub fn new(
        method: Method,
        url: Url,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Self, ApiError> {
        let mut headers = vec![
            "Content-Type: application/json".to_string(),
            "Accept: application/json".to_string(),
        ];
        if let Some(token) = token {
            headers.push(format!("Authorization: Bearer {}", token));
        }
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(ApiError::Json)?;
        Ok(Self {
            method,
            url,
            headers,
            body,
        })
    }

    /// Append a caller-supplied header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push(format!("{}: {}", name.trim(), value.trim()));
        self
    }
}

/// Raw status and body of one transfer.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Success bodies as JSON (empty → `Null`); non-2xx as `ApiError::Status`.
    pub fn into_json(self) -> Result<Value, ApiError> {
        if !(200..300).contains(&self.status) {
            return Err(ApiError::from_response(self.status, &self.body));
        }
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body).map_err(ApiError::Json)
    }
}

/// Performs one HTTP transfer.
///
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn perform(req: &PreparedRequest, timeout: Duration) -> Result<HttpResponse, curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(req.url.as_str())?;
    easy.custom_request(req.method.as_str())?;
    easy.follow_location(true)?;
    easy.connect_timeout(timeout.min(Duration::from_secs(15)))?;
    easy.timeout(timeout)?;

    let mut list = curl::easy::List::new();
    for h in &req.headers {
        list.append(h)?;
    }
    easy.http_headers(list)?;

    if let Some(body) = &req.body {
        easy.post_fields_copy(body)?;
    }

    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    Ok(HttpResponse {
        status: u16::try_from(status).unwrap_or(0),
        body,
    })
}
