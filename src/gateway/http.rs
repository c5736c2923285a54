//! Remote backend over HTTP.

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde_json::Value;
use url::Url;

use super::backend::{Backend, BackendRequest, BackendResponse, HttpMethod, RequestBody, TransportError};
use crate::errors::AppError;

/// Forwards each request once to the configured base URL.
pub struct HttpBackend {
    http: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        // A trailing slash keeps the last base segment when joining routes.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| AppError::Config(format!("Invalid backend URL {}: {}", base_url, e)))?;

        let http = Client::builder().build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append `path` segment by segment. Segments are percent-encoded and
    /// dot-segments are refused, so a route never leaves its resource.
    fn url(&self, path: &str) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TransportError(format!("Backend URL {} cannot carry routes", self.base_url)))?;
            segments.pop_if_empty();
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                if segment == "." || segment == ".." {
                    return Err(TransportError(format!("Invalid route {}", path)));
                }
                segments.push(segment);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse, TransportError> {
        let url = self.url(&request.path)?;

        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
            HttpMethod::Put => self.http.put(url),
            HttpMethod::Delete => self.http.delete(url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(body) => {
                let mut form = multipart::Form::new();
                for (name, value) in body.fields {
                    form = form.text(name, value);
                }
                for file in body.files {
                    let part = multipart::Part::bytes(file.bytes)
                        .file_name(file.file_name)
                        .mime_str(&file.content_type)
                        .map_err(|e| TransportError(format!("Invalid content type: {}", e)))?;
                    form = form.part(file.field, part);
                }
                builder.multipart(form)
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError(format!("Failed to read response body: {}", e)))?;

        Ok(BackendResponse::new(status, parse_body(&text)))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_url_keeps_prefix() {
        let backend = HttpBackend::new("http://backend.local/api/v1").unwrap();
        assert_eq!(
            backend.url("/system-configurations").unwrap().as_str(),
            "http://backend.local/api/v1/system-configurations"
        );
        assert_eq!(
            backend.url("roles/r-1").unwrap().as_str(),
            "http://backend.local/api/v1/roles/r-1"
        );
    }

    #[test]
    fn test_route_segments_stay_inside_the_base() {
        let backend = HttpBackend::new("http://backend.local/api").unwrap();
        assert!(backend.url("roles/../permissions/p-1").is_err());
        assert_eq!(
            backend.url("roles/a b%").unwrap().as_str(),
            "http://backend.local/api/roles/a%20b%25"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(HttpBackend::new("not a url"), Err(AppError::Config(_))));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body(r#"{"data": 1}"#), json!({"data": 1}));
        assert_eq!(parse_body("Bad Gateway"), json!("Bad Gateway"));
    }
}
