//! Blocking HTTP transport built on `reqwest`.

use super::{error_message, ApiRequest, Body, Method, Transport};
use crate::error::ApiError;
use anyhow::{Context, Result};
use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn attach_body(builder: RequestBuilder, body: &Body) -> Result<RequestBuilder, ApiError> {
        Ok(match body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Multipart { fields, file } => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                if let Some(part) = file {
                    form = form
                        .file(part.field.clone(), &part.path)
                        .map_err(|e| ApiError::Upload {
                            path: part.path.display().to_string(),
                            reason: e.to_string(),
                        })?;
                }
                builder.multipart(form)
            }
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token);
        }
        builder = Self::attach_body(builder, &request.body)?;

        let response = builder
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &text),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        // Some endpoints answer with a bare string such as "Deleted".
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
