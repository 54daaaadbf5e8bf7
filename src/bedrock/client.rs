//! Blocking `bedrock-runtime` client with SigV4 signing.

use super::credentials::AwsCredentials;
use super::sigv4::{SigningRequest, sign};
use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "bedrock";

pub struct BedrockRuntimeClient {
    http: Client,
    endpoint: reqwest::Url,
    region: String,
    credentials: AwsCredentials,
}

impl BedrockRuntimeClient {
    /// `endpoint_url` overrides `https://bedrock-runtime.{region}.amazonaws.com`.
    pub fn new(
        region: &str,
        endpoint_url: Option<&str>,
        credentials: AwsCredentials,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!region.trim().is_empty(), "missing AWS region");
        let endpoint = match endpoint_url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{region}.amazonaws.com"),
        };
        let endpoint = reqwest::Url::parse(&endpoint)
            .with_context(|| format!("invalid Bedrock endpoint '{endpoint}'"))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Bedrock HTTP client")?;
        debug!("Created Bedrock client for region: {region} ({endpoint})");
        Ok(Self {
            http,
            endpoint,
            region: region.to_string(),
            credentials,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// `POST /model/{model_id}/invoke`
    pub fn invoke_model(&self, model_id: &str, body: &Value) -> anyhow::Result<Value> {
        self.post_json(&model_path(model_id, "invoke"), body)
    }

    /// `POST /model/{model_id}/converse`
    pub fn converse(&self, model_id: &str, body: &Value) -> anyhow::Result<Value> {
        self.post_json(&model_path(model_id, "converse"), body)
    }

    fn post_json(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let payload = serde_json::to_vec(body)?;
        let base_path = self.endpoint.path().trim_end_matches('/');
        let full_path = format!("{base_path}{path}");
        let url = format!("{}{full_path}", self.endpoint.origin().ascii_serialization());

        let host = match (self.endpoint.host_str(), self.endpoint.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => anyhow::bail!("Bedrock endpoint has no host"),
        };
        let signed = sign(
            &SigningRequest {
                method: "POST",
                host: &host,
                path: &full_path,
                query: "",
                payload: &payload,
            },
            &self.credentials,
            &self.region,
            SERVICE,
            chrono::Utc::now(),
        );

        let mut request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header("accept", "application/json")
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("x-amz-security-token", token);
        }

        let resp = request
            .body(payload)
            .send()
            .with_context(|| format!("POST {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            let error_type = resp
                .headers()
                .get("x-amzn-errortype")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(':').next().unwrap_or(v).to_string());
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
                .unwrap_or(body);
            match error_type {
                Some(kind) => anyhow::bail!("Bedrock request failed ({status}) {kind}: {message}"),
                None => anyhow::bail!("Bedrock request failed ({status}): {message}"),
            }
        }
        resp.json().context("failed to parse Bedrock response")
    }
}

fn model_path(model_id: &str, action: &str) -> String {
    format!("/model/{}/{action}", urlencoding::encode(model_id))
}
