//! Remote blob storage for uploaded wallet bundles.

use anyhow::Context;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::debug;

/// Object storage addressed by `(flow_id, filename)`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get_file(&self, flow_id: &str, filename: &str) -> anyhow::Result<Vec<u8>>;
}

/// Blob store served over HTTP as `GET {base_url}/{flow_id}/{filename}`.
pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBlobStore {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        anyhow::ensure!(!base_url.trim().is_empty(), "blob store base URL is required");
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build blob store HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn object_url(&self, flow_id: &str, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(flow_id),
            urlencoding::encode(filename)
        )
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn get_file(&self, flow_id: &str, filename: &str) -> anyhow::Result<Vec<u8>> {
        let url = self.object_url(flow_id, filename);
        debug!("Fetching wallet object {url}");
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await.with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            anyhow::bail!("blob store returned {status} for {flow_id}/{filename}: {body}");
        }
        let bytes = resp.bytes().await.context("failed to read blob body")?;
        Ok(bytes.to_vec())
    }
}

/// Drive a future to completion from synchronous code.
///
/// Inside a multi-threaded tokio runtime the worker is handed off with
/// `block_in_place`. Inside a current-thread runtime the future runs on a
/// scoped thread with its own runtime, since that runtime's only worker is
/// the one blocked here. Outside any runtime a private current-thread
/// runtime is spun up for the call.
pub fn run_until_complete<F, T>(future: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>> + Send,
    T: Send,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(future))
        }
        Ok(_) => std::thread::scope(|scope| {
            scope
                .spawn(|| block_on_private_runtime(future))
                .join()
                .map_err(|_| anyhow::anyhow!("remote fetch thread panicked"))?
        }),
        Err(_) => block_on_private_runtime(future),
    }
}

fn block_on_private_runtime<F, T>(future: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime for remote fetch")?
        .block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn run_until_complete_outside_runtime() {
        let value = run_until_complete(async { Ok::<_, anyhow::Error>(7) }).unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn run_until_complete_inside_multi_thread_runtime() {
        let value = run_until_complete(async { Ok::<_, anyhow::Error>("ok") }).unwrap();
        assert_eq!(value, "ok");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn run_until_complete_inside_current_thread_runtime() {
        let value = run_until_complete(async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok::<_, anyhow::Error>(42)
        })
        .unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn object_url_encodes_segments() {
        let store = HttpBlobStore::new("http://files.local/api/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            store.object_url("flow 1", "Wallet_DB.zip"),
            "http://files.local/api/flow%201/Wallet_DB.zip"
        );
    }

    #[tokio::test]
    async fn http_store_fetches_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/abc/wallet.zip"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04".to_vec()))
            .mount(&server)
            .await;

        let store =
            HttpBlobStore::new(&server.uri(), Some("s3cret".into()), Duration::from_secs(5)).unwrap();
        let bytes = store.get_file("abc", "wallet.zip").await.unwrap();
        assert_eq!(bytes, b"PK\x03\x04");
    }

    #[tokio::test]
    async fn http_store_surfaces_missing_objects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such key"))
            .mount(&server)
            .await;

        let store = HttpBlobStore::new(&server.uri(), None, Duration::from_secs(5)).unwrap();
        let err = store.get_file("abc", "missing.zip").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
