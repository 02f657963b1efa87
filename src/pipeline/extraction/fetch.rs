//! Downloads source documents before any extraction strategy runs.

use super::ExtractionError;
use crate::config;

/// Fallback when the URL path has no usable final segment.
const DEFAULT_FILENAME: &str = "document.pdf";

/// Wraps one pooled HTTP client for document downloads.
#[derive(Clone)]
pub struct DocumentFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

/// A downloaded document plus the filename derived from its URL.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl DocumentFetcher {
    pub fn new() -> Self {
        Self::with_timeout(config::DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            timeout_secs,
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedDocument, ExtractionError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.download_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Download(format!(
                "{url} returned status {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExtractionError::Download(e.to_string()))?;

        Ok(FetchedDocument {
            bytes: bytes.to_vec(),
            filename: filename_from_url(url),
        })
    }

    fn download_error(&self, e: reqwest::Error) -> ExtractionError {
        if e.is_timeout() {
            ExtractionError::Download(format!(
                "request timed out after {}s",
                self.timeout_secs
            ))
        } else {
            ExtractionError::Download(e.to_string())
        }
    }
}

impl Default for DocumentFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Last path segment of the URL with query/fragment stripped.
pub fn filename_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serve one HTTP response on an ephemeral port, then exit.
    async fn spawn_one_shot_http(status_line: &'static str, body: Vec<u8>) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let header = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn fetch_returns_bytes_and_filename() {
        let addr = spawn_one_shot_http("200 OK", b"%PDF-1.4 fake".to_vec()).await;
        let fetcher = DocumentFetcher::new();
        let doc = fetcher
            .fetch(&format!("http://{addr}/docs/certificate.pdf?sig=abc"))
            .await
            .unwrap();
        assert_eq!(doc.bytes, b"%PDF-1.4 fake");
        assert_eq!(doc.filename, "certificate.pdf");
    }

    #[tokio::test]
    async fn fetch_non_2xx_is_download_error() {
        let addr = spawn_one_shot_http("404 Not Found", b"gone".to_vec()).await;
        let fetcher = DocumentFetcher::new();
        let err = fetcher
            .fetch(&format!("http://{addr}/missing.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Download(_)));
    }

    #[tokio::test]
    async fn fetch_unreachable_host_is_download_error() {
        let fetcher = DocumentFetcher::new();
        // Port 1 is never listening locally.
        let err = fetcher
            .fetch("http://127.0.0.1:1/doc.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Download(_)));
    }

    #[test]
    fn filename_strips_query_and_fragment() {
        assert_eq!(
            filename_from_url("http://host/path/report.pdf?sig=1#page2"),
            "report.pdf"
        );
    }

    #[test]
    fn filename_defaults_on_trailing_slash() {
        assert_eq!(filename_from_url("http://host/docs/"), DEFAULT_FILENAME);
    }

    #[test]
    fn filename_keeps_plain_name() {
        assert_eq!(filename_from_url("scan.pdf"), "scan.pdf");
    }
}
