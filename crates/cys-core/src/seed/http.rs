//! Seed documents served over HTTP.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::SeedSource;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Fetches seed documents from `<base_url><location>`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpSeedSource {
    client: Client,
    base_url: String,
}

impl HttpSeedSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, location: &str) -> String {
        format!("{}/{}", self.base_url, location.trim_start_matches('/'))
    }
}

impl SeedSource for HttpSeedSource {
    async fn fetch_document(&self, location: &str) -> Result<Option<String>> {
        let url = self.url_for(location);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("Status {} from {}", status, url);
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;
        debug!(%url, bytes = body.len(), "Seed document fetched");
        Ok(Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use crate::resource::ResourceType;
    use crate::seed::seed_collection;

    /// Serve canned `(path, status line, body)` responses; anything else is 404.
    async fn serve(routes: &[(&'static str, &'static str, &'static str)]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Arc<Vec<_>> = Arc::new(routes.to_vec());

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);
                    let path = request.split_whitespace().nth(1).unwrap_or("/");
                    let (status, body) = routes
                        .iter()
                        .find(|(route, _, _)| *route == path)
                        .map(|(_, status, body)| (*status, *body))
                        .unwrap_or(("404 Not Found", ""));
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });

        format!("http://{}", addr)
    }

    #[test]
    fn test_url_for_joins_cleanly() {
        let source = HttpSeedSource::new("http://localhost:5173/").unwrap();
        assert_eq!(
            source.url_for("/public/data/events.json"),
            "http://localhost:5173/public/data/events.json"
        );
    }

    #[tokio::test]
    async fn test_fetch_statuses() {
        let base = serve(&[
            ("/data/events.json", "200 OK", r#"[{"id":"event_http"}]"#),
            ("/broken.json", "500 Internal Server Error", "oops"),
        ])
        .await;
        let source = HttpSeedSource::new(&base).unwrap();

        let found = source.fetch_document("/data/events.json").await.unwrap();
        assert_eq!(found.as_deref(), Some(r#"[{"id":"event_http"}]"#));

        assert_eq!(source.fetch_document("/missing.json").await.unwrap(), None);

        let err = source.fetch_document("/broken.json").await.unwrap_err();
        assert!(err.to_string().contains("500"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_server_errors_fall_through_to_next_candidate() {
        let base = serve(&[
            ("/public/data/events.json", "503 Service Unavailable", ""),
            ("/events.json", "200 OK", r#"[{"id":"event_http"}]"#),
        ])
        .await;
        let source = HttpSeedSource::new(&base).unwrap();
        let resource = ResourceType::from_path("events").unwrap();

        let (_, records) = seed_collection(&source, &resource, chrono::Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), Some("event_http"));
    }
}
