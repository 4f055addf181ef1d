use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::{
    domain::{Quote, RawEntry, RawRecord},
    errors::{QuoteError, Result},
};

pub const DEFAULT_REMOTE_URL: &str = "https://jsonplaceholder.typicode.com/posts";

/// Remote source of truth for quotes.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Fetches at most `limit` raw records from the start of the remote collection.
    ///
    /// A record that cannot be decoded is returned as an `Err` entry so the rest
    /// of the batch still applies.
    async fn fetch_batch(&self, limit: usize) -> Result<Vec<RawEntry>>;

    /// Publishes a locally created quote and returns the record the remote echoed back.
    async fn post_record(&self, quote: &Quote) -> Result<RawRecord>;
}

/// Gateway speaking JSON over HTTP to a `/posts` style resource.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    url: String,
}

impl HttpGateway {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quotebook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| QuoteError::Gateway(format!("failed to build HTTP client: {}", err)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn fetch_batch(&self, limit: usize) -> Result<Vec<RawEntry>> {
        let mut values: Vec<Value> = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        values.truncate(limit);
        debug!(url = %self.url, count = values.len(), "fetched remote batch");
        Ok(values.into_iter().map(RawRecord::from_value).collect())
    }

    async fn post_record(&self, quote: &Quote) -> Result<RawRecord> {
        let record = self
            .client
            .post(&self.url)
            .json(&RawRecord::from(quote))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(url = %self.url, "posted quote");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Serves a single HTTP response with `body` and returns the URL to fetch.
    async fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = socket.read(&mut buf).await.expect("read request");
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            socket.shutdown().await.ok();
        });
        format!("http://{addr}/posts")
    }

    #[test]
    fn http_gateway_keeps_configured_url() {
        let gateway = HttpGateway::new("http://localhost:9/posts", Duration::from_secs(1))
            .expect("client");
        assert_eq!(gateway.url(), "http://localhost:9/posts");
    }

    #[tokio::test]
    async fn unreachable_remote_surfaces_gateway_error() {
        let gateway = HttpGateway::new("http://127.0.0.1:9/posts", Duration::from_millis(500))
            .expect("client");
        let err = gateway.fetch_batch(10).await.unwrap_err();
        assert!(matches!(err, QuoteError::Gateway(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn off_type_record_is_isolated_from_the_rest_of_the_batch() {
        let url = serve_once(
            r#"[{"id":1,"title":"good one"},{"id":2,"title":42},{"id":3,"title":"good two"},{"id":4,"title":"past limit"}]"#,
        )
        .await;
        let gateway = HttpGateway::new(url, Duration::from_secs(5)).expect("client");

        let entries = gateway.fetch_batch(3).await.expect("batch decodes");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], Ok(RawRecord { id: Some(1), ..RawRecord::titled("good one") }));
        assert!(matches!(entries[1], Err(QuoteError::MalformedRecord(_))));
        assert_eq!(entries[2], Ok(RawRecord { id: Some(3), ..RawRecord::titled("good two") }));
    }

    #[tokio::test]
    async fn non_array_body_fails_the_whole_fetch() {
        let url = serve_once(r#"{"error":"nope"}"#).await;
        let gateway = HttpGateway::new(url, Duration::from_secs(5)).expect("client");
        let err = gateway.fetch_batch(10).await.unwrap_err();
        assert!(matches!(err, QuoteError::Gateway(_)), "got {err:?}");
    }
}
