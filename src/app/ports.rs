use async_trait::async_trait;

use crate::error::Result;

/// Fetch side port: GET a URL and hand back status and body.
///
/// Implementations apply the shared header set and per-request timeout;
/// `extra_headers` carries per-source additions such as `Referer`.
/// A non-2xx status is returned as data, not as an error, so adapters can
/// give particular codes their own meaning.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str, extra_headers: &[(&str, &str)]) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}
