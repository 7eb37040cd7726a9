pub mod error;
pub mod pagination;
pub mod retry;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod transport;
pub mod types;

pub use error::{NaraError, Result};
pub use pagination::Pagination;
pub use retry::{get_with_retry, RetryPolicy};
pub use transport::{RawResponse, ReqwestTransport, Transport};
pub use types::{BidItem, Envelope, Page, SearchParams};

use std::time::Duration;

use tracing::{debug, warn};

/// PPS bid notice search for services (용역), the default endpoint.
pub const DEFAULT_BASE_URL: &str =
    "https://apis.data.go.kr/1230000/BidPublicInfoService05/getBidPblancListInfoServcPPSSrch";

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(20),
            retry: RetryPolicy::default(),
        }
    }
}

pub struct NaraClient {
    transport: Box<dyn Transport>,
    endpoint: String,
    retry: RetryPolicy,
}

impl NaraClient {
    pub fn new(service_key: &str, options: ClientOptions) -> Result<Self> {
        let transport = ReqwestTransport::new(options.timeout)?;
        Ok(Self::with_transport(
            service_key,
            &options.base_url,
            options.retry,
            transport,
        ))
    }

    pub fn with_transport(
        service_key: &str,
        base_url: &str,
        retry: RetryPolicy,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            transport: Box::new(transport),
            endpoint: endpoint_with_key(base_url, service_key),
            retry,
        }
    }

    /// Fetch one page of search results.
    ///
    /// Asks for JSON with `_type=json`. Some gateway revisions answer that
    /// spelling with a 5xx "Unexpected" error, so once the retry budget is
    /// spent on such a response the request is repeated with `type=json`.
    pub async fn fetch_page(&self, params: &SearchParams) -> Result<Page> {
        let base = params.to_query();

        let resp = match self.get(&base, "_type", "URLKey+_type").await {
            Ok(resp) => resp,
            Err(e) if e.is_unexpected_format() => {
                warn!(error = %e, "Upstream rejected _type, retrying with type");
                self.get(&base, "type", "URLKey+type").await?
            }
            Err(e) => return Err(e),
        };

        if resp.status != 200 {
            return Err(NaraError::Api {
                status: resp.status,
                message: retry::preview(&resp.body),
            });
        }

        let page = Envelope::parse(&resp.body)?.into_page()?;
        debug!(
            page_no = params.page_no,
            total_count = ?page.total_count,
            items = page.items.len(),
            "Fetched bid notice page"
        );
        Ok(page)
    }

    async fn get(&self, base: &[(String, String)], format_key: &str, label: &str) -> Result<RawResponse> {
        let mut query = base.to_vec();
        query.push((format_key.to_string(), "json".to_string()));
        get_with_retry(self.transport.as_ref(), &self.endpoint, &query, &self.retry, label).await
    }
}

/// Attach the credential to the URL itself, encoded exactly once.
///
/// Portal keys are handed out both raw and pre-encoded; decoding first means
/// either form ends up single-encoded.
fn endpoint_with_key(base_url: &str, service_key: &str) -> String {
    let raw = service_key.trim();
    let decoded = urlencoding::decode(raw)
        .map(|k| k.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    format!("{}?serviceKey={}", base_url, urlencoding::encode(&decoded))
}
