use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};

use crate::error::TellerKitError;

/// A simple wrapper on an HTTP client for making requests. Sets sensible
/// defaults such as timeouts, user-agent & ensuring HTTPS.
///
/// No retry middleware is applied: a failed identity call is treated as a
/// terminal outcome by every caller in this crate, so transparently
/// re-issuing requests here would change session semantics.
pub struct Request {
    client: reqwest::Client,
    timeout: Duration,
}

impl Request {
    /// Initializes a new `Request` instance.
    pub(crate) fn new() -> Self {
        let client = reqwest::Client::new();
        let timeout = Duration::from_secs(5);
        Self { client, timeout }
    }

    /// Creates a request builder with defaults applied.
    pub(crate) fn req(&self, method: Method, url: &str) -> RequestBuilder {
        #[cfg(not(test))]
        assert!(url.starts_with("https"));

        self.client.request(method, url).timeout(self.timeout).header(
            "User-Agent",
            format!("tellerkit-core/{}", env!("CARGO_PKG_VERSION")),
        )
    }

    /// Creates a GET request builder with defaults applied.
    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.req(Method::GET, url)
    }

    /// Creates a POST request builder with defaults applied.
    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        self.req(Method::POST, url)
    }

    /// Creates a PUT request builder with defaults applied.
    pub(crate) fn put(&self, url: &str) -> RequestBuilder {
        self.req(Method::PUT, url)
    }

    /// Sends a request built by `req`/`get`/`post`/`put`, converting any
    /// connection-level failure into [`TellerKitError::Transport`].
    pub(crate) async fn handle(
        &self,
        request_builder: RequestBuilder,
    ) -> Result<Response, TellerKitError> {
        let (client, request) = request_builder.build_split();
        let request = request.map_err(|err| TellerKitError::Transport {
            url: err
                .url()
                .map_or_else(|| "<unknown>".to_string(), ToString::to_string),
            error: format!("request build failed: {err}"),
        })?;
        let url = request.url().to_string();

        client
            .execute(request)
            .await
            .map_err(|err| TellerKitError::Transport {
                url,
                error: format!("request failed: {err}"),
            })
    }
}
