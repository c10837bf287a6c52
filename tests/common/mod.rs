use std::time::Duration;

/// HTTP client for talking to the mock server.
///
/// Proxies are disabled so that environment proxy settings never intercept
/// requests to `localhost`.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}

/// Status code returned by the embedded server for requests matching no stub
#[allow(dead_code)]
pub const UNMATCHED_STATUS: u16 = 501;
