//! Embedded stub servers.
//!
//! [`StubBackend`] is the seam between [`crate::MockHttpService`] and the HTTP
//! test double that actually listens on the socket. [`MockitoBackend`] is the
//! production implementation on top of `mockito`.

use mockito::{Matcher, Mock, Request, Server, ServerOpts};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info};

use crate::error::MockHttpError;
use crate::options::{BIND_HOST, ServiceOptions};
use crate::rule::{BodyPattern, RequestPattern, StubRule};

/// A running HTTP server that serves registered stub rules
pub trait StubBackend: Sized {
    /// Bind and start the server
    fn start(options: &ServiceOptions) -> impl Future<Output = Result<Self, MockHttpError>>;

    /// Port the server is bound to
    fn port(&self) -> u16;

    /// Install `rule`, answering with `rendered_body` in place of the
    /// rule's body template. A rule with an identical request pattern
    /// replaces the earlier one.
    fn register_rule(
        &mut self,
        rule: &StubRule,
        rendered_body: String,
    ) -> impl Future<Output = Result<(), MockHttpError>>;

    /// Drop every installed rule
    fn reset(&mut self) -> impl Future<Output = ()>;
}

/// `mockito`-backed stub server.
///
/// Requests that match no rule get mockito's `501 Not Implemented`.
pub struct MockitoBackend {
    server: Server,
    mocks: Vec<(RequestPattern, Mock)>,
}

impl MockitoBackend {
    /// Base URL as reported by mockito, e.g. `http://127.0.0.1:51234`
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Request matcher requiring the body to be JSON-equal to every pattern.
    ///
    /// Empty or unparseable bodies are a non-match rather than an error.
    fn body_matcher(
        patterns: &[BodyPattern],
    ) -> Option<impl Fn(&Request) -> bool + Send + Sync + 'static> {
        if patterns.is_empty() {
            return None;
        }

        let expected: Vec<Value> = patterns
            .iter()
            .map(|pattern| match pattern {
                BodyPattern::EqualToJson(value) => value.clone(),
            })
            .collect();

        Some(move |request: &Request| {
            request
                .body()
                .ok()
                .and_then(|body| serde_json::from_slice::<Value>(body).ok())
                .is_some_and(|actual| expected.iter().all(|value| *value == actual))
        })
    }
}

impl StubBackend for MockitoBackend {
    async fn start(options: &ServiceOptions) -> Result<Self, MockHttpError> {
        // mockito panics when it cannot bind, so check fixed ports first
        if options.port != 0 {
            let listener = tokio::net::TcpListener::bind((BIND_HOST, options.port))
                .await
                .map_err(|source| MockHttpError::Bind {
                    address: options.bind_address(),
                    source,
                })?;
            drop(listener);
        }

        let opts = ServerOpts {
            host: BIND_HOST,
            port: options.port,
            ..Default::default()
        };
        let server = Server::new_with_opts_async(opts).await;
        info!(url = %server.url(), "Mock HTTP server started");

        Ok(Self {
            server,
            mocks: Vec::new(),
        })
    }

    fn port(&self) -> u16 {
        self.server.socket_address().port()
    }

    async fn register_rule(
        &mut self,
        rule: &StubRule,
        rendered_body: String,
    ) -> Result<(), MockHttpError> {
        let pattern = &rule.request;

        let mut index = 0;
        while index < self.mocks.len() {
            if self.mocks[index].0 == *pattern {
                let (_, replaced) = self.mocks.remove(index);
                replaced.remove_async().await;
            } else {
                index += 1;
            }
        }

        let mut mock = self
            .server
            .mock(pattern.method.as_str(), Matcher::Exact(pattern.path().to_string()))
            .match_query(Matcher::Exact(pattern.query().to_string()))
            .expect_at_least(0)
            .with_status(usize::from(rule.response.status));

        if let Some(body_matcher) = Self::body_matcher(&pattern.body_patterns) {
            mock = mock.match_request(body_matcher);
        }

        for (name, value) in &rule.response.headers {
            mock = mock.with_header(name.as_str(), value.as_str());
        }

        let mock = mock.with_body(rendered_body).create_async().await;
        debug!(request = %pattern, status = rule.response.status, "Installed stub");

        self.mocks.push((pattern.clone(), mock));
        Ok(())
    }

    async fn reset(&mut self) {
        self.mocks.clear();
        self.server.reset();
    }
}
