use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::backend::{MockitoBackend, StubBackend};
use crate::error::MockHttpError;
use crate::mapping;
use crate::options::ServiceOptions;
use crate::rule::StubRule;
use crate::template::TemplateContext;

/// In-process HTTP server answering with stubbed responses.
///
/// Each instance owns its own server and port. Registration methods take
/// `&mut self`; issue them before the client under test starts sending the
/// requests they affect.
///
/// ```no_run
/// # async fn demo() -> Result<(), mock_http_service::MockHttpError> {
/// use mock_http_service::MockHttpService;
///
/// let mut service = MockHttpService::start().await?;
/// service.stub("GET", "/batches/0", 200, r#"{"id": 0, "url": "http://localhost:${port}/"}"#).await?;
/// let url = service.complete_url("/batches/0");
/// # Ok(())
/// # }
/// ```
pub struct MockHttpService<B: StubBackend = MockitoBackend> {
    backend: B,
    rules: Vec<StubRule>,
}

impl MockHttpService<MockitoBackend> {
    /// Start a server on an ephemeral port
    pub async fn start() -> Result<Self, MockHttpError> {
        Self::start_with_options(ServiceOptions::ephemeral()).await
    }

    /// Start a server on an ephemeral port and register every mapping file
    /// found in `dir`
    pub async fn from_mappings(dir: impl AsRef<Path>) -> Result<Self, MockHttpError> {
        let mut service = Self::start().await?;
        service.load_mappings(dir).await?;
        Ok(service)
    }
}

impl<B: StubBackend> MockHttpService<B> {
    /// Start a server with explicit options
    pub async fn start_with_options(options: ServiceOptions) -> Result<Self, MockHttpError> {
        let backend = B::start(&options).await?;
        Ok(Self {
            backend,
            rules: Vec::new(),
        })
    }

    /// Port the server is bound to
    pub fn port(&self) -> u16 {
        self.backend.port()
    }

    /// Template variables for the current port
    pub fn template_context(&self) -> TemplateContext {
        TemplateContext::for_port(self.port())
    }

    /// Rules currently registered, oldest first
    pub fn rules(&self) -> &[StubRule] {
        &self.rules
    }

    /// Access the underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Answer `method url` with `status` and the rendered `response`
    pub async fn stub(
        &mut self,
        method: &str,
        url: &str,
        status: u16,
        response: &str,
    ) -> Result<(), MockHttpError> {
        self.register(StubRule::new(method, url, status, response)).await
    }

    /// Like [`stub`](Self::stub), also sending exactly the given headers
    pub async fn stub_with_header(
        &mut self,
        method: &str,
        url: &str,
        status: u16,
        response: &str,
        headers: &HashMap<String, String>,
    ) -> Result<(), MockHttpError> {
        let rule = StubRule::new(method, url, status, response)
            .with_headers(headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        self.register(rule).await
    }

    /// Like [`stub`](Self::stub), matching only requests whose body is
    /// JSON-equal to `request_body_json`
    pub async fn stub_with_body(
        &mut self,
        method: &str,
        url: &str,
        request_body_json: &str,
        status: u16,
        response: &str,
    ) -> Result<(), MockHttpError> {
        let rule =
            StubRule::new(method, url, status, response).with_json_body_text(request_body_json)?;
        self.register(rule).await
    }

    /// Validate and install `rule`, replacing any rule with the same request
    /// pattern
    pub async fn register(&mut self, mut rule: StubRule) -> Result<(), MockHttpError> {
        // rules loaded from mapping files bypass `StubRule::new`
        rule.request.method = rule.request.method.to_uppercase();
        rule.validate()?;

        let rendered_body = self.normalize_response(&rule.response.body);
        self.backend.register_rule(&rule, rendered_body).await?;

        let before = self.rules.len();
        self.rules.retain(|existing| existing.request != rule.request);
        if self.rules.len() != before {
            warn!(request = %rule.request, "Replaced previously registered stub");
        }
        self.rules.push(rule);

        Ok(())
    }

    /// Register every rule in `rules`, in order
    pub async fn register_all(
        &mut self,
        rules: impl IntoIterator<Item = StubRule>,
    ) -> Result<usize, MockHttpError> {
        let mut count = 0;
        for rule in rules {
            self.register(rule).await?;
            count += 1;
        }
        Ok(count)
    }

    /// Remove every registered rule
    pub async fn reset(&mut self) {
        self.backend.reset().await;
        self.rules.clear();
    }

    /// Replace each `${port}` in `template` with the bound port
    pub fn normalize_response(&self, template: &str) -> String {
        self.template_context().render(template)
    }

    /// Absolute URL on this server for `path`
    pub fn complete_url(&self, path: &str) -> String {
        format!(
            "http://localhost:{}/{}",
            self.port(),
            path.trim_start_matches('/')
        )
    }

    /// Register every mapping file in `dir`, returning how many were loaded
    pub async fn load_mappings(&mut self, dir: impl AsRef<Path>) -> Result<usize, MockHttpError> {
        let dir = dir.as_ref();
        let rules = mapping::load_mappings(dir).await?;
        let count = self.register_all(rules).await?;
        info!(dir = %dir.display(), count, "Loaded stub mappings");
        Ok(count)
    }

    /// Write the registered rules to `dir` as mapping files
    pub async fn save_mappings(&self, dir: impl AsRef<Path>) -> Result<usize, MockHttpError> {
        mapping::save_mappings(dir.as_ref(), &self.rules).await
    }

    /// Stop the server
    pub fn stop(self) {
        info!(port = self.port(), "Mock HTTP server stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::BodyPattern;
    use serde_json::json;

    /// In-memory backend recording what the service hands over
    struct RecordingBackend {
        port: u16,
        installed: Vec<(StubRule, String)>,
        resets: usize,
    }

    impl StubBackend for RecordingBackend {
        async fn start(options: &ServiceOptions) -> Result<Self, MockHttpError> {
            Ok(Self {
                port: if options.port == 0 { 40123 } else { options.port },
                installed: Vec::new(),
                resets: 0,
            })
        }

        fn port(&self) -> u16 {
            self.port
        }

        async fn register_rule(
            &mut self,
            rule: &StubRule,
            rendered_body: String,
        ) -> Result<(), MockHttpError> {
            self.installed.push((rule.clone(), rendered_body));
            Ok(())
        }

        async fn reset(&mut self) {
            self.installed.clear();
            self.resets += 1;
        }
    }

    async fn service() -> MockHttpService<RecordingBackend> {
        MockHttpService::start_with_options(ServiceOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_complete_url_strips_leading_slashes() {
        let service = service().await;
        assert_eq!(service.complete_url("/foo"), "http://localhost:40123/foo");
        assert_eq!(service.complete_url("foo"), "http://localhost:40123/foo");
        assert_eq!(service.complete_url("//foo"), "http://localhost:40123/foo");
        assert_eq!(service.complete_url(""), "http://localhost:40123/");
    }

    #[tokio::test]
    async fn test_fixed_port_is_reported() {
        let service: MockHttpService<RecordingBackend> =
            MockHttpService::start_with_options(ServiceOptions::with_port(9100))
                .await
                .unwrap();
        assert_eq!(service.port(), 9100);
        assert_eq!(service.normalize_response("${port}"), "9100");
    }

    #[tokio::test]
    async fn test_stub_renders_body_but_keeps_template() {
        let mut service = service().await;
        service.stub("get", "/a", 200, "hello ${port}").await.unwrap();

        let (rule, rendered) = &service.backend().installed[0];
        assert_eq!(rendered, "hello 40123");
        assert_eq!(rule.request.method, "GET");
        assert_eq!(service.rules()[0].response.body, "hello ${port}");
    }

    #[tokio::test]
    async fn test_stub_with_header_copies_headers() {
        let mut service = service().await;
        let headers = HashMap::from([
            ("X-Test".to_string(), "1".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ]);
        service
            .stub_with_header("GET", "/b", 201, "ok", &headers)
            .await
            .unwrap();

        let rule = &service.rules()[0];
        assert_eq!(rule.response.status, 201);
        assert_eq!(rule.response.headers.len(), 2);
        assert_eq!(rule.response.headers["X-Test"], "1");
    }

    #[tokio::test]
    async fn test_stub_with_body_parses_matcher() {
        let mut service = service().await;
        service
            .stub_with_body("POST", "/c", "{\"a\": 1}", 200, "matched")
            .await
            .unwrap();

        assert_eq!(
            service.rules()[0].request.body_patterns,
            vec![BodyPattern::EqualToJson(json!({"a": 1}))]
        );
    }

    #[tokio::test]
    async fn test_malformed_matcher_registers_nothing() {
        let mut service = service().await;
        let result = service
            .stub_with_body("POST", "/c", "not json", 200, "matched")
            .await;

        assert!(matches!(result, Err(MockHttpError::MalformedMatcher { .. })));
        assert!(service.rules().is_empty());
        assert!(service.backend().installed.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_rule_never_reaches_backend() {
        let mut service = service().await;
        let result = service.stub("GET", "relative", 200, "").await;

        assert!(matches!(result, Err(MockHttpError::InvalidUrl(_))));
        assert!(service.backend().installed.is_empty());
    }

    #[tokio::test]
    async fn test_reregistration_replaces_rule() {
        let mut service = service().await;
        service.stub("GET", "/a", 200, "first").await.unwrap();
        service.stub("GET", "/b", 200, "other").await.unwrap();
        service.stub("GET", "/a", 404, "second").await.unwrap();

        let rules = service.rules();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].request.url, "/b");
        assert_eq!(rules[1].response.body, "second");
        assert_eq!(rules[1].response.status, 404);
    }

    #[tokio::test]
    async fn test_body_rule_does_not_replace_plain_rule() {
        let mut service = service().await;
        service.stub("POST", "/c", 200, "any").await.unwrap();
        service
            .stub_with_body("POST", "/c", "{\"a\":1}", 200, "matched")
            .await
            .unwrap();

        assert_eq!(service.rules().len(), 2);
    }

    #[tokio::test]
    async fn test_lowercase_method_from_mapping_is_replaced() {
        let mut service = service().await;
        let loaded: StubRule = serde_json::from_value(json!({
            "request": {"method": "get", "url": "/a"},
            "response": {"status": 200, "body": "first"}
        }))
        .unwrap();
        service.register(loaded).await.unwrap();
        service.stub("GET", "/a", 200, "second").await.unwrap();

        let rules = service.rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].request.method, "GET");
        assert_eq!(rules[0].response.body, "second");
        assert_eq!(service.backend().installed[0].0.request.method, "GET");
    }

    #[tokio::test]
    async fn test_reset_clears_rules() {
        let mut service = service().await;
        service.stub("GET", "/a", 200, "").await.unwrap();
        service.reset().await;

        assert!(service.rules().is_empty());
        assert_eq!(service.backend().resets, 1);
    }

    #[tokio::test]
    async fn test_register_all_counts_rules() {
        let mut service = service().await;
        let count = service
            .register_all(vec![
                StubRule::new("GET", "/a", 200, ""),
                StubRule::new("DELETE", "/a", 204, ""),
            ])
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(service.backend().installed.len(), 2);
    }
}
