//! In-process stub HTTP server for testing HTTP clients.
//!
//! [`MockHttpService`] starts an embedded server on an ephemeral port,
//! registers request-to-response rules and substitutes `${port}` into
//! response bodies so that stubbed payloads can point back at the server.

pub mod backend;
pub mod error;
pub mod mapping;
pub mod options;
pub mod rule;
pub mod service;
pub mod template;

pub use backend::{MockitoBackend, StubBackend};
pub use error::MockHttpError;
pub use options::ServiceOptions;
pub use rule::{BodyPattern, RequestPattern, ResponseDefinition, StubRule};
pub use service::MockHttpService;
pub use template::{TemplateContext, render_template};
