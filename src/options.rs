/// Host the embedded server binds to
pub const BIND_HOST: &str = "127.0.0.1";

/// Options for starting a [`crate::MockHttpService`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Port to bind; `0` lets the operating system pick an ephemeral port
    pub port: u16,
}

impl ServiceOptions {
    /// Options for an ephemeral port
    pub fn ephemeral() -> Self {
        Self::default()
    }

    /// Options for a fixed port
    pub fn with_port(port: u16) -> Self {
        Self { port }
    }

    /// Address string used in logs and bind errors
    pub fn bind_address(&self) -> String {
        format!("{BIND_HOST}:{}", self.port)
    }
}
