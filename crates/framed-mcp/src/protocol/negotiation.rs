//! Session lifecycle state and the `initialize` handshake.

use crate::types::{Implementation, InitializeParams, InitializeResult, MCP_VERSION};

/// Per-session state. Starts uninitialized; a successful `initialize`
/// flips it and nothing flips it back.
#[derive(Debug, Clone, Default)]
pub struct NegotiatedSession {
    initialized: bool,
    client: Option<Implementation>,
    protocol_version: Option<String>,
}

impl NegotiatedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Client identity from the last `initialize`, if it sent one.
    pub fn client(&self) -> Option<&Implementation> {
        self.client.as_ref()
    }

    /// Protocol version the client offered, if any.
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    pub fn negotiate(
        &mut self,
        params: InitializeParams,
        server_info: &Implementation,
    ) -> InitializeResult {
        if let Some(version) = params.protocol_version.as_deref() {
            if version != MCP_VERSION {
                tracing::warn!(
                    "Client requested protocol version {version}, server supports {MCP_VERSION}. Proceeding with server version."
                );
            }
        }

        match &params.client_info {
            Some(client) => {
                tracing::info!("Initialized with client: {} v{}", client.name, client.version)
            }
            None => tracing::info!("Initialized with anonymous client"),
        }

        if self.initialized {
            tracing::info!("Session re-initialized");
        }

        self.initialized = true;
        self.client = params.client_info;
        self.protocol_version = params.protocol_version;

        InitializeResult::new(server_info.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_uninitialized() {
        let session = NegotiatedSession::new();
        assert!(!session.is_initialized());
        assert!(session.client().is_none());
    }

    #[test]
    fn test_negotiate_records_client() {
        let mut session = NegotiatedSession::new();
        let params = InitializeParams {
            protocol_version: Some("2099-01-01".to_string()),
            capabilities: None,
            client_info: Some(Implementation {
                name: "tester".to_string(),
                version: "9.9".to_string(),
            }),
        };

        let result = session.negotiate(params, &Implementation::default());

        assert!(session.is_initialized());
        assert_eq!(session.client().unwrap().name, "tester");
        assert_eq!(session.protocol_version(), Some("2099-01-01"));
        assert_eq!(result.protocol_version, MCP_VERSION);
    }

    #[test]
    fn test_renegotiate_stays_initialized() {
        let mut session = NegotiatedSession::new();
        session.negotiate(InitializeParams::default(), &Implementation::default());
        session.negotiate(InitializeParams::default(), &Implementation::default());
        assert!(session.is_initialized());
    }
}
