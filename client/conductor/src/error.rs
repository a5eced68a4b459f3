//! Conductor-local failures: connection/handshake problems the client
//! encounters before (or instead of) any [`WireError`] the server sends.

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConductorError {
    #[snafu(display("failed to connect to {url}: {message}"))]
    ConnectFailed { url: String, message: String },

    #[snafu(display("handshake with {url} did not complete within the timeout"))]
    HandshakeTimeout { url: String },

    #[snafu(display("provider status refresh timed out"))]
    ProviderStatusTimeout,

    #[snafu(display("the socket closed: {message}"))]
    SocketClosed { message: String },

    #[snafu(display("failed to serialize client message: {message}"))]
    EncodeFailed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_url() {
        let err = ConductorError::HandshakeTimeout {
            url: "ws://127.0.0.1:4000".to_string(),
        };
        assert!(err.to_string().contains("ws://127.0.0.1:4000"));
    }
}
