//! The short-lived OAuth loopback HTTP listener (§4.5, §6): bound to
//! `127.0.0.1`, owned by a single authorization flow, torn down on
//! completion or replacement.

use rand::Rng;
use tiny_http::Response;
use tiny_http::Server;

const RANDOM_PORT_ATTEMPTS: u32 = 50;
const RANDOM_PORT_RANGE: std::ops::RangeInclusive<u16> = 49152..=65535;

/// One query parameter pulled off the callback request, e.g. `code`.
pub struct CallbackRequest {
    pub path_and_query: String,
}

/// A bound-but-not-yet-serving loopback listener.
pub struct LoopbackListener {
    server: Server,
    port: u16,
}

impl LoopbackListener {
    /// Port selection policy (§6): try `preferred` first, then the OS-assigned
    /// ephemeral port, then up to 50 random ports in the dynamic range.
    pub fn bind(preferred_port: Option<u16>) -> Result<Self, String> {
        if let Some(port) = preferred_port {
            if let Ok(server) = Server::http(("127.0.0.1", port)) {
                return Ok(Self { server, port });
            }
        }

        if let Ok(server) = Server::http(("127.0.0.1", 0)) {
            let port = server
                .server_addr()
                .to_ip()
                .map(|addr| addr.port())
                .ok_or_else(|| "loopback server has no local address".to_string())?;
            return Ok(Self { server, port });
        }

        let mut rng = rand::rng();
        for _ in 0..RANDOM_PORT_ATTEMPTS {
            let port = rng.random_range(RANDOM_PORT_RANGE);
            if let Ok(server) = Server::http(("127.0.0.1", port)) {
                return Ok(Self { server, port });
            }
        }

        Err(format!(
            "exhausted {RANDOM_PORT_ATTEMPTS} random ports in {RANDOM_PORT_RANGE:?}"
        ))
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }

    /// Block the calling (blocking-pool) thread for the single callback hit
    /// this flow expects, then answer with the success or failure page
    /// depending on whether the request carried a `code` parameter.
    pub fn await_callback(&self, timeout: std::time::Duration) -> Option<CallbackRequest> {
        let request = match self.server.recv_timeout(timeout) {
            Ok(Some(request)) => request,
            Ok(None) | Err(_) => return None,
        };
        let path_and_query = request.url().to_string();
        let has_code = path_and_query
            .split_once('?')
            .map(|(_, query)| query.split('&').any(|pair| pair.starts_with("code=")))
            .unwrap_or(false);
        let body = if has_code {
            SUCCESS_HTML.to_string()
        } else {
            FAILURE_HTML.replace("{{reason}}", "no authorization code was returned")
        };
        let _ = request.respond(Response::from_string(body));
        Some(CallbackRequest { path_and_query })
    }
}

const SUCCESS_HTML: &str = "<!doctype html><html><body><h1>Signed in</h1><p>You can close this tab and return to the app.</p></body></html>";

const FAILURE_HTML: &str = "<!doctype html><html><body><h1>Sign-in failed</h1><p>{{reason}}</p></body></html>";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_bind_assigns_a_nonzero_port() {
        let listener = LoopbackListener::bind(None).unwrap();
        assert_ne!(listener.port(), 0);
        assert!(listener.url().starts_with("http://127.0.0.1:"));
    }

    #[test]
    fn two_listeners_bind_to_different_ports() {
        let first = LoopbackListener::bind(None).unwrap();
        let second = LoopbackListener::bind(None).unwrap();
        assert_ne!(first.port(), second.port());
    }
}
