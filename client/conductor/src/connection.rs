//! The single websocket the conductor opens per control/thread socket
//! (§4.4, §6: "one websocket may bind to one session").

use agentsrv_protocol_wire::ClientMessage;
use agentsrv_protocol_wire::OutboundMessage;
use futures::SinkExt;
use futures::StreamExt;
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::error::ConductorError;

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// An open session socket: a thin framing layer over the websocket that
/// speaks [`ClientMessage`] out and [`OutboundMessage`] in.
pub struct SessionConnection {
    socket: Socket,
}

impl SessionConnection {
    pub async fn connect(url: &str) -> Result<Self, ConductorError> {
        let (socket, _response) =
            connect_async(url)
                .await
                .map_err(|err| ConductorError::ConnectFailed {
                    url: url.to_string(),
                    message: err.to_string(),
                })?;
        Ok(Self { socket })
    }

    pub async fn send(&mut self, message: &ClientMessage) -> Result<(), ConductorError> {
        let text = serde_json::to_string(message).map_err(|err| ConductorError::EncodeFailed {
            message: err.to_string(),
        })?;
        self.socket
            .send(Message::Text(text.into()))
            .await
            .map_err(|err| ConductorError::SocketClosed {
                message: err.to_string(),
            })
    }

    /// Read the next inbound frame. `Ok(None)` means the socket closed
    /// cleanly; non-text/ping/pong frames are skipped rather than erroring,
    /// since the wire protocol only ever sends text frames.
    pub async fn recv(&mut self) -> Result<Option<OutboundMessage>, ConductorError> {
        loop {
            let Some(frame) = self.socket.next().await else {
                return Ok(None);
            };
            let frame = frame.map_err(|err| ConductorError::SocketClosed {
                message: err.to_string(),
            })?;
            match frame {
                Message::Text(text) => {
                    let parsed = serde_json::from_str(&text).map_err(|err| ConductorError::SocketClosed {
                        message: format!("malformed server frame: {err}"),
                    })?;
                    return Ok(Some(parsed));
                }
                Message::Close(_) => return Ok(None),
                _ => continue,
            }
        }
    }

    pub async fn close(&mut self) -> Result<(), ConductorError> {
        self.socket
            .close(None)
            .await
            .map_err(|err| ConductorError::SocketClosed {
                message: err.to_string(),
            })
    }
}
