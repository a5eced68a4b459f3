//! Shared client-side session conductor (§4.4): connection management,
//! the server-event reducer, optimistic send, transcript buffering,
//! reconnect, and the client-side watchdog set. Every client (CLI, TUI,
//! or otherwise) drives one [`SessionConductor`] per open socket.

mod conductor;
mod connection;
mod error;
mod feed;
mod pending_queue;
mod state;
mod transcript_buffer;
mod watchdog;

pub use conductor::ConductorEvent;
pub use conductor::SessionConductor;
pub use conductor::WatchdogKind;
pub use conductor::reconnect_backoff;
pub use connection::SessionConnection;
pub use error::ConductorError;
pub use feed::DEFAULT_FEED_CAPACITY;
pub use feed::Feed;
pub use feed::FeedItem;
pub use pending_queue::PendingQueue;
pub use state::ConnectionState;
pub use state::SessionConductorState;
pub use transcript_buffer::FLUSH_INTERVAL;
pub use transcript_buffer::TranscriptBuffer;
pub use watchdog::CANCEL_GRACE;
pub use watchdog::HANDSHAKE_TIMEOUT;
pub use watchdog::PROVIDER_STATUS_TIMEOUT;
pub use watchdog::STUCK_TURN_TIMEOUT;
pub use watchdog::Watchdog;
