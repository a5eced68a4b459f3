//! Structured error taxonomy for the agent session server.
//!
//! Every error that can reach the wire carries a `source` (which subsystem
//! raised it) and a `code` (what went wrong), matching the `{type:"error",
//! source, code, message, sessionId?}` shape clients receive. Internal
//! crates raise [`snafu`]-derived errors and convert them to [`WireError`]
//! at the boundary; see [`ErrorCode::recovery`] for the propagation policy.

pub mod code;
pub mod wire;

pub use code::ErrorCode;
pub use code::ErrorSource;
pub use code::LocalRecovery;
pub use wire::WireError;
