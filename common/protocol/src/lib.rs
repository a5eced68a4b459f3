//! Shared data types for the agent session server.
//!
//! This crate holds the types that are common to the session runtime, the
//! tool mediator, provider auth, and the client-facing wire protocol
//! (`agentsrv-app-server-protocol`): session/turn/request identifiers,
//! provider metadata, risk classification, and token accounting.

pub mod ids;
pub mod provider;
pub mod queue;
pub mod risk;
pub mod usage;

pub use ids::RequestId;
pub use ids::SessionId;
pub use ids::ThreadId;
pub use ids::TurnId;
pub use provider::AuthMode;
pub use provider::ProviderType;
pub use provider::ReasoningMode;
pub use queue::SteeringAttachment;
pub use queue::SteeringSource;
pub use queue::UserQueuedCommand;
pub use risk::ApprovalRiskCode;
pub use usage::TokenUsage;
