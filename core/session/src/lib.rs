//! The session runtime (§4.2): lifecycle state machine, turn execution,
//! and tool mediation for one agent session.

mod config;
mod error;
mod lifecycle;
mod mediator;
mod model;
mod model_client;
mod registry;
mod runtime;
mod title;

pub use config::MAX_STEPS_MAX;
pub use config::MAX_STEPS_MIN;
pub use config::SessionConfig;
pub use error::SessionError;
pub use lifecycle::LifecycleEvent;
pub use lifecycle::LifecycleState;
pub use mediator::MediatorOutcome;
pub use mediator::PromptRequest;
pub use mediator::PromptResponse;
pub use mediator::ToolMediator;
pub use mediator::SKIPPED;
pub use model::FeedItem;
pub use model::Turn;
pub use model::ToolInvocationState;
pub use model::ToolInvocationStatus;
pub use model::ToolOutcome;
pub use model_client::ModelChunk;
pub use model_client::ModelClient;
pub use model_client::ToolExecutor;
pub use model_client::ToolRoundOutcome;
pub use model_client::ToolRoundResult;
pub use model_client::TurnRequest;
pub use registry::SessionRegistry;
pub use runtime::Session;
pub use title::derive_title;
