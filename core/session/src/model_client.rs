//! The seam between the session runtime and a specific model vendor's
//! API — intentionally narrow and vendor-agnostic (any particular
//! provider's wire format is out of scope here).

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::SessionError;

/// Context for one round of model streaming within a turn. A turn may
/// run several rounds when the model requests tool calls: each round
/// appends the previous round's tool outcomes.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub provider: agentsrv_protocol::ProviderType,
    pub model: String,
    pub user_text: String,
    pub prior_tool_results: Vec<ToolRoundResult>,
}

#[derive(Debug, Clone)]
pub struct ToolRoundResult {
    pub call_id: String,
    pub outcome: ToolRoundOutcome,
}

#[derive(Debug, Clone)]
pub enum ToolRoundOutcome {
    Result(Value),
    Error(String),
    Denied(String),
}

/// One piece of a model's streamed response, the vendor-agnostic
/// equivalent of a wire [`agentsrv_protocol_wire::StreamPart`].
#[derive(Debug, Clone)]
pub enum ModelChunk {
    TextDelta(String),
    ReasoningDelta { stream_id: String, text: String },
    ToolInputStart { call_id: String, name: String },
    ToolInputDelta { call_id: String, delta: String },
    ToolCall { call_id: String, name: String, args: Value },
    Finish,
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Open one streaming round and return the channel the runtime reads
    /// chunks from. The stream ends (channel closes) at `Finish` or on
    /// error.
    async fn open_turn(
        &self,
        request: TurnRequest,
    ) -> Result<mpsc::Receiver<ModelChunk>, SessionError>;
}

/// Executes a tool call's side effect once the mediator has approved it.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, name: &str, args: &Value) -> Result<Value, String>;
}
