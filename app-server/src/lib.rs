//! Library surface for the workspace-scoped agent session server: the
//! websocket protocol handler, shared state, and the process-local glue
//! (model client, tool executor, workspace supervisor) the binary wires
//! together in `main`.

pub mod error;
pub mod model_client;
pub mod state;
pub mod supervisor;
pub mod tool_executor;
pub mod ws;
