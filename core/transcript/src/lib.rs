//! The transcript and checkpoint store (§3, §6): an append-only,
//! per-thread event log with total ordering and atomic batch append,
//! plus named snapshot/restore on top of it.

mod checkpoint;
mod error;
mod event;
mod store;

pub use checkpoint::Checkpoint;
pub use checkpoint::CheckpointStore;
pub use checkpoint::FileCheckpointStore;
pub use error::TranscriptError;
pub use event::Direction;
pub use event::TranscriptEvent;
pub use store::FileTranscriptStore;
pub use store::TranscriptStore;
