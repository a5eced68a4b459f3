//! Persisted workspace/thread state.
//!
//! The server keeps exactly one state file per installation (default
//! `~/.agentsrv/state.json`), tracking the set of workspaces the user has
//! opened and the threads within them. It is the only thing that survives
//! a server restart; everything else (live sessions, turns, feeds) is
//! reconstructed or reconnected.

mod error;
mod state;

pub use error::ConfigError;
pub use state::PersistedState;
pub use state::ThreadEntry;
pub use state::ThreadStatus;
pub use state::WorkspaceEntry;
pub use state::default_state_path;
pub use state::load_state;
pub use state::save_state;
