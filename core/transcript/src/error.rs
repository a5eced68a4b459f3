use std::io;
use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TranscriptError {
    #[snafu(display("failed to read transcript {}: {source}", path.display()))]
    Read { path: PathBuf, source: io::Error },
    #[snafu(display("failed to append to transcript {}: {source}", path.display()))]
    Append { path: PathBuf, source: io::Error },
    #[snafu(display("failed to delete transcript {}: {source}", path.display()))]
    Delete { path: PathBuf, source: io::Error },
    #[snafu(display("transcript {} contains invalid JSON: {source}", path.display()))]
    Corrupt {
        path: PathBuf,
        source: serde_path_to_error::Error<serde_json::Error>,
    },
    #[snafu(display("no checkpoint {checkpoint_id} for thread {thread_id}"))]
    UnknownCheckpoint {
        thread_id: String,
        checkpoint_id: String,
    },
}
