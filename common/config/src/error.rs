use std::io;
use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("failed to read state file {}: {source}", path.display()))]
    Read { path: PathBuf, source: io::Error },

    #[snafu(display("failed to write state file {}: {source}", path.display()))]
    Write { path: PathBuf, source: io::Error },

    #[snafu(display("state file {} is not valid JSON: {source}", path.display()))]
    Parse {
        path: PathBuf,
        source: serde_path_to_error::Error<serde_json::Error>,
    },

    #[snafu(display("could not determine a home directory to locate the state file"))]
    NoHomeDirectory,
}
