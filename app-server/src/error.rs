//! Errors raised by app-server's own glue code (supervisor, filesystem
//! tool executor) before they are mapped onto the wire `{source, code}`
//! shape, following the same pattern as `agentsrv-session`'s `SessionError`.

use agentsrv_error::ErrorCode;
use agentsrv_error::WireError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AppServerError {
    #[snafu(display("persisted state operation failed: {source}"))]
    State { source: agentsrv_config::ConfigError },

    #[snafu(display("transcript operation failed: {source}"))]
    Transcript {
        source: agentsrv_transcript::TranscriptError,
    },

    #[snafu(display("tool execution failed: {message}"))]
    ToolExecution { message: String },

    #[snafu(display("operation not supported: {operation}"))]
    NotSupported { operation: String },
}

impl AppServerError {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::State { .. } => ErrorCode::InternalError,
            Self::Transcript { .. } => ErrorCode::BackupError,
            Self::ToolExecution { .. } => ErrorCode::InternalError,
            Self::NotSupported { .. } => ErrorCode::InternalError,
        }
    }

    pub fn to_wire_error(&self, session_id: Option<&str>) -> WireError {
        let err = WireError::new(self.code(), self.to_string());
        match session_id {
            Some(id) => err.with_session(id),
            None => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_supported_maps_to_internal_error() {
        let err = AppServerError::NotSupported {
            operation: "list_commands".to_string(),
        };
        assert_eq!(err.to_wire_error(None).code, "internal_error");
    }
}
