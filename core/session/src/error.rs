use agentsrv_error::ErrorCode;
use agentsrv_error::WireError;
use snafu::Snafu;

/// Runtime errors raised by a session, before they are mapped onto the
/// wire `{source, code}` shape.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SessionError {
    #[snafu(display("session {session_id} is not registered"))]
    UnknownSession { session_id: String },

    #[snafu(display("session {session_id} already has a turn in flight"))]
    Busy { session_id: String },

    #[snafu(display("{field} {message}"))]
    ValidationFailed { field: String, message: String },

    #[snafu(display("provider request failed: {message}"))]
    ProviderError { message: String },

    #[snafu(display("checkpoint operation failed: {message}"))]
    BackupError { message: String },

    #[snafu(display("observability emitter failed: {message}"))]
    ObservabilityError { message: String },

    #[snafu(display("internal session fault: {message}"))]
    Internal { message: String },
}

impl SessionError {
    /// The wire error code this variant maps to, per the error taxonomy.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownSession { .. } => ErrorCode::UnknownSession,
            Self::Busy { .. } => ErrorCode::Busy,
            Self::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            Self::ProviderError { .. } => ErrorCode::ProviderError,
            Self::BackupError { .. } => ErrorCode::BackupError,
            Self::ObservabilityError { .. } => ErrorCode::ObservabilityError,
            Self::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Convert to the boundary shape sent to clients.
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
    fn busy_maps_to_busy_wire_code() {
        let err = SessionError::Busy {
            session_id: "S1".to_string(),
        };
        let wire = err.to_wire_error(Some("S1"));
        assert_eq!(wire.code, "busy");
        assert_eq!(wire.session_id.as_deref(), Some("S1"));
    }

    #[test]
    fn validation_failed_message_names_field() {
        let err = SessionError::ValidationFailed {
            field: "set_config config.maxSteps".to_string(),
            message: "must be number 1-1000".to_string(),
        };
        assert_eq!(err.to_string(), "set_config config.maxSteps must be number 1-1000");
    }
}
