use agentsrv_error::ErrorCode;
use agentsrv_error::WireError;
use snafu::Snafu;

/// Runtime errors raised by the provider auth registry, before they are
/// mapped onto the wire `{source, code}` shape.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProviderAuthError {
    #[snafu(display("unknown provider auth method {method_id}"))]
    UnknownMethod { method_id: String },

    #[snafu(display("method {method_id} does not support this operation"))]
    WrongMethodKind { method_id: String },

    #[snafu(display("no loopback port could be bound: {message}"))]
    LoopbackBindFailed { message: String },

    #[snafu(display("keyring operation failed: {message}"))]
    KeyringError { message: String },

    #[snafu(display("oauth flow failed: {message}"))]
    OauthFailed { message: String },
}

impl ProviderAuthError {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownMethod { .. } | Self::WrongMethodKind { .. } => ErrorCode::ValidationFailed,
            Self::LoopbackBindFailed { .. } | Self::OauthFailed { .. } => ErrorCode::ProviderError,
            Self::KeyringError { .. } => ErrorCode::BackupError,
        }
    }

    pub fn to_wire_error(&self) -> WireError {
        WireError::new(self.code(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_method_maps_to_validation_failed() {
        let err = ProviderAuthError::UnknownMethod {
            method_id: "bogus".to_string(),
        };
        assert_eq!(err.to_wire_error().code, "validation_failed");
    }
}
