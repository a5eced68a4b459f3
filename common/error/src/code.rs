//! The wire-level error taxonomy.
//!
//! Codes are grouped by [`ErrorSource`], the subsystem that raised them.
//! [`LocalRecovery`] records whether a client can retry without user
//! intervention, matching the "Local recovery?" column of the error table.

use strum::AsRefStr;
use strum::EnumIter;

/// Which subsystem raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorSource {
    Protocol,
    Session,
    Tool,
    Provider,
    Backup,
    Observability,
    Permissions,
}

/// Whether a client can recover from an error without user intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalRecovery {
    /// No local recovery; surface immediately.
    None,
    /// Client retries after observing the named condition.
    RetryAfter(&'static str),
    /// The session itself remains usable; no recovery action needed.
    SessionUsable,
    /// The session may need to close.
    SessionMayClose,
}

macro_rules! define_error_codes {
    ($(
        $(#[$attr:meta])*
        $name:ident => {
            wire: $wire:expr,
            source: $source:ident,
            recovery: $recovery:expr $(,)?
        }
    ),* $(,)?) => {
        /// A wire-level error code, stable across protocol versions.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
        pub enum ErrorCode {
            $($(#[$attr])* $name,)*
        }

        impl ErrorCode {
            /// The `code` string sent on the wire.
            pub const fn wire_str(&self) -> &'static str {
                match self {
                    $(Self::$name => $wire,)*
                }
            }

            /// The subsystem that normally raises this code.
            pub const fn default_source(&self) -> ErrorSource {
                match self {
                    $(Self::$name => ErrorSource::$source,)*
                }
            }

            /// The propagation policy for this code.
            pub const fn recovery(&self) -> LocalRecovery {
                match self {
                    $(Self::$name => $recovery,)*
                }
            }
        }
    };
}

define_error_codes! {
    /// Frame was not JSON.
    InvalidJson => { wire: "invalid_json", source: Protocol, recovery: LocalRecovery::None },
    /// Payload shape rejected.
    InvalidPayload => { wire: "invalid_payload", source: Protocol, recovery: LocalRecovery::None },
    /// Discriminator field missing.
    MissingType => { wire: "missing_type", source: Protocol, recovery: LocalRecovery::None },
    /// Discriminator field unrecognized.
    UnknownType => { wire: "unknown_type", source: Protocol, recovery: LocalRecovery::None },
    /// `sessionId` not registered.
    UnknownSession => { wire: "unknown_session", source: Session, recovery: LocalRecovery::None },
    /// Operation disallowed while a turn is in flight.
    Busy => { wire: "busy", source: Session, recovery: LocalRecovery::RetryAfter("session_busy:false") },
    /// Field-level validation failed; message names the field.
    ValidationFailed => { wire: "validation_failed", source: Protocol, recovery: LocalRecovery::None },
    /// Policy refused the action.
    PermissionDenied => { wire: "permission_denied", source: Permissions, recovery: LocalRecovery::None },
    /// Upstream model/auth failure.
    ProviderError => { wire: "provider_error", source: Provider, recovery: LocalRecovery::SessionUsable },
    /// Checkpoint/restore failure.
    BackupError => { wire: "backup_error", source: Backup, recovery: LocalRecovery::SessionUsable },
    /// Telemetry emitter failed.
    ObservabilityError => { wire: "observability_error", source: Observability, recovery: LocalRecovery::SessionUsable },
    /// Uncaught server fault.
    InternalError => { wire: "internal_error", source: Session, recovery: LocalRecovery::SessionMayClose },
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn wire_strings_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in ErrorCode::iter() {
            assert!(seen.insert(code.wire_str()), "duplicate wire code {code:?}");
        }
    }

    #[test]
    fn busy_recovers_on_session_not_busy() {
        assert_eq!(
            ErrorCode::Busy.recovery(),
            LocalRecovery::RetryAfter("session_busy:false")
        );
    }

    #[test]
    fn validation_failed_has_no_local_recovery() {
        assert_eq!(ErrorCode::ValidationFailed.recovery(), LocalRecovery::None);
    }
}
