//! Opaque string identifiers used across the protocol.
//!
//! Each identifier is a thin newtype over `String` so that session ids,
//! turn ids, and request ids cannot be accidentally swapped at a call
//! site, while still serializing as plain strings on the wire.

use serde::Deserialize;
use serde::Serialize;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(SessionId, "Identifies a session, opaque to clients.");
define_id!(
    ThreadId,
    "Identifies a persisted thread record (spans reconnects of a session)."
);
define_id!(
    TurnId,
    "Identifies one user->assistant exchange within a session, monotonic."
);
define_id!(
    RequestId,
    "Identifies one outstanding ask/approval prompt request."
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types_but_share_string_repr() {
        let session = SessionId::from("abc");
        let turn = TurnId::from("abc");
        assert_eq!(session.as_str(), turn.as_str());
    }

    #[test]
    fn new_ids_are_random_and_nonempty() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = SessionId::from("S1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"S1\"");
    }
}
