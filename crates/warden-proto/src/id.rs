//! Room and member identifiers.
//!
//! Both are opaque strings on the wire. The newtypes exist so a room id can
//! never be passed where a member id is expected; validation is only applied
//! when parsing user input through [`RoomId::parse`] / [`MemberId::parse`].

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdError;

/// Returns the `server` part of `<sigil>localpart:server`, if well formed.
fn split_server<'a>(raw: &'a str, sigils: &[char]) -> Option<&'a str> {
    let mut chars = raw.chars();
    let sigil = chars.next()?;
    if !sigils.contains(&sigil) {
        return None;
    }
    let rest = chars.as_str();
    let (local, server) = rest.split_once(':')?;
    if local.is_empty() || server.is_empty() || raw.chars().any(char::is_whitespace) {
        return None;
    }
    Some(server)
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $sigils:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a string without validating it.
            ///
            /// Use this for identifiers that come from the homeserver, which
            /// are trusted to be well formed.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Parses and validates user supplied input.
            pub fn parse(raw: &str) -> Result<Self, IdError> {
                match split_server(raw, $sigils) {
                    Some(_) => Ok(Self(raw.to_string())),
                    None => Err(IdError {
                        kind: $kind,
                        value: raw.to_string(),
                    }),
                }
            }

            /// The server name suffix, if the identifier is well formed.
            pub fn server_name(&self) -> Option<&str> {
                split_server(&self.0, $sigils)
            }

            /// Borrow as a plain string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume into the inner string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

id_type!(
    /// A room identifier (`!opaque:server`) or alias (`#alias:server`).
    RoomId,
    "room",
    &['!', '#']
);

id_type!(
    /// A member (user) identifier, `@localpart:server`.
    MemberId,
    "member",
    &['@']
);

impl RoomId {
    /// True for `#alias:server` identifiers, which must be resolved by a join.
    pub fn is_alias(&self) -> bool {
        self.0.starts_with('#')
    }
}
