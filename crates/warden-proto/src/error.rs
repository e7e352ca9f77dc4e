//! Error types for identifier, mode and command parsing.

use thiserror::Error;

/// An identifier did not have the expected `<sigil>localpart:server` shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} id '{value}'")]
pub struct IdError {
    /// Which kind of identifier was being parsed ("room" or "member").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// A room mode name was not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid room mode '{0}'")]
pub struct RoomModeParseError(pub String);

/// Errors encountered when parsing an in-room command.
///
/// The `Display` output is what gets echoed back into the room, so every
/// message is written for the person who typed the command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CommandParseError {
    /// Nothing followed the command prefix.
    #[error("empty command")]
    Empty,

    /// The first word is not a known command.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// The input ended before the command was complete.
    #[error("incomplete command '{command}', expected {expected}")]
    Incomplete {
        /// Command (or command path) that was being parsed.
        command: &'static str,
        /// Human readable description of what was expected next.
        expected: &'static str,
    },

    /// A literal word was not one of the accepted subcommands.
    #[error("invalid {command} subcommand '{sub}', expected {expected}")]
    InvalidSubcommand {
        /// Parent command.
        command: &'static str,
        /// The rejected word.
        sub: String,
        /// Accepted alternatives.
        expected: &'static str,
    },

    /// An identifier argument was malformed.
    #[error("{source} at position {position}")]
    InvalidId {
        /// Byte offset of the argument inside the command text.
        position: usize,
        /// Underlying identifier error.
        #[source]
        source: IdError,
    },

    /// A room mode argument was malformed.
    #[error("{source} at position {position}")]
    InvalidRoomMode {
        /// Byte offset of the argument inside the command text.
        position: usize,
        /// Underlying mode error.
        #[source]
        source: RoomModeParseError,
    },

    /// A quoted string was never closed.
    #[error("unterminated quoted string at position {0}")]
    UnterminatedQuote(usize),

    /// Extra input followed a complete command.
    #[error("unexpected argument '{input}' at position {position}")]
    TrailingInput {
        /// The leftover text.
        input: String,
        /// Byte offset where it starts.
        position: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CommandParseError::Incomplete {
            command: "admin",
            expected: "one of grant, revoke, list",
        };
        assert_eq!(
            err.to_string(),
            "incomplete command 'admin', expected one of grant, revoke, list"
        );

        let err = CommandParseError::InvalidId {
            position: 4,
            source: IdError {
                kind: "member",
                value: "eve".to_string(),
            },
        };
        assert_eq!(err.to_string(), "invalid member id 'eve' at position 4");
    }

    #[test]
    fn test_error_source_chaining() {
        let err = CommandParseError::InvalidRoomMode {
            position: 10,
            source: RoomModeParseError("FOO".to_string()),
        };
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
        assert_eq!(source.map(|s| s.to_string()).as_deref(), Some("invalid room mode 'FOO'"));
    }
}
