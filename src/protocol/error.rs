/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Protocol decoding errors.

use thiserror::Error;

/// A line or datagram that could not be decoded.
///
/// Decoding never panics; every malformed input maps to one of these
/// variants so callers can log it and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The line had no content.
    #[error("empty message")]
    Empty,

    /// The first field is not a known command name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The first field is not a known event name.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// The message has the wrong number of fields for its tag.
    #[error("{tag} expects {expected} fields, found {found}")]
    FieldCount {
        /// Message tag.
        tag: &'static str,
        /// Number of fields the tag requires.
        expected: usize,
        /// Number of fields received.
        found: usize,
    },

    /// A required field was present but empty.
    #[error("{tag}: empty {field}")]
    EmptyField {
        /// Message tag.
        tag: &'static str,
        /// Name of the empty field.
        field: &'static str,
    },

    /// A field contained a line break, which would split the message.
    #[error("{tag}: line break in {field}")]
    LineBreak {
        /// Message tag.
        tag: &'static str,
        /// Name of the offending field.
        field: &'static str,
    },

    /// A numeric field did not parse.
    #[error("invalid {field}: {value:?}")]
    InvalidInteger {
        /// Name of the field.
        field: &'static str,
        /// Raw field text.
        value: String,
    },

    /// The side token was neither BUY nor SELL.
    #[error("invalid order side: {0:?}")]
    InvalidSide(String),

    /// The state token was neither OPEN nor CLOSED.
    #[error("invalid exchange state: {0:?}")]
    InvalidState(String),

    /// A message whose encoding decodes to something else.
    #[error("message cannot be framed: {0:?}")]
    NotRepresentable(String),

    /// A line exceeded the length limit and was discarded.
    #[error("line longer than {0} bytes")]
    LineTooLong(usize),

    /// A datagram payload was not valid UTF-8.
    #[error("message is not valid UTF-8")]
    NotUtf8,
}
