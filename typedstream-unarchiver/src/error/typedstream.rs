/*!
 Errors that can happen when decoding `typedstream` data.
*/

use std::{
    error::Error,
    fmt::{Display, Formatter, Result},
    str::Utf8Error,
};

/// Errors that can happen when decoding `typedstream` data
///
/// Every variant is fatal to the decode session that produced it: once a byte offset
/// is misread, nothing after it can be interpreted.
#[derive(Debug)]
pub enum TypedStreamError {
    /// A read needed bytes up to the first index, but the stream has the second length
    UnexpectedEndOfStream(usize, usize),
    /// A type encoding could not be parsed
    MalformedTypeGrammar(String),
    /// A tag byte that is not valid at this position, with the offset it was found at
    UnknownStreamMarker(u8, usize),
    /// A back-reference index, and the size of the table it was resolved against
    DanglingBackReference(usize, usize),
    /// An object or class reference that does not resolve to a defined class
    UnregisteredClassVersion(usize),
    /// No decode routine is registered for the dispatch name
    DecodableTypeNotFound(String),
    /// A decode was requested after every byte was consumed
    PastEndOfStream,
    /// The archive does not start with a supported `typedstream` header
    InvalidHeader,
    /// String bytes were not valid UTF-8
    StringParseError(Utf8Error),
    /// The type encoding in the stream is not the one the caller asked for
    TypeMismatch { expected: String, found: String },
    /// A back-reference resolved to an entry of the wrong kind
    InvalidReference(usize, &'static str),
    /// An integer that does not fit the declared type
    IntegerOutOfRange(i64, &'static str),
    /// A negative length prefix
    InvalidLength(i64),
    /// A decode routine left part of its object's payload unread
    MissingEndOfObject(usize),
    /// Nesting exceeded the configured limit
    NestingTooDeep(usize),
    /// Class name substitutions must be registered before the first decode
    DecodeInProgress,
    /// A previous decode in this session failed
    SessionFailed,
    /// An error raised by a host-supplied decode routine
    Decodable(Box<dyn Error + Send + Sync>),
}

impl Display for TypedStreamError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            TypedStreamError::UnexpectedEndOfStream(idx, len) => {
                write!(fmt, "Index {idx:x} is outside of range {len:x}!")
            }
            TypedStreamError::MalformedTypeGrammar(why) => {
                write!(fmt, "Malformed type encoding: {why}")
            }
            TypedStreamError::UnknownStreamMarker(byte, offset) => {
                write!(fmt, "Unexpected tag {byte:#04x} at offset {offset:x}")
            }
            TypedStreamError::DanglingBackReference(index, len) => write!(
                fmt,
                "Reference {index} points past the end of a table with {len} entries"
            ),
            TypedStreamError::UnregisteredClassVersion(index) => {
                write!(fmt, "Reference {index} does not resolve to a defined class")
            }
            TypedStreamError::DecodableTypeNotFound(name) => {
                write!(fmt, "No decode routine registered for class {name}")
            }
            TypedStreamError::PastEndOfStream => write!(fmt, "Attempted to decode past the end of the stream!"),
            TypedStreamError::InvalidHeader => write!(fmt, "Invalid typedstream header!"),
            TypedStreamError::StringParseError(why) => write!(fmt, "Failed to parse string: {why}"),
            TypedStreamError::TypeMismatch { expected, found } => {
                write!(fmt, "Expected type {expected}, found {found}")
            }
            TypedStreamError::InvalidReference(index, kind) => {
                write!(fmt, "Reference {index} is not a {kind}")
            }
            TypedStreamError::IntegerOutOfRange(value, ty) => {
                write!(fmt, "{value} does not fit in {ty}")
            }
            TypedStreamError::InvalidLength(length) => write!(fmt, "Invalid length {length}"),
            TypedStreamError::MissingEndOfObject(offset) => {
                write!(fmt, "Expected end of object at offset {offset:x}")
            }
            TypedStreamError::NestingTooDeep(limit) => {
                write!(fmt, "Nesting exceeds the limit of {limit} levels")
            }
            TypedStreamError::DecodeInProgress => write!(
                fmt,
                "Class name substitutions must be registered before decoding"
            ),
            TypedStreamError::SessionFailed => {
                write!(fmt, "A previous decode failed; the session cannot continue")
            }
            TypedStreamError::Decodable(why) => write!(fmt, "{why}"),
        }
    }
}

impl Error for TypedStreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TypedStreamError::StringParseError(why) => Some(why),
            TypedStreamError::Decodable(why) => Some(why.as_ref()),
            _ => None,
        }
    }
}
