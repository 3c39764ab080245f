use crate::model::Us;

#[derive(Debug)]
pub enum Error {
    /// Allocation descriptor text is missing a required field.
    InvalidDescriptor(String),
    /// A value could not be boxed into the generic scalar/array/binary/void set.
    UnsupportedValueType(String),
    /// Payload encoding or decoding failed.
    Serialization(String),
    NoResources,
    UnknownVariant {
        kind: &'static str,
        value: String,
    },
    InvalidDuration(String),
    Config(String),
    /// A span whose begin lies after its end, where an ordered one is required.
    InvertedSpan {
        begin: Us,
        end: Us,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidDescriptor(msg) => write!(f, "invalid descriptor: {msg}"),
            Error::UnsupportedValueType(msg) => write!(f, "unsupported value type: {msg}"),
            Error::Serialization(msg) => write!(f, "serialization error: {msg}"),
            Error::NoResources => write!(f, "allocation must cover at least one resource"),
            Error::UnknownVariant { kind, value } => write!(f, "unknown {kind}: {value:?}"),
            Error::InvalidDuration(text) => write!(f, "invalid duration: {text:?}"),
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::InvertedSpan { begin, end } => {
                write!(f, "span begins after it ends: ({begin})-({end})")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
