use alloc::format;
use alloc::string::ToString;
use core::error;
use core::fmt::{Display, Formatter, Result};
use core::str::Utf8Error;

use crate::Field;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A path length of zero was encoded or requested
    EmptyPath,
    /// Path byte length does not fit the u32 length field
    PathTooLong(usize),
    InvalidUtf8(Utf8Error),
    /// The source ran out part way through a field
    Truncated {
        field: Field,
        expected: u64,
        actual: u64,
    },
    Overflow,
    TryFromInt(core::num::TryFromIntError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> Result {
        use Error::*;

        let msg = match self {
            EmptyPath => "Empty entry path".to_string(),
            PathTooLong(len) => format!("Entry path too long: {} bytes", len),
            InvalidUtf8(err) => format!("Entry path is not UTF-8: {}", err),
            Truncated {
                field,
                expected,
                actual,
            } => format!(
                "Truncated {}: expected {} bytes, got {}",
                field, expected, actual
            ),
            Overflow => "Overflow".to_string(),
            TryFromInt(err) => format!("TryFromInt: {}", err),
        };
        write!(f, "{}", msg)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::InvalidUtf8(e) => Some(e),
            Self::TryFromInt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Error {
        Error::InvalidUtf8(err)
    }
}

impl From<core::num::TryFromIntError> for Error {
    fn from(err: core::num::TryFromIntError) -> Error {
        Error::TryFromInt(err)
    }
}
