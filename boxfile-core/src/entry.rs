//! Entry header layout of the box container format
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Display};

use byteorder::{BigEndian, ByteOrder};

use crate::{Error, PATH_LEN_SIZE, PAYLOAD_LEN_SIZE};

/// Framing field of an entry, in stream order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    PathLen,
    Path,
    PayloadLen,
    Payload,
}

impl Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::PathLen => "path length",
            Field::Path => "path",
            Field::PayloadLen => "payload length",
            Field::Payload => "payload",
        })
    }
}

/// Header of one packaged file. The payload is not part of this struct; it
/// follows the header in the container and is exactly `size` bytes long.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Slash separated path relative to the extract directory
    path: String,
    /// Size in bytes of the payload
    size: u64,
}

impl Entry {
    /// Build an entry header, checking that `path` can be framed.
    ///
    /// Only framing constraints are checked here. Whether the path is safe to
    /// materialize below a directory is up to the reader of the container.
    pub fn new(path: impl Into<String>, size: u64) -> Result<Entry, Error> {
        let path = path.into();
        if path.is_empty() {
            return Err(Error::EmptyPath);
        }
        if u32::try_from(path.len()).is_err() {
            return Err(Error::PathTooLong(path.len()));
        }
        Ok(Entry { path, size })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Size of the encoded header: both length fields plus the path bytes
    pub fn header_size(&self) -> u64 {
        (PATH_LEN_SIZE + self.path.len() + PAYLOAD_LEN_SIZE) as u64
    }

    /// Size of the header plus the payload
    pub fn framed_size(&self) -> Result<u64, Error> {
        self.header_size()
            .checked_add(self.size)
            .ok_or(Error::Overflow)
    }

    /// Encode the header. The payload is expected to be written right after.
    pub fn header_bytes(&self) -> Vec<u8> {
        let path_len = self.path.len();
        let mut bytes = alloc::vec![0; PATH_LEN_SIZE + path_len + PAYLOAD_LEN_SIZE];

        // Checked by Entry::new
        BigEndian::write_u32(&mut bytes[..PATH_LEN_SIZE], path_len as u32);
        bytes[PATH_LEN_SIZE..PATH_LEN_SIZE + path_len].copy_from_slice(self.path.as_bytes());
        BigEndian::write_u64(&mut bytes[PATH_LEN_SIZE + path_len..], self.size);
        bytes
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path={:?} size={}", self.path, self.size)
    }
}

/// Frame a complete entry, header followed by `payload`.
pub fn encode(path: &str, payload: &[u8]) -> Result<Vec<u8>, Error> {
    let entry = Entry::new(path, payload.len() as u64)?;
    let mut bytes = entry.header_bytes();
    bytes.extend_from_slice(payload);
    Ok(bytes)
}
