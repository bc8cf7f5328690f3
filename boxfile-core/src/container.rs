use alloc::string::String;
use alloc::vec::Vec;
use core::cmp;

use byteorder::{BigEndian, ByteOrder};

use crate::{Entry, Error, Field, PATH_LEN_SIZE, PAYLOAD_LEN_SIZE};

/// Upper bound on a single read while collecting bytes of unknown length, so
/// a corrupt length field cannot force a large allocation before the data
/// has actually been seen.
const CHUNK_SIZE: usize = 64 * 1024;

/// A sequential source of container bytes.
///
/// A container is decoded in one pass: `read_header`, then the payload through
/// `read_payload` until `size` bytes have been read, then the next header.
/// `read_header` returning `None` marks the end of the container.
pub trait ContainerSrc {
    type Err: From<Error>;

    /// Read up to `buf.len()` bytes; `Ok(0)` means the source is exhausted.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Err>;

    /// Read until `buf` is full or the source is exhausted, returning the
    /// number of bytes read.
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, Self::Err> {
        let mut total = 0;
        while total < buf.len() {
            let count = self.read(&mut buf[total..])?;
            if count == 0 {
                break;
            }
            total += count;
        }
        Ok(total)
    }

    /// Read the next entry header, or `None` if the source is exhausted
    /// exactly at an entry boundary.
    fn read_header(&mut self) -> Result<Option<Entry>, Self::Err> {
        let mut path_len = [0; PATH_LEN_SIZE];
        match self.read_full(&mut path_len)? {
            0 => return Ok(None),
            PATH_LEN_SIZE => {}
            actual => {
                return Err(truncated(Field::PathLen, PATH_LEN_SIZE as u64, actual as u64).into())
            }
        }

        let path_len = BigEndian::read_u32(&path_len);
        if path_len == 0 {
            return Err(Error::EmptyPath.into());
        }
        let path_len = usize::try_from(path_len).map_err(Error::TryFromInt)?;

        let mut path = Vec::new();
        let mut chunk = [0; 256];
        while path.len() < path_len {
            let want = cmp::min(chunk.len(), path_len - path.len());
            let count = self.read_full(&mut chunk[..want])?;
            path.extend_from_slice(&chunk[..count]);
            if count < want {
                return Err(truncated(Field::Path, path_len as u64, path.len() as u64).into());
            }
        }
        let path =
            String::from_utf8(path).map_err(|err| Error::InvalidUtf8(err.utf8_error()))?;

        let mut size = [0; PAYLOAD_LEN_SIZE];
        let count = self.read_full(&mut size)?;
        if count != PAYLOAD_LEN_SIZE {
            let expected = PAYLOAD_LEN_SIZE as u64;
            return Err(truncated(Field::PayloadLen, expected, count as u64).into());
        }

        Ok(Some(Entry::new(path, BigEndian::read_u64(&size))?))
    }

    /// Read the payload of `entry`, `offset` bytes in. Returns `Ok(0)` once
    /// the whole payload has been read. Running out of bytes before that is a
    /// framing error.
    fn read_payload(
        &mut self,
        entry: &Entry,
        offset: u64,
        buf: &mut [u8],
    ) -> Result<usize, Self::Err> {
        if offset >= entry.size() {
            return Ok(0);
        }

        let remaining = entry.size() - offset;
        let end = match usize::try_from(remaining) {
            Ok(remaining) => cmp::min(remaining, buf.len()),
            Err(_) => buf.len(),
        };

        let count = self.read_full(&mut buf[..end])?;
        if count < end {
            return Err(truncated(Field::Payload, entry.size(), offset + count as u64).into());
        }
        Ok(count)
    }

    /// Read the next entry together with its whole payload
    fn decode(&mut self) -> Result<Option<(Entry, Vec<u8>)>, Self::Err> {
        let entry = match self.read_header()? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let mut payload = Vec::new();
        let mut chunk = alloc::vec![0; CHUNK_SIZE];
        loop {
            let count = self.read_payload(&entry, payload.len() as u64, &mut chunk)?;
            if count == 0 {
                break;
            }
            payload.extend_from_slice(&chunk[..count]);
        }
        Ok(Some((entry, payload)))
    }
}

fn truncated(field: Field, expected: u64, actual: u64) -> Error {
    Error::Truncated {
        field,
        expected,
        actual,
    }
}

impl ContainerSrc for &[u8] {
    type Err = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let count = cmp::min(buf.len(), self.len());
        let (head, tail) = self.split_at(count);
        buf[..count].copy_from_slice(head);
        *self = tail;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::ContainerSrc;
    use crate::{encode, Error, Field};

    fn container(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (path, payload) in entries {
            bytes.extend_from_slice(&encode(path, payload).unwrap());
        }
        bytes
    }

    #[test]
    fn empty_container() {
        let mut src: &[u8] = &[];
        assert_eq!(src.read_header(), Ok(None));
        assert_eq!(src.decode(), Ok(None));
    }

    #[test]
    fn decode_in_order() {
        let bytes = container(&[
            ("var/db/fun", b"some random string file contents\n"),
            ("empty", b""),
            ("var/db/fun", b"second"),
        ]);
        let mut src = &bytes[..];

        let (entry, payload) = src.decode().unwrap().unwrap();
        assert_eq!(entry.path(), "var/db/fun");
        assert_eq!(payload, b"some random string file contents\n");

        let (entry, payload) = src.decode().unwrap().unwrap();
        assert_eq!(entry.path(), "empty");
        assert_eq!(entry.size(), 0);
        assert!(payload.is_empty());

        let (entry, payload) = src.decode().unwrap().unwrap();
        assert_eq!(entry.path(), "var/db/fun");
        assert_eq!(payload, b"second");

        assert_eq!(src.decode(), Ok(None));
    }

    #[test]
    fn payload_in_chunks() {
        let bytes = container(&[("f", b"0123456789")]);
        let mut src = &bytes[..];
        let entry = src.read_header().unwrap().unwrap();

        let mut buf = [0; 4];
        let mut offset = 0;
        let mut out = Vec::new();
        loop {
            let count = src.read_payload(&entry, offset, &mut buf).unwrap();
            if count == 0 {
                break;
            }
            out.extend_from_slice(&buf[..count]);
            offset += count as u64;
        }
        assert_eq!(out, b"0123456789");
        assert_eq!(src.read_header(), Ok(None));
    }

    #[test]
    fn truncated_path_len() {
        let mut src: &[u8] = &[0, 0];
        assert_eq!(
            src.read_header(),
            Err(Error::Truncated {
                field: Field::PathLen,
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn truncated_path() {
        let bytes = container(&[("abcdef", b"x")]);
        let mut src = &bytes[..7];
        assert_eq!(
            src.read_header(),
            Err(Error::Truncated {
                field: Field::Path,
                expected: 6,
                actual: 3
            })
        );
    }

    #[test]
    fn truncated_payload_len() {
        let bytes = container(&[("abc", b"x")]);
        let mut src = &bytes[..4 + 3 + 5];
        assert_eq!(
            src.read_header(),
            Err(Error::Truncated {
                field: Field::PayloadLen,
                expected: 8,
                actual: 5
            })
        );
    }

    #[test]
    fn truncated_payload() {
        let bytes = container(&[("abc", b"hello world")]);
        // Cut right after the payload length field
        let mut src = &bytes[..4 + 3 + 8];
        assert_eq!(
            src.decode(),
            Err(Error::Truncated {
                field: Field::Payload,
                expected: 11,
                actual: 0
            })
        );

        let mut src = &bytes[..bytes.len() - 1];
        assert_eq!(
            src.decode(),
            Err(Error::Truncated {
                field: Field::Payload,
                expected: 11,
                actual: 10
            })
        );
    }

    #[test]
    fn zero_path_len_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&[0; 8]);
        let mut src = &bytes[..];
        assert_eq!(src.read_header(), Err(Error::EmptyPath));
    }

    #[test]
    fn invalid_utf8_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0, 0, 0, 2, 0xff, 0xfe]);
        bytes.extend_from_slice(&[0; 8]);
        let mut src = &bytes[..];
        assert!(matches!(src.read_header(), Err(Error::InvalidUtf8(_))));
    }

    #[test]
    fn huge_lengths_fail_without_data() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        bytes.extend_from_slice(b"abc");
        let mut src = &bytes[..];
        assert!(matches!(
            src.read_header(),
            Err(Error::Truncated {
                field: Field::Path,
                ..
            })
        ));

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0, 0, 0, 1, b'f']);
        bytes.extend_from_slice(&u64::MAX.to_be_bytes());
        bytes.extend_from_slice(b"short");
        let mut src = &bytes[..];
        assert_eq!(
            src.decode(),
            Err(Error::Truncated {
                field: Field::Payload,
                expected: u64::MAX,
                actual: 5
            })
        );
    }
}
