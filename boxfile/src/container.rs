use std::fs::File;
use std::io::{self, BufReader, Read};
use std::mem;
use std::path::{Path, PathBuf};

use boxfile_core::{ContainerSrc, Entry};

use crate::{wrap_io_err, DecodeError, ExtractError};

/// Position of the reader within the container stream
#[derive(Debug)]
enum State {
    /// At an entry boundary, the next read is a header
    Header,
    /// Inside the payload of `entry`, `offset` bytes in
    Payload { entry: Entry, offset: u64 },
    /// The container was exhausted at an entry boundary
    End,
}

/// A container file on disk, read sequentially from its start
#[derive(Debug)]
pub struct ContainerFile {
    path: PathBuf,
    src: BufReader<File>,
    /// Bytes consumed from the start of the container
    offset: u64,
    state: State,
}

impl ContainerFile {
    pub fn open(path: impl AsRef<Path>) -> Result<ContainerFile, ExtractError> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path)
            .map_err(wrap_io_err!(ExtractError::ContainerUnavailable, path, "Open"))?;

        Ok(ContainerFile {
            path,
            src: BufReader::new(file),
            offset: 0,
            state: State::Header,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Advance to the next entry, skipping whatever is left of the current
    /// payload. Returns `None` at the end of the container.
    pub fn next_entry(&mut self) -> Result<Option<Entry>, ExtractError> {
        if let State::Payload { .. } = self.state {
            self.skip_data()?;
        }
        if let State::End = self.state {
            return Ok(None);
        }

        match self.read_header() {
            Ok(Some(entry)) => {
                self.state = State::Payload {
                    entry: entry.clone(),
                    offset: 0,
                };
                Ok(Some(entry))
            }
            Ok(None) => {
                self.state = State::End;
                Ok(None)
            }
            Err(err) => {
                self.state = State::End;
                Err(self.wrap_err(err, "Read entry header"))
            }
        }
    }

    /// Read payload bytes of the current entry. Returns `Ok(0)` once the
    /// payload is exhausted.
    pub fn read_data(&mut self, buf: &mut [u8]) -> Result<usize, ExtractError> {
        if buf.is_empty() {
            return Ok(0);
        }

        let (entry, offset) = match mem::replace(&mut self.state, State::Header) {
            State::Payload { entry, offset } => (entry, offset),
            other => {
                self.state = other;
                return Ok(0);
            }
        };

        match self.read_payload(&entry, offset, buf) {
            Ok(0) => Ok(0),
            Ok(count) => {
                self.state = State::Payload {
                    entry,
                    offset: offset + count as u64,
                };
                Ok(count)
            }
            Err(err) => {
                self.state = State::End;
                Err(self.wrap_err(err, "Read entry payload"))
            }
        }
    }

    /// Consume the rest of the current payload
    pub fn skip_data(&mut self) -> Result<(), ExtractError> {
        let mut buf = [0; 8 * 1024];
        while self.read_data(&mut buf)? != 0 {}
        Ok(())
    }

    fn wrap_err(&self, err: DecodeError, context: &'static str) -> ExtractError {
        match err {
            DecodeError::Framing(source) => ExtractError::CorruptContainer {
                path: self.path.clone(),
                offset: self.offset,
                source,
            },
            DecodeError::Io(source) => ExtractError::ContainerUnavailable {
                path: self.path.clone(),
                context,
                source,
            },
        }
    }
}

impl ContainerSrc for ContainerFile {
    type Err = DecodeError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, DecodeError> {
        loop {
            match self.src.read(buf) {
                Ok(count) => {
                    self.offset += count as u64;
                    return Ok(count);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }
}
