use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use boxfile_core::Entry;
use tracing::{debug, warn};

use crate::{wrap_io_err, AppendError, READ_WRITE_BUF_SIZE};

/// Destination a [`ContainerWriter`] can cut a partly written entry off.
pub trait ContainerDest: Write {
    /// Flush and return the length of the destination in bytes
    fn committed_len(&mut self) -> io::Result<u64>;

    /// Flush and drop everything past the first `len` bytes
    fn rollback(&mut self, len: u64) -> io::Result<()>;
}

impl ContainerDest for BufWriter<File> {
    fn committed_len(&mut self) -> io::Result<u64> {
        self.flush()?;
        Ok(self.get_ref().metadata()?.len())
    }

    fn rollback(&mut self, len: u64) -> io::Result<()> {
        self.flush()?;
        self.get_ref().set_len(len)
    }
}

impl ContainerDest for Vec<u8> {
    fn committed_len(&mut self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn rollback(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        self.truncate(len);
        Ok(())
    }
}

/// Appends framed entries to a container, one at a time and in call order.
///
/// Each entry is flushed to the destination before the next one is started,
/// so a failure leaves every earlier entry intact. An entry that fails partway
/// is cut back off the destination, so later appends stay readable. Nothing
/// present in the destination before the failing entry is ever rewritten.
///
/// # Example
/// ```
/// use boxfile::{ContainerSrc, ContainerWriter};
///
/// let mut writer = ContainerWriter::new(Vec::new(), "memory");
/// writer
///     .add_reader(&b"some file contents"[..], "path/to/unpack/to", 18).unwrap()
///     .add_reader(&b""[..], "empty", 0).unwrap();
/// let container = writer.finish().unwrap();
///
/// let mut src = &container[..];
/// let (entry, payload) = src.decode().unwrap().unwrap();
/// assert_eq!(entry.path(), "path/to/unpack/to");
/// assert_eq!(payload, b"some file contents");
/// ```
pub struct ContainerWriter<W: ContainerDest> {
    /// Name of the destination in error reports
    path: PathBuf,
    dest: W,
    buf: Vec<u8>,
    entries: usize,
    written: u64,
}

impl ContainerWriter<BufWriter<File>> {
    /// Open `path` for appending, creating it if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppendError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(wrap_io_err!(AppendError::DestinationUnavailable, path, "Open"))?;
        Ok(ContainerWriter::new(BufWriter::new(file), path))
    }
}

impl<W: ContainerDest> ContainerWriter<W> {
    /// Write entries to `dest`. `path` only names the destination in errors.
    pub fn new(dest: W, path: impl AsRef<Path>) -> Self {
        ContainerWriter {
            path: path.as_ref().to_path_buf(),
            dest,
            buf: Vec::new(),
            entries: 0,
            written: 0,
        }
    }

    /// Number of entries written so far
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Number of container bytes written so far, headers included
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Append the regular file at `source` as an entry named `target`.
    pub fn add_file(
        &mut self,
        source: impl AsRef<Path>,
        target: &str,
    ) -> Result<&mut Self, AppendError> {
        let source = source.as_ref();

        let file = File::open(source)
            .map_err(wrap_io_err!(AppendError::SourceUnavailable, source, "Open"))?;
        let metadata = file
            .metadata()
            .map_err(wrap_io_err!(AppendError::SourceUnavailable, source, "Stat"))?;
        if !metadata.is_file() {
            return Err(AppendError::SourceUnavailable {
                path: source.to_path_buf(),
                context: "Stat",
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        self.write_entry(file, source, target, metadata.len())?;
        Ok(self)
    }

    /// Append `size` bytes read from `source` as an entry named `target`.
    pub fn add_reader(
        &mut self,
        source: impl Read,
        target: &str,
        size: u64,
    ) -> Result<&mut Self, AppendError> {
        self.write_entry(source, Path::new(target), target, size)?;
        Ok(self)
    }

    /// Flush and hand back the destination
    pub fn finish(mut self) -> Result<W, AppendError> {
        self.dest
            .flush()
            .map_err(wrap_io_err!(AppendError::DestinationUnavailable, self.path, "Flush"))?;
        Ok(self.dest)
    }

    fn write_entry(
        &mut self,
        source: impl Read,
        source_path: &Path,
        target: &str,
        size: u64,
    ) -> Result<(), AppendError> {
        let entry = Entry::new(target, size).map_err(|err| AppendError::Entry {
            path: PathBuf::from(target),
            source: err,
        })?;

        if self.buf.is_empty() {
            self.buf = vec![0; READ_WRITE_BUF_SIZE];
        }

        let start = self
            .dest
            .committed_len()
            .map_err(wrap_io_err!(AppendError::DestinationUnavailable, self.path, "Stat"))?;

        if let Err(err) = self.write_framed(&entry, source, source_path) {
            if let Err(rollback_err) = self.dest.rollback(start) {
                warn!(
                    container = %self.path.display(),
                    offset = start,
                    err = %rollback_err,
                    "failed to cut off partly written entry"
                );
            }
            return Err(err);
        }

        debug!(
            path = entry.path(),
            size,
            offset = self.written,
            "appended entry"
        );
        self.entries += 1;
        self.written += entry.header_size() + size;
        Ok(())
    }

    fn write_framed(
        &mut self,
        entry: &Entry,
        source: impl Read,
        source_path: &Path,
    ) -> Result<(), AppendError> {
        let dest_path = &self.path;
        self.dest
            .write_all(&entry.header_bytes())
            .map_err(wrap_io_err!(
                AppendError::DestinationUnavailable,
                dest_path,
                "Write entry header"
            ))?;

        // Anything the source grew by since it was measured is left out
        let size = entry.size();
        let mut source = source.take(size);
        let mut total = 0;
        loop {
            let count = match source.read(&mut self.buf) {
                Ok(0) => break,
                Ok(count) => count,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    return Err(AppendError::SourceUnavailable {
                        path: source_path.to_path_buf(),
                        context: "Read",
                        source: err,
                    })
                }
            };
            self.dest
                .write_all(&self.buf[..count])
                .map_err(wrap_io_err!(
                    AppendError::DestinationUnavailable,
                    dest_path,
                    "Write entry payload"
                ))?;
            total += count as u64;
        }

        if total != size {
            return Err(AppendError::LengthMismatch {
                path: source_path.to_path_buf(),
                expected: size,
                actual: total,
            });
        }

        self.dest
            .flush()
            .map_err(wrap_io_err!(AppendError::DestinationUnavailable, dest_path, "Flush"))
    }
}

impl<W: ContainerDest> fmt::Debug for ContainerWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ContainerWriter")
            .field("path", &self.path)
            .field("entries", &self.entries)
            .field("written", &self.written)
            .finish()
    }
}
