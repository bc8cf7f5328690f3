use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::{wrap_io_err, ContainerFile, ExtractError};

/// Write the payload of the container's current entry to `target`.
///
/// The payload goes to a temporary file next to `target`, renamed into place
/// once the whole payload has been read. A truncated container never leaves a
/// truncated file behind, and the temporary is removed when dropped. An
/// existing file at `target` is overwritten.
pub(crate) fn materialize(
    container: &mut ContainerFile,
    base_dir: &Path,
    target: &Path,
    buf: &mut [u8],
) -> Result<(), ExtractError> {
    let parent = target.parent().unwrap_or(base_dir);
    fs::create_dir_all(parent)
        .map_err(wrap_io_err!(ExtractError::WriteFailed, parent, "Create directory"))?;

    // Named independently of `target`, so any legal file name still fits
    let mut tmp_file = NamedTempFile::new_in(parent)
        .map_err(wrap_io_err!(ExtractError::WriteFailed, parent, "Create temporary file"))?;

    loop {
        let count = container.read_data(buf)?;
        if count == 0 {
            break;
        }
        tmp_file
            .write_all(&buf[..count])
            .map_err(wrap_io_err!(ExtractError::WriteFailed, tmp_file.path(), "Write file"))?;
    }

    tmp_file
        .persist(target)
        .map_err(|err| ExtractError::WriteFailed {
            path: target.to_path_buf(),
            context: "Rename into place",
            source: err.error,
        })?;
    Ok(())
}
