use std::collections::HashSet;
use std::path::Path;

use boxfile_core::Entry;
use tracing::{debug, info, warn};

use crate::ext::{entry_path, EntryExt};
use crate::extract::materialize;
use crate::{AppendError, ContainerFile, ContainerWriter, ExtractError, READ_WRITE_BUF_SIZE};

/// Append one entry per file in `sources` to the container at `destination`,
/// in the given order. The container is created if it does not exist.
///
/// Each entry is named after its source path, see [`entry_path`]. All names
/// are checked before the container is opened, so an unusable name leaves the
/// container untouched.
pub fn append<P: AsRef<Path>>(
    destination: impl AsRef<Path>,
    sources: &[P],
) -> Result<(), AppendError> {
    let destination = destination.as_ref();

    let targets = sources
        .iter()
        .map(|source| entry_path(source.as_ref()))
        .collect::<Result<Vec<String>, AppendError>>()?;

    let mut seen = HashSet::new();
    for target in targets.iter() {
        if !seen.insert(target.as_str()) {
            warn!(
                path = %target,
                "entry path appears more than once, the last one wins on extract"
            );
        }
    }

    let mut writer = ContainerWriter::open(destination)?;
    for (source, target) in sources.iter().zip(targets.iter()) {
        writer.add_file(source, target)?;
    }

    let (entries, written) = (writer.entries(), writer.written());
    writer.finish()?;

    info!(
        container = %destination.display(),
        entries,
        bytes = written,
        "appended to container"
    );
    Ok(())
}

/// Recreate every entry of the container at `container` below
/// `destination`, in container order.
pub fn extract(
    destination: impl AsRef<Path>,
    container: impl AsRef<Path>,
) -> Result<(), ExtractError> {
    let base_dir = destination.as_ref();
    let mut container = ContainerFile::open(container)?;

    let mut buf = vec![0; READ_WRITE_BUF_SIZE];
    let (mut entries, mut bytes) = (0usize, 0u64);

    while let Some(entry) = container.next_entry()? {
        let relative_path = entry.check_path()?;
        let target_path = base_dir.join(relative_path);

        debug!(
            path = entry.path(),
            size = entry.size(),
            offset = container.offset(),
            "extracting entry"
        );
        materialize(&mut container, base_dir, &target_path, &mut buf)?;

        entries += 1;
        bytes += entry.size();
    }

    info!(
        container = %container.path().display(),
        destination = %base_dir.display(),
        entries,
        bytes,
        "extracted container"
    );
    Ok(())
}

/// Read every entry header of the container at `container`, in order.
///
/// Payloads are read through and discarded, so truncation anywhere in the
/// container is reported.
pub fn list(container: impl AsRef<Path>) -> Result<Vec<Entry>, ExtractError> {
    let mut container = ContainerFile::open(container)?;

    let mut entries = Vec::new();
    while let Some(entry) = container.next_entry()? {
        entries.push(entry);
    }
    Ok(entries)
}
