mod bin;
mod container;
mod error;
pub mod ext;
mod extract;
mod writer;

pub use bin::*;
pub use container::*;
pub use error::*;
pub(crate) use error::wrap_io_err;
pub use writer::*;

pub use boxfile_core::{encode, ContainerSrc, Entry, Field};

/// Size of the buffer payloads are streamed through
const READ_WRITE_BUF_SIZE: usize = 4 * 1024 * 1024;
