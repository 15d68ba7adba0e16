mod cursor;
#[cfg(target_os = "windows")]
mod process;
mod reader;
mod snapshot;

#[cfg(test)]
pub mod mock;

pub use cursor::{Cursor, Window};
#[cfg(target_os = "windows")]
pub use process::*;
pub use reader::{MAX_STRING_LEN, PointerWidth, ReadMemory};
pub use snapshot::SnapshotReader;
pub(crate) use snapshot::read_exact_at;

#[cfg(test)]
pub use mock::{MockMemoryBuilder, MockMemoryReader};
