pub mod directory;
pub mod wad;

pub use directory::{LumpDirectory, LumpInfo};
pub use wad::{LumpNamespace, WadArchive, WadEntry, WadKind, lump_name_eq, write_wad};
