use woof_formats::{LumpDirectory, LumpNamespace};

use crate::error::StartupError;
use crate::version::{GameMode, GameModeInfo};

/// Read access to the loaded lump store.
pub trait LumpLookup {
    /// Index of the last global lump called `name`.
    fn check_num_for_name(&self, name: &str) -> Option<usize>;
    fn check_num_for_sprite(&self, name: &str) -> Option<usize>;
    /// Global lumps called `name`, in the order they were loaded.
    fn lumps_named(&self, name: &str) -> Vec<usize>;
    fn is_iwad_lump(&self, index: usize) -> bool;
    fn lump_bytes(&self, index: usize) -> Option<&[u8]>;

    fn lump_exists(&self, name: &str) -> bool {
        self.check_num_for_name(name).is_some()
    }
}

impl LumpLookup for LumpDirectory {
    fn check_num_for_name(&self, name: &str) -> Option<usize> {
        LumpDirectory::check_num_for_name(self, name)
    }

    fn check_num_for_sprite(&self, name: &str) -> Option<usize> {
        self.check_num_for_name_ns(name, LumpNamespace::Sprites)
    }

    fn lumps_named(&self, name: &str) -> Vec<usize> {
        self.positions(name)
            .iter()
            .copied()
            .filter(|&index| {
                self.lump(index)
                    .map(|lump| lump.namespace == LumpNamespace::Global)
                    .unwrap_or(false)
            })
            .collect()
    }

    fn is_iwad_lump(&self, index: usize) -> bool {
        LumpDirectory::is_iwad_lump(self, index)
    }

    fn lump_bytes(&self, index: usize) -> Option<&[u8]> {
        LumpDirectory::lump_bytes(self, index)
    }
}

/// Lumps a genuine registered IWAD always carries.
pub const REGISTERED_LUMPS: [&str; 23] = [
    "e2m1", "e2m2", "e2m3", "e2m4", "e2m5", "e2m6", "e2m7", "e2m8", "e2m9", "e3m1", "e3m3",
    "e3m3", "e3m4", "e3m5", "e3m6", "e3m7", "e3m8", "e3m9", "dphoof", "bfgga0", "heada1",
    "cybra1", "spida1d1",
];

/// Rejects add-on archives on shareware, and registered IWADs missing
/// registered content.
pub fn check_modified_game(
    info: GameModeInfo,
    modified: bool,
    store: &dyn LumpLookup,
) -> Result<(), StartupError> {
    if !modified {
        return Ok(());
    }
    match info.mode {
        GameMode::Shareware => Err(StartupError::ModifiedShareware),
        GameMode::Registered => {
            let complete = REGISTERED_LUMPS.iter().all(|name| {
                store.check_num_for_name(name).is_some()
                    || store.check_num_for_sprite(name).is_some()
            });
            if complete {
                Ok(())
            } else {
                Err(StartupError::FakeRegistered)
            }
        }
        _ => Ok(()),
    }
}

/// Whether the game should react to input. A commercial IWAD without
/// `MAP01` is a store demo and only runs the attract loop.
pub fn accepts_input(info: GameModeInfo, store: &dyn LumpLookup) -> bool {
    info.mode != GameMode::Commercial || store.lump_exists("MAP01")
}
