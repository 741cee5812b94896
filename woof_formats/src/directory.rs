use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;

use crate::wad::{LumpNamespace, WadArchive, WadEntry};

/// One lump as seen through the merged directory.
#[derive(Debug, Clone)]
pub struct LumpInfo {
    pub name: String,
    pub namespace: LumpNamespace,
    pub archive: usize,
    entry: usize,
}

/// All lumps of the loaded archives in load order. Name lookups return the
/// most recently added lump, so later archives override earlier ones.
#[derive(Debug, Default)]
pub struct LumpDirectory {
    archives: Vec<WadArchive>,
    lumps: Vec<LumpInfo>,
    by_name: HashMap<String, Vec<usize>>,
}

impl LumpDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens every path in order. The first archive is treated as the IWAD.
    pub fn open_all<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut directory = LumpDirectory::new();
        for path in paths {
            directory.push_archive(WadArchive::open(path)?);
        }
        Ok(directory)
    }

    pub fn push_archive(&mut self, archive: WadArchive) {
        let archive_index = self.archives.len();
        for (entry_index, entry) in archive.entries().iter().enumerate() {
            let lump_index = self.lumps.len();
            self.lumps.push(LumpInfo {
                name: entry.name.clone(),
                namespace: entry.namespace,
                archive: archive_index,
                entry: entry_index,
            });
            self.by_name
                .entry(index_key(&entry.name))
                .or_default()
                .push(lump_index);
        }
        self.archives.push(archive);
    }

    pub fn archives(&self) -> &[WadArchive] {
        &self.archives
    }

    pub fn len(&self) -> usize {
        self.lumps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lumps.is_empty()
    }

    pub fn lump(&self, index: usize) -> Option<&LumpInfo> {
        self.lumps.get(index)
    }

    /// Every lump carrying `name`, in insertion order, across all namespaces.
    pub fn positions(&self, name: &str) -> &[usize] {
        self.by_name
            .get(&index_key(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn check_num_for_name(&self, name: &str) -> Option<usize> {
        self.check_num_for_name_ns(name, LumpNamespace::Global)
    }

    pub fn check_num_for_name_ns(&self, name: &str, namespace: LumpNamespace) -> Option<usize> {
        self.positions(name)
            .iter()
            .rev()
            .copied()
            .find(|&index| self.lumps[index].namespace == namespace)
    }

    pub fn is_iwad_lump(&self, index: usize) -> bool {
        self.lumps
            .get(index)
            .map(|lump| lump.archive == 0)
            .unwrap_or(false)
    }

    pub fn lump_bytes(&self, index: usize) -> Option<&[u8]> {
        let lump = self.lumps.get(index)?;
        let archive = &self.archives[lump.archive];
        let entry: &WadEntry = &archive.entries()[lump.entry];
        Some(archive.read_entry_bytes(entry))
    }
}

fn index_key(name: &str) -> String {
    name.chars().take(8).collect::<String>().to_ascii_uppercase()
}
