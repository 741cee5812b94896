//! Composition of the ordered archive list handed to the lump store.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::autoload::{scan, AutoloadPaths, ARCHIVE_EXTENSIONS};
use crate::cmdline::{add_default_extension, CommandLine};
use crate::config::EngineConfig;
use crate::error::StartupError;
use crate::locate::FileLocator;
use crate::version::GameModeInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssetOrigin {
    PrimaryArchive,
    AutoloadCommon,
    AutoloadPerArchive,
    CommandLine,
    DemoLump,
    Preloaded,
    Sentinel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetEntry {
    pub source: PathBuf,
    pub origin: AssetOrigin,
}

/// Archives in load order. Entries are only ever appended; the store resolves
/// names to the last entry that provides them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetPlan {
    entries: Vec<AssetEntry>,
    modified_game: bool,
}

impl AssetPlan {
    fn push(&mut self, source: impl Into<PathBuf>, origin: AssetOrigin) {
        if self.is_terminated() {
            log::warn!("ignoring archive appended after the end of the list");
            return;
        }
        let source = source.into();
        log::debug!("asset {:?}: {}", origin, source.display());
        self.entries.push(AssetEntry { source, origin });
    }

    fn terminate(&mut self) {
        if !self.is_terminated() {
            self.entries.push(AssetEntry {
                source: PathBuf::new(),
                origin: AssetOrigin::Sentinel,
            });
        }
    }

    pub fn entries(&self) -> &[AssetEntry] {
        &self.entries
    }

    pub fn is_terminated(&self) -> bool {
        self.entries
            .last()
            .map(|entry| entry.origin == AssetOrigin::Sentinel)
            .unwrap_or(false)
    }

    /// Archive paths in load order, without the terminator.
    pub fn archive_paths(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .take_while(|entry| entry.origin != AssetOrigin::Sentinel)
            .map(|entry| entry.source.as_path())
    }

    /// True once `-file` was given, whatever followed it.
    pub fn is_modified_game(&self) -> bool {
        self.modified_game
    }
}

/// Inputs shared by the archive and patch resolution passes.
pub struct ResolveInputs<'a> {
    pub cmdline: &'a CommandLine,
    pub iwad: &'a Path,
    pub info: GameModeInfo,
    pub autoload: &'a AutoloadPaths,
    pub config: &'a EngineConfig,
    pub locator: &'a dyn FileLocator,
}

impl ResolveInputs<'_> {
    /// Archive names following `-file`, in command-line order.
    pub fn command_line_archives(&self) -> Vec<&str> {
        self.cmdline.flag_run(&["-file"])
    }

    /// Archives whose per-archive autoload directories are scanned: only the
    /// first run of names after `-file`.
    pub fn autoload_archives(&self) -> Vec<&str> {
        self.cmdline.first_run("-file")
    }

    pub fn preloads_enabled(&self) -> bool {
        !self.cmdline.parm_exists("-noload")
    }
}

pub fn build_asset_plan(inputs: &ResolveInputs<'_>) -> Result<AssetPlan, StartupError> {
    let mut plan = AssetPlan::default();

    plan.push(inputs.iwad, AssetOrigin::PrimaryArchive);

    let include_common = inputs.info.mission.is_doom_flavour();
    for base in inputs.autoload.bases() {
        let single = AutoloadPaths::from_bases([base]);
        let dirs = single.iwad_dirs(inputs.iwad, include_common);
        for (index, dir) in dirs.iter().enumerate() {
            let origin = if include_common && index == 0 {
                AssetOrigin::AutoloadCommon
            } else {
                AssetOrigin::AutoloadPerArchive
            };
            for file in scan(dir, ARCHIVE_EXTENSIONS) {
                plan.push(file, origin);
            }
        }
    }

    plan.modified_game = inputs.cmdline.parm_exists("-file");
    let archives = inputs.command_line_archives();
    for name in &archives {
        let file = add_default_extension(name, ".wad");
        let path = inputs
            .locator
            .locate(&file)
            .ok_or_else(|| StartupError::ArchiveNotFound(file.clone()))?;
        plan.push(path, AssetOrigin::CommandLine);
    }

    for name in inputs.autoload_archives() {
        for dir in inputs.autoload.archive_dirs(name) {
            for file in scan(&dir, ARCHIVE_EXTENSIONS) {
                plan.push(file, AssetOrigin::AutoloadPerArchive);
            }
        }
    }

    if let Some(demo) = demo_lump_name(inputs.cmdline) {
        let file = add_default_extension(demo, ".lmp");
        let path = inputs
            .locator
            .locate(&file)
            .ok_or_else(|| StartupError::ArchiveNotFound(file.clone()))?;
        log::info!("Playing demo {file}");
        plan.push(path, AssetOrigin::DemoLump);
    }

    if inputs.preloads_enabled() {
        for name in inputs.config.preloaded_wads() {
            let file = add_default_extension(name, ".wad");
            if Path::new(&file).is_file() {
                plan.push(file, AssetOrigin::Preloaded);
            } else {
                log::warn!("could not open {file}");
            }
        }
    }

    plan.terminate();
    Ok(plan)
}

/// Demo named by `-playdemo`, else `-fastdemo`, else `-timedemo`.
pub fn demo_lump_name(cmdline: &CommandLine) -> Option<&str> {
    ["-playdemo", "-fastdemo", "-timedemo"]
        .iter()
        .find_map(|flag| cmdline.value_after(flag))
}
