//! Ordered behaviour patches: DEHACKED lumps and `.deh`/`.bex` files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::assets::ResolveInputs;
use crate::autoload::{scan, PATCH_EXTENSIONS};
use crate::cmdline::add_default_extension;
use crate::error::StartupError;
use crate::store::LumpLookup;

pub const PATCH_LUMP: &str = "DEHACKED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PatchOrigin {
    EmbeddedLump { index: usize },
    File(PathBuf),
}

/// Which of the two candidate extensions a patch file resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtensionPreference {
    Preferred,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PatchGroup {
    PrimaryLumps,
    CommandLine,
    Autoload,
    ArchiveLumps,
    ArchiveAutoload,
    Preloaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchApplication {
    pub origin: PatchOrigin,
    pub preference: ExtensionPreference,
    pub group: PatchGroup,
}

/// Patches in application order, plus the optional diagnostics file named by
/// `-dehout` / `-bexout`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatchPlan {
    applications: Vec<PatchApplication>,
    output: Option<PathBuf>,
}

impl PatchPlan {
    fn push(&mut self, origin: PatchOrigin, preference: ExtensionPreference, group: PatchGroup) {
        log::debug!("patch {:?}: {:?}", group, origin);
        self.applications.push(PatchApplication {
            origin,
            preference,
            group,
        });
    }

    fn push_file(&mut self, path: PathBuf, group: PatchGroup) {
        self.push(PatchOrigin::File(path), ExtensionPreference::Preferred, group);
    }

    pub fn applications(&self) -> &[PatchApplication] {
        &self.applications
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }
}

/// Consumer of patch data. The text grammar lives behind this trait.
pub trait PatchEngine {
    fn apply_file(&mut self, path: &Path, output: Option<&Path>) -> Result<()>;
    fn apply_lump(&mut self, index: usize, data: &[u8], output: Option<&Path>) -> Result<()>;
    /// Runs once after every patch, for state derived from all of them.
    fn finalize(&mut self);
}

pub fn build_patch_plan(
    inputs: &ResolveInputs<'_>,
    store: &dyn LumpLookup,
) -> Result<PatchPlan, StartupError> {
    let cmdline = inputs.cmdline;
    let mut plan = PatchPlan {
        applications: Vec::new(),
        output: cmdline
            .value_after("-dehout")
            .or_else(|| cmdline.value_after("-bexout"))
            .map(PathBuf::from),
    };
    let embedded = !cmdline.parm_exists("-nodehlump");
    let lumps = store.lumps_named(PATCH_LUMP);

    if embedded {
        for &index in lumps.iter().filter(|&&index| store.is_iwad_lump(index)) {
            plan.push(
                PatchOrigin::EmbeddedLump { index },
                ExtensionPreference::Preferred,
                PatchGroup::PrimaryLumps,
            );
        }
    }

    for name in cmdline.flag_run(&["-deh", "-bex"]) {
        let (path, preference) = locate_patch(name, |file| inputs.locator.locate(file))
            .ok_or_else(|| StartupError::PatchNotFound(name.to_string()))?;
        plan.push(PatchOrigin::File(path), preference, PatchGroup::CommandLine);
    }

    let include_common = inputs.info.mission.is_doom_flavour();
    for dir in inputs.autoload.iwad_dirs(inputs.iwad, include_common) {
        for file in scan(&dir, PATCH_EXTENSIONS) {
            plan.push_file(file, PatchGroup::Autoload);
        }
    }

    if embedded {
        for &index in lumps.iter().filter(|&&index| !store.is_iwad_lump(index)) {
            plan.push(
                PatchOrigin::EmbeddedLump { index },
                ExtensionPreference::Preferred,
                PatchGroup::ArchiveLumps,
            );
        }
    }

    for name in inputs.autoload_archives() {
        for dir in inputs.autoload.archive_dirs(name) {
            for file in scan(&dir, PATCH_EXTENSIONS) {
                plan.push_file(file, PatchGroup::ArchiveAutoload);
            }
        }
    }

    if inputs.preloads_enabled() {
        for name in inputs.config.preloaded_patches() {
            let existing = |file: &str| Some(PathBuf::from(file)).filter(|path| path.is_file());
            match locate_patch(name, existing) {
                Some((path, preference)) => {
                    plan.push(PatchOrigin::File(path), preference, PatchGroup::Preloaded)
                }
                None => log::warn!("could not open {name} .deh or .bex"),
            }
        }
    }

    Ok(plan)
}

/// Tries `<name>.bex`, then `<name>.deh`. A name that already carries an
/// extension is tried as given.
fn locate_patch(
    name: &str,
    find: impl Fn(&str) -> Option<PathBuf>,
) -> Option<(PathBuf, ExtensionPreference)> {
    find(&add_default_extension(name, ".bex"))
        .map(|path| (path, ExtensionPreference::Preferred))
        .or_else(|| {
            find(&add_default_extension(name, ".deh"))
                .map(|path| (path, ExtensionPreference::Fallback))
        })
}

/// Applies `plan` in order and then finalizes the engine.
pub fn apply_patches(
    plan: &PatchPlan,
    store: &dyn LumpLookup,
    engine: &mut dyn PatchEngine,
) -> Result<(), StartupError> {
    for application in plan.applications() {
        let result = match &application.origin {
            PatchOrigin::File(path) => engine.apply_file(path, plan.output()),
            PatchOrigin::EmbeddedLump { index } => store
                .lump_bytes(*index)
                .with_context(|| format!("lump {index} is not in the store"))
                .and_then(|data| engine.apply_lump(*index, data, plan.output())),
        };
        result.map_err(|source| StartupError::PatchFailed {
            origin: describe(&application.origin),
            source,
        })?;
    }
    engine.finalize();
    Ok(())
}

fn describe(origin: &PatchOrigin) -> String {
    match origin {
        PatchOrigin::File(path) => path.display().to_string(),
        PatchOrigin::EmbeddedLump { index } => format!("{PATCH_LUMP} lump #{index}"),
    }
}

/// Patch engine that only records what it was handed. Files are read so an
/// unreadable patch still fails the way a real parser would.
#[derive(Debug, Default)]
pub struct PatchRecorder {
    applied: Vec<(String, usize)>,
    finalized: bool,
}

impl PatchRecorder {
    pub fn applied(&self) -> &[(String, usize)] {
        &self.applied
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl PatchEngine for PatchRecorder {
    fn apply_file(&mut self, path: &Path, _output: Option<&Path>) -> Result<()> {
        let data = fs::read(path)
            .with_context(|| format!("failed to read patch {}", path.display()))?;
        log::info!("Loading DEH file {}", path.display());
        self.applied.push((path.display().to_string(), data.len()));
        Ok(())
    }

    fn apply_lump(&mut self, index: usize, data: &[u8], _output: Option<&Path>) -> Result<()> {
        log::info!("Loading DEH lump #{index}");
        self.applied
            .push((String::from_utf8_lossy(data).into_owned(), data.len()));
        Ok(())
    }

    fn finalize(&mut self) {
        self.finalized = true;
    }
}
