//! Game mode and mission identification for the primary archive.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use woof_formats::{WadArchive, WadKind, lump_name_eq};

use crate::cmdline::{add_default_extension, CommandLine};
use crate::error::StartupError;
use crate::locate::FileLocator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GameMode {
    Shareware,
    Registered,
    Commercial,
    Retail,
    Undetermined,
}

impl GameMode {
    /// Column of this mode in mode-indexed tables.
    pub fn table_index(self) -> Option<usize> {
        match self {
            GameMode::Shareware => Some(0),
            GameMode::Registered => Some(1),
            GameMode::Commercial => Some(2),
            GameMode::Retail => Some(3),
            GameMode::Undetermined => None,
        }
    }
}

/// Declaration order matters: missions before `Chex` are flavours of Doom
/// and share the common autoload directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GameMission {
    Doom,
    Doom2,
    Tnt,
    Plutonia,
    Chex,
    Hacx,
    Rekkr,
    None,
}

impl GameMission {
    pub fn is_doom_flavour(self) -> bool {
        self < GameMission::Chex
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Language {
    English,
    French,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameModeInfo {
    pub mode: GameMode,
    pub mission: GameMission,
}

impl GameModeInfo {
    pub const UNDETERMINED: GameModeInfo = GameModeInfo {
        mode: GameMode::Undetermined,
        mission: GameMission::Doom,
    };

    /// Version line printed once the IWAD is identified.
    pub fn description(&self, iwad: &Path) -> &'static str {
        match self.mode {
            GameMode::Retail => match self.mission {
                GameMission::Chex => "Chex(R) Quest",
                GameMission::Rekkr => "REKKR",
                _ => "Ultimate DOOM version",
            },
            GameMode::Registered => "DOOM Registered version",
            GameMode::Shareware => "DOOM Shareware version",
            GameMode::Commercial => match self.mission {
                GameMission::Hacx => "HACX: Twitch n' Kill",
                GameMission::Tnt => "Final DOOM: TNT - Evilution version",
                GameMission::Plutonia => "Final DOOM: The Plutonia Experiment version",
                _ if language_for(iwad) == Language::French => {
                    "DOOM II version, French language"
                }
                _ => "DOOM II version",
            },
            GameMode::Undetermined => "Unknown Game Version, may not work",
        }
    }

    /// Startup banner title.
    pub fn title(&self) -> &'static str {
        match self.mode {
            GameMode::Retail => "The Ultimate DOOM Startup",
            GameMode::Shareware => "DOOM Shareware Startup",
            GameMode::Registered => "DOOM Registered Startup",
            GameMode::Commercial => match self.mission {
                GameMission::Plutonia => "DOOM 2: Plutonia Experiment",
                GameMission::Tnt => "DOOM 2: TNT - Evilution",
                _ => "DOOM 2: Hell on Earth",
            },
            GameMode::Undetermined => "Public DOOM",
        }
    }
}

impl fmt::Display for GameModeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.mode, self.mission)
    }
}

pub struct StandardIwad {
    pub name: &'static str,
    pub mission: GameMission,
    pub mode: GameMode,
}

/// Known IWAD file names, in search priority order.
pub const STANDARD_IWADS: &[StandardIwad] = &[
    StandardIwad { name: "doom2.wad", mission: GameMission::Doom2, mode: GameMode::Commercial },
    StandardIwad { name: "plutonia.wad", mission: GameMission::Plutonia, mode: GameMode::Commercial },
    StandardIwad { name: "tnt.wad", mission: GameMission::Tnt, mode: GameMode::Commercial },
    StandardIwad { name: "doom.wad", mission: GameMission::Doom, mode: GameMode::Retail },
    StandardIwad { name: "doom1.wad", mission: GameMission::Doom, mode: GameMode::Shareware },
    StandardIwad { name: "doom2f.wad", mission: GameMission::Doom2, mode: GameMode::Commercial },
    StandardIwad { name: "chex.wad", mission: GameMission::Chex, mode: GameMode::Retail },
    StandardIwad { name: "hacx.wad", mission: GameMission::Hacx, mode: GameMode::Commercial },
    StandardIwad { name: "freedoom2.wad", mission: GameMission::Doom2, mode: GameMode::Commercial },
    StandardIwad { name: "freedoom1.wad", mission: GameMission::Doom, mode: GameMode::Retail },
    StandardIwad { name: "freedm.wad", mission: GameMission::Doom2, mode: GameMode::Commercial },
    StandardIwad { name: "rekkrsa.wad", mission: GameMission::Rekkr, mode: GameMode::Retail },
];

fn describe_dirs(dirs: &[PathBuf]) -> String {
    if dirs.is_empty() {
        return "(none)".to_string();
    }
    dirs.iter()
        .map(|dir| dir.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn language_for(iwad: &Path) -> Language {
    if base_name(iwad).eq_ignore_ascii_case("doom2f.wad") {
        Language::French
    } else {
        Language::English
    }
}

/// Locates the primary archive: `-iwad <name>` (default extension `.wad`,
/// or a directory holding a standard IWAD), otherwise the first standard
/// name the locator can find.
pub fn find_iwad(cmdline: &CommandLine, locator: &dyn FileLocator) -> Result<PathBuf, StartupError> {
    if let Some(requested) = cmdline.value_after("-iwad") {
        let requested_path = Path::new(requested);
        if requested_path.is_dir() {
            return STANDARD_IWADS
                .iter()
                .map(|iwad| requested_path.join(iwad.name))
                .find(|candidate| candidate.is_file())
                .ok_or_else(|| StartupError::IwadNotFound(requested.to_string()));
        }
        let file = add_default_extension(requested, ".wad");
        return locator
            .locate(&file)
            .ok_or(StartupError::IwadNotFound(file));
    }

    STANDARD_IWADS
        .iter()
        .find_map(|iwad| locator.locate(iwad.name))
        .ok_or_else(|| StartupError::NoIwad {
            searched: describe_dirs(locator.search_dirs()),
        })
}

/// Classifies `iwad` by its file name, falling back to probing its lump
/// directory.
pub fn identify(iwad: &Path) -> Result<GameModeInfo, StartupError> {
    let name = base_name(iwad);
    if let Some(standard) = STANDARD_IWADS
        .iter()
        .find(|standard| standard.name.eq_ignore_ascii_case(&name))
    {
        return Ok(GameModeInfo {
            mode: standard.mode,
            mission: standard.mission,
        });
    }
    identify_by_content(iwad)
}

pub fn identify_by_content(iwad: &Path) -> Result<GameModeInfo, StartupError> {
    let archive = WadArchive::open_wad(iwad).map_err(|source| StartupError::IwadUnreadable {
        path: iwad.to_path_buf(),
        source,
    })?;
    if archive.kind() != WadKind::Iwad {
        log::warn!("CheckIWAD: IWAD tag {} not present", iwad.display());
    }
    let names: Vec<&str> = archive.entries().iter().map(|entry| entry.name.as_str()).collect();
    let info = probe_lump_names(&names);
    if info.mode == GameMode::Undetermined {
        return Err(StartupError::UnknownGameMode);
    }
    Ok(info)
}

/// The first of `MAP01` / `E1M1` in directory order picks commercial or
/// shareware; episode 4 and 3 markers then promote a non-commercial IWAD.
pub fn probe_lump_names(names: &[&str]) -> GameModeInfo {
    let mut info = GameModeInfo::UNDETERMINED;

    for name in names {
        if lump_name_eq(name, "MAP01") {
            info.mission = GameMission::Doom2;
            break;
        }
        if lump_name_eq(name, "E1M1") {
            info.mode = GameMode::Shareware;
            info.mission = GameMission::Doom;
            break;
        }
    }

    if info.mission == GameMission::Doom2 {
        info.mode = GameMode::Commercial;
        return info;
    }

    for name in names {
        if lump_name_eq(name, "E4M1") {
            info.mode = GameMode::Retail;
            break;
        }
        if lump_name_eq(name, "E3M1") {
            info.mode = GameMode::Registered;
        }
    }
    info
}

/// Executable behaviour to emulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameVersion {
    Doom19,
    Ultimate,
    Final,
    Chex,
}

pub struct GameVersionSpec {
    pub description: &'static str,
    pub cmdline: &'static str,
    pub version: GameVersion,
}

pub const GAME_VERSIONS: &[GameVersionSpec] = &[
    GameVersionSpec { description: "Doom 1.9", cmdline: "1.9", version: GameVersion::Doom19 },
    GameVersionSpec { description: "Ultimate Doom", cmdline: "ultimate", version: GameVersion::Ultimate },
    GameVersionSpec { description: "Final Doom", cmdline: "final", version: GameVersion::Final },
    GameVersionSpec { description: "Chex Quest", cmdline: "chex", version: GameVersion::Chex },
];

impl GameVersion {
    pub fn cmdline_name(self) -> &'static str {
        GAME_VERSIONS
            .iter()
            .find(|spec| spec.version == self)
            .map(|spec| spec.cmdline)
            .unwrap_or("1.9")
    }
}

/// `-gameversion <name>` when given, otherwise derived from the game mode.
pub fn select_game_version(
    cmdline: &CommandLine,
    info: GameModeInfo,
) -> Result<GameVersion, StartupError> {
    if let Some(requested) = cmdline.value_after("-gameversion") {
        return GAME_VERSIONS
            .iter()
            .find(|spec| spec.cmdline == requested)
            .map(|spec| spec.version)
            .ok_or_else(|| StartupError::UnknownGameVersion {
                requested: requested.to_string(),
                supported: GAME_VERSIONS
                    .iter()
                    .map(|spec| format!("{} ({})", spec.cmdline, spec.description))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
    }

    let version = match (info.mode, info.mission) {
        (GameMode::Shareware | GameMode::Registered, _) => GameVersion::Doom19,
        (GameMode::Commercial, GameMission::Doom2) => GameVersion::Doom19,
        (GameMode::Retail, GameMission::Chex) => GameVersion::Chex,
        (GameMode::Retail, _) => GameVersion::Ultimate,
        (GameMode::Commercial, _) => GameVersion::Final,
        (GameMode::Undetermined, _) => GameVersion::Doom19,
    };
    Ok(version)
}
