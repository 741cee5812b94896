//! Session boot: identification, archive and patch resolution, store load.

use std::path::{Path, PathBuf};

use serde::Serialize;
use woof_formats::LumpDirectory;

use crate::assets::{build_asset_plan, AssetPlan, ResolveInputs};
use crate::autoload::AutoloadPaths;
use crate::cmdline::CommandLine;
use crate::config::EngineConfig;
use crate::demo::DemoSequencer;
use crate::display::DisplayMachine;
use crate::error::StartupError;
use crate::host::HostPaths;
use crate::launch::LaunchOptions;
use crate::locate::{FileLocator, SearchPath};
use crate::mapinfo::{apply_map_info, build_map_info_plan, MapInfoPlan, MapInfoSink};
use crate::patches::{apply_patches, build_patch_plan, PatchEngine, PatchPlan};
use crate::store::{accepts_input, check_modified_game};
use crate::version::{find_iwad, identify, select_game_version, GameModeInfo, GameVersion};

/// Host-level overrides that do not come from the game command line.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub pref_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

/// Everything resolved at startup. Read-only once the frame loop starts.
#[derive(Debug)]
pub struct Session {
    pub host: HostPaths,
    pub cmdline: CommandLine,
    pub config: EngineConfig,
    pub iwad: PathBuf,
    pub info: GameModeInfo,
    pub version: GameVersion,
    pub assets: AssetPlan,
    pub patches: PatchPlan,
    pub map_info: MapInfoPlan,
    pub store: LumpDirectory,
    pub launch: LaunchOptions,
    pub save_dir: PathBuf,
    pub accepts_input: bool,
}

/// The resolved load order, as written by `--plan-json`.
#[derive(Debug, Serialize)]
pub struct LoadReport<'a> {
    pub iwad: &'a Path,
    pub game: GameModeInfo,
    pub description: &'static str,
    pub version: GameVersion,
    pub assets: &'a AssetPlan,
    pub patches: &'a PatchPlan,
    pub map_info: &'a MapInfoPlan,
    pub launch: &'a LaunchOptions,
}

impl Session {
    pub fn report(&self) -> LoadReport<'_> {
        LoadReport {
            iwad: &self.iwad,
            game: self.info,
            description: self.info.description(&self.iwad),
            version: self.version,
            assets: &self.assets,
            patches: &self.patches,
            map_info: &self.map_info,
            launch: &self.launch,
        }
    }

    pub fn display_machine(&self) -> DisplayMachine {
        DisplayMachine::new(self.config.values().screen_melt, self.launch.nodraw)
    }

    pub fn demo_sequencer(&self) -> DemoSequencer {
        DemoSequencer::new(self.info.mode)
    }
}

/// Boots with the default search path.
pub fn boot(
    cmdline: CommandLine,
    options: &StartupOptions,
    patch_engine: &mut dyn PatchEngine,
    map_info: &mut dyn MapInfoSink,
) -> Result<Session, StartupError> {
    boot_with(cmdline, options, None, patch_engine, map_info)
}

/// `locator` replaces the search path built from the environment.
pub fn boot_with(
    cmdline: CommandLine,
    options: &StartupOptions,
    locator: Option<&dyn FileLocator>,
    patch_engine: &mut dyn PatchEngine,
    map_info_sink: &mut dyn MapInfoSink,
) -> Result<Session, StartupError> {
    let cmdline = cmdline.expand_response_file()?;
    let host = HostPaths::discover(cmdline.program(), options.pref_dir.as_deref());

    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| host.config_path());
    let config = match EngineConfig::from_json_file(Some(&config_path)) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("{err:#}; using defaults");
            EngineConfig::default()
        }
    };

    let search = SearchPath::from_environment(&host);
    let locator = locator.unwrap_or(&search);

    let iwad = find_iwad(&cmdline, locator)?;
    log::info!("IWAD found: {}", iwad.display());
    let info = identify(&iwad)?;
    log::info!("{}", info.title());
    log::info!("{}", info.description(&iwad));
    let version = select_game_version(&cmdline, info)?;
    log::info!("emulating {}", version.cmdline_name());

    let autoload = AutoloadPaths::prepare(&host, &cmdline);
    let inputs = ResolveInputs {
        cmdline: &cmdline,
        iwad: &iwad,
        info,
        autoload: &autoload,
        config: &config,
        locator,
    };
    let assets = build_asset_plan(&inputs)?;

    log::info!("W_Init: Init WADfiles.");
    let store =
        LumpDirectory::open_all(assets.archive_paths()).map_err(StartupError::ArchiveLoad)?;
    for archive in store.archives() {
        log::info!(" adding {}", archive.path().display());
    }

    let patches = build_patch_plan(&inputs, &store)?;
    apply_patches(&patches, &store, patch_engine)?;

    check_modified_game(info, assets.is_modified_game(), &store)?;

    let map_info = build_map_info_plan(&cmdline, &store);
    apply_map_info(&map_info, &store, map_info_sink);

    let launch = LaunchOptions::from_cmdline(&cmdline, info.mode);
    let save_dir = host.save_dir(&cmdline);
    let accepts_input = accepts_input(info, &store);
    if !accepts_input {
        log::warn!("no MAP01 in a commercial IWAD, input disabled");
    }

    Ok(Session {
        host,
        cmdline,
        config,
        iwad,
        info,
        version,
        assets,
        patches,
        map_info,
        store,
        launch,
        save_dir,
        accepts_input,
    })
}
