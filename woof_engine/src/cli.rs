use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use woof_engine::config::MAX_PRELOAD_FILES;

#[derive(Parser, Debug)]
#[command(
    about = "Resolves a Doom game session and optionally runs its title loop headless",
    version
)]
pub struct Args {
    /// Preference directory (default: the per-user data directory)
    #[arg(long)]
    pub pref_dir: Option<PathBuf>,

    /// JSON config file (default: <pref-dir>/<exe>.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to write the resolved load plan as JSON
    #[arg(long)]
    pub plan_json: Option<PathBuf>,

    /// Run the frame loop without a window or audio device
    #[arg(long)]
    pub headless: bool,

    /// Stop the headless loop after this many frames (requires --headless)
    #[arg(long)]
    pub frames: Option<u64>,

    /// Store a preloaded WAD in the config before starting (repeatable)
    #[arg(long, value_name = "NAME")]
    pub preload_wad: Vec<String>,

    /// Store a preloaded DEH/BEX patch in the config before starting (repeatable)
    #[arg(long, value_name = "NAME")]
    pub preload_patch: Vec<String>,

    /// Game command line, e.g. `-- -iwad doom2.wad -file mod.wad`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub game_args: Vec<String>,
}

#[derive(Debug)]
pub enum Command {
    Inspect(SessionArgs),
    Headless { session: SessionArgs, frames: Option<u64> },
}

#[derive(Debug)]
pub struct SessionArgs {
    pub pref_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub plan_json: Option<PathBuf>,
    pub preload_wads: Vec<String>,
    pub preload_patches: Vec<String>,
    pub game_args: Vec<String>,
}

pub fn parse() -> Result<Command> {
    let args = Args::parse();
    args.into_command()
}

impl Args {
    fn into_command(self) -> Result<Command> {
        if !self.headless && self.frames.is_some() {
            bail!("--frames requires --headless");
        }
        if self.preload_wad.len() > MAX_PRELOAD_FILES {
            bail!("at most {MAX_PRELOAD_FILES} --preload-wad values are supported");
        }
        if self.preload_patch.len() > MAX_PRELOAD_FILES {
            bail!("at most {MAX_PRELOAD_FILES} --preload-patch values are supported");
        }

        let session = SessionArgs {
            pref_dir: self.pref_dir,
            config: self.config,
            plan_json: self.plan_json,
            preload_wads: self.preload_wad,
            preload_patches: self.preload_patch,
            game_args: self.game_args,
        };
        if self.headless {
            Ok(Command::Headless {
                session,
                frames: self.frames,
            })
        } else {
            Ok(Command::Inspect(session))
        }
    }
}
