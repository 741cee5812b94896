pub mod assets;
pub mod autoload;
pub mod cmdline;
pub mod config;
pub mod demo;
pub mod display;
pub mod error;
pub mod events;
pub mod frame_loop;
pub mod headless;
pub mod host;
pub mod launch;
pub mod locate;
pub mod mapinfo;
pub mod patches;
pub mod startup;
pub mod store;
pub mod version;
pub mod wipe;

pub use assets::{AssetEntry, AssetOrigin, AssetPlan};
pub use cmdline::CommandLine;
pub use error::StartupError;
pub use frame_loop::{FrameLoop, Platform, Simulation, Sound};
pub use patches::{PatchApplication, PatchEngine, PatchOrigin, PatchPlan};
pub use startup::{boot, boot_with, Session, StartupOptions};
pub use version::{GameMission, GameMode, GameModeInfo};
