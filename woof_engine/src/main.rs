use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Builder, Env};
use serde::Serialize;
use woof_engine::config::EngineConfig;
use woof_engine::frame_loop::FrameLoop;
use woof_engine::headless::{
    AttractSimulation, CountingRenderer, MapInfoLog, RenderStats, SilentSound, WallClock,
};
use woof_engine::host::HostPaths;
use woof_engine::patches::PatchRecorder;
use woof_engine::{boot, CommandLine, Session, StartupOptions};

mod cli;
use cli::{Command, SessionArgs};

const DEFAULT_PROGRAM: &str = "woof";

#[derive(Serialize)]
struct HeadlessSummary {
    frames: u64,
    tics: u64,
    render: RenderStats,
}

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    match cli::parse()? {
        Command::Inspect(args) => {
            let session = start_session(&args)?;
            print_summary(&session);
        }
        Command::Headless { session: args, frames } => {
            let session = start_session(&args)?;
            print_summary(&session);
            let summary = run_headless(&session, frames);
            println!(
                "Ran {} frame(s), {} tic(s): {}",
                summary.frames,
                summary.tics,
                serde_json::to_string(&summary).context("serializing headless summary")?
            );
        }
    }

    Ok(())
}

fn start_session(args: &SessionArgs) -> Result<Session> {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());
    let cmdline = CommandLine::new(std::iter::once(program).chain(args.game_args.iter().cloned()));

    if !args.preload_wads.is_empty() || !args.preload_patches.is_empty() {
        let host = HostPaths::discover(cmdline.program(), args.pref_dir.as_deref());
        let path = args.config.clone().unwrap_or_else(|| host.config_path());
        store_preloads(&path, &args.preload_wads, &args.preload_patches)?;
    }

    let options = StartupOptions {
        pref_dir: args.pref_dir.clone(),
        config_path: args.config.clone(),
    };
    let mut patches = PatchRecorder::default();
    let mut map_info = MapInfoLog::default();
    let session =
        boot(cmdline, &options, &mut patches, &mut map_info).context("startup failed")?;

    if let Some(path) = &args.plan_json {
        write_plan_json(path, &session)?;
    }
    Ok(session)
}

fn store_preloads(path: &Path, wads: &[String], patches: &[String]) -> Result<()> {
    let mut config = EngineConfig::from_json_file(Some(path))?;
    for (slot, name) in wads.iter().enumerate() {
        config.set_preloaded_wad(slot, name.as_str());
    }
    for (slot, name) in patches.iter().enumerate() {
        config.set_preloaded_patch(slot, name.as_str());
    }
    config.save()?;
    println!("Saved preload slots to {}", path.display());
    Ok(())
}

fn write_plan_json(path: &Path, session: &Session) -> Result<()> {
    let json = serde_json::to_string_pretty(&session.report())
        .context("serializing load plan to JSON")?;
    fs::write(path, json).with_context(|| format!("writing load plan to {}", path.display()))?;
    println!("Saved load plan JSON to {}", path.display());
    Ok(())
}

fn print_summary(session: &Session) {
    println!("{}", session.info.description(&session.iwad));
    println!("IWAD: {}", session.iwad.display());
    println!("Game version: {}", session.version.cmdline_name());
    println!("Archives:");
    for entry in session.assets.entries() {
        println!("  {:?} {}", entry.origin, entry.source.display());
    }
    if session.patches.is_empty() {
        println!("Patches: none");
    } else {
        println!("Patches: {}", session.patches.len());
    }
    println!("Save directory: {}", session.save_dir.display());
    println!("Start: {:?}", session.launch.start_action());
}

fn run_headless(session: &Session, max_frames: Option<u64>) -> HeadlessSummary {
    let mut frame_loop = FrameLoop::new(session.display_machine());
    let mut clock = WallClock::default();
    let mut sim = AttractSimulation::new(
        &session.store,
        session.demo_sequencer(),
        &session.launch,
        session.accepts_input,
    );
    let mut sound = SilentSound;
    let mut renderer = CountingRenderer::default();

    let frames = frame_loop.run(&mut clock, &mut sim, &mut sound, &mut renderer, max_frames);
    HeadlessSummary {
        frames,
        tics: frame_loop.tics_run(),
        render: renderer.stats(),
    }
}
