use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::tempdir;
use woof_formats::{write_wad, WadKind};

fn run_engine(cwd: &Path, args: &[&str]) -> Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_woof_engine"))
        .current_dir(cwd)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .context("executing woof_engine")
}

fn transcript(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).to_string();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

fn write_doom2(dir: &Path) -> Result<String> {
    let iwad = dir.join("doom2.wad");
    write_wad(
        &iwad,
        WadKind::Iwad,
        &[
            ("MAP01", b"".as_slice()),
            ("TITLEPIC", b"title".as_slice()),
            ("CREDIT", b"credit".as_slice()),
        ],
    )?;
    iwad.to_str()
        .map(str::to_string)
        .context("iwad path is not valid UTF-8")
}

#[test]
fn plan_json_lists_archives_in_load_order() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary install")?;
    let iwad = write_doom2(temp_dir.path())?;
    write_wad(temp_dir.path().join("mod.wad"), WadKind::Pwad, &[("THINGS", b"")])?;
    let pref = temp_dir.path().join("pref");
    let plan_path = temp_dir.path().join("plan.json");

    let output = run_engine(
        temp_dir.path(),
        &[
            "--pref-dir",
            pref.to_str().context("pref path is not valid UTF-8")?,
            "--plan-json",
            plan_path.to_str().context("plan path is not valid UTF-8")?,
            "--",
            "-iwad",
            &iwad,
            "-noautoload",
            "-file",
            "mod.wad",
            "-warp",
            "5",
        ],
    )?;
    assert!(output.status.success(), "woof_engine failed: {}", transcript(&output));
    assert!(transcript(&output).contains("DOOM II version"));

    let plan: Value = serde_json::from_str(&fs::read_to_string(&plan_path)?)?;
    assert_eq!(plan["game"]["mode"], "Commercial");
    let origins: Vec<&str> = plan["assets"]["entries"]
        .as_array()
        .context("entries should be an array")?
        .iter()
        .filter_map(|entry| entry["origin"].as_str())
        .collect();
    assert_eq!(origins, vec!["PrimaryArchive", "CommandLine", "Sentinel"]);
    assert_eq!(plan["assets"]["modified_game"], true);
    assert_eq!(plan["launch"]["map"], 5);
    assert_eq!(plan["launch"]["autostart"], true);
    Ok(())
}

#[test]
fn preload_slots_persist_and_join_the_plan() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary install")?;
    let iwad = write_doom2(temp_dir.path())?;
    let extra = temp_dir.path().join("extra.wad");
    write_wad(&extra, WadKind::Pwad, &[("EXTRA", b"x")])?;
    let config = temp_dir.path().join("woof.json");
    let plan_path = temp_dir.path().join("plan.json");

    let output = run_engine(
        temp_dir.path(),
        &[
            "--pref-dir",
            temp_dir.path().to_str().context("temp path is not valid UTF-8")?,
            "--config",
            config.to_str().context("config path is not valid UTF-8")?,
            "--preload-wad",
            extra.to_str().context("extra path is not valid UTF-8")?,
            "--plan-json",
            plan_path.to_str().context("plan path is not valid UTF-8")?,
            "--",
            "-iwad",
            &iwad,
            "-noautoload",
        ],
    )?;
    assert!(output.status.success(), "woof_engine failed: {}", transcript(&output));

    let saved: Value = serde_json::from_str(&fs::read_to_string(&config)?)?;
    assert_eq!(saved["preload_wads"][0], extra.to_str().unwrap_or_default());

    let plan: Value = serde_json::from_str(&fs::read_to_string(&plan_path)?)?;
    let entries = plan["assets"]["entries"]
        .as_array()
        .context("entries should be an array")?;
    assert_eq!(entries[1]["origin"], "Preloaded");
    Ok(())
}

#[test]
fn headless_title_loop_stops_at_frame_limit() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary install")?;
    let iwad = write_doom2(temp_dir.path())?;

    let output = run_engine(
        temp_dir.path(),
        &[
            "--pref-dir",
            temp_dir.path().to_str().context("temp path is not valid UTF-8")?,
            "--headless",
            "--frames",
            "3",
            "--",
            "-iwad",
            &iwad,
            "-noautoload",
        ],
    )?;
    assert!(output.status.success(), "woof_engine failed: {}", transcript(&output));
    assert!(
        transcript(&output).contains("Ran 3 frame(s)"),
        "frame summary missing: {}",
        transcript(&output)
    );
    Ok(())
}

#[test]
fn frames_without_headless_is_rejected() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let output = run_engine(temp_dir.path(), &["--frames", "3"])?;
    assert!(!output.status.success());
    assert!(transcript(&output).contains("--frames requires --headless"));
    Ok(())
}

#[test]
fn missing_iwad_fails_startup() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory")?;
    let output = run_engine(
        temp_dir.path(),
        &[
            "--pref-dir",
            temp_dir.path().to_str().context("temp path is not valid UTF-8")?,
            "--",
            "-iwad",
            "absent",
        ],
    )?;
    assert!(!output.status.success());
    assert!(transcript(&output).contains("IWAD file 'absent.wad' not found!"));
    Ok(())
}
