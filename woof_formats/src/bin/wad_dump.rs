use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use woof_formats::{LumpDirectory, WadArchive};

#[derive(Parser, Debug)]
#[command(about = "List the lump directory of one or more WAD files", version)]
struct Args {
    /// WAD or lump files, in load order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print the merged directory as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Only show which file provides this lump after overrides are applied
    #[arg(long)]
    resolve: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(name) = args.resolve.as_deref() {
        let directory = LumpDirectory::open_all(&args.files)?;
        match directory.check_num_for_name(name) {
            Some(index) => {
                let lump = directory.lump(index).context("resolved lump index out of range")?;
                let archive = &directory.archives()[lump.archive];
                println!(
                    "{name} -> lump {index} in {} ({} of {} candidates)",
                    archive.path().display(),
                    directory
                        .positions(name)
                        .iter()
                        .position(|&candidate| candidate == index)
                        .map(|pos| pos + 1)
                        .unwrap_or(0),
                    directory.positions(name).len()
                );
            }
            None => println!("{name} not found"),
        }
        return Ok(());
    }

    for path in &args.files {
        let archive = WadArchive::open(path)?;
        if args.json {
            let json = serde_json::to_string_pretty(archive.entries())
                .context("serializing WAD directory to JSON")?;
            println!("{json}");
            continue;
        }
        println!(
            "{} entries in {} ({:?})",
            archive.entries().len(),
            archive.path().display(),
            archive.kind()
        );
        for entry in archive.entries() {
            println!(
                "{name:<8} {namespace:<10} {offset:>10} {size:>10}",
                name = entry.name,
                namespace = format!("{:?}", entry.namespace),
                offset = entry.offset,
                size = entry.size
            );
        }
    }
    Ok(())
}
