use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::cmdline::CommandLine;
use crate::host::{make_directory, HostPaths};

pub const AUTOLOAD_DIR: &str = "autoload";
/// Shared by every Doom-flavoured IWAD.
pub const COMMON_DIR: &str = "doom-all";

pub const ARCHIVE_EXTENSIONS: &[&str] = &["wad", "lmp"];
pub const PATCH_EXTENSIONS: &[&str] = &["deh", "bex"];

/// Autoload base directories, configured once per session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoloadPaths {
    bases: Vec<PathBuf>,
}

impl AutoloadPaths {
    /// Shared data dir, preference dir, then executable dir, each with an
    /// `autoload` subdirectory. `-noload` and `-noautoload` leave the list
    /// empty.
    pub fn prepare(host: &HostPaths, cmdline: &CommandLine) -> Self {
        if cmdline.parm_exists("-noload") || cmdline.parm_exists("-noautoload") {
            log::info!("autoload disabled");
            return AutoloadPaths::default();
        }

        let roots = host
            .shared_data_dir
            .iter()
            .chain([&host.pref_dir, &host.exe_dir]);
        let mut bases: Vec<PathBuf> = Vec::new();
        for root in roots {
            let base = root.join(AUTOLOAD_DIR);
            if bases.contains(&base) {
                continue;
            }
            make_directory(&base);
            bases.push(base);
        }
        AutoloadPaths { bases }
    }

    pub fn from_bases<I, P>(bases: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        AutoloadPaths {
            bases: bases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn bases(&self) -> &[PathBuf] {
        &self.bases
    }

    pub fn is_disabled(&self) -> bool {
        self.bases.is_empty()
    }

    /// Directories consulted for the IWAD: per base, `doom-all` (when
    /// `include_common`) followed by the IWAD's own directory. Both are
    /// created on demand.
    pub fn iwad_dirs(&self, iwad: &Path, include_common: bool) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for base in &self.bases {
            if include_common {
                dirs.push(dir_for(base, COMMON_DIR, true));
            }
            dirs.push(dir_for(base, &file_name_of(iwad), true));
        }
        dirs
    }

    /// Directories consulted for a command-line archive, one per base. These
    /// are never created.
    pub fn archive_dirs(&self, archive: &str) -> Vec<PathBuf> {
        let name = file_name_of(Path::new(archive));
        self.bases
            .iter()
            .map(|base| dir_for(base, &name, false))
            .collect()
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<base>/<name lowercased>`.
pub fn dir_for(base: &Path, name: &str, create: bool) -> PathBuf {
    let dir = base.join(name.to_ascii_lowercase());
    if create {
        make_directory(&dir);
    }
    dir
}

/// Files directly inside `dir` whose extension matches one of `extensions`
/// (ignoring case), sorted by path. A missing directory yields nothing.
pub fn scan(dir: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("failed to read autoload dir {}: {err}", dir.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = entry.path().extension() else {
            continue;
        };
        if extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted)) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    log::debug!("autoload {}: {} file(s)", dir.display(), found.len());
    found
}
