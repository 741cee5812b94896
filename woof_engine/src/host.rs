use std::fs;
use std::path::{Path, PathBuf};

use crate::cmdline::CommandLine;

/// Directory name used below the per-user data directory.
pub const PROJECT_DIR: &str = "woof";

/// Filesystem locations derived once from the invocation and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub exe_dir: PathBuf,
    pub exe_name: String,
    pub pref_dir: PathBuf,
    /// Compiled-in shared data directory (`WOOF_DATA_DIR` at build time).
    pub shared_data_dir: Option<PathBuf>,
}

impl HostPaths {
    /// Resolves every host path for `program` (argv[0]). The preference
    /// directory is created if needed.
    pub fn discover(program: &str, pref_override: Option<&Path>) -> Self {
        let exe_dir = exe_dir_of(program);
        let exe_name = exe_name_of(program);
        let pref_dir = match pref_override {
            Some(dir) => dir.to_path_buf(),
            None => dirs::data_dir()
                .map(|dir| dir.join(PROJECT_DIR))
                .unwrap_or_else(|| exe_dir.clone()),
        };
        make_directory(&pref_dir);

        HostPaths {
            exe_dir,
            exe_name,
            pref_dir,
            shared_data_dir: option_env!("WOOF_DATA_DIR").map(PathBuf::from),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.pref_dir.join(format!("{}.json", self.exe_name))
    }

    /// Savegame directory: `-save <dir>` when it names an existing directory,
    /// otherwise the preference directory.
    pub fn save_dir(&self, cmdline: &CommandLine) -> PathBuf {
        if let Some(requested) = cmdline.value_after("-save") {
            let requested = PathBuf::from(requested);
            if requested.is_dir() {
                return requested;
            }
            log::warn!(
                "-save path {} does not exist, using {}",
                requested.display(),
                self.pref_dir.display()
            );
        }
        self.pref_dir.clone()
    }
}

/// Directory part of `program`, or `.` when it has none.
pub fn exe_dir_of(program: &str) -> PathBuf {
    match program.rfind(['/', '\\']) {
        Some(0) => PathBuf::from(&program[..1]),
        Some(index) => PathBuf::from(&program[..index]),
        None => PathBuf::from("."),
    }
}

/// Base name of `program` up to its first dot.
pub fn exe_name_of(program: &str) -> String {
    let base = program.rsplit(['/', '\\', ':']).next().unwrap_or(program);
    base.split('.').next().unwrap_or(base).to_string()
}

pub(crate) fn make_directory(path: &Path) {
    if let Err(err) = fs::create_dir_all(path) {
        log::warn!("could not create directory {}: {err}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn exe_paths_follow_argv0() {
        assert_eq!(exe_dir_of("/usr/games/woof"), PathBuf::from("/usr/games"));
        assert_eq!(exe_dir_of("woof"), PathBuf::from("."));
        assert_eq!(exe_dir_of("/woof"), PathBuf::from("/"));
        assert_eq!(exe_name_of("C:\\games\\woof.exe"), "woof");
        assert_eq!(exe_name_of("./bin/woof-sdl.x86_64"), "woof-sdl");
    }

    #[test]
    fn discover_creates_pref_dir_override() {
        let dir = tempdir().unwrap();
        let pref = dir.path().join("prefs");
        let paths = HostPaths::discover("/opt/woof/woof", Some(&pref));
        assert!(pref.is_dir());
        assert_eq!(paths.config_path(), pref.join("woof.json"));
    }

    #[test]
    fn invalid_save_override_falls_back() {
        let dir = tempdir().unwrap();
        let paths = HostPaths::discover("woof", Some(dir.path()));
        let missing = dir.path().join("nope");
        let line = CommandLine::new(["woof", "-save", missing.to_str().unwrap()]);
        assert_eq!(paths.save_dir(&line), dir.path());

        let line = CommandLine::new(["woof", "-save", dir.path().to_str().unwrap()]);
        assert_eq!(paths.save_dir(&line), dir.path());
    }
}
