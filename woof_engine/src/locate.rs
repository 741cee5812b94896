use std::env;
use std::path::{Path, PathBuf};

use crate::host::HostPaths;

/// Resolves a WAD, lump or patch name to a file on disk.
pub trait FileLocator {
    fn locate(&self, name: &str) -> Option<PathBuf>;

    /// Directories tried by base name, reported when nothing is found.
    fn search_dirs(&self) -> &[PathBuf] {
        &[]
    }
}

/// Looks for a file as given, then by base name in each search directory.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        SearchPath {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Current directory, executable directory, `DOOMWADDIR`, every entry of
    /// `DOOMWADPATH`, then the preference directory.
    pub fn from_environment(host: &HostPaths) -> Self {
        let mut dirs = vec![PathBuf::from("."), host.exe_dir.clone()];
        if let Some(dir) = env::var_os("DOOMWADDIR") {
            dirs.push(PathBuf::from(dir));
        }
        if let Some(list) = env::var_os("DOOMWADPATH") {
            dirs.extend(env::split_paths(&list));
        }
        dirs.push(host.pref_dir.clone());
        dirs.dedup();
        SearchPath { dirs }
    }
}

impl FileLocator for SearchPath {
    fn search_dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }

        let base = direct.file_name()?.to_string_lossy().into_owned();
        let candidates = [base.clone(), base.to_ascii_lowercase(), base.to_ascii_uppercase()];
        for dir in &self.dirs {
            for candidate in &candidates {
                let path = dir.join(candidate);
                if path.is_file() {
                    log::debug!("located {name} at {}", path.display());
                    return Some(path);
                }
            }
        }
        None
    }
}
