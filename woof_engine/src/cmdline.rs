//! Game command-line tokens and the decisions read from them.
//!
//! Flags use the single-dash long form of the original engine (`-file`,
//! `-iwad`, ...) and are matched case-insensitively. Only the first
//! occurrence of a flag counts, except for list flags such as `-file` and
//! `-deh`, whose runs are collected by [`CommandLine::flag_run`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StartupError;

/// First byte of a response-file token.
pub const RESPONSE_FILE_MARKER: char = '@';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    tokens: Vec<String>,
}

impl CommandLine {
    /// `tokens[0]` is the program invocation, as in `std::env::args`.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.is_empty() {
            tokens.push(String::from("woof"));
        }
        CommandLine { tokens }
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    pub fn check_parm(&self, flag: &str) -> Option<usize> {
        self.tokens
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, token)| token.eq_ignore_ascii_case(flag))
            .map(|(index, _)| index)
    }

    pub fn parm_exists(&self, flag: &str) -> bool {
        self.check_parm(flag).is_some()
    }

    /// Index of `flag` when it is followed by at least `num_args` tokens.
    pub fn check_parm_with_args(&self, flag: &str, num_args: usize) -> Option<usize> {
        self.check_parm(flag)
            .filter(|&index| index + num_args < self.tokens.len())
    }

    /// Token following `flag`, if any.
    pub fn value_after(&self, flag: &str) -> Option<&str> {
        self.check_parm_with_args(flag, 1)
            .map(|index| self.tokens[index + 1].as_str())
    }

    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Non-flag tokens that follow any of `flags`. Collection starts at the
    /// earliest of `flags` on the line; every later flag token switches
    /// collection on if it is one of `flags` and off otherwise.
    pub fn flag_run(&self, flags: &[&str]) -> Vec<&str> {
        let Some(start) = flags.iter().filter_map(|flag| self.check_parm(flag)).min() else {
            return Vec::new();
        };

        let mut collecting = true;
        let mut run = Vec::new();
        for token in &self.tokens[start + 1..] {
            if token.starts_with('-') {
                collecting = flags.iter().any(|flag| token.eq_ignore_ascii_case(flag));
            } else if collecting {
                run.push(token.as_str());
            }
        }
        run
    }

    /// Tokens directly after the first `flag`, up to the next flag. Later
    /// occurrences of `flag` are not included.
    pub fn first_run(&self, flag: &str) -> Vec<&str> {
        let Some(start) = self.check_parm(flag) else {
            return Vec::new();
        };
        self.tokens[start + 1..]
            .iter()
            .take_while(|token| !token.starts_with('-'))
            .map(String::as_str)
            .collect()
    }

    /// Splices the contents of the first `@file` token into the token list at
    /// the marker's position. Tokens before and after the marker keep their
    /// relative order around the inserted ones.
    pub fn expand_response_file(self) -> Result<Self, StartupError> {
        let Some(index) = self
            .tokens
            .iter()
            .skip(1)
            .position(|token| token.starts_with(RESPONSE_FILE_MARKER))
            .map(|pos| pos + 1)
        else {
            return Ok(self);
        };

        let name = &self.tokens[index][RESPONSE_FILE_MARKER.len_utf8()..];
        let path = PathBuf::from(add_default_extension(name, ".rsp"));
        let contents = read_response_file(&path)?;
        log::info!("Found response file {}!", path.display());

        let mut tokens = Vec::with_capacity(self.tokens.len() + 8);
        tokens.extend_from_slice(&self.tokens[..index]);
        tokens.extend(tokenize_response(&contents));
        tokens.extend_from_slice(&self.tokens[index + 1..]);

        log::info!("{} command-line args:", tokens.len() - 1);
        for token in &tokens[1..] {
            log::info!("{token}");
        }

        Ok(CommandLine { tokens })
    }
}

fn read_response_file(path: &Path) -> Result<Vec<u8>, StartupError> {
    fs::read(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => StartupError::ResponseFileNotFound(path.to_path_buf()),
        _ => StartupError::ResponseFileRead {
            path: path.to_path_buf(),
            source: err,
        },
    })
}

/// Bytes `'!'..='z'` form tokens; anything else separates them.
pub fn tokenize_response(contents: &[u8]) -> Vec<String> {
    contents
        .split(|byte| !is_response_token_byte(*byte))
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

fn is_response_token_byte(byte: u8) -> bool {
    (b' ' + 1..=b'z').contains(&byte)
}

/// Appends `extension` (including the dot) unless the file name already has
/// one. Directory components are not inspected.
pub fn add_default_extension(name: &str, extension: &str) -> String {
    let file_part = name.rsplit(['/', '\\']).next().unwrap_or(name);
    if file_part.contains('.') {
        name.to_string()
    } else {
        format!("{name}{extension}")
    }
}
