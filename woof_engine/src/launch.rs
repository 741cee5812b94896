use serde::Serialize;

use crate::cmdline::CommandLine;
use crate::version::GameMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackSpeed {
    /// `-playdemo`
    Normal,
    /// `-fastdemo`: as fast as possible, timing stats on exit.
    Fast,
    /// `-timedemo`: one tic per frame, timing stats on exit.
    Timed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoPlayback {
    pub name: String,
    pub speed: PlaybackSpeed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StartAction {
    LoadGame { slot: i32 },
    PlayDemo(DemoPlayback),
    NewGame { skill: Option<i32>, episode: i32, map: i32 },
    TitleLoop,
}

/// Gameplay decisions read from the command line once identification is
/// done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchOptions {
    /// Zero based; `None` when no skill was picked.
    pub skill: Option<i32>,
    pub episode: i32,
    pub map: i32,
    pub autostart: bool,
    /// Map a demo fast-forwards to, from `-warp`.
    pub demo_warp: Option<i32>,
    pub playback: Option<DemoPlayback>,
    pub record: Option<String>,
    pub load_slot: Option<i32>,
    pub nodraw: bool,
    pub nomonsters: bool,
    pub fast: bool,
    pub respawn: bool,
}

impl LaunchOptions {
    pub fn from_cmdline(cmdline: &CommandLine, mode: GameMode) -> Self {
        let mut options = LaunchOptions {
            skill: None,
            episode: 1,
            map: 1,
            autostart: false,
            demo_warp: None,
            playback: None,
            record: None,
            load_slot: None,
            nodraw: cmdline.parm_exists("-nodraw"),
            nomonsters: cmdline.parm_exists("-nomonsters"),
            fast: cmdline.parm_exists("-fast"),
            respawn: cmdline.parm_exists("-respawn"),
        };

        if let Some(skill) = cmdline.value_after("-skill") {
            options.skill = Some(leading_digit(skill) - 1);
            options.autostart = true;
        }

        if let Some(episode) = cmdline.value_after("-episode") {
            options.episode = leading_digit(episode);
            options.map = 1;
            options.autostart = true;
        }

        if let Some((episode, map)) = parse_warp(cmdline, mode) {
            if let Some(episode) = episode {
                options.episode = episode;
            }
            options.map = map;
            options.autostart = true;
            options.demo_warp = Some(map);
        }

        if let Some(name) = cmdline.value_after("-record") {
            options.record = Some(name.to_string());
            options.autostart = true;
        }

        options.playback = [
            ("-fastdemo", PlaybackSpeed::Fast),
            ("-timedemo", PlaybackSpeed::Timed),
            ("-playdemo", PlaybackSpeed::Normal),
        ]
        .iter()
        .find_map(|(flag, speed)| {
            cmdline.value_after(flag).map(|name| DemoPlayback {
                name: name.to_string(),
                speed: *speed,
            })
        });
        if options.playback.is_none() {
            options.demo_warp = None;
        }

        options.load_slot = cmdline.value_after("-loadgame").map(atoi);
        options
    }

    /// Playing a demo from the command line ends the session after it.
    pub fn single_demo(&self) -> bool {
        self.playback.is_some()
    }

    pub fn start_action(&self) -> StartAction {
        if let Some(slot) = self.load_slot {
            return StartAction::LoadGame { slot };
        }
        if let Some(playback) = &self.playback {
            return StartAction::PlayDemo(playback.clone());
        }
        if self.autostart {
            return StartAction::NewGame {
                skill: self.skill,
                episode: self.episode,
                map: self.map,
            };
        }
        StartAction::TitleLoop
    }
}

/// `-warp` (or `-wart`) target. Commercial games take a map number; the
/// others take an episode and map, or a single `EM` number.
fn parse_warp(cmdline: &CommandLine, mode: GameMode) -> Option<(Option<i32>, i32)> {
    let index = cmdline
        .check_parm_with_args("-warp", 1)
        .or_else(|| cmdline.check_parm_with_args("-wart", 1))?;
    let first = cmdline.token(index + 1)?;
    if mode == GameMode::Commercial {
        return Some((None, atoi(first)));
    }
    match cmdline.token(index + 2) {
        Some(second) if !second.starts_with('-') => Some((Some(atoi(first)), atoi(second))),
        _ => {
            let em = atoi(first);
            Some((Some(em / 10), em % 10))
        }
    }
}

/// Leading decimal digits of `text`, 0 when there are none.
pub fn atoi(text: &str) -> i32 {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i32, |acc, digit| {
            acc.wrapping_mul(10).wrapping_add(i32::from(digit - b'0'))
        });
    sign * value
}

fn leading_digit(text: &str) -> i32 {
    text.bytes()
        .next()
        .map(|byte| i32::from(byte) - i32::from(b'0'))
        .unwrap_or(0)
}
