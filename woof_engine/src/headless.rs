//! Collaborators for running the frame loop without a window or audio
//! device: a wall clock, an attract-loop simulation and a renderer that only
//! keeps counts.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;

use crate::demo::{DemoHost, DemoSequencer, Music, PageView, TICRATE};
use crate::display::{FrameView, GameState, Renderer, TicClock};
use crate::events::{dispatch_events, Event, EventKind, EventQueue, Responder};
use crate::frame_loop::{Platform, Simulation, Sound};
use crate::launch::{LaunchOptions, StartAction};
use crate::mapinfo::{MapInfoKind, MapInfoSink};
use crate::store::LumpLookup;
use crate::wipe::{Frame, MeltWipe};

pub const SCREEN_WIDTH: usize = 320;
pub const SCREEN_HEIGHT: usize = 200;
/// Bytes per recorded tic in a demo lump.
const DEMO_TIC_BYTES: usize = 4;

/// Real-time tic clock at [`TICRATE`] Hz.
#[derive(Debug)]
pub struct WallClock {
    origin: Instant,
    pending: Vec<Event>,
}

impl Default for WallClock {
    fn default() -> Self {
        WallClock {
            origin: Instant::now(),
            pending: Vec::new(),
        }
    }
}

impl WallClock {
    /// Queues an event for the next frame start.
    pub fn post(&mut self, event: Event) {
        self.pending.push(event);
    }
}

pub fn tics_for(elapsed: Duration) -> i64 {
    let tics = elapsed.as_nanos() * TICRATE as u128 / 1_000_000_000;
    i64::try_from(tics).unwrap_or(i64::MAX)
}

impl TicClock for WallClock {
    fn now_tics(&mut self) -> i64 {
        tics_for(self.origin.elapsed())
    }
}

impl Platform for WallClock {
    fn start_frame(&mut self, events: &mut EventQueue) {
        for event in self.pending.drain(..) {
            events.push(event);
        }
    }
}

#[derive(Debug, Default)]
pub struct SilentSound;

impl Sound for SilentSound {
    fn update_sounds(&mut self) {}
    fn update_sound(&mut self) {}
    fn submit_sound(&mut self) {}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub presented: u64,
    pub pages: u64,
    pub level_frames: u64,
    pub wipe_frames: u64,
    pub palette_resets: u64,
}

/// Draws nothing. Captured frames are flat fills keyed on the last thing
/// drawn, so melts still have two distinct images to work with.
#[derive(Debug, Default)]
pub struct CountingRenderer {
    stats: RenderStats,
    shade: u8,
}

impl CountingRenderer {
    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

impl Renderer for CountingRenderer {
    fn execute_set_view_size(&mut self) {}

    fn capture_frame(&mut self) -> Frame {
        Frame::filled(SCREEN_WIDTH, SCREEN_HEIGHT, self.shade)
    }

    fn draw_level(&mut self, _automap: bool) {
        self.shade = 1;
        self.stats.level_frames += 1;
    }

    fn draw_intermission(&mut self) {
        self.shade = 2;
    }

    fn draw_finale(&mut self) {
        self.shade = 3;
    }

    fn draw_page(&mut self, page: PageView) {
        self.shade = match page {
            PageView::Credits => 4,
            PageView::Patch { lump, .. } => 5u8.wrapping_add(lump as u8),
        };
        self.stats.pages += 1;
    }

    fn reset_palette(&mut self) {
        self.stats.palette_resets += 1;
    }

    fn fill_back_screen(&mut self) {}
    fn draw_view_border(&mut self) {}
    fn draw_automap_overlay(&mut self) {}
    fn draw_pause(&mut self) {}
    fn draw_menu(&mut self) {}

    fn draw_wipe(&mut self, _wipe: &MeltWipe) {
        self.stats.wipe_frames += 1;
    }

    fn finish_update(&mut self) {
        self.stats.presented += 1;
    }
}

/// Side effects requested by the demo sequencer, applied on the next tic.
#[derive(Debug, Default)]
struct AttractHost {
    entered_page_screen: bool,
    music: Option<Music>,
    demo_request: Option<String>,
}

impl DemoHost for AttractHost {
    fn enter_demo_screen(&mut self) {
        self.entered_page_screen = true;
    }

    fn start_music(&mut self, music: Music) {
        self.music = Some(music);
    }

    fn play_demo(&mut self, name: &str) {
        self.demo_request = Some(name.to_string());
    }
}

/// Menu stand-in: claims nothing.
struct NoMenu;

impl Responder for NoMenu {
    fn respond(&mut self, _event: &Event) -> bool {
        false
    }
}

/// Game responder that only listens for quit requests.
#[derive(Default)]
struct QuitListener {
    quit: bool,
}

impl Responder for QuitListener {
    fn respond(&mut self, event: &Event) -> bool {
        if event.kind == EventKind::Quit {
            self.quit = true;
            return true;
        }
        false
    }
}

/// Runs the title loop. Demos are not simulated; a demo lump simply keeps the
/// level state up for as many tics as it has recorded.
pub struct AttractSimulation<'a> {
    store: &'a dyn LumpLookup,
    sequencer: DemoSequencer,
    host: AttractHost,
    accepts_input: bool,
    state: GameState,
    gametic: u64,
    demo_tics_left: Option<u64>,
    single_demo: bool,
    listener: QuitListener,
    quit: bool,
}

impl<'a> AttractSimulation<'a> {
    pub fn new(
        store: &'a dyn LumpLookup,
        sequencer: DemoSequencer,
        launch: &LaunchOptions,
        accepts_input: bool,
    ) -> Self {
        let mut sim = AttractSimulation {
            store,
            sequencer,
            host: AttractHost::default(),
            accepts_input,
            state: GameState::DemoScreen,
            gametic: 0,
            demo_tics_left: None,
            single_demo: launch.single_demo(),
            listener: QuitListener::default(),
            quit: false,
        };
        sim.sequencer.set_single_demo(sim.single_demo);

        match launch.start_action() {
            StartAction::PlayDemo(playback) => sim.host.demo_request = Some(playback.name),
            StartAction::NewGame { episode, map, .. } => {
                log::info!("starting new game at episode {episode} map {map}");
                sim.state = GameState::Level;
            }
            StartAction::LoadGame { slot } => {
                log::warn!("savegame slot {slot} cannot be loaded without a game, showing title");
                sim.sequencer.start(store, &mut sim.host);
            }
            StartAction::TitleLoop => sim.sequencer.start(store, &mut sim.host),
        }
        sim
    }

    pub fn sequencer(&self) -> &DemoSequencer {
        &self.sequencer
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn music(&self) -> Option<Music> {
        self.host.music
    }

    fn start_requested_demo(&mut self) {
        let Some(name) = self.host.demo_request.take() else {
            return;
        };
        let lump = demo_lump_name(&name);
        let recorded = self
            .store
            .check_num_for_name(&lump)
            .and_then(|index| self.store.lump_bytes(index))
            .map(|data| (data.len() / DEMO_TIC_BYTES).max(1) as u64);
        match recorded {
            Some(tics) => {
                log::info!("playing demo {lump} ({tics} tics)");
                self.state = GameState::Level;
                self.demo_tics_left = Some(tics);
            }
            None => {
                log::warn!("demo lump {lump} not found");
                self.finish_demo();
            }
        }
    }

    fn finish_demo(&mut self) {
        self.demo_tics_left = None;
        if self.single_demo {
            self.quit = true;
        } else {
            self.sequencer.request_advance();
        }
    }
}

/// Lump name for a demo given as a file name: the upper-cased stem.
fn demo_lump_name(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    stem.chars().take(8).collect::<String>().to_ascii_uppercase()
}

impl Simulation for AttractSimulation<'_> {
    fn run_tic(&mut self, events: &mut EventQueue) {
        dispatch_events(events, self.accepts_input, &mut NoMenu, &mut self.listener);
        if self.listener.quit {
            self.quit = true;
            return;
        }

        if self.sequencer.run_pending(self.store, &mut self.host) && self.host.entered_page_screen {
            self.host.entered_page_screen = false;
            self.state = GameState::DemoScreen;
            self.demo_tics_left = None;
        }
        self.start_requested_demo();

        match self.demo_tics_left {
            Some(left) if left <= 1 => {
                self.gametic += 1;
                self.finish_demo();
            }
            Some(left) => {
                self.gametic += 1;
                self.demo_tics_left = Some(left - 1);
            }
            None if self.state == GameState::DemoScreen => self.sequencer.page_ticker(),
            None => self.gametic += 1,
        }
    }

    fn frame_view(&self) -> FrameView {
        FrameView {
            state: self.state,
            gametic: self.gametic,
            ..FrameView::page(self.sequencer.page_view(self.store))
        }
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}

/// Records map-info lumps without interpreting them.
#[derive(Debug, Default, Serialize)]
pub struct MapInfoLog {
    pub parsed: Vec<(MapInfoKind, usize)>,
}

impl MapInfoSink for MapInfoLog {
    fn parse(&mut self, kind: MapInfoKind, data: &[u8]) -> Result<()> {
        log::info!("{}: {} bytes", kind.lump_name(), data.len());
        self.parsed.push((kind, data.len()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmdline::CommandLine;
    use crate::version::GameMode;
    use tempfile::tempdir;
    use woof_formats::{write_wad, LumpDirectory, WadKind};

    fn store(lumps: &[(&str, &[u8])]) -> LumpDirectory {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doom.wad");
        write_wad(&path, WadKind::Iwad, lumps).unwrap();
        LumpDirectory::open_all([&path]).unwrap()
    }

    fn launch(args: &[&str]) -> LaunchOptions {
        let cmdline = CommandLine::new(std::iter::once("woof").chain(args.iter().copied()));
        LaunchOptions::from_cmdline(&cmdline, GameMode::Retail)
    }

    #[test]
    fn tics_follow_wall_time() {
        assert_eq!(tics_for(Duration::from_millis(0)), 0);
        assert_eq!(tics_for(Duration::from_secs(1)), 35);
        assert_eq!(tics_for(Duration::from_millis(29)), 1);
    }

    #[test]
    fn title_loop_plays_demo_then_returns_to_pages() {
        let store = store(&[("TITLEPIC", b"t"), ("DEMO1", &[0u8; 12]), ("CREDIT", b"c")]);
        let mut sim = AttractSimulation::new(
            &store,
            DemoSequencer::new(GameMode::Retail),
            &launch(&[]),
            true,
        );
        let mut events = EventQueue::default();
        assert_eq!(sim.music(), Some(Music::Intro));
        assert_eq!(sim.state(), GameState::DemoScreen);

        for _ in 0..=170 {
            sim.run_tic(&mut events);
        }
        assert_eq!(sim.sequencer().sequence(), 0);
        sim.run_tic(&mut events);
        assert_eq!(sim.sequencer().sequence(), 1);
        assert_eq!(sim.state(), GameState::Level);

        // three recorded tics, then the next page
        for _ in 0..3 {
            sim.run_tic(&mut events);
        }
        sim.run_tic(&mut events);
        assert_eq!(sim.sequencer().sequence(), 2);
        assert_eq!(sim.state(), GameState::DemoScreen);
        assert_eq!(sim.sequencer().page_name(), Some("CREDIT"));
    }

    #[test]
    fn single_demo_quits_when_done() {
        let store = store(&[("DEMO2", &[0u8; 8])]);
        let mut sim = AttractSimulation::new(
            &store,
            DemoSequencer::new(GameMode::Retail),
            &launch(&["-playdemo", "demos/demo2.lmp"]),
            true,
        );
        let mut events = EventQueue::default();
        sim.run_tic(&mut events);
        assert!(!sim.quit_requested());
        sim.run_tic(&mut events);
        assert!(sim.quit_requested());
    }

    #[test]
    fn quit_event_ends_the_session() {
        let store = store(&[("TITLEPIC", b"t")]);
        let mut sim = AttractSimulation::new(
            &store,
            DemoSequencer::new(GameMode::Retail),
            &launch(&[]),
            true,
        );
        let mut events = EventQueue::default();
        events.push(Event::new(EventKind::Quit, 0));
        sim.run_tic(&mut events);
        assert!(sim.quit_requested());
    }

    #[test]
    fn demo_names_become_lump_names() {
        assert_eq!(demo_lump_name("demo1"), "DEMO1");
        assert_eq!(demo_lump_name("runs/longdemoname.lmp"), "LONGDEMO");
    }
}
