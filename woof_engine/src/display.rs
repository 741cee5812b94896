//! Per-frame drawing: state dispatch, overlays and the melt between states.

use serde::Serialize;

use crate::demo::PageView;
use crate::wipe::{Frame, MeltWipe};

/// Border redraws queued after a view size change.
const BORDER_REDRAWS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GameState {
    Level,
    Intermission,
    Finale,
    DemoScreen,
}

/// Monotonic real time in tics.
pub trait TicClock {
    fn now_tics(&mut self) -> i64;
}

/// Drawing back end. Calls arrive in the order a frame is composed.
pub trait Renderer {
    fn execute_set_view_size(&mut self);
    /// Copy of what is currently on screen.
    fn capture_frame(&mut self) -> Frame;
    /// 3D view and status bar, with the full-screen automap when `automap`.
    fn draw_level(&mut self, automap: bool);
    fn draw_intermission(&mut self);
    fn draw_finale(&mut self);
    fn draw_page(&mut self, page: PageView);
    fn reset_palette(&mut self);
    fn fill_back_screen(&mut self);
    fn draw_view_border(&mut self);
    fn draw_automap_overlay(&mut self);
    fn draw_pause(&mut self);
    fn draw_menu(&mut self);
    fn draw_wipe(&mut self, wipe: &MeltWipe);
    /// Presents the composed frame.
    fn finish_update(&mut self);
}

/// What the simulation wants shown this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameView {
    pub state: GameState,
    pub gametic: u64,
    pub automap_active: bool,
    pub automap_overlay: bool,
    pub paused: bool,
    pub page: PageView,
}

impl FrameView {
    pub fn page(page: PageView) -> Self {
        FrameView {
            state: GameState::DemoScreen,
            gametic: 0,
            automap_active: false,
            automap_overlay: false,
            paused: false,
            page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOutcome {
    Skipped,
    Presented,
    /// The state changed with the melt disabled; the new state was presented
    /// in a single frame.
    Cut,
    /// A melt ran to completion over `tics` real tics in `frames` presents.
    Wiped { tics: u32, frames: u32 },
}

/// A melt in progress: the transition frames plus the time of the last step.
#[derive(Debug)]
pub struct WipeTransition {
    pub melt: MeltWipe,
    pub start_time: i64,
}

/// Remembers what was drawn last so state changes can be detected.
#[derive(Debug)]
pub struct DisplayMachine {
    wipe_state: Option<GameState>,
    old_state: Option<GameState>,
    border_draw_count: u8,
    resize_pending: bool,
    melt_enabled: bool,
    nodraw: bool,
    active_wipe: Option<WipeTransition>,
}

impl Default for DisplayMachine {
    fn default() -> Self {
        DisplayMachine {
            wipe_state: Some(GameState::DemoScreen),
            old_state: None,
            border_draw_count: 0,
            resize_pending: false,
            melt_enabled: true,
            nodraw: false,
            active_wipe: None,
        }
    }
}

impl DisplayMachine {
    pub fn new(melt_enabled: bool, nodraw: bool) -> Self {
        DisplayMachine {
            melt_enabled,
            nodraw,
            ..DisplayMachine::default()
        }
    }

    /// The next frame wipes whatever state it shows.
    pub fn force_wipe(&mut self) {
        self.wipe_state = None;
    }

    pub fn request_resize(&mut self) {
        self.resize_pending = true;
    }

    pub fn is_wiping(&self) -> bool {
        self.active_wipe.is_some()
    }

    pub fn last_state(&self) -> Option<GameState> {
        self.old_state
    }

    pub fn display(
        &mut self,
        view: &FrameView,
        renderer: &mut dyn Renderer,
        clock: &mut dyn TicClock,
    ) -> DisplayOutcome {
        if self.nodraw {
            return DisplayOutcome::Skipped;
        }

        if self.resize_pending {
            renderer.execute_set_view_size();
            self.old_state = None;
            self.border_draw_count = BORDER_REDRAWS;
            self.resize_pending = false;
        }

        let state = view.state;
        let wipe = self.wipe_state != Some(state);
        let before = (wipe && self.melt_enabled).then(|| renderer.capture_frame());

        match state {
            GameState::Level => {
                if view.gametic > 0 {
                    renderer.draw_level(view.automap_active);
                }
            }
            GameState::Intermission => renderer.draw_intermission(),
            GameState::Finale => renderer.draw_finale(),
            GameState::DemoScreen => renderer.draw_page(view.page),
        }

        if self.old_state != Some(state) && state != GameState::Level {
            renderer.reset_palette();
        }
        if state == GameState::Level && self.old_state != Some(GameState::Level) {
            renderer.fill_back_screen();
        }
        if state == GameState::Level && self.border_draw_count > 0 {
            renderer.draw_view_border();
            self.border_draw_count -= 1;
        }

        self.old_state = Some(state);
        self.wipe_state = Some(state);

        if state == GameState::Level && view.automap_active && view.automap_overlay {
            renderer.draw_automap_overlay();
        }
        if view.paused {
            renderer.draw_pause();
        }
        renderer.draw_menu();

        let Some(before) = before else {
            renderer.finish_update();
            return if wipe {
                DisplayOutcome::Cut
            } else {
                DisplayOutcome::Presented
            };
        };

        let after = renderer.capture_frame();
        self.active_wipe = Some(WipeTransition {
            melt: MeltWipe::new(before, after),
            start_time: clock.now_tics() - 1,
        });
        let outcome = self.run_wipe(renderer, clock);
        self.active_wipe = None;
        outcome
    }

    fn run_wipe(&mut self, renderer: &mut dyn Renderer, clock: &mut dyn TicClock) -> DisplayOutcome {
        let mut total = 0u32;
        let mut frames = 0u32;
        let Some(transition) = self.active_wipe.as_mut() else {
            return DisplayOutcome::Presented;
        };

        loop {
            let (now, tics) = loop {
                let now = clock.now_tics();
                let tics = now - transition.start_time;
                if tics > 0 {
                    break (now, tics);
                }
            };
            transition.start_time = now;
            let tics = u32::try_from(tics).unwrap_or(u32::MAX);
            total = total.saturating_add(tics);

            let done = transition.melt.advance(tics);
            renderer.draw_wipe(&transition.melt);
            renderer.draw_menu();
            renderer.finish_update();
            frames += 1;
            if done {
                break;
            }
        }
        DisplayOutcome::Wiped { tics: total, frames }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wipe::minimum_tics;

    const HEIGHT: usize = 24;

    /// Records every renderer call by name.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
    }

    impl Recorder {
        fn count(&self, name: &str) -> usize {
            self.calls.iter().filter(|call| **call == name).count()
        }
    }

    impl Renderer for Recorder {
        fn execute_set_view_size(&mut self) {
            self.calls.push("resize");
        }
        fn capture_frame(&mut self) -> Frame {
            self.calls.push("capture");
            Frame::new(8, HEIGHT)
        }
        fn draw_level(&mut self, _automap: bool) {
            self.calls.push("level");
        }
        fn draw_intermission(&mut self) {
            self.calls.push("intermission");
        }
        fn draw_finale(&mut self) {
            self.calls.push("finale");
        }
        fn draw_page(&mut self, _page: PageView) {
            self.calls.push("page");
        }
        fn reset_palette(&mut self) {
            self.calls.push("palette");
        }
        fn fill_back_screen(&mut self) {
            self.calls.push("backscreen");
        }
        fn draw_view_border(&mut self) {
            self.calls.push("border");
        }
        fn draw_automap_overlay(&mut self) {
            self.calls.push("automap");
        }
        fn draw_pause(&mut self) {
            self.calls.push("pause");
        }
        fn draw_menu(&mut self) {
            self.calls.push("menu");
        }
        fn draw_wipe(&mut self, _wipe: &MeltWipe) {
            self.calls.push("wipe");
        }
        fn finish_update(&mut self) {
            self.calls.push("finish");
        }
    }

    /// Advances by `step` tics on every read.
    struct SteppingClock {
        now: i64,
        step: i64,
        reads: usize,
    }

    impl SteppingClock {
        fn new(step: i64) -> Self {
            SteppingClock {
                now: 0,
                step,
                reads: 0,
            }
        }
    }

    impl TicClock for SteppingClock {
        fn now_tics(&mut self) -> i64 {
            self.reads += 1;
            self.now += self.step;
            self.now
        }
    }

    /// Stalls for a few reads between every tick.
    struct SlowClock {
        reads: i64,
    }

    impl TicClock for SlowClock {
        fn now_tics(&mut self) -> i64 {
            self.reads += 1;
            self.reads / 4
        }
    }

    fn level(gametic: u64) -> FrameView {
        FrameView {
            state: GameState::Level,
            gametic,
            ..FrameView::page(PageView::Credits)
        }
    }

    #[test]
    fn first_page_frame_presents_without_wipe() {
        let mut machine = DisplayMachine::default();
        let mut renderer = Recorder::default();
        let mut clock = SteppingClock::new(1);
        let outcome = machine.display(&FrameView::page(PageView::Credits), &mut renderer, &mut clock);
        assert_eq!(outcome, DisplayOutcome::Presented);
        assert_eq!(renderer.calls, vec!["page", "palette", "menu", "finish"]);
        assert_eq!(clock.reads, 0);
    }

    #[test]
    fn state_change_melts_until_done() {
        let mut machine = DisplayMachine::default();
        let mut renderer = Recorder::default();
        let mut clock = SteppingClock::new(1);
        machine.display(&FrameView::page(PageView::Credits), &mut renderer, &mut clock);
        renderer.calls.clear();

        let outcome = machine.display(&level(1), &mut renderer, &mut clock);
        let DisplayOutcome::Wiped { tics, frames } = outcome else {
            panic!("expected a wipe, got {outcome:?}");
        };
        assert!(tics >= minimum_tics(HEIGHT));
        assert!((1..=tics).contains(&frames));
        assert_eq!(
            &renderer.calls[..6],
            &["capture", "level", "backscreen", "menu", "capture", "wipe"]
        );
        assert_eq!(renderer.count("wipe") as u32, frames);
        assert_eq!(renderer.count("menu") as u32, frames + 1);
        assert_eq!(renderer.count("finish") as u32, frames);
        assert!(!machine.is_wiping());

        renderer.calls.clear();
        assert_eq!(
            machine.display(&level(2), &mut renderer, &mut clock),
            DisplayOutcome::Presented
        );
    }

    #[test]
    fn wipe_waits_for_real_time() {
        let mut machine = DisplayMachine::default();
        machine.force_wipe();
        let mut renderer = Recorder::default();
        let mut clock = SlowClock { reads: 0 };
        let outcome = machine.display(&FrameView::page(PageView::Credits), &mut renderer, &mut clock);
        let DisplayOutcome::Wiped { tics, frames } = outcome else {
            panic!("expected a wipe, got {outcome:?}");
        };
        assert_eq!(tics, frames);
        assert!(clock.reads > i64::from(frames));
    }

    #[test]
    fn disabled_melt_cuts_straight_over() {
        let mut machine = DisplayMachine::new(false, false);
        let mut renderer = Recorder::default();
        let mut clock = SteppingClock::new(1);
        let outcome = machine.display(&level(1), &mut renderer, &mut clock);
        assert_eq!(outcome, DisplayOutcome::Cut);
        assert_eq!(renderer.count("capture"), 0);
        assert_eq!(renderer.count("wipe"), 0);
        assert_eq!(renderer.count("finish"), 1);
        assert_eq!(machine.last_state(), Some(GameState::Level));
        assert_eq!(clock.reads, 0);

        assert_eq!(
            machine.display(&level(2), &mut renderer, &mut clock),
            DisplayOutcome::Presented
        );
        machine.force_wipe();
        assert_eq!(
            machine.display(&level(3), &mut renderer, &mut clock),
            DisplayOutcome::Cut
        );
    }

    #[test]
    fn level_before_first_tic_skips_the_view() {
        let mut machine = DisplayMachine::new(false, false);
        let mut renderer = Recorder::default();
        let mut clock = SteppingClock::new(1);
        machine.display(&level(0), &mut renderer, &mut clock);
        assert_eq!(renderer.count("level"), 0);
        assert_eq!(renderer.count("backscreen"), 1);
    }

    #[test]
    fn resize_redraws_border_three_times() {
        let mut machine = DisplayMachine::new(false, false);
        let mut renderer = Recorder::default();
        let mut clock = SteppingClock::new(1);
        machine.display(&level(1), &mut renderer, &mut clock);
        machine.request_resize();
        for tic in 2..7 {
            machine.display(&level(tic), &mut renderer, &mut clock);
        }
        assert_eq!(renderer.count("resize"), 1);
        assert_eq!(renderer.count("border"), 3);
        // resize forgets the previous state, so the back screen is refilled
        assert_eq!(renderer.count("backscreen"), 2);
    }

    #[test]
    fn overlays_follow_the_view() {
        let mut machine = DisplayMachine::new(false, false);
        let mut renderer = Recorder::default();
        let mut clock = SteppingClock::new(1);
        let view = FrameView {
            automap_active: true,
            automap_overlay: true,
            paused: true,
            ..level(5)
        };
        machine.display(&view, &mut renderer, &mut clock);
        assert_eq!(
            renderer.calls,
            vec!["level", "backscreen", "automap", "pause", "menu", "finish"]
        );
    }

    #[test]
    fn nodraw_skips_everything() {
        let mut machine = DisplayMachine::new(true, true);
        let mut renderer = Recorder::default();
        let mut clock = SteppingClock::new(1);
        assert_eq!(
            machine.display(&level(1), &mut renderer, &mut clock),
            DisplayOutcome::Skipped
        );
        assert!(renderer.calls.is_empty());
    }
}
