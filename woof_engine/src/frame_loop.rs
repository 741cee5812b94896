//! The outer game loop: input, tics, sound and display once per frame.

use crate::display::{DisplayMachine, DisplayOutcome, FrameView, Renderer, TicClock};
use crate::events::EventQueue;

/// Most tics run in one frame when catching up with real time. Anything
/// beyond this is dropped rather than simulated.
pub const MAX_CATCHUP_TICS: i64 = 35;

/// Host services: real time and per-frame input polling.
pub trait Platform: TicClock {
    /// Frame-start housekeeping; input gathered here is posted to `events`.
    fn start_frame(&mut self, events: &mut EventQueue);
}

pub trait Sound {
    /// Moves positional sounds relative to the listener.
    fn update_sounds(&mut self);
    fn update_sound(&mut self);
    fn submit_sound(&mut self);
}

/// The game side, advanced one tic at a time.
pub trait Simulation {
    /// Runs one tic, consuming pending events.
    fn run_tic(&mut self, events: &mut EventQueue);
    fn frame_view(&self) -> FrameView;
    fn quit_requested(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub tics: u32,
    pub display: DisplayOutcome,
}

#[derive(Debug)]
pub struct FrameLoop {
    events: EventQueue,
    display: DisplayMachine,
    last_tic_time: Option<i64>,
    tics_run: u64,
    frames: u64,
}

impl FrameLoop {
    pub fn new(display: DisplayMachine) -> Self {
        FrameLoop {
            events: EventQueue::default(),
            display,
            last_tic_time: None,
            tics_run: 0,
            frames: 0,
        }
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    pub fn display_mut(&mut self) -> &mut DisplayMachine {
        &mut self.display
    }

    pub fn tics_run(&self) -> u64 {
        self.tics_run
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn run_frame<P, S, A, R>(
        &mut self,
        platform: &mut P,
        sim: &mut S,
        sound: &mut A,
        renderer: &mut R,
    ) -> FrameReport
    where
        P: Platform,
        S: Simulation,
        A: Sound,
        R: Renderer,
    {
        platform.start_frame(&mut self.events);
        let tics = self.try_run_tics(platform, sim);
        sound.update_sounds();
        let display = self.display.display(&sim.frame_view(), renderer, platform);
        sound.update_sound();
        sound.submit_sound();
        self.frames += 1;
        FrameReport { tics, display }
    }

    /// Runs frames until the simulation asks to quit or `max_frames` have
    /// been shown. Returns the number of frames run.
    pub fn run<P, S, A, R>(
        &mut self,
        platform: &mut P,
        sim: &mut S,
        sound: &mut A,
        renderer: &mut R,
        max_frames: Option<u64>,
    ) -> u64
    where
        P: Platform,
        S: Simulation,
        A: Sound,
        R: Renderer,
    {
        let mut frames = 0;
        while max_frames.map_or(true, |max| frames < max) {
            self.run_frame(platform, sim, sound, renderer);
            frames += 1;
            if sim.quit_requested() {
                log::info!("quit requested after {frames} frame(s)");
                break;
            }
        }
        frames
    }

    /// Waits until at least one tic of real time has passed since the last
    /// run, then runs every elapsed tic up to [`MAX_CATCHUP_TICS`].
    fn try_run_tics<P, S>(&mut self, platform: &mut P, sim: &mut S) -> u32
    where
        P: Platform,
        S: Simulation,
    {
        let mut now = platform.now_tics();
        let last = *self.last_tic_time.get_or_insert(now - 1);
        while now - last <= 0 {
            now = platform.now_tics();
        }
        self.last_tic_time = Some(now);

        let available = (now - last).min(MAX_CATCHUP_TICS);
        let mut ran = 0;
        for _ in 0..available {
            sim.run_tic(&mut self.events);
            ran += 1;
            if sim.quit_requested() {
                break;
            }
        }
        self.tics_run += u64::from(ran);
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::PageView;
    use crate::display::GameState;
    use crate::events::Event;
    use crate::wipe::{Frame, MeltWipe};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<String>>>;

    struct ScriptedPlatform {
        journal: Journal,
        times: Vec<i64>,
        reads: usize,
    }

    impl TicClock for ScriptedPlatform {
        fn now_tics(&mut self) -> i64 {
            let time = self.times.get(self.reads).or(self.times.last()).copied().unwrap_or(0);
            self.reads += 1;
            time
        }
    }

    impl Platform for ScriptedPlatform {
        fn start_frame(&mut self, events: &mut EventQueue) {
            self.journal.borrow_mut().push("start".into());
            events.push(Event::key_down(self.reads as i32));
        }
    }

    struct CountingSim {
        journal: Journal,
        tics: u64,
        quit_after: Option<u64>,
        state: GameState,
    }

    impl Simulation for CountingSim {
        fn run_tic(&mut self, events: &mut EventQueue) {
            let drained = events.drain().count();
            self.tics += 1;
            self.journal.borrow_mut().push(format!("tic({drained})"));
        }

        fn frame_view(&self) -> FrameView {
            FrameView {
                state: self.state,
                gametic: self.tics,
                ..FrameView::page(PageView::Credits)
            }
        }

        fn quit_requested(&self) -> bool {
            self.quit_after.map_or(false, |limit| self.tics >= limit)
        }
    }

    struct JournalSound(Journal);

    impl Sound for JournalSound {
        fn update_sounds(&mut self) {
            self.0.borrow_mut().push("sounds".into());
        }
        fn update_sound(&mut self) {
            self.0.borrow_mut().push("mix".into());
        }
        fn submit_sound(&mut self) {
            self.0.borrow_mut().push("submit".into());
        }
    }

    struct JournalRenderer(Journal);

    impl Renderer for JournalRenderer {
        fn execute_set_view_size(&mut self) {}
        fn capture_frame(&mut self) -> Frame {
            Frame::new(4, 4)
        }
        fn draw_level(&mut self, _automap: bool) {}
        fn draw_intermission(&mut self) {}
        fn draw_finale(&mut self) {}
        fn draw_page(&mut self, _page: PageView) {}
        fn reset_palette(&mut self) {}
        fn fill_back_screen(&mut self) {}
        fn draw_view_border(&mut self) {}
        fn draw_automap_overlay(&mut self) {}
        fn draw_pause(&mut self) {}
        fn draw_menu(&mut self) {}
        fn draw_wipe(&mut self, _wipe: &MeltWipe) {}
        fn finish_update(&mut self) {
            self.0.borrow_mut().push("present".into());
        }
    }

    fn rig(times: Vec<i64>, quit_after: Option<u64>) -> (ScriptedPlatform, CountingSim, JournalSound, JournalRenderer, Journal) {
        let journal: Journal = Rc::default();
        (
            ScriptedPlatform {
                journal: journal.clone(),
                times,
                reads: 0,
            },
            CountingSim {
                journal: journal.clone(),
                tics: 0,
                quit_after,
                state: GameState::DemoScreen,
            },
            JournalSound(journal.clone()),
            JournalRenderer(journal.clone()),
            journal,
        )
    }

    #[test]
    fn frame_runs_steps_in_order() {
        let (mut platform, mut sim, mut sound, mut renderer, journal) = rig(vec![10], None);
        let mut frame_loop = FrameLoop::new(DisplayMachine::default());
        let report = frame_loop.run_frame(&mut platform, &mut sim, &mut sound, &mut renderer);
        assert_eq!(report.tics, 1);
        assert_eq!(report.display, DisplayOutcome::Presented);
        assert_eq!(
            *journal.borrow(),
            vec!["start", "tic(1)", "sounds", "present", "mix", "submit"]
        );
    }

    #[test]
    fn every_frame_runs_at_least_one_tic() {
        // the clock stalls at 5 for a while before moving on
        let (mut platform, mut sim, mut sound, mut renderer, _journal) =
            rig(vec![5, 5, 5, 5, 6, 6, 9], None);
        let mut frame_loop = FrameLoop::new(DisplayMachine::default());

        let first = frame_loop.run_frame(&mut platform, &mut sim, &mut sound, &mut renderer);
        let second = frame_loop.run_frame(&mut platform, &mut sim, &mut sound, &mut renderer);
        let third = frame_loop.run_frame(&mut platform, &mut sim, &mut sound, &mut renderer);
        assert_eq!((first.tics, second.tics, third.tics), (1, 1, 3));
        assert_eq!(frame_loop.tics_run(), 5);
    }

    #[test]
    fn catch_up_is_capped() {
        let (mut platform, mut sim, mut sound, mut renderer, _journal) = rig(vec![0, 1000], None);
        let mut frame_loop = FrameLoop::new(DisplayMachine::default());
        frame_loop.run_frame(&mut platform, &mut sim, &mut sound, &mut renderer);
        let report = frame_loop.run_frame(&mut platform, &mut sim, &mut sound, &mut renderer);
        assert_eq!(i64::from(report.tics), MAX_CATCHUP_TICS);
    }

    #[test]
    fn run_stops_on_quit_or_frame_limit() {
        let times: Vec<i64> = (0..100).collect();
        let (mut platform, mut sim, mut sound, mut renderer, _journal) = rig(times.clone(), Some(3));
        let mut frame_loop = FrameLoop::new(DisplayMachine::new(true, true));
        let frames = frame_loop.run(&mut platform, &mut sim, &mut sound, &mut renderer, None);
        assert_eq!(frames, 3);
        assert_eq!(sim.tics, 3);

        let (mut platform, mut sim, mut sound, mut renderer, _journal) = rig(times, None);
        let mut frame_loop = FrameLoop::new(DisplayMachine::new(true, true));
        let frames = frame_loop.run(&mut platform, &mut sim, &mut sound, &mut renderer, Some(4));
        assert_eq!(frames, 4);
        assert_eq!(frame_loop.frames(), 4);
    }
}
