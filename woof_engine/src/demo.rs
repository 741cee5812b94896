//! Attract loop: title pages, credits and demo playback in a fixed cycle.

use serde::Serialize;

use crate::store::LumpLookup;
use crate::version::GameMode;

/// Logical tics per second.
pub const TICRATE: i32 = 35;
/// How long a page stays up unless its action says otherwise.
pub const DEFAULT_PAGE_TICS: i32 = TICRATE * 11;
pub const TITLE_INTRO_TICS: i32 = (TICRATE * 170) / 35;

/// Page checksums of the two title screens that get the `DOGOVRLY` overlay.
const OVERLAY_TITLE_SUMS: [u32; 2] = [2_119_826_587, 2_391_756_584];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Music {
    Intro,
    Doom2Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DemoAction {
    /// Title page with the intro music and a shortened page time.
    TitleIntro,
    /// Title page with the DOOM II title music.
    TitleCommercial,
    /// Show a page; no resource means the credits screen.
    Page,
    PlayDemo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoStep {
    pub action: DemoAction,
    pub resource: Option<&'static str>,
}

const fn step(action: DemoAction, resource: &'static str) -> Option<DemoStep> {
    Some(DemoStep {
        action,
        resource: Some(resource),
    })
}

const CREDITS_PAGE: Option<DemoStep> = Some(DemoStep {
    action: DemoAction::Page,
    resource: None,
});

/// Rows are sequence steps, columns are game modes in the order shareware,
/// registered, commercial, retail. An empty cell ends the cycle.
pub type DemoTable = [[Option<DemoStep>; 4]];

use DemoAction::{Page, PlayDemo, TitleCommercial, TitleIntro};

pub const DEMO_STATES: [[Option<DemoStep>; 4]; 9] = [
    [
        step(TitleIntro, "TITLEPIC"),
        step(TitleIntro, "TITLEPIC"),
        step(TitleCommercial, "TITLEPIC"),
        step(TitleIntro, "TITLEPIC"),
    ],
    [
        step(PlayDemo, "demo1"),
        step(PlayDemo, "demo1"),
        step(PlayDemo, "demo1"),
        step(PlayDemo, "demo1"),
    ],
    [
        step(Page, "HELP2"),
        step(Page, "HELP2"),
        step(Page, "CREDIT"),
        step(Page, "CREDIT"),
    ],
    [
        step(PlayDemo, "demo2"),
        step(PlayDemo, "demo2"),
        step(PlayDemo, "demo2"),
        step(PlayDemo, "demo2"),
    ],
    [CREDITS_PAGE, CREDITS_PAGE, CREDITS_PAGE, CREDITS_PAGE],
    [
        step(PlayDemo, "demo3"),
        step(PlayDemo, "demo3"),
        step(PlayDemo, "demo3"),
        step(PlayDemo, "demo3"),
    ],
    [None, None, None, step(Page, "CREDIT")],
    [None, None, None, step(PlayDemo, "demo4")],
    [None, None, None, None],
];

/// Game-side effects of a sequence step.
pub trait DemoHost {
    /// Leaves whatever was running and switches to the page screen.
    fn enter_demo_screen(&mut self);
    fn start_music(&mut self, music: Music);
    /// Queues demo playback for the next tic.
    fn play_demo(&mut self, name: &str);
}

/// What the page screen should show this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageView {
    Credits,
    Patch { lump: usize, overlay: Option<usize> },
}

#[derive(Debug, Clone)]
pub struct DemoSequencer {
    table: &'static DemoTable,
    mode_index: usize,
    sequence: i32,
    page_tic: i32,
    page_name: Option<&'static str>,
    advance_pending: bool,
    single_demo: bool,
}

impl DemoSequencer {
    pub fn new(mode: GameMode) -> Self {
        DemoSequencer::with_table(&DEMO_STATES, mode.table_index().unwrap_or(0))
    }

    pub fn with_table(table: &'static DemoTable, mode_index: usize) -> Self {
        DemoSequencer {
            table,
            mode_index,
            sequence: -1,
            page_tic: DEFAULT_PAGE_TICS,
            page_name: None,
            advance_pending: false,
            single_demo: false,
        }
    }

    pub fn sequence(&self) -> i32 {
        self.sequence
    }

    pub fn page_tic(&self) -> i32 {
        self.page_tic
    }

    pub fn page_name(&self) -> Option<&'static str> {
        self.page_name
    }

    /// Stops the page timer from cycling, for single demo playback.
    pub fn set_single_demo(&mut self, single: bool) {
        self.single_demo = single;
    }

    /// Asks for the next step; it runs on the next [`Self::run_pending`].
    pub fn request_advance(&mut self) {
        self.advance_pending = true;
    }

    pub fn advance_pending(&self) -> bool {
        self.advance_pending
    }

    /// Restarts the cycle from the first step.
    pub fn start(&mut self, store: &dyn LumpLookup, host: &mut dyn DemoHost) {
        self.sequence = -1;
        self.advance(store, host);
    }

    /// Counts down the current page and requests the next step when it
    /// expires.
    pub fn page_ticker(&mut self) {
        if self.single_demo {
            return;
        }
        self.page_tic -= 1;
        if self.page_tic < 0 {
            self.request_advance();
        }
    }

    /// Runs a requested advance. Returns true if one ran.
    pub fn run_pending(&mut self, store: &dyn LumpLookup, host: &mut dyn DemoHost) -> bool {
        if !self.advance_pending {
            return false;
        }
        self.advance(store, host);
        true
    }

    /// Moves to the next step, wrapping to step 0 when the next cell for
    /// this mode is empty, and performs the step's action.
    pub fn advance(&mut self, store: &dyn LumpLookup, host: &mut dyn DemoHost) {
        self.advance_pending = false;
        self.page_tic = DEFAULT_PAGE_TICS;
        host.enter_demo_screen();

        self.sequence += 1;
        let Some(step) = self.cell(self.sequence).or_else(|| {
            self.sequence = 0;
            self.cell(0)
        }) else {
            log::warn!("demo sequence has no steps for mode {}", self.mode_index);
            return;
        };

        let resource = step.resource.map(|name| substitute_title(name, store));
        log::debug!("demo step {}: {:?} {:?}", self.sequence, step.action, resource);
        match step.action {
            DemoAction::TitleIntro => {
                host.start_music(Music::Intro);
                self.page_tic = TITLE_INTRO_TICS;
                self.page_name = resource;
            }
            DemoAction::TitleCommercial => {
                host.start_music(Music::Doom2Title);
                self.page_name = resource;
            }
            DemoAction::Page => self.page_name = resource,
            DemoAction::PlayDemo => {
                if let Some(name) = resource {
                    host.play_demo(name);
                }
            }
        }
    }

    fn cell(&self, sequence: i32) -> Option<DemoStep> {
        let row = usize::try_from(sequence).ok()?;
        self.table.get(row)?.get(self.mode_index).copied().flatten()
    }

    pub fn page_view(&self, store: &dyn LumpLookup) -> PageView {
        let Some(name) = self.page_name else {
            return PageView::Credits;
        };
        let Some(lump) = store.check_num_for_name(name) else {
            log::debug!("page {name} missing, showing credits");
            return PageView::Credits;
        };
        let sum = store.lump_bytes(lump).map(page_checksum).unwrap_or(0);
        let overlay = if OVERLAY_TITLE_SUMS.contains(&sum) {
            store.check_num_for_name("DOGOVRLY")
        } else {
            None
        };
        PageView::Patch { lump, overlay }
    }
}

/// Release-specific replacement for the title page: IWADs without
/// `TITLEPIC`, or whose own `TITLEPIC` is shadowed by `DMENUPIC`, use
/// `DMENUPIC` and then `INTERPIC`.
fn substitute_title(name: &'static str, store: &dyn LumpLookup) -> &'static str {
    if !name.eq_ignore_ascii_case("TITLEPIC") {
        return name;
    }
    let title = store.check_num_for_name("TITLEPIC");
    let menu = store.check_num_for_name("DMENUPIC");
    let replace = match title {
        None => true,
        Some(index) => menu.is_some() && store.is_iwad_lump(index),
    };
    match (replace, menu) {
        (false, _) => name,
        (true, Some(_)) => "DMENUPIC",
        (true, None) => "INTERPIC",
    }
}

/// Sum over the page bytes from last to first, `c = c * 3 + byte`.
pub fn page_checksum(data: &[u8]) -> u32 {
    data.iter()
        .rev()
        .fold(0u32, |sum, &byte| sum.wrapping_mul(3).wrapping_add(u32::from(byte)))
}
