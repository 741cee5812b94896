//! Column melt between two captured frames.

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Fixed so every melt looks the same from run to run.
pub const MELT_SEED: u64 = 0x5EED_D00D;
/// Largest head start a column may be delayed by.
const MAX_DELAY: i32 = 16;
/// Columns speed up until they have fallen this far, then drop at a constant
/// rate.
const ACCELERATION_ROWS: i32 = 16;
const FALL_RATE: i32 = 8;

/// A palettized screen snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Frame {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn filled(width: usize, height: usize, color: u8) -> Self {
        Frame {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, color: u8) {
        self.pixels[y * self.width + x] = color;
    }
}

/// The start frame slides down column by column, uncovering the end frame.
/// Each column waits out a small random delay before falling.
#[derive(Debug, Clone)]
pub struct MeltWipe {
    start: Frame,
    end: Frame,
    offsets: Vec<i32>,
    elapsed: u32,
}

impl MeltWipe {
    pub fn new(start: Frame, end: Frame) -> Self {
        MeltWipe::with_seed(start, end, MELT_SEED)
    }

    /// Frames of different sizes melt over the end frame's area.
    pub fn with_seed(start: Frame, end: Frame, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut offsets = Vec::with_capacity(end.width);
        let mut previous = -rng.gen_range(0..MAX_DELAY);
        for column in 0..end.width {
            if column > 0 {
                previous = (previous + rng.gen_range(-1..=1)).clamp(-(MAX_DELAY - 1), 0);
            }
            offsets.push(previous);
        }
        MeltWipe {
            start,
            end,
            offsets,
            elapsed: 0,
        }
    }

    pub fn height(&self) -> usize {
        self.end.height
    }

    /// Tics spent in [`Self::advance`] so far.
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn offsets(&self) -> &[i32] {
        &self.offsets
    }

    pub fn is_complete(&self) -> bool {
        let height = self.end.height as i32;
        self.offsets.iter().all(|&y| y >= height)
    }

    /// Moves every column `tics` steps. Returns true once every column has
    /// fully uncovered the end frame. Zero tics changes nothing.
    pub fn advance(&mut self, tics: u32) -> bool {
        let height = self.end.height as i32;
        for _ in 0..tics {
            if self.is_complete() {
                break;
            }
            self.elapsed += 1;
            for y in &mut self.offsets {
                *y = step_column(*y, height);
            }
        }
        self.is_complete()
    }

    /// Composites the current melt state into `out`.
    pub fn render(&self, out: &mut Frame) {
        if out.width != self.end.width || out.height != self.end.height {
            *out = Frame::new(self.end.width, self.end.height);
        }
        let height = self.end.height;
        for (x, &offset) in self.offsets.iter().enumerate() {
            let uncovered = offset.clamp(0, height as i32) as usize;
            for y in 0..height {
                let color = if y < uncovered {
                    self.end.pixel(x, y)
                } else {
                    self.start_pixel(x, y - uncovered)
                };
                out.set(x, y, color);
            }
        }
    }

    fn start_pixel(&self, x: usize, y: usize) -> u8 {
        if x < self.start.width && y < self.start.height {
            self.start.pixel(x, y)
        } else {
            0
        }
    }
}

fn step_column(y: i32, height: i32) -> i32 {
    if y < 0 {
        y + 1
    } else if y < height {
        let dy = if y < ACCELERATION_ROWS { y + 1 } else { FALL_RATE };
        (y + dy).min(height)
    } else {
        y
    }
}

/// Fewest tics any melt of `height` rows can take: a column with no delay.
pub fn minimum_tics(height: usize) -> u32 {
    let height = height as i32;
    let mut y = 0;
    let mut tics = 0;
    while y < height {
        y = step_column(y, height);
        tics += 1;
    }
    tics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wipe(width: usize, height: usize) -> MeltWipe {
        MeltWipe::new(Frame::filled(width, height, 1), Frame::filled(width, height, 2))
    }

    #[test]
    fn offsets_stay_within_delay_window() {
        let melt = wipe(320, 200);
        assert_eq!(melt.offsets().len(), 320);
        assert!(melt.offsets().iter().all(|&y| (-15..=0).contains(&y)));
        for pair in melt.offsets().windows(2) {
            assert!((pair[0] - pair[1]).abs() <= 1);
        }
    }

    #[test]
    fn same_seed_gives_same_melt() {
        assert_eq!(wipe(64, 8).offsets(), wipe(64, 8).offsets());
    }

    #[test]
    fn zero_tics_make_no_progress() {
        let mut melt = wipe(16, 50);
        let before = melt.offsets().to_vec();
        assert!(!melt.advance(0));
        assert_eq!(melt.offsets(), &before[..]);
        assert_eq!(melt.elapsed(), 0);
    }

    #[test]
    fn completion_takes_at_least_minimum_tics() {
        for height in [1, 16, 200] {
            let mut melt = wipe(32, height);
            let mut total = 0;
            while !melt.advance(1) {
                total += 1;
                assert!(total < 1000, "melt never finished");
            }
            total += 1;
            assert!(total >= minimum_tics(height));
            assert_eq!(melt.elapsed(), total);
        }
    }

    #[test]
    fn large_steps_finish_in_one_call() {
        let mut melt = wipe(8, 200);
        assert!(melt.advance(1000));
        assert!(melt.elapsed() >= minimum_tics(200));
        assert!(melt.elapsed() < 1000);
    }

    #[test]
    fn render_uncovers_end_frame_from_the_top() {
        let mut melt = MeltWipe::new(Frame::filled(4, 40, 1), Frame::filled(4, 40, 2));
        let mut out = Frame::new(0, 0);
        melt.render(&mut out);
        assert!(out.pixels.iter().all(|&p| p == 1));

        // every column has started falling after the longest delay
        melt.advance(16);
        melt.render(&mut out);
        for x in 0..4 {
            assert_eq!(out.pixel(x, 0), 2);
            let offset = melt.offsets()[x] as usize;
            if offset < 40 {
                assert_eq!(out.pixel(x, offset), 1);
                assert_eq!(out.pixel(x, offset - 1), 2);
            }
        }

        melt.advance(100);
        melt.render(&mut out);
        assert!(out.pixels.iter().all(|&p| p == 2));
    }

    #[test]
    fn minimum_tics_accelerates_then_falls_steadily() {
        assert_eq!(minimum_tics(1), 1);
        // 0 -> 1 -> 3 -> 7 -> 15 -> 31 -> 39 -> ...
        assert_eq!(minimum_tics(31), 5);
        assert_eq!(minimum_tics(39), 6);
        assert_eq!(minimum_tics(200), 6 + 21);
    }
}
