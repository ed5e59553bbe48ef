//! Reveal schedule
//!
//! Splits the canvas into square blocks and assigns each block the frame on
//! which it becomes visible. The frame grows with the block's distance from
//! the ripple origin, optionally reshaped by a timing function and roughened
//! with random jitter at the edge.

use glam::DVec2;
use rand::Rng;
use serde::Serialize;

use crate::consts::{JITTER_MIN_FRAME, TIMING_DURATION};
use crate::easing::TimingFunction;

/// Absorbs `c * (b / c)` landing a hair under `b` before flooring
const FRAME_EPSILON: f64 = 1e-9;

/// Schedule parameters
#[derive(Debug, Clone)]
pub struct ScheduleOptions {
    /// Edge length of one block in canvas pixels (0 is treated as 1)
    pub block_size: u32,
    /// Remaps raw frames; `None` keeps the linear distance schedule
    pub timing: Option<TimingFunction>,
    /// Jitter strength ("bit crash"); only values above 1 have an effect
    pub bit_crash: Option<f64>,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            block_size: 1,
            timing: None,
            bit_crash: None,
        }
    }
}

/// Frame index per block, row-major. Immutable once built.
#[derive(Debug, Clone)]
pub struct RenderSchedule {
    frames: Vec<u32>,
    width: u32,
    height: u32,
    block_size: u32,
    eased_by: Option<TimingFunction>,
    max_frame: u32,
}

impl RenderSchedule {
    /// Blocks per row
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Blocks per column
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Timing function used to build this schedule
    pub fn eased_by(&self) -> Option<&TimingFunction> {
        self.eased_by.as_ref()
    }

    /// Last frame on which any block appears
    pub fn max_frame(&self) -> u32 {
        self.max_frame
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame of the block at (column, row)
    #[inline]
    pub fn frame_at(&self, col: u32, row: u32) -> Option<u32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.frames.get((row * self.width + col) as usize).copied()
    }

    /// Every row of the grid, including empty rows of a zero-width grid
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        let width = self.width as usize;
        (0..self.height as usize).map(move |row| &self.frames[row * width..(row + 1) * width])
    }

    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.rows().map(<[u32]>::to_vec).collect()
    }

    /// Plain-data view: rows plus grid metadata
    pub fn data(&self) -> ScheduleData {
        ScheduleData {
            data: self.to_rows(),
            width: self.width,
            height: self.height,
            pixel_size: self.block_size,
            eased_by: self.eased_by.as_ref().and_then(TimingFunction::name),
        }
    }

    /// Whether every block is visible at `frame`
    pub fn is_revealed_at(&self, frame: u32) -> bool {
        self.max_frame <= frame
    }
}

/// Serializable schedule, as handed to scripts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleData {
    pub data: Vec<Vec<u32>>,
    pub width: u32,
    pub height: u32,
    pub pixel_size: u32,
    /// Curve name; `None` for custom functions or no easing
    pub eased_by: Option<&'static str>,
}

/// Build the reveal schedule for a `width` x `height` canvas rippling out from `origin`.
pub fn create_render_schedule<R: Rng>(
    origin: DVec2,
    width: u32,
    height: u32,
    options: &ScheduleOptions,
    rng: &mut R,
) -> RenderSchedule {
    let block_size = options.block_size.max(1);
    let cols = width.div_ceil(block_size);
    let rows = height.div_ceil(block_size);
    let size = block_size as f64;

    let mut raw = Vec::with_capacity((cols * rows) as usize);
    let mut max_raw = 0u32;
    for row in 0..rows {
        for col in 0..cols {
            let corner = DVec2::new(size * col as f64, size * row as f64);
            let frame = (corner.distance(origin) / size).floor() as u32;
            max_raw = max_raw.max(frame);
            raw.push(frame);
        }
    }

    let frames = match &options.timing {
        Some(timing) => {
            let c = max_raw as f64;
            raw.iter()
                .map(|&b| {
                    let t = if max_raw > 0 { b as f64 / c } else { 0.0 };
                    let eased = timing.apply(t, b as f64, c, TIMING_DURATION);
                    let mut frame = (eased + FRAME_EPSILON).floor() as i64;

                    // Jitter keys off the raw frame but lands on the eased one
                    if let Some(strength) = options.bit_crash {
                        if strength > 1.0 && b > JITTER_MIN_FRAME {
                            frame += (strength * rng.random::<f64>()).floor() as i64;
                        }
                    }

                    frame.clamp(0, u32::MAX as i64) as u32
                })
                .collect()
        }
        None => raw,
    };

    let max_frame = frames.iter().copied().max().unwrap_or(0);
    log::debug!(
        "Schedule {}x{} blocks (size {}), max frame {}, eased by {:?}",
        cols,
        rows,
        block_size,
        max_frame,
        options.timing
    );

    RenderSchedule {
        frames,
        width: cols,
        height: rows,
        block_size,
        eased_by: options.timing.clone(),
        max_frame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::{CustomTiming, TimingSpec, resolve_timing_function};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::rc::Rc;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(12345)
    }

    fn eased(name: &str) -> Option<TimingFunction> {
        resolve_timing_function(name.into())
    }

    #[test]
    fn test_single_block() {
        let options = ScheduleOptions {
            block_size: 5,
            timing: eased("easeInBack"),
            bit_crash: None,
        };
        let schedule = create_render_schedule(DVec2::ZERO, 5, 5, &options, &mut rng());
        assert_eq!(schedule.to_rows(), vec![vec![0]]);
        assert_eq!(schedule.width(), 1);
        assert_eq!(schedule.height(), 1);
        assert_eq!(schedule.block_size(), 5);
        assert_eq!(schedule.eased_by(), eased("easeInBack").as_ref());
    }

    #[test]
    fn test_two_by_two_in_out_expo() {
        let options = ScheduleOptions {
            timing: eased("easeInOutExpo"),
            ..Default::default()
        };
        let schedule = create_render_schedule(DVec2::ZERO, 2, 2, &options, &mut rng());
        assert_eq!(schedule.to_rows(), vec![vec![0, 1], vec![1, 1]]);
        assert_eq!(schedule.width(), 2);
        assert_eq!(schedule.height(), 2);
        assert_eq!(schedule.block_size(), 1);
        assert_eq!(schedule.eased_by(), eased("easeInOutExpo").as_ref());
    }

    #[test]
    fn test_linear_distance_from_center() {
        let schedule = create_render_schedule(
            DVec2::new(2.0, 0.0),
            5,
            1,
            &ScheduleOptions::default(),
            &mut rng(),
        );
        assert_eq!(schedule.to_rows(), vec![vec![2, 1, 0, 1, 2]]);
        assert_eq!(schedule.max_frame(), 2);
        assert!(schedule.eased_by().is_none());
    }

    #[test]
    fn test_partial_blocks_round_up() {
        let options = ScheduleOptions {
            block_size: 4,
            ..Default::default()
        };
        let schedule = create_render_schedule(DVec2::ZERO, 10, 5, &options, &mut rng());
        assert_eq!(schedule.width(), 3);
        assert_eq!(schedule.height(), 2);
        assert_eq!(schedule.frame_at(3, 0), None);
    }

    #[test]
    fn test_zero_block_size_treated_as_one() {
        let options = ScheduleOptions {
            block_size: 0,
            ..Default::default()
        };
        let schedule = create_render_schedule(DVec2::ZERO, 3, 2, &options, &mut rng());
        assert_eq!(schedule.block_size(), 1);
        assert_eq!(schedule.width(), 3);
        assert_eq!(schedule.height(), 2);
    }

    #[test]
    fn test_degenerate_size_is_empty() {
        let schedule =
            create_render_schedule(DVec2::ZERO, 0, 10, &ScheduleOptions::default(), &mut rng());
        assert!(schedule.is_empty());
        assert_eq!(schedule.max_frame(), 0);
        // Zero columns, but every row is still there
        assert_eq!(schedule.rows().count(), 10);
        assert!(schedule.rows().all(<[u32]>::is_empty));
        assert!(schedule.is_revealed_at(0));

        let flat =
            create_render_schedule(DVec2::ZERO, 10, 0, &ScheduleOptions::default(), &mut rng());
        assert_eq!(flat.rows().count(), 0);
    }

    #[test]
    fn test_zero_width_single_row() {
        let schedule =
            create_render_schedule(DVec2::ZERO, 0, 1, &ScheduleOptions::default(), &mut rng());
        assert_eq!(schedule.width(), 0);
        assert_eq!(schedule.height(), 1);
        assert_eq!(schedule.to_rows(), vec![Vec::<u32>::new()]);
    }

    #[test]
    fn test_data_view() {
        let options = ScheduleOptions {
            block_size: 5,
            timing: eased("easeInBack"),
            bit_crash: None,
        };
        let schedule = create_render_schedule(DVec2::ZERO, 5, 5, &options, &mut rng());
        let data = schedule.data();
        assert_eq!(data.data, vec![vec![0]]);
        assert_eq!((data.width, data.height, data.pixel_size), (1, 1, 5));
        assert_eq!(data.eased_by, Some("easeInBack"));

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["pixelSize"], 5);
        assert_eq!(json["easedBy"], "easeInBack");

        let plain =
            create_render_schedule(DVec2::ZERO, 2, 1, &ScheduleOptions::default(), &mut rng());
        assert!(serde_json::to_value(plain.data()).unwrap()["easedBy"].is_null());
    }

    #[test]
    fn test_overshoot_clamped_to_zero() {
        let options = ScheduleOptions {
            timing: eased("easeInBack"),
            ..Default::default()
        };
        let schedule = create_render_schedule(DVec2::ZERO, 20, 1, &options, &mut rng());
        assert!(schedule.rows().flatten().all(|&f| f <= schedule.max_frame()));
        // easeInBack dips below zero for near blocks
        assert_eq!(schedule.frame_at(1, 0), Some(0));
        assert_eq!(schedule.frame_at(19, 0), Some(19));
    }

    #[test]
    fn test_jitter_only_beyond_threshold() {
        let options = ScheduleOptions {
            timing: eased("linear"),
            bit_crash: Some(50.0),
            ..Default::default()
        };
        let schedule = create_render_schedule(DVec2::ZERO, 40, 1, &options, &mut rng());
        for col in 0..=JITTER_MIN_FRAME {
            assert_eq!(schedule.frame_at(col, 0), Some(col));
        }
        let jittered = (JITTER_MIN_FRAME + 1..40)
            .filter(|&col| schedule.frame_at(col, 0) != Some(col))
            .count();
        assert!(jittered > 0);
        for col in JITTER_MIN_FRAME + 1..40 {
            let frame = schedule.frame_at(col, 0).unwrap();
            assert!(frame >= col && frame < col + 50);
        }
    }

    #[test]
    fn test_jitter_needs_strength_above_one() {
        let options = ScheduleOptions {
            timing: eased("linear"),
            bit_crash: Some(1.0),
            ..Default::default()
        };
        let schedule = create_render_schedule(DVec2::ZERO, 30, 1, &options, &mut rng());
        let expected: Vec<u32> = (0..30).collect();
        assert_eq!(schedule.to_rows(), vec![expected]);
    }

    #[test]
    fn test_jitter_is_seeded() {
        let options = ScheduleOptions {
            timing: eased("easeInQuad"),
            bit_crash: Some(7.0),
            block_size: 2,
        };
        let a = create_render_schedule(DVec2::new(20.0, 10.0), 50, 30, &options, &mut rng());
        let b = create_render_schedule(DVec2::new(20.0, 10.0), 50, 30, &options, &mut rng());
        assert_eq!(a.to_rows(), b.to_rows());
    }

    #[test]
    fn test_custom_timing_receives_frame_domain() {
        let custom: CustomTiming = Rc::new(|t, b, c, d| {
            assert_eq!(d, 1.0);
            assert!((t * c - b).abs() < 1e-9);
            b * 3.0
        });
        let options = ScheduleOptions {
            timing: resolve_timing_function(TimingSpec::Custom(custom)),
            ..Default::default()
        };
        let schedule = create_render_schedule(DVec2::ZERO, 4, 1, &options, &mut rng());
        assert_eq!(schedule.to_rows(), vec![vec![0, 3, 6, 9]]);
    }

    proptest! {
        #[test]
        fn prop_grid_dimensions(
            x in -50.0f64..150.0,
            y in -50.0f64..150.0,
            width in 0u32..120,
            height in 0u32..120,
            block_size in 1u32..16,
        ) {
            let options = ScheduleOptions { block_size, ..Default::default() };
            let origin = DVec2::new(x, y);
            let schedule = create_render_schedule(origin, width, height, &options, &mut rng());
            prop_assert_eq!(schedule.width(), width.div_ceil(block_size));
            prop_assert_eq!(schedule.height(), height.div_ceil(block_size));
            prop_assert_eq!(schedule.rows().count() as u32, schedule.height());
        }

        #[test]
        fn prop_eased_frames_stay_bounded(
            x in 0.0f64..60.0,
            y in 0.0f64..60.0,
            bit_crash in 0.0f64..12.0,
            curve in 0usize..crate::easing::EASINGS.len(),
        ) {
            let easing = &crate::easing::EASINGS[curve];
            let origin = DVec2::new(x, y);
            let linear = ScheduleOptions { block_size: 3, ..Default::default() };
            let raw = create_render_schedule(origin, 60, 60, &linear, &mut rng());
            let smooth = ScheduleOptions {
                timing: Some(TimingFunction::Named(easing)),
                ..linear.clone()
            };
            let jittered = ScheduleOptions {
                bit_crash: Some(bit_crash),
                ..smooth.clone()
            };
            let smooth = create_render_schedule(origin, 60, 60, &smooth, &mut rng());
            let jittered = create_render_schedule(origin, 60, 60, &jittered, &mut rng());

            // Back and elastic curves overshoot past the last raw frame
            let overshoots = easing.name.contains("Back") || easing.name.contains("Elastic");
            let bound = raw.max_frame() + bit_crash.floor() as u32;
            for row in 0..raw.height() {
                for col in 0..raw.width() {
                    let frame = jittered.frame_at(col, row).unwrap();
                    if !overshoots {
                        prop_assert!(frame <= bound, "{} > {} for {}", frame, bound, easing.name);
                    }
                    if raw.frame_at(col, row).unwrap() <= JITTER_MIN_FRAME {
                        prop_assert_eq!(Some(frame), smooth.frame_at(col, row));
                    }
                }
            }
        }
    }
}
