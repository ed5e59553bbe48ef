//! Frame renderer
//!
//! Repaints the whole pixel buffer from the reveal schedule for the current
//! frame counter. This is a full repaint every tick, not a diff, so cost grows
//! with the canvas area.

use crate::color::Color;
use crate::schedule::RenderSchedule;

/// RGBA pixel grid matching a canvas `ImageData`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl PixelBuffer {
    /// Fully transparent buffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Raw RGBA bytes, ready for `ImageData`
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn copy_from(&mut self, other: &PixelBuffer) {
        self.width = other.width;
        self.height = other.height;
        self.pixels.clone_from(&other.pixels);
    }

    /// Number of pixels with non-zero alpha
    pub fn visible_count(&self) -> usize {
        self.pixels.iter().filter(|p| p.a > 0).count()
    }
}

/// Paints the schedule one frame at a time
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    schedule: RenderSchedule,
    color: Color,
    frame: u32,
}

impl FrameRenderer {
    pub fn new(schedule: RenderSchedule, color: Color) -> Self {
        Self {
            schedule,
            color,
            frame: 0,
        }
    }

    pub fn schedule(&self) -> &RenderSchedule {
        &self.schedule
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Current frame counter
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn advance(&mut self) {
        self.frame = self.frame.saturating_add(1);
    }

    /// Paint `pixels` for the current frame.
    /// Returns true once every block is visible.
    pub fn paint(&self, pixels: &mut PixelBuffer) -> bool {
        let block_size = self.schedule.block_size();
        let shown = self.color;
        let hidden = self.color.with_alpha(0);
        let width = pixels.width as usize;

        if width > 0 {
            for (y, row) in pixels.pixels.chunks_mut(width).enumerate() {
                let block_row = y as u32 / block_size;
                for (x, pixel) in row.iter_mut().enumerate() {
                    let visible = self
                        .schedule
                        .frame_at(x as u32 / block_size, block_row)
                        .is_none_or(|frame| frame <= self.frame);
                    *pixel = if visible { shown } else { hidden };
                }
            }
        }

        self.schedule.is_revealed_at(self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{ScheduleOptions, create_render_schedule};
    use glam::DVec2;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn schedule(origin: DVec2, width: u32, height: u32, block_size: u32) -> RenderSchedule {
        let options = ScheduleOptions {
            block_size,
            ..Default::default()
        };
        create_render_schedule(origin, width, height, &options, &mut Pcg32::seed_from_u64(7))
    }

    #[test]
    fn test_first_frame_shows_origin_block_only() {
        let red = Color::rgb(255, 0, 0);
        let renderer = FrameRenderer::new(schedule(DVec2::ZERO, 4, 4, 2), red);
        let mut pixels = PixelBuffer::new(4, 4);

        assert!(!renderer.paint(&mut pixels));
        // Block (0,0) covers the 2x2 top-left pixels
        assert_eq!(pixels.pixel(0, 0), Some(red));
        assert_eq!(pixels.pixel(1, 1), Some(red));
        assert_eq!(pixels.pixel(2, 0), Some(red.with_alpha(0)));
        assert_eq!(pixels.visible_count(), 4);
    }

    #[test]
    fn test_reveal_completes_at_max_frame() {
        let renderer_schedule = schedule(DVec2::new(1.0, 1.0), 6, 3, 1);
        let max = renderer_schedule.max_frame();
        let mut renderer = FrameRenderer::new(renderer_schedule, Color::BLACK);
        let mut pixels = PixelBuffer::new(6, 3);

        for _ in 0..max {
            assert!(!renderer.paint(&mut pixels));
            renderer.advance();
        }
        assert!(renderer.paint(&mut pixels));
        assert_eq!(renderer.frame(), max);
        assert_eq!(pixels.visible_count(), 18);
    }

    #[test]
    fn test_keeps_color_alpha() {
        let tint = Color::rgba(0, 0, 0, 77);
        let renderer = FrameRenderer::new(schedule(DVec2::ZERO, 1, 1, 1), tint);
        let mut pixels = PixelBuffer::new(1, 1);
        assert!(renderer.paint(&mut pixels));
        assert_eq!(pixels.pixel(0, 0), Some(tint));
        assert_eq!(pixels.as_bytes(), &[0, 0, 0, 77]);
    }

    #[test]
    fn test_empty_surface_is_revealed() {
        let renderer = FrameRenderer::new(schedule(DVec2::ZERO, 0, 0, 1), Color::BLACK);
        let mut pixels = PixelBuffer::new(0, 0);
        assert!(renderer.paint(&mut pixels));
    }

    proptest! {
        #[test]
        fn prop_reveal_is_monotonic(
            x in 0.0f64..24.0,
            y in 0.0f64..24.0,
            block_size in 1u32..6,
            frame in 0u32..20,
        ) {
            let schedule = schedule(DVec2::new(x, y), 24, 24, block_size);
            let mut renderer = FrameRenderer::new(schedule.clone(), Color::BLACK);
            for _ in 0..frame {
                renderer.advance();
            }
            let mut pixels = PixelBuffer::new(24, 24);
            renderer.paint(&mut pixels);

            for py in 0..24 {
                for px in 0..24 {
                    let scheduled = schedule.frame_at(px / block_size, py / block_size).unwrap();
                    let visible = pixels.pixel(px, py).unwrap().a > 0;
                    prop_assert_eq!(visible, scheduled <= frame);
                }
            }
        }
    }
}
