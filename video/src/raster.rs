//! Drawing primitives over a pixel buffer
//!
//! Pixels are 16-bit cells at `(y << row_shift) + (x << 1)`. Colors are raw
//! values (RGB565 on the reference hardware) and are never interpreted here.
//!
//! [`Canvas`] adapts a [`Rasterizer`] to `embedded-graphics`, so its shapes
//! and text styles render straight into the back buffer.

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::{
        raw::{RawData, RawU16},
        Rgb565,
    },
    Pixel,
};

use crate::config::BoundsMode;
use crate::device::RegisterWindow;
use crate::error::VideoError;
use crate::geometry::DisplayGeometry;

/// Side of a box corner marker
const MARKER: i32 = 3;

/// Byte offset of pixel `(x, y)`, or `None` if it lands before the buffer
#[inline]
pub fn pixel_offset(x: i32, y: i32, row_shift: u32) -> Option<usize> {
    let offset = ((y as i64) << row_shift) + ((x as i64) << 1);
    usize::try_from(offset).ok()
}

// =============================================================================
// Bresenham line walk
// =============================================================================

/// Pixels of an integer Bresenham line, endpoints included
///
/// Steep lines are walked along y. Endpoints are ordered so the walk always
/// runs with increasing major axis, which makes `(a, b)` and `(b, a)` yield
/// the same set of pixels.
#[derive(Debug, Clone)]
pub struct LinePoints {
    steep: bool,
    x: i32,
    x_end: i32,
    y: i32,
    y_step: i32,
    delta_x: i64,
    delta_y: i64,
    error: i64,
    done: bool,
}

impl LinePoints {
    pub fn new(mut x0: i32, mut y0: i32, mut x1: i32, mut y1: i32) -> Self {
        let steep = y1.abs_diff(y0) > x1.abs_diff(x0);
        if steep {
            core::mem::swap(&mut x0, &mut y0);
            core::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            core::mem::swap(&mut x0, &mut x1);
            core::mem::swap(&mut y0, &mut y1);
        }

        // Deltas span up to 2^32 - 1 for extreme endpoints
        let delta_x = x1 as i64 - x0 as i64;
        Self {
            steep,
            x: x0,
            x_end: x1,
            y: y0,
            y_step: if y1 >= y0 { 1 } else { -1 },
            delta_x,
            delta_y: y1.abs_diff(y0) as i64,
            error: -(delta_x / 2),
            done: false,
        }
    }
}

impl Iterator for LinePoints {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        if self.done {
            return None;
        }
        let point = if self.steep { (self.y, self.x) } else { (self.x, self.y) };

        if self.x == self.x_end {
            self.done = true;
            return Some(point);
        }

        // Flat runs never step the minor axis (error starts at 0 when dx == 1)
        self.error += self.delta_y;
        if self.delta_y != 0 && self.error >= 0 {
            self.y += self.y_step;
            self.error -= self.delta_x;
        }
        self.x += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            let n = usize::try_from(self.x_end as i64 - self.x as i64 + 1).ok();
            (n.unwrap_or(usize::MAX), n)
        }
    }
}

// =============================================================================
// Rasterizer
// =============================================================================

/// Drawing primitives bound to one pixel buffer and a geometry snapshot
pub struct Rasterizer<'a, B> {
    buffer: &'a mut B,
    geometry: DisplayGeometry,
    row_shift: u32,
    bounds: BoundsMode,
}

impl<'a, B: RegisterWindow> Rasterizer<'a, B> {
    pub fn new(buffer: &'a mut B, geometry: DisplayGeometry, row_shift: u32, bounds: BoundsMode) -> Self {
        Self {
            buffer,
            geometry,
            row_shift,
            bounds,
        }
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    fn check(&self, x: i32, y: i32) -> Result<(), VideoError> {
        match self.bounds {
            BoundsMode::Checked if !self.geometry.contains(x, y) => Err(VideoError::OutOfBounds { x, y }),
            _ => Ok(()),
        }
    }

    fn offset(&self, x: i32, y: i32) -> Result<usize, VideoError> {
        pixel_offset(x, y, self.row_shift).ok_or(VideoError::OutOfBounds { x, y })
    }

    /// Write one pixel
    pub fn plot_pixel(&mut self, x: i32, y: i32, color: u16) -> Result<(), VideoError> {
        self.check(x, y)?;
        let offset = self.offset(x, y)?;
        self.buffer.write_u16(offset, color)?;
        Ok(())
    }

    pub fn read_pixel(&self, x: i32, y: i32) -> Result<u16, VideoError> {
        self.check(x, y)?;
        let offset = self.offset(x, y)?;
        Ok(self.buffer.read_u16(offset)?)
    }

    /// Bresenham line from `(x0, y0)` to `(x1, y1)` inclusive
    ///
    /// Every pixel lies inside the endpoints' bounding box, so in checked
    /// mode validating both endpoints up front keeps a rejected line from
    /// leaving a partial stroke behind.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u16) -> Result<(), VideoError> {
        self.check(x0, y0)?;
        self.check(x1, y1)?;
        for (x, y) in LinePoints::new(x0, y0, x1, y1) {
            self.plot_pixel(x, y, color)?;
        }
        Ok(())
    }

    /// Two 3x3 corner markers ending at each (clamped) endpoint
    ///
    /// Each coordinate is raised to at least 2, and the marker covers
    /// `[x-2, x] x [y-2, y]`, so it never reaches negative coordinates.
    pub fn draw_box(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u16) -> Result<(), VideoError> {
        let (x0, y0) = (x0.max(MARKER - 1), y0.max(MARKER - 1));
        let (x1, y1) = (x1.max(MARKER - 1), y1.max(MARKER - 1));
        self.check(x0, y0)?;
        self.check(x1, y1)?;

        for i in 0..MARKER {
            for j in 0..MARKER {
                self.plot_pixel(x0 - 2 + i, y0 - 2 + j, color)?;
                self.plot_pixel(x1 - 2 + i, y1 - 2 + j, color)?;
            }
        }
        Ok(())
    }

    /// Fill every on-screen pixel with `color`
    pub fn clear(&mut self, color: u16) -> Result<(), VideoError> {
        for y in 0..self.geometry.height as i32 {
            for x in 0..self.geometry.width as i32 {
                let offset = self.offset(x, y)?;
                self.buffer.write_u16(offset, color)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// embedded-graphics support
// =============================================================================

/// `DrawTarget` view of a [`Rasterizer`]; off-screen pixels are dropped
pub struct Canvas<'r, 'a, B> {
    raster: &'r mut Rasterizer<'a, B>,
}

impl<'r, 'a, B: RegisterWindow> Canvas<'r, 'a, B> {
    pub fn new(raster: &'r mut Rasterizer<'a, B>) -> Self {
        Self { raster }
    }
}

impl<B: RegisterWindow> DrawTarget for Canvas<'_, '_, B> {
    type Color = Rgb565;
    type Error = VideoError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let geometry = self.raster.geometry;
        for Pixel(point, color) in pixels {
            if !geometry.contains(point.x, point.y) {
                continue;
            }
            self.raster
                .plot_pixel(point.x, point.y, RawU16::from(color).into_inner())?;
        }
        Ok(())
    }
}

impl<B: RegisterWindow> OriginDimensions for Canvas<'_, '_, B> {
    fn size(&self) -> Size {
        Size::new(self.raster.geometry.width, self.raster.geometry.height)
    }
}
