//! Character overlay
//!
//! One byte per cell at `(y << col_shift) + x`. The grid geometry comes from
//! the character controller and is independent of the pixel resolution; on
//! the DE1-SoC it is 80x60 visible cells in 128-cell rows.

use alloc::vec::Vec;

use crate::config::BoundsMode;
use crate::constants::BLANK_CELL;
use crate::device::RegisterWindow;
use crate::error::VideoError;
use crate::geometry::DisplayGeometry;

#[inline]
pub fn cell_offset(x: i32, y: i32, col_shift: u32) -> Option<usize> {
    let offset = ((y as i64) << col_shift) + x as i64;
    usize::try_from(offset).ok()
}

pub struct TextOverlay<'a, B> {
    buffer: &'a mut B,
    geometry: DisplayGeometry,
    col_shift: u32,
    bounds: BoundsMode,
}

impl<'a, B: RegisterWindow> TextOverlay<'a, B> {
    pub fn new(buffer: &'a mut B, geometry: DisplayGeometry, col_shift: u32, bounds: BoundsMode) -> Self {
        Self {
            buffer,
            geometry,
            col_shift,
            bounds,
        }
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    fn offset(&self, x: i32, y: i32) -> Result<usize, VideoError> {
        cell_offset(x, y, self.col_shift).ok_or(VideoError::OutOfBounds { x, y })
    }

    /// Write a space into every visible cell
    pub fn clear_all(&mut self) -> Result<(), VideoError> {
        for x in 0..self.geometry.width as i32 {
            for y in 0..self.geometry.height as i32 {
                let offset = self.offset(x, y)?;
                self.buffer.write_u8(offset, BLANK_CELL)?;
            }
        }
        Ok(())
    }

    /// Write `text` into consecutive cells starting at `(x, y)`
    ///
    /// There is no wrapping. In checked mode the whole run must fit in row
    /// `y` of the grid. In unchecked mode a string longer than the rest of
    /// the row runs on through the row padding and into the following row's
    /// memory, as the raw hardware does.
    pub fn plot_text(&mut self, x: i32, y: i32, text: &str) -> Result<(), VideoError> {
        if self.bounds == BoundsMode::Checked {
            if !self.geometry.contains(x, y) {
                return Err(VideoError::OutOfBounds { x, y });
            }
            let end = x as i64 + text.len() as i64;
            if end > self.geometry.width as i64 {
                return Err(VideoError::OutOfBounds {
                    x: i32::try_from(end - 1).unwrap_or(i32::MAX),
                    y,
                });
            }
        }
        let start = self.offset(x, y)?;
        for (i, byte) in text.bytes().enumerate() {
            self.buffer.write_u8(start + i, byte)?;
        }
        Ok(())
    }

    pub fn read_cell(&self, x: i32, y: i32) -> Result<u8, VideoError> {
        if self.bounds == BoundsMode::Checked && !self.geometry.contains(x, y) {
            return Err(VideoError::OutOfBounds { x, y });
        }
        let offset = self.offset(x, y)?;
        Ok(self.buffer.read_u8(offset)?)
    }

    /// Visible cells of row `y`
    pub fn row(&self, y: i32) -> Result<Vec<u8>, VideoError> {
        (0..self.geometry.width as i32)
            .map(|x| self.read_cell(x, y))
            .collect()
    }
}
