//! Display configuration
//!
//! Defaults describe the DE1-SoC VGA subsystem. Other boards with the same
//! controller IP only differ in buffer addresses and pitch.

use crate::constants::{CHAR_ROW_SHIFT, FPGA_PIXEL_BUF_BASE, PIXEL_ROW_SHIFT, SDRAM_BASE};

/// How drawing primitives treat coordinates outside the current geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsMode {
    /// Reject with `VideoError::OutOfBounds` before writing anything
    #[default]
    Checked,
    /// Write wherever the addressing formula lands, as the raw hardware
    /// would. The register window still refuses offsets outside the mapping.
    Unchecked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    /// log2 of the pixel row pitch in bytes
    pub row_shift: u32,
    /// log2 of the character row pitch in cells
    pub col_shift: u32,
    /// Physical base of the primary pixel buffer
    pub primary_base: u32,
    /// Physical base of the secondary pixel buffer
    pub secondary_base: u32,
    pub bounds: BoundsMode,
    /// Status polls before a swap is abandoned; `None` spins forever
    pub swap_poll_limit: Option<u32>,
}

impl DisplayConfig {
    pub const fn de1_soc() -> Self {
        Self {
            row_shift: PIXEL_ROW_SHIFT,
            col_shift: CHAR_ROW_SHIFT,
            primary_base: FPGA_PIXEL_BUF_BASE as u32,
            secondary_base: SDRAM_BASE as u32,
            bounds: BoundsMode::Checked,
            swap_poll_limit: None,
        }
    }

    pub fn with_bounds(mut self, bounds: BoundsMode) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_swap_poll_limit(mut self, limit: Option<u32>) -> Self {
        self.swap_poll_limit = limit;
        self
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::de1_soc()
    }
}
