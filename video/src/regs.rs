//! Pixel/character buffer controller register block
//!
//! Both controllers expose the same four-word layout:
//!
//! ```text
//! 0x0  Buffer       front buffer base, write 1 to request a swap
//! 0x4  Backbuffer   back buffer base
//! 0x8  Resolution   width | height << 16
//! 0xC  Status       bit 0 set while a swap is pending
//! ```

use crate::constants::{REG_BACK_BUFFER, REG_BUFFER, REG_RESOLUTION, REG_STATUS, SWAP_REQUEST};
use crate::device::{RegisterWindow, WindowError};
use crate::geometry::DisplayGeometry;

bitflags::bitflags! {
    /// Controller status register
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Status: u32 {
        /// Swap requested, waiting for the vertical blank
        const SWAP_PENDING = 1 << 0;
        /// Controller uses X/Y (rather than consecutive) addressing
        const XY_ADDRESSING = 1 << 1;
    }
}

/// Typed view over a controller's register window
pub struct ControlBlock<C> {
    window: C,
}

impl<C: RegisterWindow> ControlBlock<C> {
    pub fn new(window: C) -> Self {
        Self { window }
    }

    /// Base address of the buffer currently scanned out
    pub fn front_buffer(&self) -> Result<u32, WindowError> {
        self.window.read_u32(REG_BUFFER)
    }

    pub fn back_buffer(&self) -> Result<u32, WindowError> {
        self.window.read_u32(REG_BACK_BUFFER)
    }

    pub fn set_back_buffer(&mut self, base: u32) -> Result<(), WindowError> {
        self.window.write_u32(REG_BACK_BUFFER, base)
    }

    /// Read the resolution register. Never cached: the hardware owns it.
    pub fn geometry(&self) -> Result<DisplayGeometry, WindowError> {
        Ok(DisplayGeometry::from_packed(self.window.read_u32(REG_RESOLUTION)?))
    }

    pub fn status(&self) -> Result<Status, WindowError> {
        Ok(Status::from_bits_retain(self.window.read_u32(REG_STATUS)?))
    }

    /// Ask the controller to swap front and back at the next vertical blank
    pub fn request_swap(&mut self) -> Result<(), WindowError> {
        self.window.write_u32(REG_BUFFER, SWAP_REQUEST)
    }

    pub fn window(&self) -> &C {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut C {
        &mut self.window
    }

    pub fn into_inner(self) -> C {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemWindow;

    #[test]
    fn test_fields_decode_from_register_words() {
        let mut w = MemWindow::new(16);
        w.write_u32(0x0, 0xC800_0000).unwrap();
        w.write_u32(0x4, 0xC000_0000).unwrap();
        w.write_u32(0x8, (240 << 16) | 320).unwrap();
        w.write_u32(0xC, 0b11).unwrap();
        let ctrl = ControlBlock::new(w);
        assert_eq!(ctrl.front_buffer().unwrap(), 0xC800_0000);
        assert_eq!(ctrl.back_buffer().unwrap(), 0xC000_0000);
        assert_eq!(ctrl.geometry().unwrap(), DisplayGeometry::new(320, 240));
        assert_eq!(ctrl.status().unwrap(), Status::SWAP_PENDING | Status::XY_ADDRESSING);
    }

    #[test]
    fn test_geometry_is_reread_every_query() {
        let mut ctrl = ControlBlock::new(MemWindow::new(16));
        assert_eq!(ctrl.geometry().unwrap(), DisplayGeometry::new(0, 0));
        ctrl.window_mut().write_u32(0x8, (60 << 16) | 80).unwrap();
        assert_eq!(ctrl.geometry().unwrap(), DisplayGeometry::new(80, 60));
    }

    #[test]
    fn test_swap_request_writes_one_to_buffer_register() {
        let mut ctrl = ControlBlock::new(MemWindow::new(16));
        ctrl.request_swap().unwrap();
        assert_eq!(ctrl.window().read_u32(0x0).unwrap(), 1);
    }
}
