//! Simulated VGA controllers for host builds and tests
//!
//! [`SimControl`] models the DE1-SoC pixel/character controller register
//! block, including the swap handshake: a write of 1 to the Buffer register
//! raises the status S bit, and after a configurable number of status polls
//! the "vertical blank" arrives, front and back addresses trade places and S
//! clears. [`SimMapper`] hands these out alongside plain [`MemWindow`]s.

use core::cell::Cell;

use super::window::{check_access, MemWindow, RegisterWindow, WindowError};
use super::{MapError, Region, RegionMapper};
use crate::constants::{
    CHAR_BUF_CTRL_BASE, CTRL_SPAN, FPGA_CHAR_BASE, FPGA_PIXEL_BUF_BASE, PIXEL_BUF_CTRL_BASE,
    REG_BACK_BUFFER, REG_BUFFER, REG_RESOLUTION, REG_STATUS, SWAP_REQUEST,
};
use crate::geometry::DisplayGeometry;
use crate::regs::Status;

/// When the simulated vertical blank acknowledges a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapLatency {
    /// Acknowledge once this many polls have seen S still set
    Polls(u32),
    /// Never acknowledge (hung controller)
    Never,
}

impl Default for SwapLatency {
    fn default() -> Self {
        SwapLatency::Polls(2)
    }
}

/// Simulated controller register block
#[derive(Debug)]
pub struct SimControl {
    front: Cell<u32>,
    back: Cell<u32>,
    resolution: u32,
    status: Cell<Status>,
    latency: SwapLatency,
    remaining: Cell<u32>,
    polls: Cell<u32>,
    swaps: Cell<u32>,
}

impl SimControl {
    pub fn new(front: u32, geometry: DisplayGeometry, latency: SwapLatency) -> Self {
        Self {
            front: Cell::new(front),
            back: Cell::new(front),
            resolution: geometry.packed(),
            status: Cell::new(Status::XY_ADDRESSING),
            latency,
            remaining: Cell::new(0),
            polls: Cell::new(0),
            swaps: Cell::new(0),
        }
    }

    /// Pixel controller at reset: both addresses on the on-chip buffer
    pub fn pixel(geometry: DisplayGeometry, latency: SwapLatency) -> Self {
        Self::new(FPGA_PIXEL_BUF_BASE as u32, geometry, latency)
    }

    /// Character controller (swap handshake unused)
    pub fn character(geometry: DisplayGeometry) -> Self {
        Self::new(FPGA_CHAR_BASE as u32, geometry, SwapLatency::Never)
    }

    /// Completed swaps so far
    pub fn swaps(&self) -> u32 {
        self.swaps.get()
    }

    /// Status register reads so far
    pub fn polls(&self) -> u32 {
        self.polls.get()
    }

    pub fn is_swap_pending(&self) -> bool {
        self.status.get().contains(Status::SWAP_PENDING)
    }

    /// Register value without side effects
    fn peek(&self, offset: usize) -> u32 {
        match offset {
            REG_BUFFER => self.front.get(),
            REG_BACK_BUFFER => self.back.get(),
            REG_RESOLUTION => self.resolution,
            REG_STATUS => self.status.get().bits(),
            _ => 0,
        }
    }

    fn poll_status(&self) -> u32 {
        self.polls.set(self.polls.get().wrapping_add(1));
        let status = self.status.get();
        if status.contains(Status::SWAP_PENDING) {
            if let SwapLatency::Polls(_) = self.latency {
                let left = self.remaining.get();
                if left == 0 {
                    self.vertical_blank();
                } else {
                    self.remaining.set(left - 1);
                }
            }
        }
        self.status.get().bits()
    }

    fn vertical_blank(&self) {
        let front = self.front.get();
        self.front.set(self.back.get());
        self.back.set(front);
        self.status.set(self.status.get() - Status::SWAP_PENDING);
        self.swaps.set(self.swaps.get().wrapping_add(1));
    }
}

impl RegisterWindow for SimControl {
    fn len(&self) -> usize {
        CTRL_SPAN
    }

    fn read_u8(&self, offset: usize) -> Result<u8, WindowError> {
        check_access(offset, 1, CTRL_SPAN)?;
        Ok((self.peek(offset & !3) >> ((offset & 3) * 8)) as u8)
    }

    fn write_u8(&mut self, offset: usize, _value: u8) -> Result<(), WindowError> {
        check_access(offset, 1, CTRL_SPAN)?;
        log::trace!("sim: ignoring byte write at {:#x}", offset);
        Ok(())
    }

    fn read_u16(&self, offset: usize) -> Result<u16, WindowError> {
        check_access(offset, 2, CTRL_SPAN)?;
        Ok((self.peek(offset & !3) >> ((offset & 3) * 8)) as u16)
    }

    fn write_u16(&mut self, offset: usize, _value: u16) -> Result<(), WindowError> {
        check_access(offset, 2, CTRL_SPAN)?;
        log::trace!("sim: ignoring halfword write at {:#x}", offset);
        Ok(())
    }

    fn read_u32(&self, offset: usize) -> Result<u32, WindowError> {
        check_access(offset, 4, CTRL_SPAN)?;
        if offset == REG_STATUS {
            Ok(self.poll_status())
        } else {
            Ok(self.peek(offset))
        }
    }

    fn write_u32(&mut self, offset: usize, value: u32) -> Result<(), WindowError> {
        check_access(offset, 4, CTRL_SPAN)?;
        match offset {
            REG_BUFFER if value == SWAP_REQUEST => {
                let latency = match self.latency {
                    SwapLatency::Polls(n) => n,
                    SwapLatency::Never => 0,
                };
                self.remaining.set(latency);
                self.status.set(self.status.get() | Status::SWAP_PENDING);
            }
            REG_BACK_BUFFER => self.back.set(value),
            _ => log::trace!("sim: ignoring write {:#x} at {:#x}", value, offset),
        }
        Ok(())
    }
}

/// Region mapper backed entirely by simulated hardware
#[derive(Debug, Clone, Copy)]
pub struct SimMapper {
    pub pixel_geometry: DisplayGeometry,
    pub char_geometry: DisplayGeometry,
    pub latency: SwapLatency,
    /// Name of a region whose mapping should fail
    pub fail_region: Option<&'static str>,
    /// Windows handed out and not yet unmapped
    pub live: u32,
}

impl SimMapper {
    /// 320x240 pixels, 80x60 characters
    pub fn de1_soc() -> Self {
        Self {
            pixel_geometry: DisplayGeometry::new(320, 240),
            char_geometry: DisplayGeometry::new(80, 60),
            latency: SwapLatency::default(),
            fail_region: None,
            live: 0,
        }
    }

    fn check(&self, region: Region) -> Result<(), MapError> {
        match self.fail_region {
            Some(name) if name == region.name => Err(MapError { region }),
            _ => Ok(()),
        }
    }
}

impl Default for SimMapper {
    fn default() -> Self {
        Self::de1_soc()
    }
}

impl RegionMapper for SimMapper {
    type Control = SimControl;
    type Buffer = MemWindow;

    fn map_control(&mut self, region: Region) -> Result<SimControl, MapError> {
        self.check(region)?;
        let control = match region.base {
            PIXEL_BUF_CTRL_BASE => SimControl::pixel(self.pixel_geometry, self.latency),
            CHAR_BUF_CTRL_BASE => SimControl::character(self.char_geometry),
            _ => return Err(MapError { region }),
        };
        self.live += 1;
        Ok(control)
    }

    fn map_buffer(&mut self, region: Region) -> Result<MemWindow, MapError> {
        self.check(region)?;
        self.live += 1;
        Ok(MemWindow::new(region.span))
    }

    fn unmap_control(&mut self, _window: SimControl) {
        self.live = self.live.saturating_sub(1);
    }

    fn unmap_buffer(&mut self, _window: MemWindow) {
        self.live = self.live.saturating_sub(1);
    }
}
