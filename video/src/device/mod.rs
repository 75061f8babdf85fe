//! Register window abstraction layer
//!
//! The display core never touches raw pointers directly. Everything it reads
//! or writes goes through a [`RegisterWindow`], which lets the same drawing
//! code run against:
//! - Real DE1-SoC hardware (an `ioremap`/`mmap`ed region, see [`MmioWindow`])
//! - Plain memory ([`MemWindow`]) and the simulated controller in [`sim`]
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Display core                    │
//! │     (raster, text, swap, command, chardev)       │
//! └───────────────────┬─────────────────────────────┘
//!                     │
//! ┌───────────────────┴─────────────────────────────┐
//! │        RegisterWindow  /  RegionMapper           │
//! └───────────────────┬─────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         │                       │
//!    ┌────┴─────┐           ┌─────┴─────┐
//!    │ mmio     │           │ MemWindow │
//!    │ (unsafe) │           │ SimControl│
//!    └──────────┘           └───────────┘
//! ```

pub mod mmio;
pub mod sim;
pub mod window;

pub use mmio::MmioWindow;
pub use window::{MemWindow, RegisterWindow, WindowError};

use core::fmt;

/// A physical region the core needs mapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Short name used in logs and errors
    pub name: &'static str,
    /// Physical base address
    pub base: usize,
    /// Length in bytes
    pub span: usize,
}

impl Region {
    pub const fn new(name: &'static str, base: usize, span: usize) -> Self {
        Self { name, base, span }
    }
}

/// Mapping failure reported by a [`RegionMapper`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapError {
    /// Region that could not be mapped
    pub region: Region,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to map {} at {:#010x} (+{:#x})",
            self.region.name, self.region.base, self.region.span
        )
    }
}

/// Mapping capability injected by the platform layer
///
/// Controller blocks and memory buffers may be backed by different window
/// types (the simulator, for instance, gives controllers register side
/// effects but buffers plain memory).
pub trait RegionMapper {
    /// Window type for controller register blocks
    type Control: RegisterWindow;
    /// Window type for pixel and character memory
    type Buffer: RegisterWindow;

    /// Map a controller register block
    fn map_control(&mut self, region: Region) -> Result<Self::Control, MapError>;

    /// Map a pixel or character buffer
    fn map_buffer(&mut self, region: Region) -> Result<Self::Buffer, MapError>;

    /// Release a controller window. The default just drops it.
    fn unmap_control(&mut self, window: Self::Control) {
        drop(window);
    }

    /// Release a buffer window. The default just drops it.
    fn unmap_buffer(&mut self, window: Self::Buffer) {
        drop(window);
    }
}
