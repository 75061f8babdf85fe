//! Double-buffered VGA display core
//!
//! Drives the pixel buffer and character buffer controllers of a DE1-SoC
//! style VGA subsystem through injected register windows: two 16-bit pixel
//! buffers swapped on vertical blank, and an 8-bit character overlay.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod chardev;
pub mod command;
pub mod config;
pub mod constants;
pub mod device;
pub mod display;
pub mod error;
pub mod geometry;
pub mod raster;
pub mod regs;
pub mod swap;
pub mod text;

pub use chardev::VideoDevice;
pub use command::{Command, ParseError};
pub use config::{BoundsMode, DisplayConfig};
pub use device::{MapError, MemWindow, MmioWindow, Region, RegionMapper, RegisterWindow, WindowError};
pub use display::{Display, Regions};
pub use error::VideoError;
pub use geometry::DisplayGeometry;
pub use raster::{Canvas, LinePoints, Rasterizer};
pub use swap::{BufferId, SpinWait, SwapState, VsyncWait};
