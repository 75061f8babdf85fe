//! DE1-SoC memory map and VGA controller layout
//!
//! Physical addresses of the regions the display core needs mapped, and the
//! register offsets inside the pixel/character controller blocks.

use crate::device::Region;

// ============================================================================
// Physical Memory Map
// ============================================================================

/// FPGA lightweight HPS-to-FPGA bridge base
pub const LW_BRIDGE_BASE: usize = 0xFF20_0000;

/// Pixel buffer controller, inside the lightweight bridge
pub const PIXEL_BUF_CTRL_BASE: usize = LW_BRIDGE_BASE + 0x3020;

/// Character buffer controller, inside the lightweight bridge
pub const CHAR_BUF_CTRL_BASE: usize = LW_BRIDGE_BASE + 0x3030;

/// Controller register block size (four 32-bit words)
pub const CTRL_SPAN: usize = 0x10;

/// On-chip pixel buffer (primary)
pub const FPGA_PIXEL_BUF_BASE: usize = 0xC800_0000;

/// SDRAM pixel buffer (secondary)
pub const SDRAM_BASE: usize = 0xC000_0000;

/// Bytes covered by one pixel buffer: 240 rows of 1024-byte pitch, rounded
/// up to the on-chip memory size.
pub const PIXEL_BUF_SPAN: usize = 0x0004_0000;

/// On-chip character buffer
pub const FPGA_CHAR_BASE: usize = 0xC900_0000;

/// Character buffer span: 60 rows of 128-byte pitch
pub const FPGA_CHAR_SPAN: usize = 0x0000_2000;

// ============================================================================
// Controller Registers (byte offsets)
// ============================================================================

/// Front buffer base; writing 1 requests a swap at the next vertical blank
pub const REG_BUFFER: usize = 0x0;
/// Back buffer base
pub const REG_BACK_BUFFER: usize = 0x4;
/// Resolution: width in bits 0..16, height in bits 16..32
pub const REG_RESOLUTION: usize = 0x8;
/// Status register
pub const REG_STATUS: usize = 0xC;

/// Value written to `REG_BUFFER` to request a swap
pub const SWAP_REQUEST: u32 = 1;

// ============================================================================
// Buffer Geometry
// ============================================================================

/// log2 of the pixel row pitch in bytes (1024-byte rows)
pub const PIXEL_ROW_SHIFT: u32 = 10;

/// log2 of the character row pitch in cells (128-cell rows)
pub const CHAR_ROW_SHIFT: u32 = 7;

/// Fill value for an erased character cell
pub const BLANK_CELL: u8 = b' ';

/// Background color written by a pixel clear
pub const BACKGROUND: u16 = 0x0000;

// ============================================================================
// Regions
// ============================================================================

pub const PIXEL_CTRL_REGION: Region = Region::new("pixel-ctrl", PIXEL_BUF_CTRL_BASE, CTRL_SPAN);
pub const CHAR_CTRL_REGION: Region = Region::new("char-ctrl", CHAR_BUF_CTRL_BASE, CTRL_SPAN);
pub const CHAR_BUF_REGION: Region = Region::new("char-buffer", FPGA_CHAR_BASE, FPGA_CHAR_SPAN);

/// Region descriptor for a pixel buffer at `base`
pub const fn pixel_region(base: usize) -> Region {
    Region::new("pixel-buffer", base, PIXEL_BUF_SPAN)
}
