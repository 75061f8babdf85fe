//! Typed, bounds-checked access to a fixed-length register or memory region

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

/// Register window error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    /// Access would fall outside the window
    OutOfRange { offset: usize, width: usize, len: usize },
    /// Offset is not a multiple of the access width
    Misaligned { offset: usize, width: usize },
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowError::OutOfRange { offset, width, len } => write!(
                f,
                "{}-byte access at {:#x} outside {:#x}-byte window",
                width, offset, len
            ),
            WindowError::Misaligned { offset, width } => {
                write!(f, "{}-byte access at {:#x} is misaligned", width, offset)
            }
        }
    }
}

/// Indexed read/write access at byte offsets
///
/// Implementations must reject any access that is not fully inside the
/// window or not naturally aligned; the core relies on that instead of
/// raw pointer arithmetic.
pub trait RegisterWindow {
    /// Window length in bytes
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_u8(&self, offset: usize) -> Result<u8, WindowError>;
    fn write_u8(&mut self, offset: usize, value: u8) -> Result<(), WindowError>;

    fn read_u16(&self, offset: usize) -> Result<u16, WindowError>;
    fn write_u16(&mut self, offset: usize, value: u16) -> Result<(), WindowError>;

    fn read_u32(&self, offset: usize) -> Result<u32, WindowError>;
    fn write_u32(&mut self, offset: usize, value: u32) -> Result<(), WindowError>;
}

/// Validate an access of `width` bytes at `offset` into a window of `len` bytes
#[inline]
pub fn check_access(offset: usize, width: usize, len: usize) -> Result<(), WindowError> {
    if offset % width != 0 {
        return Err(WindowError::Misaligned { offset, width });
    }
    match offset.checked_add(width) {
        Some(end) if end <= len => Ok(()),
        _ => Err(WindowError::OutOfRange { offset, width, len }),
    }
}

/// Window backed by owned memory (little-endian words)
#[derive(Clone, PartialEq, Eq)]
pub struct MemWindow {
    bytes: Vec<u8>,
}

impl MemWindow {
    /// Zero-filled window of `len` bytes
    pub fn new(len: usize) -> Self {
        Self { bytes: vec![0u8; len] }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for MemWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemWindow").field("len", &self.bytes.len()).finish()
    }
}

impl RegisterWindow for MemWindow {
    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn read_u8(&self, offset: usize) -> Result<u8, WindowError> {
        check_access(offset, 1, self.bytes.len())?;
        Ok(self.bytes[offset])
    }

    fn write_u8(&mut self, offset: usize, value: u8) -> Result<(), WindowError> {
        check_access(offset, 1, self.bytes.len())?;
        self.bytes[offset] = value;
        Ok(())
    }

    fn read_u16(&self, offset: usize) -> Result<u16, WindowError> {
        check_access(offset, 2, self.bytes.len())?;
        Ok(u16::from_le_bytes([self.bytes[offset], self.bytes[offset + 1]]))
    }

    fn write_u16(&mut self, offset: usize, value: u16) -> Result<(), WindowError> {
        check_access(offset, 2, self.bytes.len())?;
        self.bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn read_u32(&self, offset: usize) -> Result<u32, WindowError> {
        check_access(offset, 4, self.bytes.len())?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[offset..offset + 4]);
        Ok(u32::from_le_bytes(word))
    }

    fn write_u32(&mut self, offset: usize, value: u32) -> Result<(), WindowError> {
        check_access(offset, 4, self.bytes.len())?;
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}
